//! Classifier seam and the gradient-boosted tree ensemble
//!
//! Models are read from the XGBoost JSON format written by `save_model`.
//! Only inference is supported.

use serde::Deserialize;
use std::path::Path;

use crate::error::util::read_artifact;
use crate::error::{Error, Result};
use crate::models::Label;

/// A trained model returning one label per feature row
pub trait Classifier: Send + Sync {
    /// Predict a label for every row
    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<Label>>;

    /// Number of input features the model was trained on, when it declares one
    fn num_features(&self) -> Option<usize>;
}

#[derive(Debug, Deserialize)]
struct ModelDocument {
    learner: LearnerDocument,
}

#[derive(Debug, Deserialize)]
struct LearnerDocument {
    gradient_booster: BoosterDocument,
    learner_model_param: LearnerParams,
    objective: ObjectiveDocument,
}

#[derive(Debug, Deserialize)]
struct BoosterDocument {
    name: String,
    model: Option<GbtreeDocument>,
}

#[derive(Debug, Deserialize)]
struct GbtreeDocument {
    trees: Vec<TreeDocument>,
    #[serde(default)]
    tree_info: Vec<usize>,
}

#[derive(Debug, Deserialize)]
struct TreeDocument {
    left_children: Vec<i32>,
    right_children: Vec<i32>,
    split_indices: Vec<usize>,
    split_conditions: Vec<f32>,
    default_left: Vec<Flag>,
}

/// Older writers store booleans as integers
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(u8),
}

impl Flag {
    const fn is_set(self) -> bool {
        match self {
            Self::Bool(b) => b,
            Self::Int(i) => i != 0,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LearnerParams {
    #[serde(default)]
    base_score: Option<String>,
    #[serde(default)]
    num_class: Option<String>,
    #[serde(default)]
    num_feature: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObjectiveDocument {
    name: String,
}

/// Objectives with a supported output transform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Objective {
    /// Sigmoid of the margin, thresholded
    Logistic,
    /// Raw margin, thresholded after the sigmoid
    LogitRaw,
    /// Argmax over per-class margins
    Multiclass(usize),
}

#[derive(Debug, Clone, PartialEq)]
struct Node {
    left: i32,
    right: i32,
    feature: usize,
    condition: f32,
    default_left: bool,
}

impl Node {
    const fn is_leaf(&self) -> bool {
        self.left < 0
    }
}

/// One regression tree, nodes stored by index with the root at zero
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn from_document(index: usize, tree: TreeDocument) -> Result<Self> {
        let n = tree.left_children.len();
        if n == 0
            || tree.right_children.len() != n
            || tree.split_indices.len() != n
            || tree.split_conditions.len() != n
            || tree.default_left.len() != n
        {
            return Err(Error::Serialization(format!(
                "Tree {index} has inconsistent node arrays"
            )));
        }
        let nodes = (0..n)
            .map(|i| Node {
                left: tree.left_children[i],
                right: tree.right_children[i],
                feature: tree.split_indices[i],
                condition: tree.split_conditions[i],
                default_left: tree.default_left[i].is_set(),
            })
            .collect::<Vec<_>>();

        // Every reachable node is visited once, so traversal always ends at a leaf
        let child = |link: i32| usize::try_from(link).ok().filter(|c| *c < n);
        let mut visited = vec![false; n];
        let mut stack = vec![0usize];
        while let Some(i) = stack.pop() {
            if std::mem::replace(&mut visited[i], true) {
                return Err(Error::Serialization(format!(
                    "Tree {index} node {i} is reached more than once"
                )));
            }
            let node = &nodes[i];
            if node.is_leaf() {
                continue;
            }
            match (child(node.left), child(node.right)) {
                (Some(left), Some(right)) => stack.extend([left, right]),
                _ => {
                    return Err(Error::Serialization(format!(
                        "Tree {index} node {i} points outside the tree"
                    )));
                }
            }
        }
        Ok(Self { nodes })
    }

    /// Leaf value reached by `row`; missing or out-of-range features follow the default branch
    #[must_use]
    pub fn leaf_value(&self, row: &[f64]) -> f32 {
        let mut idx = 0usize;
        loop {
            let node = &self.nodes[idx];
            if node.is_leaf() {
                return node.condition;
            }
            let value = row.get(node.feature).copied().unwrap_or(f64::NAN);
            #[allow(clippy::cast_possible_truncation)]
            let go_left = if value.is_nan() {
                node.default_left
            } else {
                (value as f32) < node.condition
            };
            let next = if go_left { node.left } else { node.right };
            idx = usize::try_from(next).unwrap_or_default();
        }
    }

    fn max_feature(&self) -> Option<usize> {
        self.nodes
            .iter()
            .filter(|n| !n.is_leaf())
            .map(|n| n.feature)
            .max()
    }
}

/// Gradient-boosted tree ensemble
#[derive(Debug, Clone, PartialEq)]
pub struct GradientBoostedTrees {
    trees: Vec<Tree>,
    tree_classes: Vec<usize>,
    objective: Objective,
    base_margin: f64,
    num_features: Option<usize>,
    threshold: f64,
}

fn parse_float_param(raw: &str) -> Option<f64> {
    raw.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim()
        .parse()
        .ok()
}

fn logit(p: f64) -> f64 {
    (p / (1.0 - p)).ln()
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

impl GradientBoostedTrees {
    /// Load a model saved as XGBoost JSON
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = read_artifact(path, "classifier model")?;
        Self::from_json_str(&content).map_err(|e| Error::artifact(path, e.to_string()))
    }

    /// Parse a model from XGBoost JSON text
    pub fn from_json_str(content: &str) -> Result<Self> {
        let document: ModelDocument = serde_json::from_str(content)?;
        let learner = document.learner;

        if learner.gradient_booster.name != "gbtree" {
            return Err(Error::Serialization(format!(
                "Unsupported booster '{}'",
                learner.gradient_booster.name
            )));
        }
        let model = learner
            .gradient_booster
            .model
            .ok_or_else(|| Error::Serialization("Booster has no tree model".to_string()))?;

        let params = &learner.learner_model_param;
        let num_class = params
            .num_class
            .as_deref()
            .and_then(parse_float_param)
            .unwrap_or(0.0);
        let base_score = params
            .base_score
            .as_deref()
            .and_then(parse_float_param)
            .unwrap_or(0.5);
        let num_features = params
            .num_feature
            .as_deref()
            .and_then(parse_float_param)
            .filter(|n| *n > 0.0);

        let objective = match learner.objective.name.as_str() {
            "binary:logistic" | "reg:logistic" => Objective::Logistic,
            "binary:logitraw" => Objective::LogitRaw,
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            "multi:softmax" | "multi:softprob" if num_class >= 2.0 => {
                Objective::Multiclass(num_class as usize)
            }
            other => {
                return Err(Error::Serialization(format!(
                    "Unsupported objective '{other}'"
                )));
            }
        };

        let base_margin = match objective {
            Objective::Logistic => {
                if !(base_score > 0.0 && base_score < 1.0) {
                    return Err(Error::Serialization(format!(
                        "base_score {base_score} is not a probability"
                    )));
                }
                logit(base_score)
            }
            Objective::LogitRaw | Objective::Multiclass(_) => base_score,
        };

        let tree_classes = match objective {
            Objective::Multiclass(classes) => {
                if model.tree_info.len() != model.trees.len()
                    || model.tree_info.iter().any(|c| *c >= classes)
                {
                    return Err(Error::Serialization(
                        "tree_info does not assign every tree to a class".to_string(),
                    ));
                }
                model.tree_info.clone()
            }
            _ => vec![0; model.trees.len()],
        };

        let trees = model
            .trees
            .into_iter()
            .enumerate()
            .map(|(i, tree)| Tree::from_document(i, tree))
            .collect::<Result<Vec<_>>>()?;

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let num_features = num_features.map(|n| n as usize);
        if let Some(declared) = num_features {
            if let Some(max) = trees.iter().filter_map(Tree::max_feature).max() {
                if max >= declared {
                    return Err(Error::Serialization(format!(
                        "Tree splits on feature {max} but the model declares {declared} features"
                    )));
                }
            }
        }

        Ok(Self {
            trees,
            tree_classes,
            objective,
            base_margin,
            num_features,
            threshold: 0.5,
        })
    }

    /// Use a different probability threshold for binary objectives
    #[must_use]
    pub const fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    #[must_use]
    pub const fn objective(&self) -> Objective {
        self.objective
    }

    #[must_use]
    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    /// Margin per class for one row; binary objectives have a single class
    #[must_use]
    pub fn margins(&self, row: &[f64]) -> Vec<f64> {
        let classes = match self.objective {
            Objective::Multiclass(n) => n,
            _ => 1,
        };
        let mut margins = vec![self.base_margin; classes];
        for (tree, class) in self.trees.iter().zip(&self.tree_classes) {
            margins[*class] += f64::from(tree.leaf_value(row));
        }
        margins
    }

    /// Fraud probability of one row for binary objectives
    #[must_use]
    pub fn probability(&self, row: &[f64]) -> Option<f64> {
        match self.objective {
            Objective::Logistic | Objective::LogitRaw => Some(sigmoid(self.margins(row)[0])),
            Objective::Multiclass(_) => None,
        }
    }

    fn label(&self, row: &[f64]) -> Label {
        let margins = self.margins(row);
        match self.objective {
            Objective::Logistic | Objective::LogitRaw => {
                if sigmoid(margins[0]) > self.threshold {
                    Label::FRAUD
                } else {
                    Label::NOT_FRAUD
                }
            }
            Objective::Multiclass(_) => {
                let best = margins
                    .iter()
                    .enumerate()
                    .fold((0, f64::NEG_INFINITY), |best, (class, m)| {
                        if *m > best.1 { (class, *m) } else { best }
                    })
                    .0;
                Label(u32::try_from(best).unwrap_or(u32::MAX))
            }
        }
    }
}

impl Classifier for GradientBoostedTrees {
    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<Label>> {
        if let Some(expected) = self.num_features {
            if let Some(row) = rows.iter().find(|row| row.len() != expected) {
                return Err(Error::Schema(format!(
                    "Classifier expects {expected} features, row has {}",
                    row.len()
                )));
            }
        }
        Ok(rows.iter().map(|row| self.label(row)).collect())
    }

    fn num_features(&self) -> Option<usize> {
        self.num_features
    }
}
