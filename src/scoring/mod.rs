//! Scoring with the frozen artifacts
//!
//! A standard scaler fitted at training time and a classifier behind the
//! [`Classifier`] trait; the gradient-boosted tree ensemble is the one
//! shipped implementation.

pub mod adapter;
pub mod classifier;
pub mod scaler;

pub use adapter::ScoringAdapter;
pub use classifier::{Classifier, GradientBoostedTrees, Objective, Tree};
pub use scaler::StandardScaler;
