//! Batch selection
//!
//! Picks the slice of merged claims to score: the first or last rows, a
//! seeded random sample, a single row or a range.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::index;
use std::fmt;
use std::str::FromStr;

use crate::models::MergedRecord;

/// Command-line selection text that does not name a selection
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid selection '{0}', expected all, head:N, tail:N, random:N[:SEED], index:I or range:A:B")]
pub struct ParseSelectionError(String);

/// Which rows of a merged table to score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    All,
    Head(usize),
    Tail(usize),
    /// `count` distinct rows chosen with a seeded generator, kept in table order
    Random { count: usize, seed: u64 },
    /// One row; negative positions count from the end
    Index(isize),
    /// Half-open row range; negative bounds count from the end
    Range(isize, isize),
}

fn resolve(position: isize, len: usize) -> usize {
    if position < 0 {
        len.saturating_sub(position.unsigned_abs())
    } else {
        position.unsigned_abs().min(len)
    }
}

impl Selection {
    /// Row positions selected from a table of `len` rows
    #[must_use]
    pub fn indices(&self, len: usize) -> Vec<usize> {
        match *self {
            Self::All => (0..len).collect(),
            Self::Head(n) => (0..n.min(len)).collect(),
            Self::Tail(n) => (len.saturating_sub(n)..len).collect(),
            Self::Random { count, seed } => {
                let mut rng = StdRng::seed_from_u64(seed);
                let mut picked = index::sample(&mut rng, len, count.min(len)).into_vec();
                picked.sort_unstable();
                picked
            }
            Self::Index(position) => {
                let resolved = if position < 0 {
                    len.checked_sub(position.unsigned_abs())
                } else {
                    Some(position.unsigned_abs()).filter(|p| *p < len)
                };
                resolved.into_iter().collect()
            }
            Self::Range(start, end) => (resolve(start, len)..resolve(end, len)).collect(),
        }
    }

    /// Clone the selected records
    #[must_use]
    pub fn apply(&self, records: &[MergedRecord]) -> Vec<MergedRecord> {
        self.indices(records.len())
            .into_iter()
            .map(|i| records[i].clone())
            .collect()
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Head(n) => write!(f, "head:{n}"),
            Self::Tail(n) => write!(f, "tail:{n}"),
            Self::Random { count, seed } => write!(f, "random:{count}:{seed}"),
            Self::Index(i) => write!(f, "index:{i}"),
            Self::Range(start, end) => write!(f, "range:{start}:{end}"),
        }
    }
}

impl FromStr for Selection {
    type Err = ParseSelectionError;

    /// Parse `all`, `head:N`, `tail:N`, `random:N[:SEED]`, `index:I` or `range:A:B`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseSelectionError(s.to_string());
        let parts: Vec<&str> = s.trim().split(':').collect();
        let number = |i: usize| parts.get(i).ok_or_else(invalid);

        let selection = match parts[0].to_ascii_lowercase().as_str() {
            "all" if parts.len() == 1 => Self::All,
            "head" if parts.len() == 2 => Self::Head(number(1)?.parse().map_err(|_| invalid())?),
            "tail" if parts.len() == 2 => Self::Tail(number(1)?.parse().map_err(|_| invalid())?),
            "random" if parts.len() == 2 || parts.len() == 3 => Self::Random {
                count: number(1)?.parse().map_err(|_| invalid())?,
                seed: match parts.get(2) {
                    Some(seed) => seed.parse().map_err(|_| invalid())?,
                    None => 0,
                },
            },
            "index" if parts.len() == 2 => Self::Index(number(1)?.parse().map_err(|_| invalid())?),
            "range" if parts.len() == 3 => Self::Range(
                number(1)?.parse().map_err(|_| invalid())?,
                number(2)?.parse().map_err(|_| invalid())?,
            ),
            _ => return Err(invalid()),
        };
        Ok(selection)
    }
}
