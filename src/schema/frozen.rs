//! Frozen training-time feature order

use itertools::{EitherOrBoth, Itertools};

use crate::error::{Error, Result};

const END_OF_COLUMNS: &str = "<end of columns>";

/// The exact ordered feature list the scaler and classifier were fitted on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrozenSchema {
    columns: Vec<String>,
}

impl FrozenSchema {
    #[must_use]
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Verify `actual` matches the frozen order exactly
    ///
    /// The error names the first position where the two lists diverge; a
    /// shorter list diverges at its end.
    pub fn verify<S: AsRef<str>>(&self, actual: &[S]) -> Result<()> {
        for (position, pair) in self
            .columns
            .iter()
            .map(String::as_str)
            .zip_longest(actual.iter().map(S::as_ref))
            .enumerate()
        {
            let (expected, found) = match pair {
                EitherOrBoth::Both(expected, found) if expected == found => continue,
                EitherOrBoth::Both(expected, found) => (expected, found),
                EitherOrBoth::Left(expected) => (expected, END_OF_COLUMNS),
                EitherOrBoth::Right(found) => (END_OF_COLUMNS, found),
            };
            return Err(Error::SchemaMismatch {
                position,
                expected: expected.to_string(),
                found: found.to_string(),
            });
        }
        Ok(())
    }
}

impl From<Vec<String>> for FrozenSchema {
    fn from(columns: Vec<String>) -> Self {
        Self::new(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frozen(names: &[&str]) -> FrozenSchema {
        FrozenSchema::new(names.iter().map(ToString::to_string).collect())
    }

    #[test]
    fn test_identical_order_passes() {
        assert!(frozen(&["a", "b"]).verify(&["a", "b"]).is_ok());
    }

    #[test]
    fn test_swapped_columns_name_first_position() {
        match frozen(&["a", "b", "c"]).verify(&["a", "c", "b"]) {
            Err(Error::SchemaMismatch {
                position,
                expected,
                found,
            }) => {
                assert_eq!(position, 1);
                assert_eq!(expected, "b");
                assert_eq!(found, "c");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_missing_trailing_column() {
        match frozen(&["a", "b"]).verify(&["a"]) {
            Err(Error::SchemaMismatch { position, found, .. }) => {
                assert_eq!(position, 1);
                assert_eq!(found, END_OF_COLUMNS);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
