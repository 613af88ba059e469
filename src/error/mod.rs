//! Error handling for the provider risk pipeline.

pub mod util;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;
use std::io;
use std::path::PathBuf;

/// Errors raised while merging, engineering features or scoring claims
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required column is missing or has an unusable shape
    #[error("Schema error: {0}")]
    Schema(String),

    /// A date or numeric field could not be parsed
    #[error("Parse error in column '{column}' at row {row}: {message}")]
    Parse {
        column: String,
        row: usize,
        message: String,
    },

    /// Reconciled feature columns differ from the frozen training order
    #[error("Schema mismatch at position {position}: expected '{expected}', found '{found}'")]
    SchemaMismatch {
        position: usize,
        expected: String,
        found: String,
    },

    /// A scaler or classifier artifact cannot be used
    #[error("Failed to load artifact {}: {message}", path.display())]
    ArtifactLoad { path: PathBuf, message: String },

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// Parquet error
    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    /// IO error with the path that caused it
    #[error("IO error on {}: {context}: {source}", path.display())]
    Io {
        path: PathBuf,
        context: String,
        #[source]
        source: io::Error,
    },

    /// Serialization of rows into or out of Arrow or JSON failed
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Shorthand for a parse failure at a row of a named column
    pub fn parse(column: impl Into<String>, row: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            column: column.into(),
            row,
            message: message.into(),
        }
    }

    /// Shorthand for an artifact failure
    pub fn artifact(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ArtifactLoad {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Wrap an IO error with the offending path
    pub fn io(path: impl Into<PathBuf>, context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            context: context.into(),
            source,
        }
    }

    /// Shift the row of a parse error by the number of rows in earlier batches
    #[must_use]
    pub fn with_row_offset(self, offset: usize) -> Self {
        match self {
            Self::Parse {
                column,
                row,
                message,
            } => Self::Parse {
                column,
                row: row + offset,
                message,
            },
            other => other,
        }
    }
}

impl From<serde_arrow::Error> for Error {
    fn from(error: serde_arrow::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;
