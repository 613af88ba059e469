//! Table reading and writing
//!
//! A table is a Parquet or CSV file, chosen by extension.

pub mod csv;
pub mod parquet;

use std::path::{Path, PathBuf};

use arrow::record_batch::RecordBatch;
use rayon::prelude::*;

use crate::error::util::validate_directory;
use crate::error::{Error, Result};

pub use self::csv::{read_csv, write_csv};
pub use self::parquet::{DEFAULT_BATCH_SIZE, read_parquet};

/// Extensions recognised as tables, in lookup order
pub const TABLE_EXTENSIONS: [&str; 2] = ["parquet", "csv"];

/// Read one table, dispatching on the file extension
pub fn read_table(path: &Path) -> Result<Vec<RecordBatch>> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("parquet") => read_parquet(path),
        Some(ext) if ext.eq_ignore_ascii_case("csv") => read_csv(path),
        _ => Err(Error::Schema(format!(
            "Unsupported table format for {}; expected .parquet or .csv",
            path.display()
        ))),
    }
}

/// Read several tables in parallel, returned in the order given
pub fn read_tables_parallel(paths: &[&Path]) -> Result<Vec<Vec<RecordBatch>>> {
    paths.par_iter().map(|path| read_table(path)).collect()
}

/// Locate `<stem>.parquet` or `<stem>.csv` inside `dir`
pub fn find_table(dir: &Path, stem: &str) -> Result<PathBuf> {
    validate_directory(dir, "reference tables")?;
    TABLE_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{stem}.{ext}")))
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| {
            Error::Schema(format!(
                "No {stem}.parquet or {stem}.csv table in {}",
                dir.display()
            ))
        })
}
