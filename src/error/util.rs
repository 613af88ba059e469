//! Utility functions for error handling
//!
//! File helpers that attach the path and purpose to IO failures.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use crate::error::{Error, Result};

/// Safely open a file with rich error information
///
/// # Arguments
/// * `path` - The path to the file to open
/// * `purpose` - Why the file is being opened (for error context)
pub fn safe_open_file(path: &Path, purpose: &str) -> Result<fs::File> {
    if !path.exists() {
        return Err(Error::io(
            path,
            format!("needed for {purpose}"),
            io::Error::new(io::ErrorKind::NotFound, "file not found"),
        ));
    }

    if !path.is_file() {
        return Err(Error::io(
            path,
            format!("expected a file for {purpose}"),
            io::Error::new(io::ErrorKind::InvalidInput, "path is not a file"),
        ));
    }

    fs::File::open(path).map_err(|e| {
        let context = match e.kind() {
            io::ErrorKind::PermissionDenied => "permission denied, check file permissions".to_string(),
            _ => format!("failed to open file for {purpose}"),
        };
        Error::io(path, context, e)
    })
}

/// Check that a directory exists and is readable
pub fn validate_directory(path: &Path, purpose: &str) -> Result<()> {
    if !path.is_dir() {
        return Err(Error::io(
            path,
            format!("expected a directory for {purpose}"),
            io::Error::new(io::ErrorKind::NotFound, "directory not found"),
        ));
    }

    fs::read_dir(path)
        .map(|_| ())
        .map_err(|e| Error::io(path, format!("failed to access directory for {purpose}"), e))
}

/// Safely read a file to string with rich error information
pub fn safe_read_to_string(path: &Path, purpose: &str) -> Result<String> {
    let mut file = safe_open_file(path, purpose)?;

    let mut content = String::new();
    file.read_to_string(&mut content).map_err(|e| {
        let context = match e.kind() {
            io::ErrorKind::InvalidData => "file contains invalid UTF-8 data".to_string(),
            _ => format!("failed to read file content for {purpose}"),
        };
        Error::io(path, context, e)
    })?;

    Ok(content)
}

/// Read an artifact file, reporting any failure as an artifact load error
pub fn read_artifact(path: &Path, purpose: &str) -> Result<String> {
    safe_read_to_string(path, purpose).map_err(|e| Error::artifact(path, e.to_string()))
}
