//! Utilities for working with Arrow arrays.
//!
//! This module provides helpers for locating and downcasting columns of a
//! record batch with errors that name the offending column.

use arrow::array::{Array, ArrayRef};
use arrow::record_batch::RecordBatch;

use crate::error::{Error, Result};

/// Get a column from a record batch by name
///
/// # Arguments
///
/// * `batch` - The record batch containing the column
/// * `column_name` - The name of the column to extract
/// * `required` - Whether the column is required (error if missing) or optional (None if missing)
///
/// # Returns
///
/// * `Ok(Some(ArrayRef))` - The column array if found
/// * `Ok(None)` - If the column is not found and `required` is false
/// * `Err(Error::Schema)` - If the column is not found and `required` is true
pub fn get_column(
    batch: &RecordBatch,
    column_name: &str,
    required: bool,
) -> Result<Option<ArrayRef>> {
    match batch.schema().index_of(column_name) {
        Ok(idx) => Ok(Some(batch.column(idx).clone())),
        Err(_) if required => Err(Error::Schema(format!(
            "Column '{column_name}' not found in record batch"
        ))),
        Err(_) => Ok(None),
    }
}

/// Downcast a column to a specific array type with clear error messages
///
/// # Type Parameters
///
/// * `A` - The target array type to downcast to
///
/// # Arguments
///
/// * `array` - The array reference to downcast
/// * `column_name` - The name of the column (for error messages)
/// * `expected_type_name` - A human-readable name of the expected type (for error messages)
pub fn downcast_array<'a, A: Array + 'static>(
    array: &'a ArrayRef,
    column_name: &str,
    expected_type_name: &str,
) -> Result<&'a A> {
    array.as_any().downcast_ref::<A>().ok_or_else(|| {
        Error::Schema(format!(
            "Column '{column_name}' has type {:?}, expected {expected_type_name}",
            array.data_type()
        ))
    })
}
