//! Arrow data handling utilities
//!
//! Helpers for locating columns in record batches and extracting them as
//! the value types the pipeline works with.

pub mod array_utils;
pub mod extractors;

pub use array_utils::{downcast_array, get_column};
pub use extractors::{date_values, float_values, string_values};
