//! Column extraction utilities for Arrow record batches
//!
//! Source tables reach the pipeline in whatever representation the reader
//! produced: CSV inference yields integer codes and native dates, hand-made
//! Parquet files often keep everything as text. These extractors adapt each
//! column to the value type the pipeline works with and report unparseable
//! cells with their column and row.

use arrow::array::{
    Array, ArrayRef, Date32Array, Date64Array, Float32Array, Float64Array, LargeStringArray,
    StringArray,
};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::utils::arrow::array_utils::{downcast_array, get_column};

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn text_cells(array: &ArrayRef, column_name: &str) -> Result<Vec<Option<String>>> {
    let values = match array.data_type() {
        DataType::Null => vec![None; array.len()],
        DataType::Utf8 => {
            let strings = downcast_array::<StringArray>(array, column_name, "Utf8")?;
            strings.iter().map(|v| v.and_then(non_empty)).collect()
        }
        DataType::LargeUtf8 => {
            let strings = downcast_array::<LargeStringArray>(array, column_name, "LargeUtf8")?;
            strings.iter().map(|v| v.and_then(non_empty)).collect()
        }
        // Integral floats print without a fractional part so that 4019.0 and 4019 agree
        DataType::Float64 => {
            let floats = downcast_array::<Float64Array>(array, column_name, "Float64")?;
            floats.iter().map(|v| v.map(|f| f.to_string())).collect()
        }
        DataType::Float32 => {
            let floats = downcast_array::<Float32Array>(array, column_name, "Float32")?;
            floats.iter().map(|v| v.map(|f| f.to_string())).collect()
        }
        other => {
            let converted = cast(array, &DataType::Utf8).map_err(|e| {
                Error::Schema(format!(
                    "Column '{column_name}' of type {other:?} cannot be read as text: {e}"
                ))
            })?;
            let strings = downcast_array::<StringArray>(&converted, column_name, "Utf8")?;
            strings.iter().map(|v| v.and_then(non_empty)).collect()
        }
    };
    Ok(values)
}

/// Extract a column as optional strings; empty strings are treated as null
///
/// # Returns
///
/// * `Ok(Some(values))` - One entry per row
/// * `Ok(None)` - If the column is not present and not required
pub fn string_values(
    batch: &RecordBatch,
    column_name: &str,
    required: bool,
) -> Result<Option<Vec<Option<String>>>> {
    get_column(batch, column_name, required)?
        .map(|array| text_cells(&array, column_name))
        .transpose()
}

/// Extract a column as optional `f64` values
///
/// Integer and boolean columns are widened; text columns are parsed and a
/// cell that is not a number fails with a parse error.
pub fn float_values(
    batch: &RecordBatch,
    column_name: &str,
    required: bool,
) -> Result<Option<Vec<Option<f64>>>> {
    let Some(array) = get_column(batch, column_name, required)? else {
        return Ok(None);
    };

    let values = match array.data_type() {
        DataType::Null => vec![None; array.len()],
        DataType::Utf8 | DataType::LargeUtf8 => text_cells(&array, column_name)?
            .into_iter()
            .enumerate()
            .map(|(row, cell)| {
                cell.map(|text| {
                    text.parse::<f64>().map_err(|e| {
                        Error::parse(column_name, row, format!("'{text}' is not a number: {e}"))
                    })
                })
                .transpose()
            })
            .collect::<Result<Vec<_>>>()?,
        dt if dt.is_numeric() || *dt == DataType::Boolean => {
            let converted = cast(&array, &DataType::Float64)?;
            downcast_array::<Float64Array>(&converted, column_name, "Float64")?
                .iter()
                .collect()
        }
        other => {
            return Err(Error::Schema(format!(
                "Column '{column_name}' of type {other:?} cannot be read as a number"
            )));
        }
    };
    Ok(Some(values))
}

/// Extract a column as optional dates
///
/// Native date columns are used directly; text columns are parsed with
/// `format` and a cell that does not match fails with a parse error.
pub fn date_values(
    batch: &RecordBatch,
    column_name: &str,
    format: &str,
    required: bool,
) -> Result<Option<Vec<Option<NaiveDate>>>> {
    let Some(array) = get_column(batch, column_name, required)? else {
        return Ok(None);
    };

    let values = match array.data_type() {
        DataType::Null => vec![None; array.len()],
        DataType::Date32 => {
            let dates = downcast_array::<Date32Array>(&array, column_name, "Date32")?;
            (0..dates.len())
                .map(|i| if dates.is_null(i) { None } else { dates.value_as_date(i) })
                .collect()
        }
        DataType::Date64 => {
            let dates = downcast_array::<Date64Array>(&array, column_name, "Date64")?;
            (0..dates.len())
                .map(|i| if dates.is_null(i) { None } else { dates.value_as_date(i) })
                .collect()
        }
        DataType::Timestamp(_, _) => {
            let converted = cast(&array, &DataType::Date32)?;
            let dates = downcast_array::<Date32Array>(&converted, column_name, "Date32")?;
            (0..dates.len())
                .map(|i| if dates.is_null(i) { None } else { dates.value_as_date(i) })
                .collect()
        }
        DataType::Utf8 | DataType::LargeUtf8 => text_cells(&array, column_name)?
            .into_iter()
            .enumerate()
            .map(|(row, cell)| {
                cell.map(|text| {
                    NaiveDate::parse_from_str(&text, format).map_err(|e| {
                        Error::parse(
                            column_name,
                            row,
                            format!("'{text}' does not match date format '{format}': {e}"),
                        )
                    })
                })
                .transpose()
            })
            .collect::<Result<Vec<_>>>()?,
        other => {
            return Err(Error::Schema(format!(
                "Column '{column_name}' of type {other:?} cannot be read as a date"
            )));
        }
    };
    Ok(Some(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Int64Array;
    use arrow::datatypes::{Field, Schema};
    use std::sync::Arc;

    fn batch(name: &str, array: ArrayRef) -> RecordBatch {
        let schema = Schema::new(vec![Field::new(name, array.data_type().clone(), true)]);
        RecordBatch::try_new(Arc::new(schema), vec![array]).unwrap()
    }

    #[test]
    fn test_integer_codes_read_as_text() {
        let batch = batch("Code", Arc::new(Int64Array::from(vec![Some(4019), None])));
        let values = string_values(&batch, "Code", true).unwrap().unwrap();
        assert_eq!(values, vec![Some("4019".to_string()), None]);
    }

    #[test]
    fn test_integral_floats_read_as_text_without_fraction() {
        let batch = batch("Code", Arc::new(Float64Array::from(vec![Some(4019.0), Some(1.5)])));
        let values = string_values(&batch, "Code", true).unwrap().unwrap();
        assert_eq!(values, vec![Some("4019".to_string()), Some("1.5".to_string())]);
    }

    #[test]
    fn test_empty_strings_are_null() {
        let batch = batch("Code", Arc::new(StringArray::from(vec![Some(""), Some(" V54 ")])));
        let values = string_values(&batch, "Code", true).unwrap().unwrap();
        assert_eq!(values, vec![None, Some("V54".to_string())]);
    }

    #[test]
    fn test_text_numbers_parse_or_fail_with_row() {
        let good = batch("Amt", Arc::new(StringArray::from(vec![Some("10.5"), None])));
        assert_eq!(
            float_values(&good, "Amt", true).unwrap().unwrap(),
            vec![Some(10.5), None]
        );

        let bad = batch("Amt", Arc::new(StringArray::from(vec![Some("1"), Some("ten")])));
        match float_values(&bad, "Amt", true) {
            Err(Error::Parse { column, row, .. }) => {
                assert_eq!(column, "Amt");
                assert_eq!(row, 1);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_text_dates_use_format() {
        let batch = batch("Dt", Arc::new(StringArray::from(vec![Some("2009-01-03"), None])));
        let values = date_values(&batch, "Dt", "%Y-%m-%d", true).unwrap().unwrap();
        assert_eq!(values[0], NaiveDate::from_ymd_opt(2009, 1, 3));
        assert_eq!(values[1], None);

        assert!(matches!(
            date_values(&batch, "Dt", "%d/%m/%Y", true),
            Err(Error::Parse { .. })
        ));
    }

    #[test]
    fn test_missing_optional_column_is_none() {
        let batch = batch("Dt", Arc::new(StringArray::from(vec![Some("x")])));
        assert!(float_values(&batch, "Other", false).unwrap().is_none());
        assert!(matches!(
            float_values(&batch, "Other", true),
            Err(Error::Schema(_))
        ));
    }
}
