//! CSV file operations
//!
//! Tables are read with a header row and a schema inferred from every record,
//! so sparse code columns whose first values look numeric are still typed by
//! their later text values. Identifier and code columns are always read as
//! text so codes such as "0389" keep their leading zeros.

use std::fs::File;
use std::io::{Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use arrow::csv::reader::Format;
use arrow::csv::{ReaderBuilder, WriterBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;

use crate::error::util::safe_open_file;
use crate::error::{Error, Result};
use crate::schema::columns;
use crate::utils::io::parquet::DEFAULT_BATCH_SIZE;
use crate::utils::logging::{log_operation_complete, log_operation_start};

/// Read a CSV file with a header row into Arrow record batches
pub fn read_csv(path: &Path) -> Result<Vec<RecordBatch>> {
    let start = Instant::now();
    log_operation_start("Reading csv file", path.display());

    let mut file = safe_open_file(path, "csv table")?;
    let (inferred, _) = Format::default()
        .with_header(true)
        .infer_schema(&mut file, None)?;
    let schema = with_text_columns(&inferred);
    file.seek(SeekFrom::Start(0))
        .map_err(|e| Error::io(path, "failed to rewind csv file", e))?;

    let reader = ReaderBuilder::new(Arc::new(schema))
        .with_header(true)
        .with_batch_size(DEFAULT_BATCH_SIZE)
        .build(file)?;
    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
    let rows: usize = batches.iter().map(RecordBatch::num_rows).sum();

    log_operation_complete("read", path.display(), rows, Some(start.elapsed()));
    Ok(batches)
}

/// Retype identifier and code columns of an inferred schema as nullable Utf8
fn with_text_columns(inferred: &Schema) -> Schema {
    let text = columns::text_columns();
    let fields: Vec<Field> = inferred
        .fields()
        .iter()
        .map(|field| {
            if text.iter().any(|name| field.name() == name) {
                Field::new(field.name(), DataType::Utf8, true)
            } else {
                Field::clone(field)
            }
        })
        .collect();
    Schema::new_with_metadata(fields, inferred.metadata().clone())
}

/// Write record batches to a CSV file with a header row
pub fn write_csv(path: &Path, batches: &[RecordBatch]) -> Result<()> {
    let file = File::create(path).map_err(|e| Error::io(path, "failed to create csv file", e))?;
    let mut writer = WriterBuilder::new().with_header(true).build(file);
    for batch in batches {
        writer.write(batch)?;
    }
    let rows: usize = batches.iter().map(RecordBatch::num_rows).sum();
    log_operation_complete("wrote", path.display(), rows, None);
    Ok(())
}
