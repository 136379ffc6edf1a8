//! Decode Athena's CSV result artifacts.
//!
//! Athena writes every SELECT result as a CSV file with a header row and
//! all values quoted. Column types are inferred from the values, NULLs are
//! written as empty unquoted fields and decode to Arrow nulls.

use std::io::Cursor;
use std::sync::Arc;

use arrow::compute::concat_batches;
use arrow::csv::reader::Format;
use arrow::csv::ReaderBuilder;
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use tracing::debug;

use super::ResultTable;

const BATCH_SIZE: usize = 8192;

/// Decode a CSV byte buffer (header row first) into a [`ResultTable`].
///
/// Types are inferred over the whole file. An empty buffer decodes to a
/// table with no columns.
pub fn decode_csv(bytes: &[u8]) -> Result<ResultTable, ArrowError> {
    if bytes.is_empty() {
        return Ok(ResultTable::empty());
    }

    let format = Format::default().with_header(true);
    let (schema, records) = format.infer_schema(Cursor::new(bytes), None)?;
    let schema = Arc::new(schema);

    let reader = ReaderBuilder::new(schema.clone())
        .with_header(true)
        .with_batch_size(BATCH_SIZE)
        .build(Cursor::new(bytes))?;
    let batches = reader.collect::<Result<Vec<RecordBatch>, _>>()?;
    let batch = concat_batches(&schema, &batches)?;

    debug!(
        columns = batch.num_columns(),
        rows = batch.num_rows(),
        inferred_from = records,
        "Decoded CSV result"
    );

    Ok(ResultTable::new(batch))
}
