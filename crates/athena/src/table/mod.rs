//! In-memory result tables.
//!
//! A [`ResultTable`] is a single Arrow [`RecordBatch`]: named columns in a
//! fixed order, no index column. Query results come from decoding the CSV
//! artifact ([`decode_csv`]); any other `RecordBatch` converts directly.

mod csv;


use std::fmt;
use std::sync::Arc;

use arrow::array::ArrayRef;
use arrow::datatypes::{Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;
use arrow::util::pretty::pretty_format_batches;

pub use self::csv::decode_csv;

#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    batch: RecordBatch,
}

impl ResultTable {
    pub fn new(batch: RecordBatch) -> Self {
        Self { batch }
    }

    /// A table with no columns and no rows.
    pub fn empty() -> Self {
        Self::new(RecordBatch::new_empty(Arc::new(Schema::empty())))
    }

    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn into_batch(self) -> RecordBatch {
        self.batch
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.num_rows() == 0
    }

    /// Column names in table order.
    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    /// Finds the zero-based index of a column by name (case-sensitive).
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.batch.schema().index_of(name).ok()
    }

    pub fn column(&self, name: &str) -> Option<&ArrayRef> {
        self.column_index(name).map(|idx| self.batch.column(idx))
    }

    /// Display string of the cell at `row` / `col`.
    ///
    /// Returns `None` if the row is out of bounds, the column does not
    /// exist, or the cell is NULL.
    pub fn value(&self, row: usize, col: &str) -> Option<String> {
        let array = self.column(col)?;
        if row >= array.len() || array.is_null(row) {
            return None;
        }
        array_value_to_string(array, row).ok()
    }
}

impl From<RecordBatch> for ResultTable {
    fn from(batch: RecordBatch) -> Self {
        Self::new(batch)
    }
}

impl fmt::Display for ResultTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.num_columns() == 0 {
            return write!(f, "(empty result set)");
        }
        let rendered =
            pretty_format_batches(std::slice::from_ref(&self.batch)).map_err(|_| fmt::Error)?;
        write!(f, "{rendered}")
    }
}
