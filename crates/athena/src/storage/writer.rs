//! Serialize tables and JSON values into memory, then upload in one put.
//!
//! Both writers materialise the full payload before the transfer, so a
//! failed encode never leaves a partial object behind; whether a failed
//! upload can is up to the backend's single-object semantics.

use bytes::Bytes;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use serde::Serialize;
use tracing::info;

use super::fs::RemoteFs;
use crate::client::AthenaError;
use crate::table::ResultTable;

/// Encode a table as a Parquet file in memory (Zstd, no index column).
pub fn parquet_bytes(table: &ResultTable) -> Result<Vec<u8>, AthenaError> {
    let props = WriterProperties::builder()
        .set_compression(Compression::ZSTD(Default::default()))
        .build();

    let mut buf = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buf, table.schema(), Some(props))?;
    writer.write(table.batch())?;
    writer.close()?;

    Ok(buf)
}

/// Encode a value as pretty-printed JSON (2-space indent, UTF-8, non-ASCII kept as-is).
pub fn json_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, AthenaError> {
    Ok(serde_json::to_vec_pretty(value)?)
}

/// Write `table` as Parquet to `location`. Returns the bytes written.
pub async fn write_parquet(
    table: &ResultTable,
    location: &str,
    fs: &RemoteFs,
) -> Result<u64, AthenaError> {
    let buf = parquet_bytes(table)?;
    let written = fs.write(location, Bytes::from(buf)).await?;

    info!(
        location = %location,
        rows = table.num_rows(),
        bytes = written,
        "Wrote Parquet object"
    );
    Ok(written)
}

/// Write `value` as pretty JSON to `location`. Returns the bytes written.
pub async fn write_json<T: Serialize + ?Sized>(
    value: &T,
    location: &str,
    fs: &RemoteFs,
) -> Result<u64, AthenaError> {
    let buf = json_bytes(value)?;
    let written = fs.write(location, Bytes::from(buf)).await?;

    info!(location = %location, bytes = written, "Wrote JSON object");
    Ok(written)
}
