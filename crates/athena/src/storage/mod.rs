//! Remote object storage: `s3://` locations, the [`RemoteFs`] handle and
//! whole-object Parquet/JSON writers.

mod fs;
mod location;
mod writer;


pub use fs::RemoteFs;
pub use location::ObjectLocation;
pub use writer::{json_bytes, parquet_bytes, write_json, write_parquet};
