pub mod config;
pub mod client;
pub mod result;
pub mod table;
pub mod storage;
pub mod runner;
pub mod session;

pub use config::PollPolicy;
pub use client::{AthenaError, AwsQueryService, QueryRequest, QueryService};
pub use result::{AthenaQueryResult, QueryMetadata, QueryState};
pub use table::{decode_csv, ResultTable};
pub use storage::{parquet_bytes, write_json, write_parquet, ObjectLocation, RemoteFs};
pub use runner::{run_query, wait_for_completion};
pub use session::AthenaSession;
