use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::table::ResultTable;

/// Execution state of an Athena query.
///
/// Transitions run from `Queued`/`Running` to exactly one terminal state;
/// once terminal the state never changes for that execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryState {
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl QueryState {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryState::Queued => "QUEUED",
            QueryState::Running => "RUNNING",
            QueryState::Succeeded => "SUCCEEDED",
            QueryState::Failed => "FAILED",
            QueryState::Cancelled => "CANCELLED",
        }
    }

    /// `true` for SUCCEEDED, FAILED and CANCELLED.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            QueryState::Succeeded | QueryState::Failed | QueryState::Cancelled
        )
    }
}

impl fmt::Display for QueryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "QUEUED" => Ok(QueryState::Queued),
            "RUNNING" => Ok(QueryState::Running),
            "SUCCEEDED" => Ok(QueryState::Succeeded),
            "FAILED" => Ok(QueryState::Failed),
            "CANCELLED" => Ok(QueryState::Cancelled),
            other => Err(format!("unknown query state: {other}")),
        }
    }
}

/// Status snapshot of one Athena query execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryMetadata {
    /// Athena query execution ID.
    pub query_id: String,
    /// State at the time of the snapshot.
    pub state: QueryState,
    /// Reason reported by Athena for the last state change, if any.
    pub state_change_reason: Option<String>,
    /// Total bytes scanned during execution.
    pub bytes_scanned: u64,
    /// Engine execution time in milliseconds.
    pub execution_time_ms: u64,
    /// S3 location of the CSV result artifact, if available.
    pub output_location: Option<String>,
}

impl QueryMetadata {
    /// Minimal snapshot carrying only an ID and a state.
    pub fn new(query_id: impl Into<String>, state: QueryState) -> Self {
        Self {
            query_id: query_id.into(),
            state,
            state_change_reason: None,
            bytes_scanned: 0,
            execution_time_ms: 0,
            output_location: None,
        }
    }

    /// Estimates the query cost in USD based on Athena's $5/TB pricing model.
    pub fn cost_estimate_usd(&self) -> f64 {
        self.bytes_scanned as f64 * DOLLARS_PER_BYTE
    }
}

/// Athena pricing: $5 per TB scanned.
const DOLLARS_PER_BYTE: f64 = 5.0 / (1024.0 * 1024.0 * 1024.0 * 1024.0);

/// Decoded result table of a successful query together with its execution metadata.
#[derive(Debug, Clone)]
pub struct AthenaQueryResult {
    pub table: ResultTable,
    pub metadata: QueryMetadata,
}

impl AthenaQueryResult {
    pub fn row_count(&self) -> usize {
        self.table.num_rows()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn into_table(self) -> ResultTable {
        self.table
    }
}

impl fmt::Display for AthenaQueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.table)?;
        writeln!(f)?;
        write!(
            f,
            "Query {} | {} rows | {:.3} MB scanned | {}ms | ${:.6}",
            self.metadata.query_id,
            self.table.num_rows(),
            self.metadata.bytes_scanned as f64 / (1024.0 * 1024.0),
            self.metadata.execution_time_ms,
            self.metadata.cost_estimate_usd(),
        )
    }
}
