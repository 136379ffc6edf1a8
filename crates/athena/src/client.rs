//! AWS Athena query service.
//!
//! [`QueryService`] is the seam the runner polls through; [`AwsQueryService`]
//! implements it on top of the AWS SDK with static credentials.

use std::time::Duration;

use async_trait::async_trait;
use aws_credential_types::Credentials as AwsCredentials;
use aws_sdk_athena::config::{BehaviorVersion, Region};
use aws_sdk_athena::types::{
    QueryExecution, QueryExecutionContext, QueryExecutionState, ResultConfiguration,
};
use quarry_core::{ConfigError, Credentials};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::result::{QueryMetadata, QueryState};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors that can occur during Athena and storage operations.
#[derive(Debug, thiserror::Error)]
pub enum AthenaError {
    /// Credentials could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// An AWS SDK error (stringified).
    #[error("AWS SDK error: {0}")]
    AwsSdk(String),

    /// The query reached FAILED or CANCELLED.
    #[error("Athena query {query_id} finished in state {state}: {reason}")]
    QueryNotSucceeded {
        query_id: String,
        state: QueryState,
        reason: String,
    },

    /// The poll policy ran out before the query reached a terminal state.
    #[error("Athena query {query_id} still {state} after {attempts} polls ({elapsed:?})")]
    QueryTimeout {
        query_id: String,
        state: QueryState,
        attempts: u32,
        elapsed: Duration,
    },

    /// Athena reported success but no result location.
    #[error("Query {0} succeeded without an output location")]
    MissingOutputLocation(String),

    /// A location that isn't a usable `s3://bucket/key` URL.
    #[error("Invalid object location {0}")]
    InvalidLocation(String),

    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// One query submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// SQL to execute.
    pub sql: String,
    /// Logical database the query runs against (empty = workgroup default).
    pub database: String,
    /// S3 prefix Athena writes the result CSV under.
    pub output_location: String,
    /// Athena workgroup; `None` uses the account default.
    #[serde(default)]
    pub workgroup: Option<String>,
}

impl QueryRequest {
    pub fn new(
        sql: impl Into<String>,
        database: impl Into<String>,
        output_location: impl Into<String>,
    ) -> Self {
        Self {
            sql: sql.into(),
            database: database.into(),
            output_location: output_location.into(),
            workgroup: None,
        }
    }

    pub fn with_workgroup(mut self, workgroup: impl Into<String>) -> Self {
        self.workgroup = Some(workgroup.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Service seam
// ---------------------------------------------------------------------------

/// Submit, inspect and stop Athena query executions.
#[async_trait]
pub trait QueryService: Send + Sync {
    /// Submit a query and return its execution ID.
    async fn start_query(&self, request: &QueryRequest) -> Result<String, AthenaError>;

    /// Current status snapshot of an execution.
    async fn query_execution(&self, query_id: &str) -> Result<QueryMetadata, AthenaError>;

    /// Request cancellation of a running execution.
    async fn stop_query(&self, query_id: &str) -> Result<(), AthenaError>;
}

// ---------------------------------------------------------------------------
// AWS implementation
// ---------------------------------------------------------------------------

/// [`QueryService`] backed by `aws_sdk_athena`.
#[derive(Debug, Clone)]
pub struct AwsQueryService {
    client: aws_sdk_athena::Client,
}

impl AwsQueryService {
    /// Build an Athena client bound to the credentials' region.
    ///
    /// No network traffic happens here; bad credentials show up on the
    /// first request.
    pub fn new(credentials: &Credentials) -> Self {
        let aws_creds = AwsCredentials::new(
            &credentials.access_key_id,
            &credentials.secret_access_key,
            credentials.session_token.clone(),
            None, // expiry
            "quarry-athena",
        );

        let config = aws_sdk_athena::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(credentials.region.clone()))
            .credentials_provider(aws_creds)
            .build();

        info!(region = %credentials.region, "Athena client initialised");

        Self {
            client: aws_sdk_athena::Client::from_conf(config),
        }
    }

    /// Wrap an already configured SDK client.
    pub fn from_client(client: aws_sdk_athena::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl QueryService for AwsQueryService {
    async fn start_query(&self, request: &QueryRequest) -> Result<String, AthenaError> {
        let resp = self
            .client
            .start_query_execution()
            .query_string(&request.sql)
            .query_execution_context({
                let mut ctx = QueryExecutionContext::builder();
                if !request.database.is_empty() {
                    ctx = ctx.database(&request.database);
                }
                ctx.build()
            })
            .result_configuration(
                ResultConfiguration::builder()
                    .output_location(&request.output_location)
                    .build(),
            )
            .set_work_group(request.workgroup.clone())
            .send()
            .await
            .map_err(|e| AthenaError::AwsSdk(e.to_string()))?;

        resp.query_execution_id()
            .map(|id| id.to_string())
            .ok_or_else(|| AthenaError::AwsSdk("No query execution ID returned".into()))
    }

    async fn query_execution(&self, query_id: &str) -> Result<QueryMetadata, AthenaError> {
        let resp = self
            .client
            .get_query_execution()
            .query_execution_id(query_id)
            .send()
            .await
            .map_err(|e| AthenaError::AwsSdk(e.to_string()))?;

        let qe = resp
            .query_execution()
            .ok_or_else(|| AthenaError::AwsSdk("No query execution in response".into()))?;

        Ok(extract_metadata(query_id, qe))
    }

    async fn stop_query(&self, query_id: &str) -> Result<(), AthenaError> {
        self.client
            .stop_query_execution()
            .query_execution_id(query_id)
            .send()
            .await
            .map_err(|e| AthenaError::AwsSdk(e.to_string()))?;

        info!(query_id = %query_id, "Query cancellation requested");
        Ok(())
    }
}

impl From<&QueryExecutionState> for QueryState {
    fn from(state: &QueryExecutionState) -> Self {
        match state {
            QueryExecutionState::Succeeded => QueryState::Succeeded,
            QueryExecutionState::Failed => QueryState::Failed,
            QueryExecutionState::Cancelled => QueryState::Cancelled,
            QueryExecutionState::Running => QueryState::Running,
            // Queued, and any state a newer SDK adds: keep waiting.
            _ => QueryState::Queued,
        }
    }
}

/// Extract [`QueryMetadata`] from an SDK [`QueryExecution`].
fn extract_metadata(query_id: &str, qe: &QueryExecution) -> QueryMetadata {
    let stats = qe.statistics();
    let status = qe.status();

    QueryMetadata {
        query_id: query_id.to_string(),
        state: status
            .and_then(|s| s.state())
            .map(QueryState::from)
            .unwrap_or(QueryState::Queued),
        state_change_reason: status
            .and_then(|s| s.state_change_reason())
            .map(|s| s.to_string()),
        bytes_scanned: stats
            .and_then(|s| s.data_scanned_in_bytes())
            .unwrap_or(0)
            .max(0) as u64,
        execution_time_ms: stats
            .and_then(|s| s.engine_execution_time_in_millis())
            .unwrap_or(0)
            .max(0) as u64,
        output_location: qe
            .result_configuration()
            .and_then(|rc| rc.output_location())
            .map(|s| s.to_string()),
    }
}
