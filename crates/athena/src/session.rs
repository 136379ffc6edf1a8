//! Credential-scoped context shared by query execution and storage I/O.

use std::path::Path;
use std::sync::Arc;

use quarry_core::{load_secrets, Credentials};
use serde::Serialize;
use tracing::info;

use crate::client::{AthenaError, AwsQueryService, QueryRequest, QueryService};
use crate::config::PollPolicy;
use crate::result::AthenaQueryResult;
use crate::runner::run_query;
use crate::storage::{write_json, write_parquet, RemoteFs};
use crate::table::ResultTable;

/// One set of credentials, one Athena client and one [`RemoteFs`].
///
/// Result artifacts are read through the same handle the caller writes
/// with, and that handle builds at most one S3 client per bucket.
pub struct AthenaSession {
    credentials: Credentials,
    service: Arc<dyn QueryService>,
    fs: RemoteFs,
    policy: PollPolicy,
}

impl AthenaSession {
    /// Load credentials from a dotenv-style secrets file and connect.
    pub fn from_secrets_file(path: impl AsRef<Path>) -> Result<Self, AthenaError> {
        let credentials = load_secrets(path)?;
        Ok(Self::connect(credentials))
    }

    /// Build the Athena client and S3 handle for `credentials`.
    pub fn connect(credentials: Credentials) -> Self {
        let service = Arc::new(AwsQueryService::new(&credentials));
        let fs = RemoteFs::s3(&credentials);
        info!(region = %credentials.region, "Athena session ready");
        Self::with_parts(credentials, service, fs)
    }

    /// Assemble a session from an explicit service and filesystem.
    pub fn with_parts(
        credentials: Credentials,
        service: Arc<dyn QueryService>,
        fs: RemoteFs,
    ) -> Self {
        Self {
            credentials,
            service,
            fs,
            policy: PollPolicy::default(),
        }
    }

    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn fs(&self) -> &RemoteFs {
        &self.fs
    }

    pub fn service(&self) -> &dyn QueryService {
        self.service.as_ref()
    }

    pub fn poll_policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Run `sql` against `database`, writing Athena's output under `output_location`.
    pub async fn run_query(
        &self,
        sql: &str,
        database: &str,
        output_location: &str,
    ) -> Result<AthenaQueryResult, AthenaError> {
        self.execute(&QueryRequest::new(sql, database, output_location))
            .await
    }

    pub async fn execute(&self, request: &QueryRequest) -> Result<AthenaQueryResult, AthenaError> {
        run_query(self.service.as_ref(), &self.fs, request, &self.policy).await
    }

    pub async fn write_parquet(
        &self,
        table: &ResultTable,
        location: &str,
    ) -> Result<u64, AthenaError> {
        write_parquet(table, location, &self.fs).await
    }

    pub async fn write_json<T: Serialize + ?Sized>(
        &self,
        value: &T,
        location: &str,
    ) -> Result<u64, AthenaError> {
        write_json(value, location, &self.fs).await
    }
}
