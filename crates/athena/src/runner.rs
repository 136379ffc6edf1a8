//! Run one Athena query to completion and load its result table.

use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::client::{AthenaError, QueryRequest, QueryService};
use crate::config::PollPolicy;
use crate::result::{AthenaQueryResult, QueryMetadata, QueryState};
use crate::storage::RemoteFs;
use crate::table::decode_csv;

/// Execute `request` and return the decoded result table.
///
/// This performs the full lifecycle:
/// 1. Start query execution
/// 2. Poll until a terminal state (see [`wait_for_completion`])
/// 3. Read the CSV artifact at the reported output location through `fs`
///    and decode it
pub async fn run_query(
    service: &dyn QueryService,
    fs: &RemoteFs,
    request: &QueryRequest,
    policy: &PollPolicy,
) -> Result<AthenaQueryResult, AthenaError> {
    info!(
        sql = %request.sql,
        database = %request.database,
        output_location = %request.output_location,
        "Starting Athena query"
    );

    let query_id = service.start_query(request).await?;
    info!(query_id = %query_id, "Query execution started");

    let metadata = wait_for_completion(service, &query_id, policy).await?;

    let location = metadata
        .output_location
        .clone()
        .ok_or_else(|| AthenaError::MissingOutputLocation(query_id.clone()))?;

    let data = fs.read(&location).await?;
    let table = decode_csv(&data)?;

    info!(
        query_id = %query_id,
        rows = table.num_rows(),
        columns = table.num_columns(),
        bytes_scanned = metadata.bytes_scanned,
        "Query results loaded"
    );

    Ok(AthenaQueryResult { table, metadata })
}

/// Poll the execution until it reaches a terminal state.
///
/// Returns the SUCCEEDED snapshot. FAILED and CANCELLED both become
/// [`AthenaError::QueryNotSucceeded`] carrying the state name. When the
/// policy is exhausted first, a stop is requested (best effort) and
/// [`AthenaError::QueryTimeout`] is returned.
pub async fn wait_for_completion(
    service: &dyn QueryService,
    query_id: &str,
    policy: &PollPolicy,
) -> Result<QueryMetadata, AthenaError> {
    let start = Instant::now();
    let mut delay = policy.interval;
    let mut attempts: u32 = 0;

    loop {
        let metadata = service.query_execution(query_id).await?;
        attempts = attempts.saturating_add(1);

        debug!(
            query_id = %query_id,
            state = %metadata.state,
            attempt = attempts,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Polling query status"
        );

        match metadata.state {
            QueryState::Succeeded => return Ok(metadata),

            QueryState::Failed | QueryState::Cancelled => {
                let reason = metadata
                    .state_change_reason
                    .unwrap_or_else(|| "no reason reported".to_string());
                error!(query_id = %query_id, state = %metadata.state, reason = %reason, "Query did not succeed");
                return Err(AthenaError::QueryNotSucceeded {
                    query_id: query_id.to_string(),
                    state: metadata.state,
                    reason,
                });
            }

            QueryState::Queued | QueryState::Running => {}
        }

        let elapsed = start.elapsed();
        if policy.is_exhausted(attempts, elapsed) {
            warn!(
                query_id = %query_id,
                attempts,
                elapsed_ms = elapsed.as_millis() as u64,
                "Poll policy exhausted, cancelling query"
            );
            if let Err(e) = service.stop_query(query_id).await {
                warn!(query_id = %query_id, error = %e, "Failed to cancel query");
            }
            return Err(AthenaError::QueryTimeout {
                query_id: query_id.to_string(),
                state: metadata.state,
                attempts,
                elapsed,
            });
        }

        tokio::time::sleep(delay).await;
        delay = policy.next_interval(delay);
    }
}
