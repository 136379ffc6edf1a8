//! Scripted query service and in-memory storage shared by the tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use object_store::memory::InMemory;
use quarry_athena::*;

pub const QUERY_ID: &str = "q-0001";
pub const RESULT_LOCATION: &str = "s3://athena-results/output/q-0001.csv";

/// Polling fast enough that tests don't wait on real time.
pub fn fast_policy() -> PollPolicy {
    PollPolicy::default().with_interval(Duration::from_millis(1))
}

/// Replays a fixed sequence of states, one per status poll. Once the script
/// runs out the last state repeats.
pub struct ScriptedService {
    script: Mutex<VecDeque<QueryState>>,
    last: Mutex<QueryState>,
    reason: Option<String>,
    output_location: Option<String>,
    pub polls: AtomicU32,
    pub stops: AtomicU32,
    pub submitted: Mutex<Vec<QueryRequest>>,
}

impl ScriptedService {
    pub fn new(states: impl IntoIterator<Item = QueryState>) -> Self {
        Self {
            script: Mutex::new(states.into_iter().collect()),
            last: Mutex::new(QueryState::Queued),
            reason: None,
            output_location: Some(RESULT_LOCATION.to_string()),
            polls: AtomicU32::new(0),
            stops: AtomicU32::new(0),
            submitted: Mutex::new(Vec::new()),
        }
    }

    /// `running` RUNNING polls, then `terminal`.
    pub fn running_then(running: usize, terminal: QueryState) -> Self {
        Self::new(
            std::iter::repeat(QueryState::Running)
                .take(running)
                .chain(std::iter::once(terminal)),
        )
    }

    pub fn with_reason(mut self, reason: &str) -> Self {
        self.reason = Some(reason.to_string());
        self
    }

    pub fn without_output_location(mut self) -> Self {
        self.output_location = None;
        self
    }

    pub fn poll_count(&self) -> u32 {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> u32 {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryService for ScriptedService {
    async fn start_query(&self, request: &QueryRequest) -> Result<String, AthenaError> {
        self.submitted.lock().unwrap().push(request.clone());
        Ok(QUERY_ID.to_string())
    }

    async fn query_execution(&self, query_id: &str) -> Result<QueryMetadata, AthenaError> {
        assert_eq!(query_id, QUERY_ID);
        self.polls.fetch_add(1, Ordering::SeqCst);

        let mut last = self.last.lock().unwrap();
        if let Some(next) = self.script.lock().unwrap().pop_front() {
            *last = next;
        }

        let mut meta = QueryMetadata::new(query_id, *last);
        if last.is_terminal() {
            meta.state_change_reason = self.reason.clone();
            meta.bytes_scanned = 4096;
            meta.execution_time_ms = 321;
            meta.output_location = self.output_location.clone();
        }
        Ok(meta)
    }

    async fn stop_query(&self, _query_id: &str) -> Result<(), AthenaError> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// In-memory "S3" holding the Athena result artifact.
pub async fn memory_fs_with_result(csv: &'static [u8]) -> RemoteFs {
    let fs = RemoteFs::from_store(Arc::new(InMemory::new()));
    fs.write(RESULT_LOCATION, Bytes::from_static(csv)).await.unwrap();
    fs
}

pub const RESULT_CSV: &[u8] = b"\"dia\",\"cidade\",\"total\",\"media\"\n\
\"2025-01-01\",\"S\xc3\xa3o Paulo\",\"120\",\"3.5\"\n\
\"2025-01-02\",\"Recife\",\"98\",\n\
\"2025-01-03\",\"Bel\xc3\xa9m\",\"7\",\"0.25\"\n";
