//! Query runner: terminal states, polling behaviour and result decoding.

use std::time::Duration;

use arrow::array::{Array, Float64Array, Int64Array};
use quarry_athena::*;

use crate::support::*;

#[tokio::test]
async fn succeeded_query_returns_decoded_artifact() {
    let service =
        ScriptedService::new([QueryState::Queued, QueryState::Running, QueryState::Succeeded]);
    let fs = memory_fs_with_result(RESULT_CSV).await;
    let request =
        QueryRequest::new("SELECT * FROM vendas", "analytics", "s3://athena-results/output/");

    let result = run_query(&service, &fs, &request, &fast_policy()).await.unwrap();

    assert_eq!(service.poll_count(), 3);
    assert_eq!(result.metadata.query_id, QUERY_ID);
    assert_eq!(result.metadata.state, QueryState::Succeeded);
    assert_eq!(result.metadata.output_location.as_deref(), Some(RESULT_LOCATION));

    let table = &result.table;
    assert_eq!(table.column_names(), ["dia", "cidade", "total", "media"]);
    assert_eq!(table.num_rows(), 3);
    assert_eq!(table.value(0, "cidade").as_deref(), Some("São Paulo"));
    assert_eq!(table.value(2, "cidade").as_deref(), Some("Belém"));
    assert_eq!(table.value(1, "dia").as_deref(), Some("2025-01-02"));

    let totals = table.column("total").unwrap().as_any().downcast_ref::<Int64Array>().unwrap();
    assert_eq!(totals.values().to_vec(), vec![120, 98, 7]);

    let medias = table.column("media").unwrap().as_any().downcast_ref::<Float64Array>().unwrap();
    assert_eq!(medias.value(0), 3.5);
    assert!(medias.is_null(1));

    let submitted = service.submitted.lock().unwrap();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].database, "analytics");
    assert_eq!(submitted[0].output_location, "s3://athena-results/output/");
}

#[tokio::test]
async fn failed_and_cancelled_carry_state_name() {
    for terminal in [QueryState::Failed, QueryState::Cancelled] {
        let service = ScriptedService::running_then(2, terminal).with_reason("boom");
        let fs = memory_fs_with_result(RESULT_CSV).await;
        let request = QueryRequest::new("SELECT 1", "analytics", "s3://athena-results/output/");

        let err = run_query(&service, &fs, &request, &fast_policy()).await.unwrap_err();

        let message = err.to_string();
        assert!(message.contains(terminal.as_str()), "{message}");
        assert!(message.contains("boom"), "{message}");
        match err {
            AthenaError::QueryNotSucceeded { query_id, state, .. } => {
                assert_eq!(query_id, QUERY_ID);
                assert_eq!(state, terminal);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(service.poll_count(), 3);
        assert_eq!(service.stop_count(), 0);
    }
}

#[tokio::test]
async fn keeps_polling_while_running() {
    // Far more polls than any fixed cap would allow; the default policy has none.
    let service = ScriptedService::running_then(250, QueryState::Succeeded);
    let policy = fast_policy();
    assert!(policy.is_unbounded());

    let meta = wait_for_completion(&service, QUERY_ID, &policy).await.unwrap();

    assert_eq!(meta.state, QueryState::Succeeded);
    assert_eq!(service.poll_count(), 251);
    assert_eq!(service.stop_count(), 0);
}

#[tokio::test]
async fn attempt_cap_cancels_and_times_out() {
    let service = ScriptedService::running_then(100, QueryState::Succeeded);
    let policy = fast_policy().with_max_attempts(5);

    let err = wait_for_completion(&service, QUERY_ID, &policy).await.unwrap_err();

    match err {
        AthenaError::QueryTimeout { attempts, state, .. } => {
            assert_eq!(attempts, 5);
            assert_eq!(state, QueryState::Running);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(service.poll_count(), 5);
    assert_eq!(service.stop_count(), 1);
}

#[tokio::test]
async fn deadline_cancels_and_times_out() {
    // Never leaves QUEUED.
    let service = ScriptedService::new(Vec::new());
    let policy = fast_policy().with_timeout(Duration::from_millis(20));

    let err = wait_for_completion(&service, QUERY_ID, &policy).await.unwrap_err();

    assert!(matches!(err, AthenaError::QueryTimeout { state: QueryState::Queued, .. }));
    assert_eq!(service.stop_count(), 1);
}

#[tokio::test]
async fn success_without_output_location_is_an_error() {
    let service = ScriptedService::new([QueryState::Succeeded]).without_output_location();
    let fs = memory_fs_with_result(RESULT_CSV).await;
    let request = QueryRequest::new("SELECT 1", "analytics", "s3://athena-results/output/");

    let err = run_query(&service, &fs, &request, &fast_policy()).await.unwrap_err();
    assert!(matches!(err, AthenaError::MissingOutputLocation(ref id) if id == QUERY_ID));
}

#[tokio::test]
async fn missing_artifact_propagates_store_error() {
    let service = ScriptedService::new([QueryState::Succeeded]);
    let fs = RemoteFs::from_store(std::sync::Arc::new(object_store::memory::InMemory::new()));
    let request = QueryRequest::new("SELECT 1", "analytics", "s3://athena-results/output/");

    let err = run_query(&service, &fs, &request, &fast_policy()).await.unwrap_err();
    assert!(matches!(err, AthenaError::ObjectStore(_)));
}
