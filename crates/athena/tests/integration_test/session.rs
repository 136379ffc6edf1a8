//! End-to-end through a session: query, then export Parquet and JSON.

use std::sync::Arc;

use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use quarry_athena::*;
use quarry_core::Credentials;
use serde_json::json;

use crate::support::*;

async fn session_with(service: ScriptedService) -> (Arc<ScriptedService>, AthenaSession) {
    let service = Arc::new(service);
    let fs = memory_fs_with_result(RESULT_CSV).await;
    let credentials = Credentials::new("AKIAEXAMPLE", "s3cr3t", "sa-east-1").unwrap();
    let session = AthenaSession::with_parts(credentials, service.clone(), fs)
        .with_poll_policy(fast_policy());
    (service, session)
}

#[tokio::test]
async fn query_then_export_parquet_round_trips() {
    let (service, session) =
        session_with(ScriptedService::running_then(3, QueryState::Succeeded)).await;

    let result = session
        .run_query("SELECT * FROM vendas", "analytics", "s3://athena-results/output/")
        .await
        .unwrap();
    assert_eq!(service.poll_count(), 4);

    let target = "s3://lake/exports/vendas.parquet";
    let written = session.write_parquet(&result.table, target).await.unwrap();
    assert!(written > 0);

    let data = session.fs().read(target).await.unwrap();
    let batches = ParquetRecordBatchReaderBuilder::try_new(data)
        .unwrap()
        .build()
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    let schema = batches[0].schema();
    let back = ResultTable::new(arrow::compute::concat_batches(&schema, &batches).unwrap());

    assert_eq!(back.column_names(), result.table.column_names());
    assert_eq!(back.num_rows(), result.table.num_rows());
    for (idx, original) in result.table.batch().columns().iter().enumerate() {
        assert_eq!(back.batch().column(idx).as_ref(), original.as_ref(), "column {idx}");
    }
}

#[tokio::test]
async fn metadata_and_values_export_as_json() {
    let (_service, session) = session_with(ScriptedService::new([QueryState::Succeeded])).await;

    let request = QueryRequest::new("SELECT 1", "analytics", "s3://athena-results/output/")
        .with_workgroup("primary");
    let result = session.execute(&request).await.unwrap();

    let target = "s3://lake/reports/metadata.json";
    session.write_json(&result.metadata, target).await.unwrap();
    let raw = session.fs().read(target).await.unwrap();
    let back: QueryMetadata = serde_json::from_slice(&raw).unwrap();
    assert_eq!(back, result.metadata);

    let summary = json!({ "região": "Nordeste", "cidades": ["Recife", "Belém"], "total": 105 });
    let target = "s3://lake/reports/resumo.json";
    session.write_json(&summary, target).await.unwrap();
    let raw = session.fs().read(target).await.unwrap();
    assert!(std::str::from_utf8(&raw).unwrap().contains("região"));
    assert_eq!(serde_json::from_slice::<serde_json::Value>(&raw).unwrap(), summary);
}

#[tokio::test]
async fn failed_query_through_session_returns_no_table() {
    let (_service, session) =
        session_with(ScriptedService::running_then(1, QueryState::Failed)).await;

    let err = session
        .run_query("SELECT broken", "analytics", "s3://athena-results/output/")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("FAILED"));
}
