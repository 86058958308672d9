use std::sync::Arc;

use actilog_core::testing as cert;
use actilog_core::ActivityStore;
use actilog_sqlite::SqliteActivityStore;

async fn create_store() -> Arc<dyn ActivityStore> {
    Arc::new(SqliteActivityStore::new("sqlite::memory:").await.unwrap())
}

#[tokio::test]
async fn search_query_should_match_builder_output() {
    let store = create_store().await;
    cert::test_service_search_query_passthrough(store).await;
}

#[tokio::test]
async fn log_event_should_record() {
    let store = create_store().await;
    cert::test_service_log_event_records(store).await;
}

#[tokio::test]
async fn log_email_should_record() {
    let store = create_store().await;
    cert::test_service_log_email_records(store).await;
}

#[tokio::test]
async fn log_client_login_should_record() {
    let store = create_store().await;
    cert::test_service_log_client_login_records(store).await;
}

#[tokio::test]
async fn api_projection_should_embed_client() {
    let store = create_store().await;
    cert::test_to_api_array_shape(store).await;
}

#[tokio::test]
async fn api_projection_should_fail_for_missing_client() {
    let store = create_store().await;
    cert::test_to_api_array_missing_client(store).await;
}

#[tokio::test]
async fn rm_by_client_should_trash_only_that_client() {
    let store = create_store().await;
    cert::test_rm_by_client_trashes_only_that_client(store).await;
}
