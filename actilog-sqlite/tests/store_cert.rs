use actilog_core::testing as cert;
use actilog_sqlite::SqliteActivityStore;

async fn create_store() -> SqliteActivityStore {
    SqliteActivityStore::new("sqlite::memory:").await.unwrap()
}

#[tokio::test]
async fn record_event_should_assign_id_and_defaults() {
    let store = create_store().await;
    cert::test_record_event_assigns_id_and_defaults(&store).await;
}

#[tokio::test]
async fn record_event_should_keep_attribution() {
    let store = create_store().await;
    cert::test_record_event_keeps_attribution(&store).await;
}

#[tokio::test]
async fn record_email_should_roundtrip() {
    let store = create_store().await;
    cert::test_record_email_roundtrips(&store).await;
}

#[tokio::test]
async fn record_login_should_roundtrip() {
    let store = create_store().await;
    cert::test_record_login_roundtrips(&store).await;
}

#[tokio::test]
async fn created_client_should_be_found_again() {
    let store = create_store().await;
    cert::test_create_client_and_lookup(&store).await;
}

#[tokio::test]
async fn missing_client_should_report_caller_message() {
    let store = create_store().await;
    cert::test_missing_client_reports_caller_message(&store).await;
}

#[tokio::test]
async fn find_events_should_scope_to_client() {
    let store = create_store().await;
    cert::test_find_events_by_client_scopes_rows(&store).await;
}

#[tokio::test]
async fn trash_event_should_remove_row() {
    let store = create_store().await;
    cert::test_trash_event_removes_row(&store).await;
}
