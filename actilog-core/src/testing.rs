//! Behavior checks shared by every storage backend. A backend crate
//! wires these into its own test harness so all implementations are held
//! to the same contract.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use crate::{
    build_search_query, ActilogError, ActivitySearcher, ActivityService, ActivityStore,
    ClientHistory, FilterMap, NewClientEmail, NewClientHistory, NewEvent, Severity,
};

fn filters(v: serde_json::Value) -> FilterMap {
    v.as_object().cloned().unwrap_or_default()
}

pub async fn test_record_event_assigns_id_and_defaults(store: &dyn ActivityStore) {
    let stored = store
        .record_event(NewEvent::new("Session started"))
        .await
        .unwrap();
    assert!(stored.id > 0);
    assert_eq!(stored.severity, Severity::Info);
    assert_eq!(stored.message, "Session started");
    assert!(stored.admin_id.is_none());
    assert!(stored.client_id.is_none());
    assert!(stored.ip.is_none());
}

pub async fn test_record_event_keeps_attribution(store: &dyn ActivityStore) {
    let stored = store
        .record_event(
            NewEvent::new("Invoice voided")
                .with_severity(Severity::Warning)
                .with_admin(7)
                .with_client(12)
                .with_ip("10.0.0.9"),
        )
        .await
        .unwrap();
    assert_eq!(stored.severity, Severity::Warning);
    assert_eq!(stored.admin_id, Some(7));
    assert_eq!(stored.client_id, Some(12));
    assert_eq!(stored.ip.as_deref(), Some("10.0.0.9"));
}

pub async fn test_record_email_roundtrips(store: &dyn ActivityStore) {
    let stored = store
        .record_email(
            NewClientEmail::new(3, "Welcome aboard")
                .with_sender("support@example.com")
                .with_recipients("jane@example.com")
                .with_html("<p>Hello Jane</p>")
                .with_text("Hello Jane"),
        )
        .await
        .unwrap();
    assert!(stored.id > 0);
    assert_eq!(stored.client_id, 3);
    assert_eq!(stored.subject, "Welcome aboard");
    assert_eq!(stored.sender.as_deref(), Some("support@example.com"));
    assert_eq!(stored.recipients.as_deref(), Some("jane@example.com"));
    assert_eq!(stored.content_html.as_deref(), Some("<p>Hello Jane</p>"));
    assert_eq!(stored.content_text.as_deref(), Some("Hello Jane"));
}

pub async fn test_record_login_roundtrips(store: &dyn ActivityStore) {
    let stored = store
        .record_login(NewClientHistory::new(5).with_ip("192.0.2.4"))
        .await
        .unwrap();
    assert!(stored.id > 0);
    assert_eq!(stored.client_id, 5);
    assert_eq!(stored.ip.as_deref(), Some("192.0.2.4"));
}

pub async fn test_create_client_and_lookup(store: &dyn ActivityStore) {
    let created = store
        .create_client("Jane", "Doe", "jane@example.com")
        .await
        .unwrap();
    let found = store
        .get_existing_client(created.id, "Client not found")
        .await
        .unwrap();
    assert_eq!(found.id, created.id);
    assert_eq!(found.first_name, "Jane");
    assert_eq!(found.last_name, "Doe");
    assert_eq!(found.email, "jane@example.com");
}

pub async fn test_missing_client_reports_caller_message(store: &dyn ActivityStore) {
    let err = store
        .get_existing_client(424242, "no such client")
        .await
        .unwrap_err();
    assert!(matches!(err, ActilogError::NotFound(msg) if msg == "no such client"));
}

pub async fn test_find_events_by_client_scopes_rows(store: &dyn ActivityStore) {
    store
        .record_event(NewEvent::new("First order placed").with_client(21))
        .await
        .unwrap();
    store
        .record_event(NewEvent::new("Password changed").with_client(21))
        .await
        .unwrap();
    store
        .record_event(NewEvent::new("Unrelated client signup").with_client(22))
        .await
        .unwrap();
    store
        .record_event(NewEvent::new("Cron finished"))
        .await
        .unwrap();

    let events = store.find_events_by_client(21).await.unwrap();
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| e.client_id == Some(21)));
}

pub async fn test_trash_event_removes_row(store: &dyn ActivityStore) {
    let stored = store
        .record_event(NewEvent::new("Short lived").with_client(30))
        .await
        .unwrap();
    store.trash_event(&stored).await.unwrap();
    let remaining = store.find_events_by_client(30).await.unwrap();
    assert!(remaining.is_empty());
}

pub async fn test_service_search_query_passthrough(store: Arc<dyn ActivityStore>) {
    let service = ActivityService::new(store);
    let input = filters(json!({"only_clients": "yes", "no_debug": true}));
    assert_eq!(service.get_search_query(&input), build_search_query(&input));
}

pub async fn test_service_log_event_records(store: Arc<dyn ActivityStore>) {
    let service = ActivityService::new(store.clone());
    let stored = service
        .log_event(NewEvent::new("Settings updated").with_admin(1))
        .await
        .unwrap();
    assert!(stored.id > 0);
    assert_eq!(stored.message, "Settings updated");
}

pub async fn test_service_log_email_records(store: Arc<dyn ActivityStore>) {
    let service = ActivityService::new(store);
    let stored = service
        .log_email(NewClientEmail::new(8, "Your invoice").with_text("Amount due: 10.00"))
        .await
        .unwrap();
    assert_eq!(stored.client_id, 8);
    assert_eq!(stored.subject, "Your invoice");
}

pub async fn test_service_log_client_login_records(store: Arc<dyn ActivityStore>) {
    let service = ActivityService::new(store);
    let stored = service
        .log_client_login(4, Some("198.51.100.7".to_string()))
        .await
        .unwrap();
    assert_eq!(stored.client_id, 4);
    assert_eq!(stored.ip.as_deref(), Some("198.51.100.7"));
}

pub async fn test_to_api_array_shape(store: Arc<dyn ActivityStore>) {
    let client = store
        .create_client("John", "Smith", "john@example.com")
        .await
        .unwrap();
    let service = ActivityService::new(store.clone());
    let login = service
        .log_client_login(client.id, Some("203.0.113.1".to_string()))
        .await
        .unwrap();

    let api = service.to_api_array(&login).await.unwrap();
    assert_eq!(api["id"], json!(login.id));
    assert_eq!(api["ip"], json!("203.0.113.1"));
    assert!(api["created_at"].is_string());
    assert_eq!(api["client"]["id"], json!(client.id));
    assert_eq!(api["client"]["first_name"], json!("John"));
    assert_eq!(api["client"]["last_name"], json!("Smith"));
    assert_eq!(api["client"]["email"], json!("john@example.com"));
}

pub async fn test_to_api_array_missing_client(store: Arc<dyn ActivityStore>) {
    let service = ActivityService::new(store);
    let dangling = ClientHistory {
        id: 1,
        client_id: 999_999,
        ip: None,
        created_at: Utc::now(),
    };
    let err = service.to_api_array(&dangling).await.unwrap_err();
    assert!(matches!(err, ActilogError::NotFound(msg) if msg == "Client not found"));
}

pub async fn test_rm_by_client_trashes_only_that_client(store: Arc<dyn ActivityStore>) {
    store
        .record_event(NewEvent::new("Ticket opened").with_client(61))
        .await
        .unwrap();
    store
        .record_event(NewEvent::new("Ticket replied").with_client(61))
        .await
        .unwrap();
    store
        .record_event(NewEvent::new("Other client ticket").with_client(62))
        .await
        .unwrap();

    let service = ActivityService::new(store.clone());
    let removed = service.rm_by_client(61).await.unwrap();
    assert_eq!(removed, 2);
    assert!(store.find_events_by_client(61).await.unwrap().is_empty());
    assert_eq!(store.find_events_by_client(62).await.unwrap().len(), 1);

    // A client with no rows is a quiet no-op.
    assert_eq!(service.rm_by_client(61).await.unwrap(), 0);
}

/// Fixed dataset the searcher checks run against. Six events spanning
/// client rows, staff rows, one unattributed row and the full severity
/// spread the noise filters care about.
pub async fn seed_search_data(store: &dyn ActivityStore) {
    store
        .record_event(NewEvent::new("Client portal login").with_client(1))
        .await
        .unwrap();
    store
        .record_event(
            NewEvent::new("Invoice 42 paid")
                .with_severity(Severity::Notice)
                .with_client(1),
        )
        .await
        .unwrap();
    store
        .record_event(NewEvent::new("Staff cleared template cache").with_admin(1))
        .await
        .unwrap();
    store
        .record_event(NewEvent::new("Nightly cron heartbeat").with_severity(Severity::Debug))
        .await
        .unwrap();
    store
        .record_event(
            NewEvent::new("Database connection lost")
                .with_severity(Severity::Critical)
                .with_admin(1),
        )
        .await
        .unwrap();
    store
        .record_event(
            NewEvent::new("Invoice 42 disputed")
                .with_severity(Severity::Warning)
                .with_admin(1)
                .with_client(2),
        )
        .await
        .unwrap();
}

fn messages(events: &[crate::SystemEvent]) -> Vec<&str> {
    events.iter().map(|e| e.message.as_str()).collect()
}

pub async fn test_search_unfiltered_returns_all(searcher: &dyn ActivitySearcher) {
    let events = searcher.search(&FilterMap::new()).await.unwrap();
    assert_eq!(events.len(), 6);
}

pub async fn test_search_returns_newest_first(searcher: &dyn ActivitySearcher) {
    let events = searcher.search(&FilterMap::new()).await.unwrap();
    assert_eq!(messages(&events)[0], "Invoice 42 disputed");
    assert_eq!(messages(&events)[5], "Client portal login");
}

pub async fn test_search_only_clients(searcher: &dyn ActivitySearcher) {
    let events = searcher
        .search(&filters(json!({"only_clients": "yes"})))
        .await
        .unwrap();
    assert_eq!(
        messages(&events),
        vec!["Invoice 42 disputed", "Invoice 42 paid", "Client portal login"]
    );
}

pub async fn test_search_only_staff(searcher: &dyn ActivitySearcher) {
    let events = searcher
        .search(&filters(json!({"only_staff": "yes"})))
        .await
        .unwrap();
    assert_eq!(
        messages(&events),
        vec![
            "Invoice 42 disputed",
            "Database connection lost",
            "Staff cleared template cache"
        ]
    );
}

pub async fn test_search_combined_flags(searcher: &dyn ActivitySearcher) {
    let events = searcher
        .search(&filters(json!({"only_clients": "yes", "only_staff": "yes"})))
        .await
        .unwrap();
    assert_eq!(messages(&events), vec!["Invoice 42 disputed"]);
}

pub async fn test_search_priority_equality(searcher: &dyn ActivitySearcher) {
    let events = searcher
        .search(&filters(json!({"priority": 6})))
        .await
        .unwrap();
    assert_eq!(
        messages(&events),
        vec!["Staff cleared template cache", "Client portal login"]
    );
}

pub async fn test_search_priority_numeric_string(searcher: &dyn ActivitySearcher) {
    let events = searcher
        .search(&filters(json!({"priority": "2"})))
        .await
        .unwrap();
    assert_eq!(messages(&events), vec!["Database connection lost"]);
}

pub async fn test_search_message_substring(searcher: &dyn ActivitySearcher) {
    let events = searcher
        .search(&filters(json!({"search": "Invoice 42"})))
        .await
        .unwrap();
    assert_eq!(
        messages(&events),
        vec!["Invoice 42 disputed", "Invoice 42 paid"]
    );
}

pub async fn test_search_no_info_hides_noise(searcher: &dyn ActivitySearcher) {
    let events = searcher
        .search(&filters(json!({"no_info": true})))
        .await
        .unwrap();
    assert_eq!(
        messages(&events),
        vec![
            "Invoice 42 disputed",
            "Database connection lost",
            "Invoice 42 paid"
        ]
    );
}

pub async fn test_search_no_debug_hides_debug(searcher: &dyn ActivitySearcher) {
    let events = searcher
        .search(&filters(json!({"no_debug": true})))
        .await
        .unwrap();
    assert_eq!(events.len(), 5);
    assert!(messages(&events)
        .iter()
        .all(|m| *m != "Nightly cron heartbeat"));
}

pub async fn test_search_priority_overrides_noise_floor(searcher: &dyn ActivitySearcher) {
    let events = searcher
        .search(&filters(json!({"priority": 6, "no_info": true})))
        .await
        .unwrap();
    assert_eq!(
        messages(&events),
        vec!["Staff cleared template cache", "Client portal login"]
    );
}

pub async fn test_search_ignores_unknown_keys(searcher: &dyn ActivitySearcher) {
    let events = searcher
        .search(&filters(json!({"order_by": "ip", "limit": 1})))
        .await
        .unwrap();
    assert_eq!(events.len(), 6);
}

pub async fn test_count_matches_search(searcher: &dyn ActivitySearcher) {
    for input in [
        json!({}),
        json!({"only_clients": "yes"}),
        json!({"no_info": true}),
        json!({"search": "Invoice 42"}),
    ] {
        let parsed = filters(input.clone());
        let total = searcher.count(&parsed).await.unwrap();
        let found = searcher.search(&parsed).await.unwrap();
        assert_eq!(total, found.len() as i64, "filters {input}");
    }
}

pub async fn test_search_page_slices_newest_first(searcher: &dyn ActivitySearcher) {
    let page = searcher
        .search_page(&FilterMap::new(), 2, 1)
        .await
        .unwrap();
    assert_eq!(page.total, 6);
    assert_eq!(page.page, 1);
    assert_eq!(page.per_page, 2);
    assert_eq!(
        messages(&page.items),
        vec!["Invoice 42 disputed", "Database connection lost"]
    );

    let beyond = searcher
        .search_page(&FilterMap::new(), 2, 4)
        .await
        .unwrap();
    assert_eq!(beyond.total, 6);
    assert!(beyond.items.is_empty());
}

pub async fn test_search_page_clamps_bounds(searcher: &dyn ActivitySearcher) {
    let page = searcher
        .search_page(&FilterMap::new(), 0, 0)
        .await
        .unwrap();
    assert_eq!(page.page, 1);
    assert_eq!(page.per_page, 1);
    assert_eq!(messages(&page.items), vec!["Invoice 42 disputed"]);
}
