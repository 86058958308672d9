use std::sync::Arc;

use serde_json::json;

use crate::search::{build_search_query, SearchQuery};
use crate::{
    ActivityStore, ClientEmail, ClientHistory, FilterMap, NewClientEmail, NewClientHistory,
    NewEvent, Result, SystemEvent,
};

const CLIENT_NOT_FOUND: &str = "Client not found";

/// High-level operations of the activity log, written against the
/// [`ActivityStore`] seam so any backend can sit underneath.
pub struct ActivityService {
    store: Arc<dyn ActivityStore>,
}

impl ActivityService {
    pub fn new(store: Arc<dyn ActivityStore>) -> Self {
        Self { store }
    }

    /// See [`build_search_query`].
    pub fn get_search_query(&self, filters: &FilterMap) -> SearchQuery {
        build_search_query(filters)
    }

    pub async fn log_event(&self, event: NewEvent) -> Result<SystemEvent> {
        self.store.record_event(event).await
    }

    /// Keeps a copy of an outgoing client email for the audit trail.
    pub async fn log_email(&self, email: NewClientEmail) -> Result<ClientEmail> {
        self.store.record_email(email).await
    }

    pub async fn log_client_login(
        &self,
        client_id: i64,
        ip: Option<String>,
    ) -> Result<ClientHistory> {
        let mut login = NewClientHistory::new(client_id);
        login.ip = ip;
        self.store.record_login(login).await
    }

    /// API projection of a login row. The owning client must still exist;
    /// a dangling reference surfaces as `NotFound`.
    pub async fn to_api_array(&self, history: &ClientHistory) -> Result<serde_json::Value> {
        let client = self
            .store
            .get_existing_client(history.client_id, CLIENT_NOT_FOUND)
            .await?;
        Ok(json!({
            "id": history.id,
            "ip": history.ip,
            "created_at": history.created_at,
            "client": {
                "id": client.id,
                "first_name": client.first_name,
                "last_name": client.last_name,
                "email": client.email,
            },
        }))
    }

    /// Removes every activity row attributed to a client, returning how
    /// many were trashed.
    pub async fn rm_by_client(&self, client_id: i64) -> Result<usize> {
        let events = self.store.find_events_by_client(client_id).await?;
        let mut removed = 0;
        for event in &events {
            self.store.trash_event(event).await?;
            removed += 1;
        }
        Ok(removed)
    }
}
