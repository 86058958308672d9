pub mod error;
pub mod search;
pub mod service;
pub mod testing;

pub use error::{ActilogError, Result};
pub use search::{build_search_query, named_placeholders, BindValue, SearchQuery};
pub use service::ActivityService;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Filter criteria as they arrive from a query string or an API payload:
/// an open map of string keys to JSON values. Unrecognized keys are
/// ignored by every consumer.
pub type FilterMap = serde_json::Map<String, serde_json::Value>;

/// Syslog-style severity of a logged event. Smaller levels are more
/// severe; Info (6) and Debug (7) are the noise levels the `no_info` and
/// `no_debug` search filters cut off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Emergency,
    Alert,
    Critical,
    Error,
    Warning,
    Notice,
    Info,
    Debug,
}

impl Severity {
    pub fn level(self) -> i64 {
        match self {
            Severity::Emergency => 0,
            Severity::Alert => 1,
            Severity::Critical => 2,
            Severity::Error => 3,
            Severity::Warning => 4,
            Severity::Notice => 5,
            Severity::Info => 6,
            Severity::Debug => 7,
        }
    }

    pub fn from_level(level: i64) -> Option<Severity> {
        match level {
            0 => Some(Severity::Emergency),
            1 => Some(Severity::Alert),
            2 => Some(Severity::Critical),
            3 => Some(Severity::Error),
            4 => Some(Severity::Warning),
            5 => Some(Severity::Notice),
            6 => Some(Severity::Info),
            7 => Some(Severity::Debug),
            _ => None,
        }
    }
}

/// One row of the `activity_system` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemEvent {
    pub id: i64,
    pub severity: Severity,
    pub message: String,
    pub admin_id: Option<i64>,
    pub client_id: Option<i64>,
    pub ip: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insertion form of [`SystemEvent`]: no id yet, severity defaults to
/// Info and the timestamp to now.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub severity: Severity,
    pub message: String,
    pub admin_id: Option<i64>,
    pub client_id: Option<i64>,
    pub ip: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewEvent {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
            admin_id: None,
            client_id: None,
            ip: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_admin(mut self, admin_id: i64) -> Self {
        self.admin_id = Some(admin_id);
        self
    }

    pub fn with_client(mut self, client_id: i64) -> Self {
        self.client_id = Some(client_id);
        self
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }
}

/// One row of the `activity_client_email` table: a copy of an email sent
/// to a client, kept for the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientEmail {
    pub id: i64,
    pub client_id: i64,
    pub sender: Option<String>,
    pub recipients: Option<String>,
    pub subject: String,
    pub content_html: Option<String>,
    pub content_text: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewClientEmail {
    pub client_id: i64,
    pub sender: Option<String>,
    pub recipients: Option<String>,
    pub subject: String,
    pub content_html: Option<String>,
    pub content_text: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewClientEmail {
    pub fn new(client_id: i64, subject: impl Into<String>) -> Self {
        Self {
            client_id,
            sender: None,
            recipients: None,
            subject: subject.into(),
            content_html: None,
            content_text: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    pub fn with_recipients(mut self, recipients: impl Into<String>) -> Self {
        self.recipients = Some(recipients.into());
        self
    }

    pub fn with_html(mut self, content_html: impl Into<String>) -> Self {
        self.content_html = Some(content_html.into());
        self
    }

    pub fn with_text(mut self, content_text: impl Into<String>) -> Self {
        self.content_text = Some(content_text.into());
        self
    }
}

/// One row of the `activity_client_history` table: a client login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientHistory {
    pub id: i64,
    pub client_id: i64,
    pub ip: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewClientHistory {
    pub client_id: i64,
    pub ip: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewClientHistory {
    pub fn new(client_id: i64) -> Self {
        Self {
            client_id,
            ip: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }
}

/// The client projection the activity API exposes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// One page of search results. `page` is 1-based.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub items: Vec<T>,
}

/// Persistence seam for the activity log. Implementations own their
/// connection handling; callers receive the stored rows back with their
/// database-assigned ids.
#[async_trait::async_trait]
pub trait ActivityStore: Send + Sync {
    async fn record_event(&self, event: NewEvent) -> Result<SystemEvent>;
    async fn record_email(&self, email: NewClientEmail) -> Result<ClientEmail>;
    async fn record_login(&self, login: NewClientHistory) -> Result<ClientHistory>;
    async fn create_client(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
    ) -> Result<Client>;
    /// Look up a client that is expected to exist; a missing row surfaces
    /// as `NotFound` carrying `not_found_message`.
    async fn get_existing_client(&self, id: i64, not_found_message: &str) -> Result<Client>;
    async fn find_events_by_client(&self, client_id: i64) -> Result<Vec<SystemEvent>>;
    async fn trash_event(&self, event: &SystemEvent) -> Result<()>;
}

/// Search seam: executes the fragment produced by
/// [`search::build_search_query`] against the activity table.
#[async_trait::async_trait]
pub trait ActivitySearcher: Send + Sync {
    async fn search(&self, filters: &FilterMap) -> Result<Vec<SystemEvent>>;
    async fn count(&self, filters: &FilterMap) -> Result<i64>;
    async fn search_page(
        &self,
        filters: &FilterMap,
        per_page: i64,
        page: i64,
    ) -> Result<Page<SystemEvent>>;
}
