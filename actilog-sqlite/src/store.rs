use actilog_core::{
    ActilogError, ActivityStore, Client, ClientEmail, ClientHistory, NewClientEmail,
    NewClientHistory, NewEvent, Result, Severity, SystemEvent,
};
use async_trait::async_trait;
use chrono::DateTime;
use sqlx::{Row, SqlitePool};

pub struct SqliteActivityStore {
    pub pool: SqlitePool,
}

impl SqliteActivityStore {
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .map_err(|e| ActilogError::Storage(e.to_string()))?;
        init_schema(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Result<Self> {
        init_schema(&pool).await?;
        Ok(Self { pool })
    }
}

pub(crate) async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS activity_system (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            priority INTEGER NOT NULL,
            message TEXT NOT NULL,
            admin_id INTEGER,
            client_id INTEGER,
            ip TEXT,
            created_at_ms INTEGER NOT NULL
        )",
    )
    .execute(pool)
    .await
    .map_err(|e| ActilogError::Storage(e.to_string()))?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS activity_client_email (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            client_id INTEGER NOT NULL,
            sender TEXT,
            recipients TEXT,
            subject TEXT NOT NULL,
            content_html TEXT,
            content_text TEXT,
            created_at_ms INTEGER NOT NULL
        )",
    )
    .execute(pool)
    .await
    .map_err(|e| ActilogError::Storage(e.to_string()))?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS activity_client_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            client_id INTEGER NOT NULL,
            ip TEXT,
            created_at_ms INTEGER NOT NULL
        )",
    )
    .execute(pool)
    .await
    .map_err(|e| ActilogError::Storage(e.to_string()))?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS client (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            email TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await
    .map_err(|e| ActilogError::Storage(e.to_string()))?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_activity_system_client ON activity_system(client_id)",
    )
    .execute(pool)
    .await
    .map_err(|e| ActilogError::Storage(e.to_string()))?;

    Ok(())
}

pub(crate) fn row_to_event(row: &sqlx::sqlite::SqliteRow) -> Result<SystemEvent> {
    let id: i64 = row
        .try_get("id")
        .map_err(|e| ActilogError::Storage(e.to_string()))?;
    let priority: i64 = row
        .try_get("priority")
        .map_err(|e| ActilogError::Storage(e.to_string()))?;
    let message: String = row
        .try_get("message")
        .map_err(|e| ActilogError::Storage(e.to_string()))?;
    let admin_id: Option<i64> = row
        .try_get("admin_id")
        .map_err(|e| ActilogError::Storage(e.to_string()))?;
    let client_id: Option<i64> = row
        .try_get("client_id")
        .map_err(|e| ActilogError::Storage(e.to_string()))?;
    let ip: Option<String> = row
        .try_get("ip")
        .map_err(|e| ActilogError::Storage(e.to_string()))?;
    let created_at_ms: i64 = row
        .try_get("created_at_ms")
        .map_err(|e| ActilogError::Storage(e.to_string()))?;

    let severity = Severity::from_level(priority)
        .ok_or_else(|| ActilogError::Parse(format!("unknown severity level {priority}")))?;
    let created_at = DateTime::from_timestamp_millis(created_at_ms).unwrap_or_default();

    Ok(SystemEvent {
        id,
        severity,
        message,
        admin_id,
        client_id,
        ip,
        created_at,
    })
}

fn row_to_client(row: &sqlx::sqlite::SqliteRow) -> Result<Client> {
    let id: i64 = row
        .try_get("id")
        .map_err(|e| ActilogError::Storage(e.to_string()))?;
    let first_name: String = row
        .try_get("first_name")
        .map_err(|e| ActilogError::Storage(e.to_string()))?;
    let last_name: String = row
        .try_get("last_name")
        .map_err(|e| ActilogError::Storage(e.to_string()))?;
    let email: String = row
        .try_get("email")
        .map_err(|e| ActilogError::Storage(e.to_string()))?;

    Ok(Client {
        id,
        first_name,
        last_name,
        email,
    })
}

#[async_trait]
impl ActivityStore for SqliteActivityStore {
    async fn record_event(&self, event: NewEvent) -> Result<SystemEvent> {
        let created_at_ms = event.created_at.timestamp_millis();

        let result = sqlx::query(
            "INSERT INTO activity_system (priority, message, admin_id, client_id, ip, created_at_ms)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(event.severity.level())
        .bind(&event.message)
        .bind(event.admin_id)
        .bind(event.client_id)
        .bind(&event.ip)
        .bind(created_at_ms)
        .execute(&self.pool)
        .await
        .map_err(|e| ActilogError::Storage(e.to_string()))?;

        Ok(SystemEvent {
            id: result.last_insert_rowid(),
            severity: event.severity,
            message: event.message,
            admin_id: event.admin_id,
            client_id: event.client_id,
            ip: event.ip,
            created_at: event.created_at,
        })
    }

    async fn record_email(&self, email: NewClientEmail) -> Result<ClientEmail> {
        let created_at_ms = email.created_at.timestamp_millis();

        let result = sqlx::query(
            "INSERT INTO activity_client_email
             (client_id, sender, recipients, subject, content_html, content_text, created_at_ms)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(email.client_id)
        .bind(&email.sender)
        .bind(&email.recipients)
        .bind(&email.subject)
        .bind(&email.content_html)
        .bind(&email.content_text)
        .bind(created_at_ms)
        .execute(&self.pool)
        .await
        .map_err(|e| ActilogError::Storage(e.to_string()))?;

        Ok(ClientEmail {
            id: result.last_insert_rowid(),
            client_id: email.client_id,
            sender: email.sender,
            recipients: email.recipients,
            subject: email.subject,
            content_html: email.content_html,
            content_text: email.content_text,
            created_at: email.created_at,
        })
    }

    async fn record_login(&self, login: NewClientHistory) -> Result<ClientHistory> {
        let created_at_ms = login.created_at.timestamp_millis();

        let result = sqlx::query(
            "INSERT INTO activity_client_history (client_id, ip, created_at_ms) VALUES (?, ?, ?)",
        )
        .bind(login.client_id)
        .bind(&login.ip)
        .bind(created_at_ms)
        .execute(&self.pool)
        .await
        .map_err(|e| ActilogError::Storage(e.to_string()))?;

        Ok(ClientHistory {
            id: result.last_insert_rowid(),
            client_id: login.client_id,
            ip: login.ip,
            created_at: login.created_at,
        })
    }

    async fn create_client(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
    ) -> Result<Client> {
        let result =
            sqlx::query("INSERT INTO client (first_name, last_name, email) VALUES (?, ?, ?)")
                .bind(first_name)
                .bind(last_name)
                .bind(email)
                .execute(&self.pool)
                .await
                .map_err(|e| ActilogError::Storage(e.to_string()))?;

        Ok(Client {
            id: result.last_insert_rowid(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
        })
    }

    async fn get_existing_client(&self, id: i64, not_found_message: &str) -> Result<Client> {
        let row = sqlx::query("SELECT id, first_name, last_name, email FROM client WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ActilogError::Storage(e.to_string()))?;

        match row {
            None => Err(ActilogError::NotFound(not_found_message.to_string())),
            Some(r) => row_to_client(&r),
        }
    }

    async fn find_events_by_client(&self, client_id: i64) -> Result<Vec<SystemEvent>> {
        let rows = sqlx::query(
            "SELECT id, priority, message, admin_id, client_id, ip, created_at_ms
             FROM activity_system WHERE client_id = ? ORDER BY id",
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ActilogError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row_to_event(&row)?);
        }
        Ok(results)
    }

    async fn trash_event(&self, event: &SystemEvent) -> Result<()> {
        sqlx::query("DELETE FROM activity_system WHERE id = ?")
            .bind(event.id)
            .execute(&self.pool)
            .await
            .map_err(|e| ActilogError::Storage(e.to_string()))?;
        Ok(())
    }
}
