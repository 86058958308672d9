use actilog_core::{
    build_search_query, ActilogError, ActivitySearcher, BindValue, FilterMap, Page, Result,
    SystemEvent,
};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use crate::query::expand_named_params;
use crate::store::{init_schema, row_to_event};

const EVENT_COLUMNS: &str =
    "m.id, m.priority, m.message, m.admin_id, m.client_id, m.ip, m.created_at_ms";

/// Runs activity-log searches against sqlite. The filter map is turned
/// into a `FROM ... WHERE ...` fragment by the core builder; this type
/// wraps it in a `SELECT`, a `COUNT(*)` or a paginated listing.
pub struct SqliteActivitySearcher {
    pool: SqlitePool,
}

impl SqliteActivitySearcher {
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

    async fn fetch_events(&self, sql: &str, binds: &[BindValue]) -> Result<Vec<SystemEvent>> {
        let rows = bind_all(sqlx::query(sql), binds)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ActilogError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row_to_event(&row)?);
        }
        Ok(results)
    }
}

fn bind_all<'q>(
    mut q: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    binds: &'q [BindValue],
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    for value in binds {
        q = match value {
            BindValue::Int(i) => q.bind(*i),
            BindValue::Text(t) => q.bind(t.as_str()),
        };
    }
    q
}

#[async_trait]
impl ActivitySearcher for SqliteActivitySearcher {
    async fn search(&self, filters: &FilterMap) -> Result<Vec<SystemEvent>> {
        let query = build_search_query(filters);
        let sql = format!(
            "SELECT {EVENT_COLUMNS} {} ORDER BY m.id DESC",
            query.fragment
        );
        let expanded = expand_named_params(&sql, &query.params)?;
        tracing::debug!(sql = %expanded.sql, "activity search");
        self.fetch_events(&expanded.sql, &expanded.binds).await
    }

    async fn count(&self, filters: &FilterMap) -> Result<i64> {
        let query = build_search_query(filters);
        let sql = format!("SELECT COUNT(*) AS total {}", query.fragment);
        let expanded = expand_named_params(&sql, &query.params)?;

        let row = bind_all(sqlx::query(&expanded.sql), &expanded.binds)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| ActilogError::Storage(e.to_string()))?;
        row.try_get("total")
            .map_err(|e| ActilogError::Storage(e.to_string()))
    }

    async fn search_page(
        &self,
        filters: &FilterMap,
        per_page: i64,
        page: i64,
    ) -> Result<Page<SystemEvent>> {
        let per_page = per_page.max(1);
        let page = page.max(1);

        let total = self.count(filters).await?;

        let query = build_search_query(filters);
        let sql = format!(
            "SELECT {EVENT_COLUMNS} {} ORDER BY m.id DESC LIMIT ? OFFSET ?",
            query.fragment
        );
        let expanded = expand_named_params(&sql, &query.params)?;

        let rows = bind_all(sqlx::query(&expanded.sql), &expanded.binds)
            .bind(per_page)
            .bind((page - 1) * per_page)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ActilogError::Storage(e.to_string()))?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row_to_event(&row)?);
        }

        Ok(Page {
            total,
            page,
            per_page,
            items,
        })
    }
}
