//! PostgreSQL database collaborator
//!
//! Backed by a single-connection `sqlx` pool so queries never overlap.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{debug, info};

use crate::core::config::DatabaseConfig;
use crate::core::{CrewError, Result};
use crate::db::{format_table_definition, Database, Row};

pub struct PostgresDatabase {
    pool: PgPool,
}

impl PostgresDatabase {
    /// Connect using the configured URL and pool limits
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let url = config.connection_url()?;
        Self::connect_with_settings(&url, config.max_connections, config.acquire_timeout_secs)
            .await
    }

    pub async fn connect_with_settings(
        database_url: &str,
        max_connections: u32,
        timeout_secs: u64,
    ) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(Duration::from_secs(timeout_secs.max(1)))
            .connect(database_url)
            .await
            .map_err(|e| CrewError::with_context("Failed to connect to database", e))?;

        info!(max_connections = max_connections.max(1), "database connected");
        Ok(Self { pool })
    }

    async fn table_names(&self) -> Result<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>(
            "SELECT table_name::text FROM information_schema.tables \
             WHERE table_schema = 'public' ORDER BY table_name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }

    async fn table_columns(&self, table: &str) -> Result<Vec<(String, String)>> {
        let columns = sqlx::query_as::<_, (String, String)>(
            "SELECT column_name::text, data_type::text FROM information_schema.columns \
             WHERE table_schema = 'public' AND table_name = $1 ORDER BY ordinal_position",
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await?;
        Ok(columns)
    }
}

/// Wrap a statement so every row comes back as one JSON object.
///
/// The statement sits on its own lines so a trailing `--` comment cannot
/// swallow the closing parenthesis.
fn as_json_rows(sql: &str) -> String {
    format!(
        "SELECT row_to_json(q) FROM (\n{}\n) AS q",
        strip_terminator(sql.trim())
    )
}

/// Drop statement terminators followed by nothing but whitespace and line comments
fn strip_terminator(sql: &str) -> String {
    let mut statement = sql.to_string();
    while let Some(idx) = statement.rfind(';') {
        let only_comments = statement[idx + 1..].lines().all(|line| {
            let line = line.trim();
            line.is_empty() || line.starts_with("--")
        });
        if !only_comments {
            break;
        }
        statement.remove(idx);
    }
    statement.trim_end().to_string()
}

#[async_trait]
impl Database for PostgresDatabase {
    async fn get_schema_text(&self) -> Result<String> {
        let mut definitions = Vec::new();
        for table in self.table_names().await? {
            let columns = self.table_columns(&table).await?;
            definitions.push(format_table_definition(&table, &columns));
        }
        debug!(tables = definitions.len(), "captured schema");
        Ok(definitions.join("\n"))
    }

    async fn run_query(&self, sql: &str) -> Result<Vec<Row>> {
        let wrapped = as_json_rows(sql);
        let rows = sqlx::query_scalar::<_, serde_json::Value>(&wrapped)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db_err) => CrewError::query(db_err.message().to_string()),
                other => CrewError::query(other.to_string()),
            })?;
        debug!(rows = rows.len(), "query executed");
        Ok(rows)
    }
}
