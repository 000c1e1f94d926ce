//! Run query capability
//!
//! Executes SQL against the database collaborator and reports the rows as text.

use async_trait::async_trait;
use std::sync::Arc;

use crate::core::Result;
use crate::db::{Database, Row};
use crate::tools::registry::{CapabilityHandler, CapabilityRegistration};
use crate::tools::schema::{Arguments, ParameterSchema, PrimitiveType};

/// Name under which the query capability is registered
pub const RUN_QUERY: &str = "run_query";

/// Tool for running SQL
pub struct RunQueryTool {
    database: Arc<dyn Database>,
}

impl RunQueryTool {
    pub fn new(database: Arc<dyn Database>) -> Self {
        Self { database }
    }

    /// Registration with one required string argument, `sql`
    pub fn registration(database: Arc<dyn Database>) -> CapabilityRegistration {
        CapabilityRegistration::new(
            RUN_QUERY,
            "Run a SQL query against the database and return the resulting rows",
            ParameterSchema::new().required(
                "sql",
                PrimitiveType::String,
                "The SQL query to execute",
            ),
            Arc::new(Self::new(database)),
        )
    }
}

/// Render rows for the conversation, one JSON object per line
pub fn format_rows(rows: &[Row]) -> String {
    if rows.is_empty() {
        return "Query returned no rows.".to_string();
    }

    let mut output = format!("Query returned {} row(s):", rows.len());
    for row in rows {
        output.push('\n');
        output.push_str(&row.to_string());
    }
    output
}

#[async_trait]
impl CapabilityHandler for RunQueryTool {
    async fn call(&self, arguments: &Arguments) -> Result<String> {
        let sql = arguments.get_str("sql").unwrap_or_default();
        let rows = self.database.run_query(sql).await?;
        Ok(format_rows(&rows))
    }
}
