//! Database module - the query target of the conversation
//!
//! The crew only needs two things from a database: a textual description of
//! its tables for the prompt, and a way to run a query and read the rows back.

pub mod postgres;

use async_trait::async_trait;

use crate::core::Result;

pub use postgres::PostgresDatabase;

/// A result row, keyed by column name
pub type Row = serde_json::Value;

/// Database collaborator used for schema capture and query execution
///
/// Implementations run one query at a time; each query commits or fails
/// before returning.
#[async_trait]
pub trait Database: Send + Sync {
    /// Newline-joined `CREATE TABLE` descriptions of every user table
    async fn get_schema_text(&self) -> Result<String>;

    /// Execute `sql` and return its rows in result order.
    ///
    /// Failures inside the database are reported as `CrewError::Query`.
    async fn run_query(&self, sql: &str) -> Result<Vec<Row>>;
}

/// Render one table as a DDL-like description
pub fn format_table_definition(table: &str, columns: &[(String, String)]) -> String {
    let column_definitions: Vec<String> = columns
        .iter()
        .map(|(name, data_type)| format!("{} {}", name, data_type))
        .collect();

    format!(
        "CREATE TABLE {} (\n  {}\n);",
        table,
        column_definitions.join(",\n  ")
    )
}
