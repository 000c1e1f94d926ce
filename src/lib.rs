//! sqlcrew - natural-language database queries answered by an agent crew
//!
//! Captures the table structure of a database, assembles a task prompt, and
//! runs a bounded conversation among role-specialised LLM agents that write,
//! execute and validate a SQL query against the live database.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, and error handling
//! - **LLM**: Completion backend abstraction with Ollama implementation
//! - **Prompt**: Task prompt assembly and reply extraction
//! - **Tools**: Capability registry and the bridge that executes requests
//! - **DB**: Database collaborator with PostgreSQL implementation
//! - **Agent**: Roles, turn-taking coordinator and orchestration
//! - **CLI**: Terminal rendering
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sqlcrew::{Config, Orchestrator};
//! use sqlcrew::db::PostgresDatabase;
//! use sqlcrew::llm::OllamaClient;
//!
//! #[tokio::main]
//! async fn main() -> sqlcrew::Result<()> {
//!     let config = Config::load()?;
//!     config.validate()?;
//!
//!     let database = PostgresDatabase::connect(&config.database).await?;
//!     let backend = OllamaClient::from_config(&config)?;
//!     let orchestrator = Orchestrator::new(config, Arc::new(backend), Arc::new(database));
//!
//!     let transcript = orchestrator.run("How many users signed up last week?").await?;
//!     println!("{:?}", transcript.reason);
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod core;
pub mod db;
pub mod llm;
pub mod prompt;
pub mod tools;

// Re-export commonly used items
pub use crate::agent::{Orchestrator, Transcript};
pub use crate::core::{Config, CrewError, Result};
