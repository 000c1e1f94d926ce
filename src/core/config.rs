//! Configuration management for sqlcrew
//!
//! Supports environment variables, config files, and runtime overrides.
//! Everything the conversation core needs (delimiters, keywords, limits,
//! credentials) lives here and is handed to the orchestrator explicitly.
//!
//! Config file location: ~/.config/sqlcrew/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::{CrewError, Result};

/// Main configuration for sqlcrew
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Ollama configuration
    #[serde(default)]
    pub ollama: OllamaConfig,
    /// Model configuration
    #[serde(default)]
    pub models: ModelConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Conversation protocol configuration
    #[serde(default)]
    pub conversation: ConversationConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Ollama server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Host address (default: localhost)
    pub host: String,
    /// Port number (default: 11434)
    pub port: u16,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Model configuration shared by every agent
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model every agent completes with
    pub name: String,
    /// Overrides the per-role default temperature when set
    pub temperature: Option<f32>,
    /// Maximum tokens per completion
    pub max_tokens: Option<u32>,
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Full connection URL; takes precedence over the individual parts
    pub url: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Pool size (1 keeps one-connection, one-cursor semantics)
    pub max_connections: u32,
    /// Seconds to wait for a pooled connection
    pub acquire_timeout_secs: u64,
}

/// Conversation protocol configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    /// Hard bound on driven turns (agent and bridge turns alike)
    pub max_rounds: usize,
    /// Case-sensitive token whose appearance in an utterance ends the conversation
    pub termination_keyword: String,
    /// Separates explanation from SQL in agent replies
    pub sql_delimiter: String,
    /// Label of the schema reference block
    pub table_definitions_ref: String,
    /// Label of the response format reference block
    pub response_format_ref: String,
    /// Database flavour named in the task prompt
    pub database_version: String,
    /// Speaker of the seed message
    pub requester: String,
}

/// Output format for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = CrewError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(CrewError::config(format!("Unknown log format: {}", other))),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset
    pub level: String,
    /// Output format
    pub format: LogFormat,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: env::var("OLLAMA_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: env::var("OLLAMA_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(11434),
            timeout_secs: 120,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: env::var("SQLCREW_MODEL").unwrap_or_else(|_| "qwen3:8b".to_string()),
            temperature: None,
            max_tokens: None,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: env::var("DATABASE_URL").ok(),
            user: env::var("DB_USER").ok(),
            password: env::var("DB_PASSWORD").ok(),
            name: env::var("DB_NAME").ok(),
            host: env::var("DB_HOST").ok(),
            port: env::var("DB_PORT").ok().and_then(|p| p.parse().ok()),
            max_connections: 1,
            acquire_timeout_secs: 30,
        }
    }
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_rounds: 10,
            termination_keyword: "APPROVED".to_string(),
            sql_delimiter: "--------".to_string(),
            table_definitions_ref: "TABLE_DEFINITIONS".to_string(),
            response_format_ref: "RESPONSE_FORMAT".to_string(),
            database_version: "Postgres".to_string(),
            requester: "admin".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: env::var("SQLCREW_LOG").unwrap_or_else(|_| "info".to_string()),
            format: env::var("SQLCREW_LOG_FORMAT")
                .ok()
                .and_then(|f| f.parse().ok())
                .unwrap_or_default(),
        }
    }
}

impl DatabaseConfig {
    /// Resolve the connection URL from either `url` or the individual parts
    pub fn connection_url(&self) -> Result<String> {
        if let Some(ref url) = self.url {
            return Ok(url.clone());
        }

        let mut missing = Vec::new();
        if self.user.is_none() {
            missing.push("DB_USER");
        }
        if self.password.is_none() {
            missing.push("DB_PASSWORD");
        }
        if self.name.is_none() {
            missing.push("DB_NAME");
        }
        if self.host.is_none() {
            missing.push("DB_HOST");
        }
        if self.port.is_none() {
            missing.push("DB_PORT");
        }

        match (&self.user, &self.password, &self.name, &self.host, self.port) {
            (Some(user), Some(password), Some(name), Some(host), Some(port)) => Ok(format!(
                "postgresql://{}:{}@{}:{}/{}",
                user, password, host, port, name
            )),
            _ => Err(CrewError::config(format!(
                "Missing database credentials: set DATABASE_URL or {}",
                missing.join(", ")
            ))),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sqlcrew")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > config file > env vars > defaults
    pub fn load() -> Result<Self> {
        // Try to load .env file if it exists
        let _ = dotenvy::dotenv();

        Self::load_from(&Self::config_file())
    }

    /// Load configuration from `path`.
    ///
    /// A missing file yields the defaults (which respect env vars); a file
    /// that cannot be read or parsed is a configuration error.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            CrewError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text; missing sections take defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| CrewError::config(format!("Failed to parse config: {}", e)))
    }

    /// Check that everything needed to start a conversation is present
    pub fn validate(&self) -> Result<()> {
        self.database.connection_url()?;

        let conversation = &self.conversation;
        if conversation.termination_keyword.is_empty() {
            return Err(CrewError::config("termination_keyword must not be empty"));
        }
        if conversation.sql_delimiter.trim().is_empty() {
            return Err(CrewError::config("sql_delimiter must not be blank"));
        }
        if conversation.requester.trim().is_empty() {
            return Err(CrewError::config("requester must not be blank"));
        }
        if self.models.name.trim().is_empty() {
            return Err(CrewError::config("model name must not be blank"));
        }

        Ok(())
    }

    /// Get the full Ollama API URL
    pub fn ollama_url(&self) -> String {
        format!("http://{}:{}", self.ollama.host, self.ollama.port)
    }
}
