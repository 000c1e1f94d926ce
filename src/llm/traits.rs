//! Completion backend trait
//!
//! Abstracts the text-completion service that turns a role's instruction and
//! message history into its next utterance.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::{CapabilityCall, Result, ToolDefinition};

/// Chat-style role understood by completion backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
    Tool,
}

/// One entry of the history as presented to a backend
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    /// Calls previously made by the assistant in this message
    pub tool_calls: Vec<CapabilityCall>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ChatRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }

    pub fn tool(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Tool, content)
    }

    /// An assistant message that carried a capability call
    pub fn assistant_call(call: CapabilityCall) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: String::new(),
            tool_calls: vec![call],
        }
    }

    fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }
}

/// Per-agent completion settings forwarded to the backend
#[derive(Debug, Clone, Default)]
pub struct CompletionConfig {
    /// Model identifier
    pub model: String,
    /// Temperature for sampling (0.0 - 2.0)
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Capabilities the model may call; empty for plain text roles
    pub tools: Vec<ToolDefinition>,
}

impl CompletionConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Whether a capability is declared for this agent
    pub fn declares_capability(&self) -> bool {
        !self.tools.is_empty()
    }
}

/// Response from a completion backend
#[derive(Debug, Clone, Default)]
pub struct LLMResponse {
    /// Text content of the response
    pub content: String,
    /// Any native tool calls the model wants to make
    pub tool_calls: Vec<CapabilityCall>,
    /// Token usage information
    pub usage: Option<TokenUsage>,
    /// Model that generated the response
    pub model: String,
}

impl LLMResponse {
    /// A plain text response
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }
}

/// Token usage information
#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Trait for completion backends
///
/// Failures surface as `BackendUnavailable` or `BackendRejected`; callers do
/// not retry.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Produce the next reply for a role
    async fn complete(
        &self,
        system_instruction: &str,
        config: &CompletionConfig,
        history: &[ChatMessage],
    ) -> Result<LLMResponse>;

    /// Check if a model is available
    async fn is_model_available(&self, _model: &str) -> Result<bool> {
        Ok(true)
    }

    /// Get the backend name
    fn name(&self) -> &str;
}
