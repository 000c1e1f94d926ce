//! LLM module - completion backend integrations
//!
//! Provides the backend abstraction with Ollama as the implementation.

pub mod ollama;
pub mod traits;

pub use ollama::OllamaClient;
pub use traits::{
    ChatMessage, ChatRole, CompletionBackend, CompletionConfig, LLMResponse, TokenUsage,
};
