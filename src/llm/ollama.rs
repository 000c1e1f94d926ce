//! Ollama client implementation
//!
//! Async HTTP client for the Ollama chat API with native tool calling.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::core::{CapabilityCall, Config, CrewError, Result, ToolDefinition};
use crate::llm::traits::{
    ChatMessage, ChatRole, CompletionBackend, CompletionConfig, LLMResponse, TokenUsage,
};

/// Ollama API client
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
}

/// Ollama chat request
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolDefinition]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
    stream: bool,
}

/// Ollama message format
#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OllamaToolCall>>,
}

/// Ollama tool call format
#[derive(Debug, Clone, Serialize, Deserialize)]
struct OllamaToolCall {
    function: OllamaFunction,
}

/// Ollama function in tool call
#[derive(Debug, Clone, Serialize, Deserialize)]
struct OllamaFunction {
    name: String,
    arguments: serde_json::Value,
}

/// Ollama generation options
#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Ollama chat response (non-streaming)
#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: OllamaMessage,
    model: String,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

/// Ollama models list response
#[derive(Debug, Deserialize)]
struct ModelsResponse {
    models: Vec<ModelInfo>,
}

/// Model information
#[derive(Debug, Deserialize)]
struct ModelInfo {
    name: String,
}

impl OllamaClient {
    /// Create a new Ollama client from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::build(config.ollama_url(), config.ollama.timeout_secs)
    }

    /// Create a client with custom base URL
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        Self::build(base_url.into(), 120)
    }

    fn build(base_url: String, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| CrewError::with_context("Failed to create HTTP client", e))?;

        Ok(Self { client, base_url })
    }

    /// Convert a backend-neutral message to Ollama format
    fn to_ollama_message(msg: &ChatMessage) -> OllamaMessage {
        let role = match msg.role {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
            ChatRole::Tool => "tool",
        };

        OllamaMessage {
            role: role.to_string(),
            content: msg.content.clone(),
            tool_calls: if msg.tool_calls.is_empty() {
                None
            } else {
                Some(
                    msg.tool_calls
                        .iter()
                        .map(|tc| OllamaToolCall {
                            function: OllamaFunction {
                                name: tc.name.clone(),
                                arguments: tc.arguments.clone(),
                            },
                        })
                        .collect(),
                )
            },
        }
    }

    /// Convert Ollama response to LLMResponse
    fn to_llm_response(response: ChatResponse) -> LLMResponse {
        let tool_calls = response
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| CapabilityCall::new(tc.function.name, tc.function.arguments))
            .collect();

        let usage = match (response.prompt_eval_count, response.eval_count) {
            (Some(prompt), Some(completion)) => Some(TokenUsage {
                prompt_tokens: prompt,
                completion_tokens: completion,
                total_tokens: prompt + completion,
            }),
            _ => None,
        };

        LLMResponse {
            content: response.message.content,
            tool_calls,
            usage,
            model: response.model,
        }
    }

    /// Map a transport failure onto the backend error kinds
    fn transport_error(&self, e: reqwest::Error) -> CrewError {
        if e.is_connect() {
            CrewError::unavailable(format!(
                "Cannot connect to Ollama at {}. Is it running?",
                self.base_url
            ))
        } else if e.is_timeout() {
            CrewError::unavailable(format!("Request to {} timed out", self.base_url))
        } else {
            CrewError::unavailable(e.to_string())
        }
    }

    /// Map a non-success HTTP status onto the backend error kinds
    fn status_error(model: &str, status: StatusCode, body: &str) -> CrewError {
        if status == StatusCode::NOT_FOUND && body.contains("not found") {
            return CrewError::rejected(format!(
                "Model '{}' not available in Ollama. Run: ollama pull {}",
                model, model
            ));
        }

        let message = format!("Ollama API error ({}): {}", status, body);
        if status.is_server_error() {
            CrewError::unavailable(message)
        } else {
            CrewError::rejected(message)
        }
    }
}

/// Truncate long payloads for debug logging
fn preview(content: &str) -> &str {
    match content.char_indices().nth(500) {
        Some((idx, _)) => &content[..idx],
        None => content,
    }
}

#[async_trait]
impl CompletionBackend for OllamaClient {
    async fn complete(
        &self,
        system_instruction: &str,
        config: &CompletionConfig,
        history: &[ChatMessage],
    ) -> Result<LLMResponse> {
        let mut ollama_messages = Vec::with_capacity(history.len() + 1);
        ollama_messages.push(Self::to_ollama_message(&ChatMessage::system(
            system_instruction,
        )));
        ollama_messages.extend(history.iter().map(Self::to_ollama_message));

        let options = if config.temperature.is_some() || config.max_tokens.is_some() {
            Some(OllamaOptions {
                temperature: config.temperature,
                num_predict: config.max_tokens,
            })
        } else {
            None
        };

        let request = ChatRequest {
            model: &config.model,
            messages: ollama_messages,
            tools: if config.tools.is_empty() {
                None
            } else {
                Some(config.tools.as_slice())
            },
            options,
            stream: false,
        };

        let request_json = serde_json::to_string(&request)?;
        debug!(model = %config.model, request = preview(&request_json), "ollama request");

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(Self::status_error(&config.model, status, &error_text));
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;
        debug!(response = preview(&response_text), "ollama response");

        let chat_response: ChatResponse = serde_json::from_str(&response_text)
            .map_err(|e| CrewError::rejected(format!("Failed to parse response: {}", e)))?;

        Ok(Self::to_llm_response(chat_response))
    }

    async fn is_model_available(&self, model: &str) -> Result<bool> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            return Err(CrewError::unavailable("Failed to list models"));
        }

        let models: ModelsResponse = response
            .json()
            .await
            .map_err(|e| self.transport_error(e))?;
        Ok(models
            .models
            .iter()
            .any(|m| m.name == model || m.name.split(':').next() == model.split(':').next()))
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
