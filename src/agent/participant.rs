//! Agent - one role-bound participant
//!
//! An agent turns the shared history into the chat shape its backend
//! expects, asks the backend for the next reply and classifies that reply as
//! an utterance or a capability request.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::agent::role::{AgentSpec, RoleKind};
use crate::core::{CapabilityCall, Message, MessageKind, Result};
use crate::llm::{ChatMessage, CompletionBackend};

/// A participant in the conversation
#[derive(Clone)]
pub struct Agent {
    spec: AgentSpec,
    backend: Arc<dyn CompletionBackend>,
}

impl Agent {
    pub fn new(spec: AgentSpec, backend: Arc<dyn CompletionBackend>) -> Self {
        Self { spec, backend }
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn role(&self) -> RoleKind {
        self.spec.role
    }

    pub fn spec(&self) -> &AgentSpec {
        &self.spec
    }

    /// Whether this agent's utterance ends the conversation
    pub fn is_terminal(&self, message: &Message) -> bool {
        self.spec.is_terminal(message)
    }

    /// Produce this agent's next message.
    ///
    /// Backend failures propagate unchanged.
    pub async fn respond(&self, history: &[Message]) -> Result<Message> {
        let chat = self.render_history(history);
        let response = self
            .backend
            .complete(
                &self.spec.system_instruction,
                &self.spec.completion_config,
                &chat,
            )
            .await?;

        if let Some(usage) = &response.usage {
            debug!(
                agent = %self.spec.name,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "completion usage"
            );
        }

        if self.spec.completion_config.declares_capability() {
            if response.tool_calls.len() > 1 {
                warn!(
                    agent = %self.spec.name,
                    dropped = response.tool_calls.len() - 1,
                    "only the first tool call of a reply is run"
                );
            }
            let call = response
                .tool_calls
                .into_iter()
                .next()
                .or_else(|| CapabilityCall::parse_text(&response.content));

            if let Some(call) = call {
                return Ok(Message::capability_request(&self.spec.name, call));
            }
        }

        Ok(Message::utterance(&self.spec.name, response.content))
    }

    /// Present the shared history from this agent's point of view
    pub fn render_history(&self, history: &[Message]) -> Vec<ChatMessage> {
        let mut chat = Vec::with_capacity(history.len());
        let mut answering_own_request = false;

        for message in history {
            let own = message.speaker == self.spec.name;
            let entry = match (&message.kind, own) {
                (MessageKind::Utterance, true) => ChatMessage::assistant(&message.content),
                (MessageKind::CapabilityRequest { call }, true) => {
                    ChatMessage::assistant_call(call.clone())
                }
                (MessageKind::CapabilityResult, _) if answering_own_request => {
                    ChatMessage::tool(&message.content)
                }
                _ => ChatMessage::user(format!("{}: {}", message.speaker, message.content)),
            };
            answering_own_request = own && message.is_capability_request();
            chat.push(entry);
        }

        chat
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.spec.name)
            .field("role", &self.spec.role)
            .field("backend", &self.backend.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ConversationConfig;
    use crate::core::ToolDefinition;
    use crate::llm::{ChatRole, CompletionConfig, LLMResponse};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Returns one canned response and records what it was shown
    struct Canned {
        response: LLMResponse,
        seen: Mutex<Vec<ChatMessage>>,
    }

    #[async_trait]
    impl CompletionBackend for Canned {
        async fn complete(
            &self,
            _system_instruction: &str,
            _config: &CompletionConfig,
            history: &[ChatMessage],
        ) -> Result<LLMResponse> {
            *self.seen.lock().unwrap() = history.to_vec();
            Ok(self.response.clone())
        }

        fn name(&self) -> &str {
            "canned"
        }
    }

    fn agent(role: RoleKind, response: LLMResponse) -> (Agent, Arc<Canned>) {
        let conversation = ConversationConfig::default();
        let mut spec = AgentSpec::for_role(role, &conversation, "test-model");
        if let Some(binding) = &spec.capability_binding {
            spec.completion_config.tools.push(ToolDefinition::function(
                binding,
                "Run SQL",
                json!({"type": "object"}),
            ));
        }
        let backend = Arc::new(Canned {
            response,
            seen: Mutex::new(Vec::new()),
        });
        (Agent::new(spec, backend.clone()), backend)
    }

    #[tokio::test]
    async fn test_plain_reply_is_utterance() {
        let (engineer, _) = agent(
            RoleKind::Engineer,
            LLMResponse::text("Counts users\n--------\nSELECT count(*) FROM users;"),
        );
        let msg = engineer
            .respond(&[Message::utterance("admin", "How many users?")])
            .await
            .unwrap();
        assert_eq!(msg.speaker, "engineer");
        assert!(msg.is_utterance());
    }

    #[tokio::test]
    async fn test_native_tool_call_becomes_request() {
        let mut response = LLMResponse::text("");
        response.tool_calls = vec![CapabilityCall::new("run_query", json!({"sql": "SELECT 1"}))];
        let (analyst, _) = agent(RoleKind::Analyst, response);

        let msg = analyst.respond(&[]).await.unwrap();
        assert!(msg.is_capability_request());
        assert_eq!(msg.capability_call().unwrap().name, "run_query");
    }

    #[tokio::test]
    async fn test_text_encoded_call_becomes_request() {
        let (analyst, _) = agent(
            RoleKind::Analyst,
            LLMResponse::text(r#"{"name": "run_query", "arguments": {"sql": "SELECT 1"}}"#),
        );
        let msg = analyst.respond(&[]).await.unwrap();
        assert!(msg.is_capability_request());
    }

    #[tokio::test]
    async fn test_text_call_with_bad_arguments_still_reaches_bridge() {
        let (analyst, _) = agent(
            RoleKind::Analyst,
            LLMResponse::text(r#"{"name": "run_query", "arguments": "SELECT 1"}"#),
        );
        let msg = analyst.respond(&[]).await.unwrap();
        let call = msg.capability_call().unwrap();
        assert_eq!(call.arguments, json!("SELECT 1"));
    }

    #[tokio::test]
    async fn test_first_of_several_tool_calls_is_kept() {
        let mut response = LLMResponse::text("");
        response.tool_calls = vec![
            CapabilityCall::new("run_query", json!({"sql": "SELECT 1"})),
            CapabilityCall::new("run_query", json!({"sql": "SELECT 2"})),
        ];
        let (analyst, _) = agent(RoleKind::Analyst, response);

        let msg = analyst.respond(&[]).await.unwrap();
        assert_eq!(
            msg.capability_call().unwrap().get_string("sql").as_deref(),
            Some("SELECT 1")
        );
    }

    #[tokio::test]
    async fn test_unbound_agent_ignores_calls() {
        let mut response = LLMResponse::text(r#"{"name": "run_query", "arguments": {}}"#);
        response.tool_calls = vec![CapabilityCall::new("run_query", json!({}))];
        let (reviewer, _) = agent(RoleKind::Reviewer, response);

        let msg = reviewer.respond(&[]).await.unwrap();
        assert!(msg.is_utterance());
    }

    #[tokio::test]
    async fn test_history_rendering() {
        let (analyst, backend) = agent(RoleKind::Analyst, LLMResponse::text("Two users."));
        let call = CapabilityCall::new("run_query", json!({"sql": "SELECT 1"}));
        let history = vec![
            Message::utterance("admin", "How many users?"),
            Message::utterance("engineer", "SELECT count(*) FROM users;"),
            Message::capability_request("analyst", call),
            Message::capability_result("Query returned 1 row(s):\n{\"count\":2}"),
            Message::utterance("analyst", "There are two users."),
        ];

        analyst.respond(&history).await.unwrap();
        let seen = backend.seen.lock().unwrap().clone();
        let roles: Vec<ChatRole> = seen.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                ChatRole::User,
                ChatRole::User,
                ChatRole::Assistant,
                ChatRole::Tool,
                ChatRole::Assistant
            ]
        );
        assert_eq!(seen[0].content, "admin: How many users?");
        assert_eq!(seen[2].tool_calls.len(), 1);
    }

    #[test]
    fn test_other_agents_see_results_as_user_text() {
        let (reviewer, _) = agent(RoleKind::Reviewer, LLMResponse::text(""));
        let call = CapabilityCall::new("run_query", json!({"sql": "SELECT 1"}));
        let chat = reviewer.render_history(&[
            Message::capability_request("analyst", call),
            Message::capability_result("Query returned no rows."),
        ]);
        assert_eq!(chat[1].role, ChatRole::User);
        assert_eq!(chat[1].content, "capability_bridge: Query returned no rows.");
    }
}
