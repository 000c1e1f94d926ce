//! Shared types used across sqlcrew modules
//!
//! Contains the conversation message model, capability calls and the tool
//! definitions handed to the completion backend.

use serde::{Deserialize, Serialize};

/// Reserved speaker identity for messages produced by the capability bridge
pub const BRIDGE_SPEAKER: &str = "capability_bridge";

/// What a message represents within the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageKind {
    /// Plain text contributed by an agent or the requesting human
    Utterance,
    /// An agent asking the bridge to run a capability
    CapabilityRequest { call: CapabilityCall },
    /// Output (or failure report) of a capability invocation
    CapabilityResult,
}

impl MessageKind {
    /// Short label used in logs and transcripts
    pub fn label(&self) -> &'static str {
        match self {
            MessageKind::Utterance => "utterance",
            MessageKind::CapabilityRequest { .. } => "capability_request",
            MessageKind::CapabilityResult => "capability_result",
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Name of the agent that produced the message, or [`BRIDGE_SPEAKER`]
    pub speaker: String,
    /// Text content of the message
    pub content: String,
    /// Kind of message
    pub kind: MessageKind,
}

impl Message {
    /// Create a plain utterance
    pub fn utterance(speaker: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            content: content.into(),
            kind: MessageKind::Utterance,
        }
    }

    /// Create a capability request; the content is the wire form of the call
    pub fn capability_request(speaker: impl Into<String>, call: CapabilityCall) -> Self {
        Self {
            speaker: speaker.into(),
            content: call.to_wire(),
            kind: MessageKind::CapabilityRequest { call },
        }
    }

    /// Create a capability result attributed to the bridge
    pub fn capability_result(content: impl Into<String>) -> Self {
        Self {
            speaker: BRIDGE_SPEAKER.to_string(),
            content: content.into(),
            kind: MessageKind::CapabilityResult,
        }
    }

    pub fn is_utterance(&self) -> bool {
        matches!(self.kind, MessageKind::Utterance)
    }

    pub fn is_capability_request(&self) -> bool {
        matches!(self.kind, MessageKind::CapabilityRequest { .. })
    }

    /// The requested call, if this message is a capability request
    pub fn capability_call(&self) -> Option<&CapabilityCall> {
        match &self.kind {
            MessageKind::CapabilityRequest { call } => Some(call),
            _ => None,
        }
    }
}

/// A structured request to run a named capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityCall {
    /// Name of the capability to invoke
    pub name: String,
    /// Named arguments, expected to be a JSON object
    pub arguments: serde_json::Value,
}

impl CapabilityCall {
    /// Create a new capability call
    pub fn new(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    /// Get a string argument by key
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.arguments
            .get(key)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }

    /// Serialize to the JSON wire form `{"name": .., "arguments": {..}}`
    pub fn to_wire(&self) -> String {
        serde_json::json!({ "name": self.name, "arguments": self.arguments }).to_string()
    }

    /// Parse a reply whose entire body is a call in wire form.
    ///
    /// The body may be wrapped in a single ```json fence. Anything else,
    /// including prose around the object or an object of another shape,
    /// yields `None`. `arguments` is taken as-is; the capability's schema
    /// decides whether it is acceptable.
    pub fn parse_text(text: &str) -> Option<Self> {
        let body = strip_json_fence(text.trim());
        if !body.starts_with('{') {
            return None;
        }

        #[derive(Deserialize)]
        #[serde(deny_unknown_fields)]
        struct Wire {
            name: String,
            arguments: serde_json::Value,
        }

        let wire: Wire = serde_json::from_str(body).ok()?;
        if wire.name.trim().is_empty() {
            return None;
        }
        Some(Self::new(wire.name, wire.arguments))
    }
}

fn strip_json_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    match rest.strip_suffix("```") {
        Some(inner) => inner.trim(),
        None => text,
    }
}

/// Definition of a tool that can be called by the LLM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Type of tool (always "function" for now)
    #[serde(rename = "type")]
    pub tool_type: String,
    /// Function details
    pub function: FunctionDefinition,
}

/// Function definition within a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDefinition {
    /// Name of the function
    pub name: String,
    /// Description of what the function does
    pub description: String,
    /// JSON Schema for the parameters
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Create a new function tool definition
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_content_is_wire_form() {
        let call = CapabilityCall::new("run_query", json!({"sql": "SELECT 1"}));
        let msg = Message::capability_request("analyst", call.clone());
        assert!(msg.is_capability_request());
        assert_eq!(msg.capability_call(), Some(&call));
        assert_eq!(CapabilityCall::parse_text(&msg.content), Some(call));
    }

    #[test]
    fn test_result_is_attributed_to_bridge() {
        let msg = Message::capability_result("[]");
        assert_eq!(msg.speaker, BRIDGE_SPEAKER);
        assert_eq!(msg.kind.label(), "capability_result");
    }

    #[test]
    fn test_parse_fenced_call() {
        let text = "```json\n{\"name\": \"run_query\", \"arguments\": {\"sql\": \"SELECT 1\"}}\n```";
        let call = CapabilityCall::parse_text(text).unwrap();
        assert_eq!(call.name, "run_query");
        assert_eq!(call.get_string("sql").as_deref(), Some("SELECT 1"));
    }

    #[test]
    fn test_parse_keeps_non_object_arguments() {
        let call =
            CapabilityCall::parse_text("{\"name\": \"run_query\", \"arguments\": \"SELECT 1\"}")
                .unwrap();
        assert_eq!(call.name, "run_query");
        assert_eq!(call.arguments, serde_json::json!("SELECT 1"));
    }

    #[test]
    fn test_parse_rejects_prose_and_other_shapes() {
        assert!(CapabilityCall::parse_text("Let me run {\"name\": \"run_query\"}").is_none());
        assert!(CapabilityCall::parse_text("{\"sql\": \"SELECT 1\"}").is_none());
        assert!(CapabilityCall::parse_text("{\"name\": \"\", \"arguments\": {}}").is_none());
        assert!(CapabilityCall::parse_text("SELECT 1;").is_none());
    }
}
