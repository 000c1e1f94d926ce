//! Capability bridge
//!
//! Executes capability requests made by agents and turns the outcome into a
//! `capability_result` message. Lookup, validation and handler failures are
//! reported in the message text so the conversation can react to them.

use tracing::{info, warn};

use crate::core::{CapabilityCall, CrewError, Message, Result};
use crate::tools::registry::CapabilityRegistry;

pub struct CapabilityBridge {
    registry: CapabilityRegistry,
}

impl CapabilityBridge {
    pub fn new(registry: CapabilityRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// Look up, validate and run a call.
    ///
    /// Errors: `UnknownCapability`, `InvalidArguments`, or whatever the
    /// handler fails with.
    pub async fn dispatch(&self, call: &CapabilityCall) -> Result<String> {
        let registration = self
            .registry
            .get(&call.name)
            .ok_or_else(|| CrewError::UnknownCapability(call.name.clone()))?;

        let arguments = registration.schema.validate(&call.name, &call.arguments)?;
        registration.handler.call(&arguments).await
    }

    /// Answer a capability request with a result message.
    ///
    /// Never fails: every error becomes the text of the returned message.
    pub async fn invoke(&self, request: &Message) -> Message {
        let Some(call) = request.capability_call() else {
            warn!(speaker = %request.speaker, "bridge invoked without a capability request");
            return Message::capability_result(format!(
                "ERROR: message from {} is not a capability request",
                request.speaker
            ));
        };

        match self.dispatch(call).await {
            Ok(output) => {
                info!(capability = %call.name, requester = %request.speaker, "capability succeeded");
                Message::capability_result(output)
            }
            Err(e) => {
                warn!(capability = %call.name, requester = %request.speaker, error = %e, "capability failed");
                Message::capability_result(format!("ERROR: {}", e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BRIDGE_SPEAKER;
    use crate::tools::registry::{CapabilityHandler, CapabilityRegistration};
    use crate::tools::schema::{Arguments, ParameterSchema, PrimitiveType};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;

    struct Scripted;

    #[async_trait]
    impl CapabilityHandler for Scripted {
        async fn call(&self, arguments: &Arguments) -> Result<String> {
            match arguments.get_str("sql") {
                Some("SELECT 1") => Ok("[{\"?column?\":1}]".to_string()),
                Some(other) => Err(CrewError::query(format!("syntax error at \"{}\"", other))),
                None => unreachable!("schema requires sql"),
            }
        }
    }

    fn bridge() -> CapabilityBridge {
        let mut registry = CapabilityRegistry::new();
        registry
            .register(CapabilityRegistration::new(
                "run_query",
                "Run SQL",
                ParameterSchema::new().required("sql", PrimitiveType::String, "SQL"),
                Arc::new(Scripted),
            ))
            .unwrap();
        CapabilityBridge::new(registry)
    }

    fn request(name: &str, arguments: serde_json::Value) -> Message {
        Message::capability_request("analyst", CapabilityCall::new(name, arguments))
    }

    #[test]
    fn test_successful_invocation() {
        let bridge = bridge();
        let result = tokio_test::block_on(bridge.invoke(&request("run_query", json!({"sql": "SELECT 1"}))));
        assert_eq!(result.speaker, BRIDGE_SPEAKER);
        assert_eq!(result.kind.label(), "capability_result");
        assert_eq!(result.content, "[{\"?column?\":1}]");
    }

    #[test]
    fn test_missing_argument_reported_not_raised() {
        let bridge = bridge();
        let call = CapabilityCall::new("run_query", json!({}));
        assert!(matches!(
            tokio_test::block_on(bridge.dispatch(&call)),
            Err(CrewError::InvalidArguments { .. })
        ));

        let result = tokio_test::block_on(bridge.invoke(&request("run_query", json!({}))));
        assert!(result.content.starts_with("ERROR: Invalid arguments for 'run_query'"));
    }

    #[test]
    fn test_non_object_arguments_reported() {
        let bridge = bridge();
        let result = tokio_test::block_on(bridge.invoke(&request("run_query", json!("SELECT 1"))));
        assert_eq!(
            result.content,
            "ERROR: Invalid arguments for 'run_query': arguments must be an object"
        );
    }

    #[test]
    fn test_unknown_capability() {
        let bridge = bridge();
        let call = CapabilityCall::new("drop_table", json!({}));
        assert!(matches!(
            tokio_test::block_on(bridge.dispatch(&call)),
            Err(CrewError::UnknownCapability(name)) if name == "drop_table"
        ));
    }

    #[test]
    fn test_handler_failure_becomes_text() {
        let bridge = bridge();
        let result = tokio_test::block_on(bridge.invoke(&request("run_query", json!({"sql": "SELEC 1"}))));
        assert_eq!(result.content, "ERROR: Query error: syntax error at \"SELEC 1\"");
    }

    #[test]
    fn test_non_request_message() {
        let bridge = bridge();
        let result = tokio_test::block_on(bridge.invoke(&Message::utterance("engineer", "hi")));
        assert!(result.content.contains("not a capability request"));
    }
}
