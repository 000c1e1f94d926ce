//! Capability registry - named operations agents may request
//!
//! Central place where capabilities are registered before a conversation
//! starts and looked up by name when a request arrives.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::core::{CrewError, Result, ToolDefinition};
use crate::tools::schema::{Arguments, ParameterSchema};

/// The callable behind a capability
#[async_trait]
pub trait CapabilityHandler: Send + Sync {
    /// Run with validated arguments and return a text result
    async fn call(&self, arguments: &Arguments) -> Result<String>;
}

/// A capability: name, argument schema and handler
#[derive(Clone)]
pub struct CapabilityRegistration {
    pub name: String,
    pub description: String,
    pub schema: ParameterSchema,
    pub handler: Arc<dyn CapabilityHandler>,
}

impl CapabilityRegistration {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: ParameterSchema,
        handler: Arc<dyn CapabilityHandler>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema,
            handler,
        }
    }

    /// Tool definition advertised to the completion backend
    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(&self.name, &self.description, self.schema.to_json_schema())
    }
}

impl std::fmt::Debug for CapabilityRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityRegistration")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// Registry of available capabilities
#[derive(Debug, Default)]
pub struct CapabilityRegistry {
    registrations: HashMap<String, CapabilityRegistration>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a capability; names must be unique
    pub fn register(&mut self, registration: CapabilityRegistration) -> Result<()> {
        if self.registrations.contains_key(&registration.name) {
            return Err(CrewError::config(format!(
                "Capability '{}' registered twice",
                registration.name
            )));
        }
        self.registrations
            .insert(registration.name.clone(), registration);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&CapabilityRegistration> {
        self.registrations.get(name)
    }

    /// Tool definition for one capability
    pub fn definition(&self, name: &str) -> Option<ToolDefinition> {
        self.get(name).map(CapabilityRegistration::definition)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.registrations.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
