//! Parameter schemas for capabilities
//!
//! A schema lists named arguments with a primitive type and whether they are
//! required. It validates incoming arguments and renders itself as JSON
//! Schema for the completion backend.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::{CrewError, Result};

/// Primitive argument types a capability can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    String,
    Integer,
    Number,
    Boolean,
}

impl PrimitiveType {
    fn matches(self, value: &Value) -> bool {
        match self {
            PrimitiveType::String => value.is_string(),
            PrimitiveType::Integer => value.is_i64() || value.is_u64(),
            PrimitiveType::Number => value.is_number(),
            PrimitiveType::Boolean => value.is_boolean(),
        }
    }

    fn json_type(self) -> &'static str {
        match self {
            PrimitiveType::String => "string",
            PrimitiveType::Integer => "integer",
            PrimitiveType::Number => "number",
            PrimitiveType::Boolean => "boolean",
        }
    }
}

impl std::fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.json_type())
    }
}

/// One declared argument
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    pub kind: PrimitiveType,
    pub required: bool,
    pub description: String,
}

/// The declared arguments of a capability
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParameterSchema {
    parameters: Vec<ParameterSpec>,
}

/// Arguments that passed validation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments(Map<String, Value>);

impl Arguments {
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.0.get(key).and_then(Value::as_i64)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(Value::as_f64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }
}

impl ParameterSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a required argument
    pub fn required(
        mut self,
        name: impl Into<String>,
        kind: PrimitiveType,
        description: impl Into<String>,
    ) -> Self {
        self.parameters.push(ParameterSpec {
            name: name.into(),
            kind,
            required: true,
            description: description.into(),
        });
        self
    }

    /// Declare an optional argument
    pub fn optional(
        mut self,
        name: impl Into<String>,
        kind: PrimitiveType,
        description: impl Into<String>,
    ) -> Self {
        self.parameters.push(ParameterSpec {
            name: name.into(),
            kind,
            required: false,
            description: description.into(),
        });
        self
    }

    pub fn parameters(&self) -> &[ParameterSpec] {
        &self.parameters
    }

    /// Check `arguments` against the declared parameters.
    ///
    /// Undeclared arguments are dropped; `null` counts as absent.
    pub fn validate(&self, capability: &str, arguments: &Value) -> Result<Arguments> {
        let Some(object) = arguments.as_object() else {
            return Err(CrewError::invalid_arguments(
                capability,
                "arguments must be an object",
            ));
        };

        let mut parsed = Map::new();
        for param in &self.parameters {
            match object.get(&param.name) {
                None | Some(Value::Null) => {
                    if param.required {
                        return Err(CrewError::invalid_arguments(
                            capability,
                            format!("missing required argument '{}'", param.name),
                        ));
                    }
                }
                Some(value) if param.kind.matches(value) => {
                    parsed.insert(param.name.clone(), value.clone());
                }
                Some(_) => {
                    return Err(CrewError::invalid_arguments(
                        capability,
                        format!("argument '{}' must be of type {}", param.name, param.kind),
                    ));
                }
            }
        }

        Ok(Arguments(parsed))
    }

    /// JSON Schema object for tool definitions
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in &self.parameters {
            properties.insert(
                param.name.clone(),
                serde_json::json!({
                    "type": param.kind.json_type(),
                    "description": param.description,
                }),
            );
        }

        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}
