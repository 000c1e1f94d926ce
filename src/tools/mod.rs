//! Tools module - capabilities agents can invoke mid-conversation
//!
//! Contains parameter schemas, the capability registry, the bridge that
//! executes requests, and the built-in query capability.

pub mod bridge;
pub mod query;
pub mod registry;
pub mod schema;

pub use bridge::CapabilityBridge;
pub use query::{RunQueryTool, RUN_QUERY};
pub use registry::{CapabilityHandler, CapabilityRegistration, CapabilityRegistry};
pub use schema::{Arguments, ParameterSchema, PrimitiveType};
