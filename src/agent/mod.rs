//! Agent module - roles, turn-taking and orchestration
//!
//! Contains the role-bound agents, the shared conversation history, the
//! coordinator state machine and the orchestrator that wires them together.

pub mod conversation;
pub mod coordinator;
pub mod loop_state;
pub mod orchestrator;
pub mod participant;
pub mod role;

pub use conversation::ConversationHistory;
pub use coordinator::{ConversationCoordinator, Turn};
pub use loop_state::{CoordinatorState, RoundCounter, TerminationReason};
pub use orchestrator::{DirectAnswer, Orchestrator, Transcript};
pub use participant::Agent;
pub use role::{AgentSpec, RoleKind, TerminationPredicate};
