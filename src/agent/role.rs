//! Agent roles
//!
//! The cast is a closed set of role kinds. Each kind knows its default name,
//! its instruction text and whether it is bound to a capability; an
//! [`AgentSpec`] fixes those choices for one conversation.

use serde::{Deserialize, Serialize};

use crate::core::config::ConversationConfig;
use crate::core::Message;
use crate::llm::CompletionConfig;
use crate::tools::RUN_QUERY;

/// The roles taking part in a query conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleKind {
    /// Stands in for the human; discusses the plan and signs it off
    Admin,
    /// Writes the SQL
    Engineer,
    /// Runs the SQL and reports on the result
    Analyst,
    /// Validates the result and approves it
    Reviewer,
}

impl RoleKind {
    /// Speaking order of the canonical cast
    pub const ROTATION: [RoleKind; 4] = [
        RoleKind::Admin,
        RoleKind::Engineer,
        RoleKind::Analyst,
        RoleKind::Reviewer,
    ];

    pub fn default_name(self) -> &'static str {
        match self {
            RoleKind::Admin => "admin",
            RoleKind::Engineer => "engineer",
            RoleKind::Analyst => "analyst",
            RoleKind::Reviewer => "reviewer",
        }
    }

    /// Capability this role may call, if any
    pub fn capability(self) -> Option<&'static str> {
        match self {
            RoleKind::Analyst => Some(RUN_QUERY),
            _ => None,
        }
    }

    pub fn default_temperature(self) -> f32 {
        match self {
            RoleKind::Admin => 0.7,
            RoleKind::Engineer | RoleKind::Analyst => 0.2,
            RoleKind::Reviewer => 0.3,
        }
    }

    /// Instruction text for this role under the given protocol settings
    pub fn instruction(self, conversation: &ConversationConfig) -> String {
        let keyword = &conversation.termination_keyword;
        let delimiter = &conversation.sql_delimiter;
        let db = &conversation.database_version;

        match self {
            RoleKind::Admin => format!(
                "You are the admin, speaking for the human who asked the question. \
                 Discuss the plan with the reviewer and keep the team focused on the request. \
                 Do not write SQL yourself and never say {keyword}."
            ),
            RoleKind::Engineer => format!(
                "You are a data engineer. Write the {db} SQL query that answers the request, \
                 using only the tables and columns given in the prompt. \
                 Reply with a short explanation, then a line containing only {delimiter}, \
                 then the SQL query as raw text. Hand the query to the analyst to run."
            ),
            RoleKind::Analyst => format!(
                "You are a senior data analyst. Run the engineer's latest SQL query with the \
                 {RUN_QUERY} tool, passing it as the `sql` argument. When the result comes \
                 back, summarise what it shows and send it to the reviewer. If the query \
                 failed, describe the error so the engineer can fix it."
            ),
            RoleKind::Reviewer => format!(
                "You are the reviewer. Check that the query and its result answer the \
                 original request. If they do, reply with {keyword} and a one-line summary. \
                 Otherwise explain what is wrong so the engineer can revise the query."
            ),
        }
    }
}

impl std::fmt::Display for RoleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.default_name())
    }
}

/// Decides whether a message ends the conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationPredicate {
    /// Case-sensitive substring match on the message content
    Keyword(String),
    /// This agent never ends the conversation
    Never,
}

impl TerminationPredicate {
    /// True when the conversation should stop after `message`
    pub fn is_terminal(&self, message: &Message) -> bool {
        match self {
            TerminationPredicate::Keyword(keyword) => {
                !message.content.is_empty() && message.content.contains(keyword.as_str())
            }
            TerminationPredicate::Never => false,
        }
    }
}

/// Fixed description of one participant
#[derive(Debug, Clone)]
pub struct AgentSpec {
    /// Unique within a conversation
    pub name: String,
    pub role: RoleKind,
    pub system_instruction: String,
    pub completion_config: CompletionConfig,
    /// Name of the registered capability this agent may request
    pub capability_binding: Option<String>,
    pub termination: TerminationPredicate,
}

impl AgentSpec {
    /// Spec for `role` with its default name, instruction and binding
    pub fn for_role(role: RoleKind, conversation: &ConversationConfig, model: &str) -> Self {
        let mut completion_config = CompletionConfig::new(model);
        completion_config.temperature = Some(role.default_temperature());

        Self {
            name: role.default_name().to_string(),
            role,
            system_instruction: role.instruction(conversation),
            completion_config,
            capability_binding: role.capability().map(str::to_string),
            termination: TerminationPredicate::Keyword(conversation.termination_keyword.clone()),
        }
    }

    /// The canonical four-role cast in speaking order
    pub fn canonical_cast(conversation: &ConversationConfig, model: &str) -> Vec<Self> {
        RoleKind::ROTATION
            .iter()
            .map(|role| Self::for_role(*role, conversation, model))
            .collect()
    }

    pub fn is_terminal(&self, message: &Message) -> bool {
        self.termination.is_terminal(message)
    }
}
