//! Orchestrator
//!
//! Entry point of a query session: captures the schema, assembles the task
//! prompt, wires the cast and the capability bridge into a coordinator and
//! runs the conversation to a terminal state.

use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::agent::coordinator::ConversationCoordinator;
use crate::agent::loop_state::TerminationReason;
use crate::agent::participant::Agent;
use crate::agent::role::{AgentSpec, RoleKind};
use crate::core::{Config, CrewError, Message, Result};
use crate::db::{Database, Row};
use crate::llm::{ChatMessage, CompletionBackend, CompletionConfig};
use crate::prompt::{extract, task_prompt, Extracted};
use crate::tools::{CapabilityBridge, CapabilityRegistry, RunQueryTool};

/// Outcome of a finished conversation
#[derive(Debug, Clone, Serialize)]
pub struct Transcript {
    /// Every message in the order it was appended, seed first
    pub messages: Vec<Message>,
    pub reason: TerminationReason,
    /// Turns driven after the seed
    pub rounds: usize,
}

impl Transcript {
    /// The latest utterance after the seed that splits cleanly around `delimiter`.
    ///
    /// The seed carries the response format, delimiter included, so it is skipped.
    pub fn final_query(&self, delimiter: &str) -> Option<Extracted> {
        self.messages
            .iter()
            .skip(1)
            .rev()
            .filter(|m| m.is_utterance())
            .find_map(|m| extract(&m.content, delimiter).ok())
    }
}

/// Result of a single-shot query without the crew
#[derive(Debug, Clone, Serialize)]
pub struct DirectAnswer {
    pub explanation: String,
    pub sql: String,
    pub rows: Vec<Row>,
}

/// Runs query conversations for one configuration
pub struct Orchestrator {
    config: Config,
    backend: Arc<dyn CompletionBackend>,
    database: Arc<dyn Database>,
}

impl Orchestrator {
    pub fn new(
        config: Config,
        backend: Arc<dyn CompletionBackend>,
        database: Arc<dyn Database>,
    ) -> Self {
        Self {
            config,
            backend,
            database,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Check that the backend serves the configured model
    pub async fn initialize(&self) -> Result<()> {
        let model = &self.config.models.name;
        if !self.backend.is_model_available(model).await? {
            return Err(CrewError::rejected(format!(
                "Model '{}' not available on {}",
                model,
                self.backend.name()
            )));
        }
        info!(backend = self.backend.name(), %model, "backend ready");
        Ok(())
    }

    /// Capabilities available to the crew
    pub fn registry(&self) -> Result<CapabilityRegistry> {
        let mut registry = CapabilityRegistry::new();
        registry.register(RunQueryTool::registration(self.database.clone()))?;
        Ok(registry)
    }

    /// The canonical cast, with bound capabilities declared to the backend
    pub fn build_cast(&self, registry: &CapabilityRegistry) -> Result<Vec<Agent>> {
        let conversation = &self.config.conversation;
        let models = &self.config.models;

        AgentSpec::canonical_cast(conversation, &models.name)
            .into_iter()
            .map(|mut spec| {
                if let Some(temperature) = models.temperature {
                    spec.completion_config.temperature = Some(temperature);
                }
                spec.completion_config.max_tokens = models.max_tokens;

                if let Some(binding) = &spec.capability_binding {
                    let definition = registry.definition(binding).ok_or_else(|| {
                        CrewError::config(format!(
                            "Agent '{}' is bound to unregistered capability '{}'",
                            spec.name, binding
                        ))
                    })?;
                    spec.completion_config.tools.push(definition);
                }

                Ok(Agent::new(spec, self.backend.clone()))
            })
            .collect()
    }

    /// Assemble the seed prompt for `request` from the live schema
    pub async fn task_prompt(&self, request: &str) -> Result<String> {
        if request.trim().is_empty() {
            return Err(CrewError::config("The request must not be empty"));
        }
        let schema = self.database.get_schema_text().await?;
        Ok(task_prompt(request, &schema, &self.config.conversation))
    }

    /// Run a full crew conversation for a natural-language request
    pub async fn run(&self, request: &str) -> Result<Transcript> {
        let prompt = self.task_prompt(request).await?;
        let registry = self.registry()?;
        let agents = self.build_cast(&registry)?;
        let capabilities = registry.names().join(", ");

        let conversation = &self.config.conversation;
        let seed = Message::utterance(&conversation.requester, prompt);
        let mut coordinator = ConversationCoordinator::new(
            agents,
            CapabilityBridge::new(registry),
            conversation.max_rounds,
            seed,
        )?;

        info!(
            max_rounds = conversation.max_rounds,
            %capabilities,
            "conversation started"
        );
        let reason = match coordinator.run().await {
            Ok(reason) => reason,
            Err(e) => {
                warn!(
                    produced = coordinator.history().len(),
                    error = %e,
                    "conversation abandoned"
                );
                return Err(e);
            }
        };

        let rounds = coordinator.rounds().count;
        Ok(Transcript {
            messages: coordinator.into_history().into_messages(),
            reason,
            rounds,
        })
    }

    /// Answer with one completion and one query, without a conversation
    pub async fn run_direct(&self, request: &str) -> Result<DirectAnswer> {
        let prompt = self.task_prompt(request).await?;
        let conversation = &self.config.conversation;

        let mut completion = CompletionConfig::new(&self.config.models.name);
        completion.temperature = self
            .config
            .models
            .temperature
            .or(Some(RoleKind::Engineer.default_temperature()));
        completion.max_tokens = self.config.models.max_tokens;

        let response = self
            .backend
            .complete(
                &RoleKind::Engineer.instruction(conversation),
                &completion,
                &[ChatMessage::user(prompt)],
            )
            .await?;

        let Extracted {
            explanation,
            payload,
        } = extract(&response.content, &conversation.sql_delimiter)?;
        info!(sql = %payload, "running direct query");
        let rows = self.database.run_query(&payload).await?;

        Ok(DirectAnswer {
            explanation,
            sql: payload,
            rows,
        })
    }
}
