//! Conversation coordinator
//!
//! Owns the shared history and drives the conversation one turn at a time:
//! strict round-robin over the agents, except that a pending capability
//! request is always answered by the bridge first, after which the requester
//! speaks again. Stops when a speaker's termination predicate matches or the
//! round limit is hit.

use std::collections::HashSet;
use tracing::{debug, info};

use crate::agent::conversation::ConversationHistory;
use crate::agent::loop_state::{CoordinatorState, RoundCounter, TerminationReason};
use crate::agent::participant::Agent;
use crate::core::{CrewError, Message, Result, BRIDGE_SPEAKER};
use crate::tools::CapabilityBridge;

/// Who drives the next turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    /// The agent at this index of the cast
    Agent(usize),
    /// The capability bridge, answering the latest request
    Bridge,
}

pub struct ConversationCoordinator {
    agents: Vec<Agent>,
    bridge: CapabilityBridge,
    history: ConversationHistory,
    state: CoordinatorState,
    rounds: RoundCounter,
    /// Index of the agent whose turn comes next in rotation
    cursor: usize,
}

impl ConversationCoordinator {
    /// Set up a conversation seeded with `seed`.
    ///
    /// Rotation starts with the agent after the seed's speaker, or with the
    /// first agent when the seed speaker is not part of the cast.
    pub fn new(
        agents: Vec<Agent>,
        bridge: CapabilityBridge,
        max_rounds: usize,
        seed: Message,
    ) -> Result<Self> {
        if agents.is_empty() {
            return Err(CrewError::config("A conversation needs at least one agent"));
        }

        let mut names = HashSet::new();
        for agent in &agents {
            if agent.name() == BRIDGE_SPEAKER {
                return Err(CrewError::config(format!(
                    "Agent name '{}' is reserved",
                    BRIDGE_SPEAKER
                )));
            }
            if !names.insert(agent.name()) {
                return Err(CrewError::config(format!(
                    "Duplicate agent name '{}'",
                    agent.name()
                )));
            }
        }

        let cursor = agents
            .iter()
            .position(|a| a.name() == seed.speaker)
            .map(|i| (i + 1) % agents.len())
            .unwrap_or(0);

        let rounds = RoundCounter::new(max_rounds);
        let state = if rounds.exhausted() {
            CoordinatorState::Terminated(TerminationReason::MaxRoundsReached)
        } else {
            CoordinatorState::Running
        };

        Ok(Self {
            agents,
            bridge,
            history: ConversationHistory::seeded(seed),
            state,
            rounds,
            cursor,
        })
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    pub fn rounds(&self) -> RoundCounter {
        self.rounds
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// The participant that will drive the next turn, or `None` once terminated
    pub fn next_turn(&self) -> Option<Turn> {
        if !self.state.is_running() {
            return None;
        }

        match self.history.last() {
            Some(last) if last.is_capability_request() => Some(Turn::Bridge),
            _ => Some(Turn::Agent(self.cursor)),
        }
    }

    /// Drive exactly one turn and return the resulting state.
    ///
    /// A backend failure propagates and leaves the coordinator `Running`
    /// with its history untouched.
    pub async fn step(&mut self) -> Result<CoordinatorState> {
        let Some(turn) = self.next_turn() else {
            return Ok(self.state);
        };

        let message = match turn {
            Turn::Bridge => {
                let request = self
                    .history
                    .last()
                    .ok_or_else(|| CrewError::Other("bridge turn without a request".into()))?;
                self.bridge.invoke(request).await
            }
            Turn::Agent(index) => {
                let agent = &self.agents[index];
                debug!(
                    round = self.rounds.count + 1,
                    remaining = self.rounds.remaining(),
                    agent = agent.name(),
                    "agent turn"
                );
                let message = agent.respond(self.history.messages()).await?;
                // A requester speaks again once the bridge has answered
                if !message.is_capability_request() {
                    self.cursor = (index + 1) % self.agents.len();
                }
                message
            }
        };

        let terminal = message.is_utterance()
            && self
                .agents
                .iter()
                .find(|a| a.name() == message.speaker)
                .is_some_and(|a| a.is_terminal(&message));

        info!(
            round = self.rounds.count + 1,
            speaker = %message.speaker,
            kind = %message.kind,
            "turn complete"
        );

        self.history.append(message);
        self.rounds.increment();

        if terminal {
            self.state = CoordinatorState::Terminated(TerminationReason::KeywordMatched);
        } else if self.rounds.exhausted() {
            self.state = CoordinatorState::Terminated(TerminationReason::MaxRoundsReached);
        }

        if let Some(reason) = self.state.reason() {
            info!(rounds = self.rounds.count, %reason, "conversation terminated");
        }

        Ok(self.state)
    }

    /// Drive turns until the conversation terminates
    pub async fn run(&mut self) -> Result<TerminationReason> {
        loop {
            if let Some(reason) = self.step().await?.reason() {
                return Ok(reason);
            }
        }
    }

    pub fn into_history(self) -> ConversationHistory {
        self.history
    }
}
