//! Conversation loop state
//!
//! Tracks whether the coordinator is still running, why it stopped, and how
//! many turns have been driven so far.

use serde::{Deserialize, Serialize};

/// Why a conversation stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// An utterance satisfied its speaker's termination predicate
    KeywordMatched,
    /// The round limit was reached
    MaxRoundsReached,
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminationReason::KeywordMatched => write!(f, "keyword matched"),
            TerminationReason::MaxRoundsReached => write!(f, "max rounds reached"),
        }
    }
}

/// State of the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    Running,
    /// Absorbing: no message is appended once here
    Terminated(TerminationReason),
}

impl CoordinatorState {
    pub fn is_running(&self) -> bool {
        matches!(self, CoordinatorState::Running)
    }

    pub fn reason(&self) -> Option<TerminationReason> {
        match self {
            CoordinatorState::Running => None,
            CoordinatorState::Terminated(reason) => Some(*reason),
        }
    }
}

/// Counts driven turns against a fixed maximum
#[derive(Debug, Clone, Copy)]
pub struct RoundCounter {
    /// Turns completed so far
    pub count: usize,
    /// Maximum allowed turns
    pub max_rounds: usize,
}

impl RoundCounter {
    /// Create a new counter with the given maximum
    pub fn new(max_rounds: usize) -> Self {
        Self {
            count: 0,
            max_rounds,
        }
    }

    /// Record one completed turn
    pub fn increment(&mut self) {
        self.count += 1;
    }

    /// True once the maximum has been reached
    pub fn exhausted(&self) -> bool {
        self.count >= self.max_rounds
    }

    pub fn remaining(&self) -> usize {
        self.max_rounds.saturating_sub(self.count)
    }
}
