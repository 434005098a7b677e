//! Run state machine
//!
//! A run moves strictly forward through its stages. Any failure ends in
//! `Failed`, which is terminal.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stage reached by an enhancement run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RunState {
    /// Nothing loaded yet (initial state)
    #[default]
    Unloaded,
    ModelLoaded,
    AudioLoaded,
    Transformed,
    Inferred,
    Resynthesized,
    /// Output file written (terminal)
    Written,
    /// A stage failed (terminal)
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Unloaded => write!(f, "Unloaded"),
            RunState::ModelLoaded => write!(f, "ModelLoaded"),
            RunState::AudioLoaded => write!(f, "AudioLoaded"),
            RunState::Transformed => write!(f, "Transformed"),
            RunState::Inferred => write!(f, "Inferred"),
            RunState::Resynthesized => write!(f, "Resynthesized"),
            RunState::Written => write!(f, "Written"),
            RunState::Failed => write!(f, "Failed"),
        }
    }
}

impl RunState {
    /// The only state reachable on success, or `None` once terminal
    pub fn next(self) -> Option<RunState> {
        match self {
            RunState::Unloaded => Some(RunState::ModelLoaded),
            RunState::ModelLoaded => Some(RunState::AudioLoaded),
            RunState::AudioLoaded => Some(RunState::Transformed),
            RunState::Transformed => Some(RunState::Inferred),
            RunState::Inferred => Some(RunState::Resynthesized),
            RunState::Resynthesized => Some(RunState::Written),
            RunState::Written | RunState::Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Written | RunState::Failed)
    }

    /// Check whether moving to `target` is allowed
    pub fn can_transition_to(self, target: RunState) -> bool {
        match target {
            RunState::Failed => !self.is_terminal(),
            _ => self.next() == Some(target),
        }
    }
}
