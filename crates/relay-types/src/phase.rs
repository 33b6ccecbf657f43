//! Epoch phase, derived from on-chain timing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where an epoch is in its commit lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Epoch not started yet.
    Idle,
    /// Collecting signatures and committing.
    Commit,
    /// Header committed on every replica.
    Accept,
    /// Commit window elapsed without a commit.
    Fail,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Commit => "commit",
            Phase::Accept => "accept",
            Phase::Fail => "fail",
        }
    }

    /// Terminal for the epoch; collected signatures can be discarded.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Accept | Phase::Fail)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
