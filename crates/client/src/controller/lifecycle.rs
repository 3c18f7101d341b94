//! Controller lifecycle states.

use serde::{Deserialize, Serialize};
use wird_core::Error;

/// Where a controller generation is in its life.
///
/// `Parsed → Installing → Installed (waiting) → Activating → Activated`, with
/// `Redundant` reachable from any state once install fails or a newer
/// generation takes over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    Redundant,
}

impl LifecycleState {
    pub fn can_transition(self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, next),
            (Parsed, Installing)
                | (Installing, Installed)
                | (Installed, Activating)
                | (Activating, Activated)
                | (Parsed | Installing | Installed | Activating | Activated, Redundant)
        )
    }

    /// Move to `next`, or fail without changing state.
    pub fn advance(&mut self, next: LifecycleState) -> Result<(), Error> {
        if !self.can_transition(next) {
            return Err(Error::InvalidState(format!("cannot go from {} to {}", self.as_str(), next.as_str())));
        }
        *self = next;
        Ok(())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Parsed => "parsed",
            LifecycleState::Installing => "installing",
            LifecycleState::Installed => "installed",
            LifecycleState::Activating => "activating",
            LifecycleState::Activated => "activated",
            LifecycleState::Redundant => "redundant",
        }
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
