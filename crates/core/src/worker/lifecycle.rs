//! Worker lifecycle state machine.
//!
//! Installing → Waiting → Activating → Active, with Redundant reachable
//! from anywhere and terminal.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Installing,
    Waiting,
    Activating,
    Active,
    Redundant,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkerState::Installing => "installing",
            WorkerState::Waiting => "waiting",
            WorkerState::Activating => "activating",
            WorkerState::Active => "active",
            WorkerState::Redundant => "redundant",
        };
        f.write_str(name)
    }
}

/// Current state plus the two flags the environment tracks alongside it.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    state: WorkerState,
    skip_waiting: bool,
    clients_claimed: bool,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self { state: WorkerState::Installing, skip_waiting: false, clients_claimed: false }
    }
}

impl Lifecycle {
    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn skip_waiting(&self) -> bool {
        self.skip_waiting
    }

    pub fn clients_claimed(&self) -> bool {
        self.clients_claimed
    }

    pub fn set_skip_waiting(&mut self) {
        self.skip_waiting = true;
    }

    /// Move to `next` if the edge is allowed.
    pub fn transition(&mut self, next: WorkerState) -> Result<(), Error> {
        use WorkerState::*;

        let allowed = matches!(
            (self.state, next),
            (Installing, Installing)
                | (Installing, Waiting)
                | (Waiting, Activating)
                | (Activating, Activating)
                | (Activating, Active)
        ) || (next == Redundant && self.state != Redundant);

        if !allowed {
            return Err(Error::InvalidState(format!("cannot go from {} to {}", self.state, next)));
        }

        tracing::debug!(from = %self.state, to = %next, "worker state transition");
        self.state = next;
        if next == Redundant {
            self.clients_claimed = false;
        }
        Ok(())
    }

    /// Take control of open pages. Only an activating or active worker may claim.
    pub fn claim_clients(&mut self) -> Result<(), Error> {
        match self.state {
            WorkerState::Activating | WorkerState::Active => {
                self.clients_claimed = true;
                Ok(())
            }
            state => Err(Error::InvalidState(format!("cannot claim clients while {state}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut lc = Lifecycle::default();
        assert_eq!(lc.state(), WorkerState::Installing);
        lc.transition(WorkerState::Waiting).unwrap();
        lc.transition(WorkerState::Activating).unwrap();
        lc.claim_clients().unwrap();
        lc.transition(WorkerState::Active).unwrap();
        assert!(lc.clients_claimed());
    }

    #[test]
    fn test_cannot_skip_install() {
        let mut lc = Lifecycle::default();
        assert!(matches!(lc.transition(WorkerState::Active), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_cannot_claim_while_waiting() {
        let mut lc = Lifecycle::default();
        lc.transition(WorkerState::Waiting).unwrap();
        assert!(lc.claim_clients().is_err());
    }

    #[test]
    fn test_redundant_is_terminal() {
        let mut lc = Lifecycle::default();
        lc.transition(WorkerState::Waiting).unwrap();
        lc.transition(WorkerState::Redundant).unwrap();
        assert!(lc.transition(WorkerState::Activating).is_err());
        assert!(lc.transition(WorkerState::Redundant).is_err());
    }

    #[test]
    fn test_redundant_releases_clients() {
        let mut lc = Lifecycle::default();
        lc.transition(WorkerState::Waiting).unwrap();
        lc.transition(WorkerState::Activating).unwrap();
        lc.claim_clients().unwrap();
        lc.transition(WorkerState::Active).unwrap();
        lc.transition(WorkerState::Redundant).unwrap();
        assert!(!lc.clients_claimed());
    }

    #[test]
    fn test_active_cannot_reactivate() {
        let mut lc = Lifecycle::default();
        lc.transition(WorkerState::Waiting).unwrap();
        lc.transition(WorkerState::Activating).unwrap();
        lc.transition(WorkerState::Active).unwrap();
        assert!(lc.transition(WorkerState::Activating).is_err());
    }
}
