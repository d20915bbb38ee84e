//! Restore state machine.
//!
//! A restore runs CapturingSchema -> Swapping -> Inserting -> Done. Any
//! non-terminal phase may fail. Every other move is rejected, which keeps a
//! restore from re-entering the swap after tables were already renamed.

use std::fmt;

use crate::errors::VgError;

/// Phase of a restore
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RestorePhase {
    CapturingSchema,
    Swapping,
    Inserting,
    Done,
    Failed,
}

impl RestorePhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, RestorePhase::Done | RestorePhase::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RestorePhase::CapturingSchema => "capturing_schema",
            RestorePhase::Swapping => "swapping",
            RestorePhase::Inserting => "inserting",
            RestorePhase::Done => "done",
            RestorePhase::Failed => "failed",
        }
    }

    fn successor(self) -> Option<RestorePhase> {
        match self {
            RestorePhase::CapturingSchema => Some(RestorePhase::Swapping),
            RestorePhase::Swapping => Some(RestorePhase::Inserting),
            RestorePhase::Inserting => Some(RestorePhase::Done),
            RestorePhase::Done | RestorePhase::Failed => None,
        }
    }
}

impl fmt::Display for RestorePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check a single move between phases
pub fn transition(from: RestorePhase, to: RestorePhase) -> Result<RestorePhase, VgError> {
    let allowed = match to {
        RestorePhase::Failed => !from.is_terminal(),
        _ => from.successor() == Some(to),
    };
    if allowed {
        Ok(to)
    } else {
        Err(VgError::IllegalTransition {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

/// Tracks one restore from schema capture to its terminal phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreMachine {
    phase: RestorePhase,
    failed_in: Option<RestorePhase>,
    structure_changed: bool,
}

impl Default for RestoreMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl RestoreMachine {
    pub fn new() -> Self {
        Self {
            phase: RestorePhase::CapturingSchema,
            failed_in: None,
            structure_changed: false,
        }
    }

    pub fn phase(&self) -> RestorePhase {
        self.phase
    }

    /// Phase that was active when the restore failed
    pub fn failed_in(&self) -> Option<RestorePhase> {
        self.failed_in
    }

    /// Whether committed DDL may have moved the live tables aside
    pub fn structure_changed(&self) -> bool {
        self.structure_changed
    }

    /// Move to the next phase
    pub fn advance(&mut self) -> Result<RestorePhase, VgError> {
        let next = self.phase.successor().ok_or_else(|| VgError::IllegalTransition {
            from: self.phase.to_string(),
            to: "<none>".to_string(),
        })?;
        self.phase = transition(self.phase, next)?;
        Ok(self.phase)
    }

    /// Record that swap DDL was committed on its own
    ///
    /// Only the two-phase restore commits the swap before inserting.
    pub fn mark_structure_changed(&mut self) {
        self.structure_changed = true;
    }

    /// Move to `Failed`, remembering where
    pub fn fail(&mut self) -> Result<RestorePhase, VgError> {
        let from = self.phase;
        self.phase = transition(from, RestorePhase::Failed)?;
        self.failed_in = Some(from);
        Ok(self.phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_rejects_skips() {
        assert!(transition(RestorePhase::CapturingSchema, RestorePhase::Inserting).is_err());
        assert!(transition(RestorePhase::CapturingSchema, RestorePhase::Done).is_err());
    }

    #[test]
    fn test_transition_rejects_backwards() {
        assert!(transition(RestorePhase::Inserting, RestorePhase::Swapping).is_err());
        assert!(transition(RestorePhase::Done, RestorePhase::CapturingSchema).is_err());
    }

    #[test]
    fn test_terminal_phases_cannot_fail() {
        assert!(transition(RestorePhase::Done, RestorePhase::Failed).is_err());
        assert!(transition(RestorePhase::Failed, RestorePhase::Failed).is_err());
    }
}
