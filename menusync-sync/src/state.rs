//! Lifecycle state of a reconciliation operation

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SyncError};

/// Operation state machine
///
/// `Queued -> Running -> Finished | Canceled`, plus `Queued -> Canceled` for
/// operations canceled before they start. `Finished` and `Canceled` are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationState {
    Queued,
    Running,
    Finished,
    Canceled,
}

impl OperationState {
    pub fn is_terminal(self) -> bool {
        matches!(self, OperationState::Finished | OperationState::Canceled)
    }

    pub fn can_transition_to(self, next: OperationState) -> bool {
        use OperationState::*;
        matches!(
            (self, next),
            (Queued, Running) | (Queued, Canceled) | (Running, Finished) | (Running, Canceled)
        )
    }

    /// Move to `next`, rejecting illegal transitions
    pub fn transition(&mut self, next: OperationState) -> Result<()> {
        if !self.can_transition_to(next) {
            return Err(SyncError::InvalidStateTransition {
                from: format!("{:?}", self),
                to: format!("{:?}", next),
            });
        }
        *self = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_transitions() {
        let mut state = OperationState::Queued;
        state.transition(OperationState::Running).unwrap();
        state.transition(OperationState::Finished).unwrap();
        assert!(state.is_terminal());
    }

    #[test]
    fn test_cancel_before_start() {
        let mut state = OperationState::Queued;
        state.transition(OperationState::Canceled).unwrap();
        assert!(state.is_terminal());
    }

    #[test]
    fn test_terminal_states_are_final() {
        let mut finished = OperationState::Finished;
        assert!(finished.transition(OperationState::Canceled).is_err());
        assert_eq!(finished, OperationState::Finished);

        let mut canceled = OperationState::Canceled;
        assert!(canceled.transition(OperationState::Running).is_err());
    }

    #[test]
    fn test_cannot_skip_running() {
        let mut state = OperationState::Queued;
        assert!(matches!(
            state.transition(OperationState::Finished),
            Err(SyncError::InvalidStateTransition { .. })
        ));
    }
}
