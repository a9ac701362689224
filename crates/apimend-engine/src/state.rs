//! Loop state machine
//!
//! The convergence loop moves AUDIT -> PLAN -> APPLY -> AUDIT until it lands
//! in a terminal state. Transitions outside this shape are bugs; the engine
//! guards every move through [`validate_transition`].

use crate::error::StateError;

/// States of the convergence loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopState {
    /// Scoring the current document
    Audit,
    /// Selecting findings and requesting a patch
    Plan,
    /// Applying the proposed batch
    Apply,
    /// Target score reached
    Done,
    /// Budget exhausted or no forward progress possible
    Failed,
}

impl LoopState {
    /// Terminal states end the loop
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// States reachable from `from`
#[must_use]
pub fn allowed_transitions(from: LoopState) -> Vec<LoopState> {
    use LoopState::{Apply, Audit, Done, Failed, Plan};
    match from {
        Audit => vec![Plan, Done, Failed],
        Plan => vec![Apply, Failed],
        Apply => vec![Audit, Failed],
        Done | Failed => vec![],
    }
}

/// Validate a state transition
///
/// # Errors
/// Returns [`StateError::IllegalTransition`] for moves outside the loop
/// shape.
pub fn validate_transition(from: LoopState, to: LoopState) -> Result<(), StateError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(StateError::IllegalTransition { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loop_shape_is_closed() {
        assert!(validate_transition(LoopState::Audit, LoopState::Plan).is_ok());
        assert!(validate_transition(LoopState::Plan, LoopState::Apply).is_ok());
        assert!(validate_transition(LoopState::Apply, LoopState::Audit).is_ok());
    }

    #[test]
    fn audit_can_terminate_either_way() {
        assert!(validate_transition(LoopState::Audit, LoopState::Done).is_ok());
        assert!(validate_transition(LoopState::Audit, LoopState::Failed).is_ok());
    }

    #[test]
    fn plan_cannot_succeed_directly() {
        assert!(matches!(
            validate_transition(LoopState::Plan, LoopState::Done),
            Err(StateError::IllegalTransition { .. })
        ));
    }

    #[test]
    fn terminal_states_have_no_exits() {
        assert!(allowed_transitions(LoopState::Done).is_empty());
        assert!(allowed_transitions(LoopState::Failed).is_empty());
        assert!(LoopState::Done.is_terminal());
        assert!(LoopState::Failed.is_terminal());
        assert!(!LoopState::Audit.is_terminal());
    }

    #[test]
    fn apply_cannot_skip_audit() {
        assert!(validate_transition(LoopState::Apply, LoopState::Plan).is_err());
        assert!(validate_transition(LoopState::Apply, LoopState::Done).is_err());
    }
}
