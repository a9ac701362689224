//! Error types for the convergence engine

use crate::state::LoopState;

/// Internal state machine violations
///
/// These indicate engine bugs, not run outcomes; failed runs still produce a
/// [`crate::engine::RunOutcome`].
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// Transition outside the loop shape
    #[error("illegal state transition: {from:?} -> {to:?}")]
    IllegalTransition {
        /// State moved from
        from: LoopState,
        /// State moved to
        to: LoopState,
    },
}
