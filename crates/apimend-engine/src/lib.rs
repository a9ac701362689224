//! Convergence engine for iterative document improvement
//!
//! Drives the audit-plan-apply loop over a document until a target score is
//! met, the iteration budget runs out, or no forward progress is possible.
//! The two external collaborators are injected through the [`Auditor`] and
//! [`PatchProposer`] traits, so the loop itself stays deterministic and
//! fully testable with scripted fakes.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod engine;
pub mod error;
pub mod record;
pub mod state;

pub use config::EngineConfig;
pub use engine::{AbortHandle, ConvergenceEngine, RunOutcome, RunStatus};
pub use error::StateError;
pub use record::{IterationRecord, IterationTrail};
pub use state::{allowed_transitions, validate_transition, LoopState};

pub use apimend_audit::Auditor;
pub use apimend_propose::PatchProposer;
