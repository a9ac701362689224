//! The convergence loop
//!
//! Orchestrates Auditor -> Patch Proposer -> Patch Applier across iterations
//! until a target score is met or the budget runs out. Strictly sequential:
//! one document, one stage at a time. Every terminal path returns the
//! best-effort document and the full iteration trail; progress from completed
//! iterations is never discarded.

use crate::config::EngineConfig;
use crate::record::{IterationRecord, IterationTrail};
use crate::state::{validate_transition, LoopState};
use apimend_audit::{AuditError, AuditReport, Auditor};
use apimend_document::Document;
use apimend_patch::apply;
use apimend_propose::{select_findings, PatchProposer};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Why the loop stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// Target score reached
    Converged,
    /// Iteration cap reached without meeting the target; a normal outcome,
    /// not an error
    BudgetExhausted,
    /// Proposer returned nothing usable; no forward progress possible
    NoProposals,
    /// Audit calls kept failing past the retry budget
    AuditUnavailable {
        /// Final audit error, rendered
        error: String,
    },
    /// Abort requested between iterations
    Cancelled,
}

impl RunStatus {
    /// True only when the target score was reached
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Converged)
    }

    /// Terminal loop state this status maps to
    #[inline]
    #[must_use]
    pub fn terminal_state(&self) -> LoopState {
        if self.is_success() {
            LoopState::Done
        } else {
            LoopState::Failed
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Converged => f.write_str("converged"),
            Self::BudgetExhausted => f.write_str("budget exhausted"),
            Self::NoProposals => f.write_str("no proposals"),
            Self::AuditUnavailable { error } => write!(f, "audit unavailable: {error}"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Everything a finished run hands back
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Why the loop stopped
    pub status: RunStatus,
    /// Most-improved document produced (the input document when no round
    /// completed)
    pub document: Document,
    /// Last score an audit observed, if any audit succeeded
    pub final_score: Option<u8>,
    /// Full iteration trail
    pub trail: IterationTrail,
}

/// Handle for aborting a run between iterations
#[derive(Debug, Clone, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    /// Fresh, un-triggered handle
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the loop stop before its next iteration
    #[inline]
    pub fn abort(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether an abort was requested
    #[inline]
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// The audit -> plan -> apply loop
#[derive(Debug)]
pub struct ConvergenceEngine<A, P> {
    auditor: A,
    proposer: P,
    config: EngineConfig,
    abort: AbortHandle,
}

impl<A: Auditor, P: PatchProposer> ConvergenceEngine<A, P> {
    /// Build an engine over the two external collaborators
    #[inline]
    #[must_use]
    pub fn new(auditor: A, proposer: P, config: EngineConfig) -> Self {
        Self {
            auditor,
            proposer,
            config,
            abort: AbortHandle::new(),
        }
    }

    /// Handle for aborting this engine's runs between iterations
    #[inline]
    #[must_use]
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run the loop to a terminal state
    ///
    /// The iteration cap is strict: an oscillating or regressing score never
    /// extends the run.
    pub async fn run(&self, document: Document) -> RunOutcome {
        let mut document = document;
        let mut trail = IterationTrail::new();
        let mut final_score = None;
        let mut completed_rounds = 0usize;
        let mut state = LoopState::Audit;

        loop {
            if self.abort.is_aborted() {
                tracing::info!("abort requested; stopping before next audit");
                return self.finish(RunStatus::Cancelled, document, final_score, trail, state);
            }

            // AUDIT
            let report = match self.audit_with_retries(&document).await {
                Ok(report) => report,
                Err(e) => {
                    tracing::error!(error = %e, "audit unavailable; ending run");
                    let status = RunStatus::AuditUnavailable {
                        error: e.to_string(),
                    };
                    return self.finish(status, document, final_score, trail, state);
                }
            };

            final_score = Some(report.score);
            trail.record_followup_score(report.score);

            if report.score >= self.config.target_score {
                tracing::info!(
                    score = report.score,
                    target = self.config.target_score,
                    "target score reached"
                );
                return self.finish(RunStatus::Converged, document, final_score, trail, state);
            }

            if completed_rounds >= self.config.max_iterations {
                tracing::warn!(
                    iterations = completed_rounds,
                    score = report.score,
                    "iteration budget exhausted below target"
                );
                return self.finish(
                    RunStatus::BudgetExhausted,
                    document,
                    final_score,
                    trail,
                    state,
                );
            }

            // PLAN
            state = self.transition(state, LoopState::Plan);
            let selected = select_findings(&report.findings, self.config.findings_cap);
            tracing::debug!(
                total = report.findings.len(),
                selected = selected.len(),
                "planning fixes"
            );

            let operations = if selected.is_empty() {
                Vec::new()
            } else {
                match self.proposer.propose(&document, &selected).await {
                    Ok(ops) => ops,
                    Err(e) => {
                        tracing::warn!(error = %e, "proposal failed; treating as empty");
                        Vec::new()
                    }
                }
            };

            if operations.is_empty() {
                tracing::warn!("no operations proposed; no forward progress possible");
                return self.finish(RunStatus::NoProposals, document, final_score, trail, state);
            }

            // APPLY
            state = self.transition(state, LoopState::Apply);
            let outcome = apply(&document, &operations);
            completed_rounds += 1;
            trail.push(IterationRecord {
                iteration: completed_rounds,
                score_before: report.score,
                score_after: None,
                findings_count: report.findings.len(),
                operations_applied: outcome.applied_count(),
                operations_skipped: outcome.skipped_count(),
            });
            tracing::info!(
                iteration = completed_rounds,
                applied = outcome.applied_count(),
                skipped = outcome.skipped_count(),
                "patch batch applied; re-auditing"
            );
            document = outcome.document;
            state = self.transition(state, LoopState::Audit);
        }
    }

    /// Audit with the configured consecutive-retry budget
    async fn audit_with_retries(&self, document: &Document) -> Result<AuditReport, AuditError> {
        let mut attempt = 0u32;
        loop {
            match self.auditor.audit(document).await {
                Ok(report) => return Ok(report),
                Err(e) if attempt < self.config.audit_retries && e.is_retryable() => {
                    attempt += 1;
                    tracing::warn!(
                        attempt,
                        retries = self.config.audit_retries,
                        error = %e,
                        "audit failed; retrying with the same document"
                    );
                    tokio::time::sleep(self.config.audit_retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn transition(&self, from: LoopState, to: LoopState) -> LoopState {
        debug_assert!(
            validate_transition(from, to).is_ok(),
            "illegal loop transition {from:?} -> {to:?}"
        );
        to
    }

    fn finish(
        &self,
        status: RunStatus,
        document: Document,
        final_score: Option<u8>,
        trail: IterationTrail,
        state: LoopState,
    ) -> RunOutcome {
        let terminal = status.terminal_state();
        debug_assert!(
            validate_transition(state, terminal).is_ok(),
            "illegal terminal transition {state:?} -> {terminal:?}"
        );
        tracing::info!(%status, iterations = trail.len(), "run finished");
        RunOutcome {
            status,
            document,
            final_score,
            trail,
        }
    }
}
