//! Iteration records
//!
//! Append-only trail of what each round did. Records are never mutated once
//! written, except that a round's `score_after` is filled in when the next
//! audit observes the patched document.

use serde::Serialize;
use std::fmt::Write as _;

/// What one audit-plan-apply round did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IterationRecord {
    /// 1-based round number
    pub iteration: usize,
    /// Score the round started from
    pub score_before: u8,
    /// Score the next audit observed, when one happened
    pub score_after: Option<u8>,
    /// Findings the audit reported (before capping)
    pub findings_count: usize,
    /// Operations that applied
    pub operations_applied: usize,
    /// Operations that were skipped
    pub operations_skipped: usize,
}

/// Append-only audit trail for a run
#[derive(Debug, Clone, Default, Serialize)]
pub struct IterationTrail {
    records: Vec<IterationRecord>,
}

impl IterationTrail {
    /// Empty trail
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record
    #[inline]
    pub fn push(&mut self, record: IterationRecord) {
        self.records.push(record);
    }

    /// Records in iteration order
    #[inline]
    #[must_use]
    pub fn records(&self) -> &[IterationRecord] {
        &self.records
    }

    /// Number of completed rounds
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no round completed
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Fill in the observed score for the most recent round
    pub(crate) fn record_followup_score(&mut self, score: u8) {
        if let Some(last) = self.records.last_mut() {
            if last.score_after.is_none() {
                last.score_after = Some(score);
            }
        }
    }

    /// Human-readable run summary, one line per round
    #[must_use]
    pub fn render_summary(&self) -> String {
        if self.records.is_empty() {
            return "no iterations completed\n".to_string();
        }
        let mut out = String::new();
        for record in &self.records {
            let after = record
                .score_after
                .map_or_else(|| "?".to_string(), |s| s.to_string());
            let _ = writeln!(
                out,
                "iteration {}: score {} -> {}, findings {}, ops applied {}, skipped {}",
                record.iteration,
                record.score_before,
                after,
                record.findings_count,
                record.operations_applied,
                record.operations_skipped,
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(iteration: usize, before: u8) -> IterationRecord {
        IterationRecord {
            iteration,
            score_before: before,
            score_after: None,
            findings_count: 3,
            operations_applied: 2,
            operations_skipped: 1,
        }
    }

    #[test]
    fn trail_appends_in_order() {
        let mut trail = IterationTrail::new();
        trail.push(record(1, 65));
        trail.push(record(2, 72));
        assert_eq!(trail.len(), 2);
        assert_eq!(trail.records()[1].iteration, 2);
    }

    #[test]
    fn followup_score_fills_last_record_once() {
        let mut trail = IterationTrail::new();
        trail.push(record(1, 65));
        trail.record_followup_score(72);
        assert_eq!(trail.records()[0].score_after, Some(72));

        // already filled; a second call must not overwrite
        trail.record_followup_score(99);
        assert_eq!(trail.records()[0].score_after, Some(72));
    }

    #[test]
    fn summary_mentions_every_round() {
        let mut trail = IterationTrail::new();
        trail.push(record(1, 65));
        trail.record_followup_score(72);
        trail.push(record(2, 72));

        let summary = trail.render_summary();
        assert!(summary.contains("iteration 1: score 65 -> 72"));
        assert!(summary.contains("iteration 2: score 72 -> ?"));
    }

    #[test]
    fn empty_trail_summary() {
        assert_eq!(IterationTrail::new().render_summary(), "no iterations completed\n");
    }
}
