//! Finding selection
//!
//! Each iteration acts on at most `cap` findings to bound proposer cost and
//! patch-batch size. Selection is top-N by descending severity; equal
//! severities keep their input order (stable sort), so the tool's own
//! ordering is the tie-break.

use apimend_audit::Finding;

/// Default findings cap per iteration (the original acts on the top 3)
pub const DEFAULT_FINDINGS_CAP: usize = 3;

/// Pick the findings to act on this iteration
#[must_use]
pub fn select_findings(findings: &[Finding], cap: usize) -> Vec<Finding> {
    let mut ranked: Vec<&Finding> = findings.iter().collect();
    // sort_by_key is stable: ties stay in input order
    ranked.sort_by_key(|f| std::cmp::Reverse(f.severity));
    ranked.into_iter().take(cap).cloned().collect()
}
