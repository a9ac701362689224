//! Engine configuration

use apimend_propose::DEFAULT_FINDINGS_CAP;
use std::time::Duration;

/// Settings for one convergence run
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Score at which the document is considered done (0-100)
    pub target_score: u8,
    /// Hard cap on audit-plan-apply rounds; guarantees termination even when
    /// the score oscillates
    pub max_iterations: usize,
    /// Findings acted on per iteration
    pub findings_cap: usize,
    /// Consecutive retries of a failed audit call before giving up
    pub audit_retries: u32,
    /// Pause between audit retries
    pub audit_retry_delay: Duration,
}

impl EngineConfig {
    /// Default configuration (target 90, 10 rounds, top 3 findings)
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the target score (clamped to 100)
    #[inline]
    #[must_use]
    pub fn with_target_score(mut self, score: u8) -> Self {
        self.target_score = score.min(100);
        self
    }

    /// Override the iteration budget
    #[inline]
    #[must_use]
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// Override the findings cap
    #[inline]
    #[must_use]
    pub fn with_findings_cap(mut self, cap: usize) -> Self {
        self.findings_cap = cap;
        self
    }

    /// Override the audit retry budget
    #[inline]
    #[must_use]
    pub fn with_audit_retries(mut self, retries: u32) -> Self {
        self.audit_retries = retries;
        self
    }

    /// Override the audit retry delay
    #[inline]
    #[must_use]
    pub fn with_audit_retry_delay(mut self, delay: Duration) -> Self {
        self.audit_retry_delay = delay;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            target_score: 90,
            max_iterations: 10,
            findings_cap: DEFAULT_FINDINGS_CAP,
            audit_retries: 2,
            audit_retry_delay: Duration::from_secs(2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_pipeline() {
        let config = EngineConfig::new();
        assert_eq!(config.target_score, 90);
        assert_eq!(config.findings_cap, 3);
        assert_eq!(config.max_iterations, 10);
    }

    #[test]
    fn builder_overrides() {
        let config = EngineConfig::new()
            .with_target_score(80)
            .with_max_iterations(2)
            .with_findings_cap(5)
            .with_audit_retries(0);
        assert_eq!(config.target_score, 80);
        assert_eq!(config.max_iterations, 2);
        assert_eq!(config.findings_cap, 5);
        assert_eq!(config.audit_retries, 0);
    }

    #[test]
    fn target_score_clamps() {
        let config = EngineConfig::new().with_target_score(255);
        assert_eq!(config.target_score, 100);
    }
}
