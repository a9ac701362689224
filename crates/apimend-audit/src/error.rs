//! Error types for the auditor boundary

/// Failures of one external audit call
///
/// All variants describe a failed call, not a security finding; the loop
/// treats them as transient and retries with the same document.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// Audit command could not be started
    #[error("failed to spawn audit command '{program}': {source}")]
    Spawn {
        /// Program that failed to start
        program: String,
        /// OS-level cause
        #[source]
        source: std::io::Error,
    },

    /// Audit command exited non-zero
    #[error("audit command exited with status {status}: {stderr}")]
    NonZeroExit {
        /// Exit code (-1 when killed by signal)
        status: i32,
        /// Captured stderr
        stderr: String,
    },

    /// Report on stdout was not the expected JSON shape
    #[error("malformed audit report: {message}")]
    MalformedReport {
        /// Decode failure detail
        message: String,
    },

    /// Call exceeded its deadline
    #[error("audit timed out after {secs}s")]
    Timeout {
        /// Configured timeout
        secs: u64,
    },

    /// I/O failure talking to the audit process
    #[error("audit i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl AuditError {
    /// Whether the loop should retry this failure with the same document
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        // Spawn failures (missing binary) won't fix themselves mid-run
        !matches!(self, Self::Spawn { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_failures_are_not_retryable() {
        let err = AuditError::Spawn {
            program: "42c-audit".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn timeouts_are_retryable() {
        assert!(AuditError::Timeout { secs: 120 }.is_retryable());
        assert!(AuditError::NonZeroExit {
            status: 1,
            stderr: String::new()
        }
        .is_retryable());
    }
}
