//! Error types for the proposer boundary

/// Failures of one proposal call
#[derive(Debug, thiserror::Error)]
pub enum ProposeError {
    /// No API key available for the hosted model
    #[error("no API key configured (set {env_var})")]
    MissingApiKey {
        /// Environment variable the key is read from
        env_var: String,
    },

    /// HTTP request failed or returned a non-success status
    #[error("proposer request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Call exceeded its deadline
    #[error("proposer timed out after {secs}s")]
    Timeout {
        /// Configured timeout
        secs: u64,
    },

    /// Model output contained no parseable patch
    #[error("invalid proposer response: {message}")]
    InvalidResponse {
        /// What was wrong with the output
        message: String,
    },

    /// Document could not be rendered into the prompt
    #[error("document error: {0}")]
    Document(#[from] apimend_document::DocumentError),
}
