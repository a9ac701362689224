//! Error types for the document model

use crate::path::PointerError;

/// Errors from parsing, serializing, and resolving documents
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// Input text is not valid in the requested format
    #[error("parse error ({format}): {message}")]
    Parse {
        /// Format the parse was attempted in
        format: &'static str,
        /// Underlying parser message
        message: String,
    },

    /// Tree could not be rendered back to text
    #[error("serialize error ({format}): {message}")]
    Serialize {
        /// Format the render was attempted in
        format: &'static str,
        /// Underlying serializer message
        message: String,
    },

    /// Path does not resolve to a node
    #[error("path not found: {path}")]
    PathNotFound {
        /// Pointer form of the failing path
        path: String,
    },

    /// Pointer text was not valid RFC 6901 syntax
    #[error("invalid pointer: {0}")]
    InvalidPointer(#[from] PointerError),
}
