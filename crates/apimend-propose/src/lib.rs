//! apimend-propose — the proposer side of the loop's external boundary
//!
//! - [`PatchProposer`]: capability trait mapping findings to edit operations
//! - [`select_findings`]: stable top-N-by-severity selection per iteration
//! - [`LlmProposer`]: chat-completions implementation
//! - [`extract_operations`]: recover a patch from raw model output

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod extract;
pub mod llm;
pub mod proposer;
pub mod selection;

pub use error::ProposeError;
pub use extract::extract_operations;
pub use llm::{LlmConfig, LlmProposer};
pub use proposer::PatchProposer;
pub use selection::{select_findings, DEFAULT_FINDINGS_CAP};
