//! apimend-patch — structural edits against a document
//!
//! - [`EditOperation`]: one add/replace/remove instruction in RFC 6902 wire
//!   form
//! - [`apply`]: ordered batch application with per-operation skip records
//!
//! A skipped operation never aborts its batch; the applier keeps whatever
//! progress the valid operations made.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod apply;
pub mod op;

pub use apply::{apply, AppliedResult, ApplyStatus, PatchOutcome, SkipReason};
pub use op::{EditKind, EditOperation, OperationError};
