//! apimend-audit — the auditor side of the loop's external boundary
//!
//! - [`AuditReport`] / [`Finding`]: the tool's JSON report deserialized
//! - [`Auditor`]: capability trait the convergence loop calls through
//! - [`CommandAuditor`]: stdin/stdout subprocess implementation with a
//!   timeout

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod auditor;
pub mod error;
pub mod report;

pub use auditor::{Auditor, CommandAuditor};
pub use error::AuditError;
pub use report::{AuditReport, Finding};
