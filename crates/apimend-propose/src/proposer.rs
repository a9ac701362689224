//! Patch proposer capability
//!
//! The seam between the loop and whatever produces fixes. The real
//! implementation is [`crate::llm::LlmProposer`]; tests drive the loop with
//! scripted fakes instead.

use crate::error::ProposeError;
use apimend_audit::Finding;
use apimend_document::Document;
use apimend_patch::EditOperation;
use async_trait::async_trait;

/// Maps findings (plus document context) to candidate edit operations
#[async_trait]
pub trait PatchProposer: Send + Sync {
    /// Propose an ordered batch of operations for the given findings
    ///
    /// An empty batch means no forward progress is possible; the loop treats
    /// it as terminal rather than retrying forever.
    ///
    /// # Errors
    /// Returns a [`ProposeError`] when the external call fails or its output
    /// contains no parseable patch.
    async fn propose(
        &self,
        document: &Document,
        findings: &[Finding],
    ) -> Result<Vec<EditOperation>, ProposeError>;
}

#[async_trait]
impl<P: PatchProposer + ?Sized> PatchProposer for std::sync::Arc<P> {
    async fn propose(
        &self,
        document: &Document,
        findings: &[Finding],
    ) -> Result<Vec<EditOperation>, ProposeError> {
        (**self).propose(document, findings).await
    }
}
