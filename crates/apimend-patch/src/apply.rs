//! Batch patch application
//!
//! Operations apply independently and in order: a failed operation is
//! recorded as skipped and the rest of the batch still runs against the
//! document state as of the last successful edit. Partial progress beats
//! discarding a whole batch from a fallible proposer.

use crate::op::{EditKind, EditOperation};
use apimend_document::{DocNode, DocPath, Document, PathSegment};

/// Why a single operation did not apply
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    /// replace/remove target does not resolve
    #[error("target not found: {0}")]
    TargetNotFound(String),

    /// add parent does not resolve
    #[error("parent not found: {0}")]
    ParentNotFound(String),

    /// remove of an already-absent path (proposer-duplicate tolerance)
    #[error("target already absent: {0}")]
    AlreadyAbsent(String),

    /// sequence index beyond one-past-end
    #[error("index {index} out of bounds for sequence of length {len}")]
    IndexOutOfBounds {
        /// Requested index
        index: usize,
        /// Sequence length at apply time
        len: usize,
    },

    /// segment kind does not match the node it addresses
    #[error("cannot {op} at {path}: parent is a {kind} node")]
    TypeMismatch {
        /// Operation kind attempted
        op: EditKind,
        /// Target path
        path: String,
        /// Kind of the node that blocked the step
        kind: &'static str,
    },

    /// add/replace constructed without a value
    #[error("'{0}' operation requires a value")]
    MissingValue(EditKind),

    /// add/remove of the document root is not supported
    #[error("cannot {0} the document root")]
    RootUnsupported(EditKind),
}

/// Outcome of one operation within a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyStatus {
    /// Operation applied (including idempotent no-op adds)
    Applied,
    /// Operation skipped; the batch continued
    Skipped(SkipReason),
}

impl ApplyStatus {
    /// True when the operation applied
    #[inline]
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Per-operation record, in batch order
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedResult {
    /// Position within the batch
    pub index: usize,
    /// `kind path` summary of the operation
    pub operation: String,
    /// Applied or skipped
    pub status: ApplyStatus,
}

/// Result of applying a batch: the new document plus per-operation records
#[derive(Debug, Clone)]
pub struct PatchOutcome {
    /// Document after all applicable operations
    pub document: Document,
    /// One record per operation, in order
    pub results: Vec<AppliedResult>,
}

impl PatchOutcome {
    /// Number of operations that applied
    #[must_use]
    pub fn applied_count(&self) -> usize {
        self.results.iter().filter(|r| r.status.is_applied()).count()
    }

    /// Number of operations that were skipped
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.results.len() - self.applied_count()
    }
}

/// Apply an ordered batch of operations to a document
///
/// The input document is untouched; the outcome carries a new document.
#[must_use]
pub fn apply(document: &Document, operations: &[EditOperation]) -> PatchOutcome {
    let mut root = document.root().clone();
    let mut results = Vec::with_capacity(operations.len());

    for (index, op) in operations.iter().enumerate() {
        let status = match apply_one(&mut root, op) {
            Ok(()) => ApplyStatus::Applied,
            Err(reason) => {
                tracing::warn!(operation = %op, %reason, "operation skipped");
                ApplyStatus::Skipped(reason)
            }
        };
        results.push(AppliedResult {
            index,
            operation: op.summary(),
            status,
        });
    }

    PatchOutcome {
        document: document.with_root(root),
        results,
    }
}

fn apply_one(root: &mut DocNode, op: &EditOperation) -> Result<(), SkipReason> {
    match op.kind() {
        EditKind::Add => {
            let value = required_value(op)?;
            if op.path().is_root() {
                return Err(SkipReason::RootUnsupported(EditKind::Add));
            }
            add(root, op.path(), value)
        }
        EditKind::Replace => {
            let value = required_value(op)?;
            if op.path().is_root() {
                *root = value;
                return Ok(());
            }
            replace(root, op.path(), value)
        }
        EditKind::Remove => {
            if op.path().is_root() {
                return Err(SkipReason::RootUnsupported(EditKind::Remove));
            }
            remove(root, op.path())
        }
    }
}

fn required_value(op: &EditOperation) -> Result<DocNode, SkipReason> {
    op.value()
        .cloned()
        .ok_or(SkipReason::MissingValue(op.kind()))
}

fn add(root: &mut DocNode, path: &DocPath, value: DocNode) -> Result<(), SkipReason> {
    let parent_path = path.parent().unwrap_or_default();
    let Some(last) = path.last() else {
        return Err(SkipReason::RootUnsupported(EditKind::Add));
    };

    let parent = descend_mut(root, &parent_path)
        .ok_or_else(|| SkipReason::ParentNotFound(parent_path.to_string()))?;

    match parent {
        DocNode::Mapping(map) => {
            let key = last.as_key();
            // Re-adding an identical entry is an idempotent no-op diff
            if map.get(&key) != Some(&value) {
                map.insert(key, value);
            }
            Ok(())
        }
        DocNode::Sequence(seq) => match last {
            PathSegment::Append => {
                seq.push(value);
                Ok(())
            }
            PathSegment::Index(i) if *i <= seq.len() => {
                seq.insert(*i, value);
                Ok(())
            }
            PathSegment::Index(i) => Err(SkipReason::IndexOutOfBounds {
                index: *i,
                len: seq.len(),
            }),
            PathSegment::Key(_) => Err(SkipReason::TypeMismatch {
                op: EditKind::Add,
                path: path.to_string(),
                kind: "sequence",
            }),
        },
        scalar => Err(SkipReason::TypeMismatch {
            op: EditKind::Add,
            path: path.to_string(),
            kind: scalar.kind(),
        }),
    }
}

fn replace(root: &mut DocNode, path: &DocPath, value: DocNode) -> Result<(), SkipReason> {
    let target = descend_mut(root, path)
        .ok_or_else(|| SkipReason::TargetNotFound(path.to_string()))?;
    *target = value;
    Ok(())
}

fn remove(root: &mut DocNode, path: &DocPath) -> Result<(), SkipReason> {
    let parent_path = path.parent().unwrap_or_default();
    let Some(last) = path.last() else {
        return Err(SkipReason::RootUnsupported(EditKind::Remove));
    };

    let Some(parent) = descend_mut(root, &parent_path) else {
        // Parent gone means the target is gone too; duplicate removes across
        // iterations are tolerated as no-op skips
        return Err(SkipReason::AlreadyAbsent(path.to_string()));
    };

    match parent {
        DocNode::Mapping(map) => {
            if map.shift_remove(&last.as_key()).is_some() {
                Ok(())
            } else {
                Err(SkipReason::AlreadyAbsent(path.to_string()))
            }
        }
        DocNode::Sequence(seq) => match last.as_index() {
            Some(i) if i < seq.len() => {
                seq.remove(i);
                Ok(())
            }
            _ => Err(SkipReason::AlreadyAbsent(path.to_string())),
        },
        scalar => Err(SkipReason::TypeMismatch {
            op: EditKind::Remove,
            path: path.to_string(),
            kind: scalar.kind(),
        }),
    }
}

/// Mutable walk of `path` down from `node`
fn descend_mut<'a>(node: &'a mut DocNode, path: &DocPath) -> Option<&'a mut DocNode> {
    let mut current = node;
    for segment in path.segments() {
        current = match (current, segment) {
            (DocNode::Mapping(map), seg @ (PathSegment::Key(_) | PathSegment::Index(_))) => {
                map.get_mut(seg.as_key().as_str())?
            }
            (DocNode::Sequence(seq), PathSegment::Index(i)) => seq.get_mut(*i)?,
            _ => return None,
        };
    }
    Some(current)
}
