//! Edit operations
//!
//! Provides [`EditOperation`], one structural change addressed by a
//! [`DocPath`]. The wire form is the RFC 6902 object the proposer emits:
//! `{"op": "add", "path": "/security", "value": [...]}`.

use apimend_document::{DocNode, DocPath};
use serde::de::{self, Deserializer};
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Kind of structural change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditKind {
    /// Insert (or overwrite, for mapping parents) at the target path
    Add,
    /// Replace an existing node
    Replace,
    /// Remove an existing node
    Remove,
}

impl EditKind {
    /// Wire name (`op` field)
    #[inline]
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Replace => "replace",
            Self::Remove => "remove",
        }
    }

    /// Whether this kind carries a value payload
    #[inline]
    #[must_use]
    pub fn takes_value(self) -> bool {
        matches!(self, Self::Add | Self::Replace)
    }
}

impl Display for EditKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EditKind {
    type Err = OperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(Self::Add),
            "replace" => Ok(Self::Replace),
            "remove" => Ok(Self::Remove),
            other => Err(OperationError::UnknownKind(other.to_string())),
        }
    }
}

/// One structural add/replace/remove instruction against a document path
///
/// # Invariants
/// - `add`/`replace` carry a value; `remove` does not
/// - Batches are ordered: later operations observe earlier effects
#[derive(Debug, Clone, PartialEq)]
pub struct EditOperation {
    kind: EditKind,
    path: DocPath,
    value: Option<DocNode>,
}

impl EditOperation {
    /// Add `value` at `path`
    #[inline]
    #[must_use]
    pub fn add(path: DocPath, value: DocNode) -> Self {
        Self {
            kind: EditKind::Add,
            path,
            value: Some(value),
        }
    }

    /// Replace the node at `path` with `value`
    #[inline]
    #[must_use]
    pub fn replace(path: DocPath, value: DocNode) -> Self {
        Self {
            kind: EditKind::Replace,
            path,
            value: Some(value),
        }
    }

    /// Remove the node at `path`
    #[inline]
    #[must_use]
    pub fn remove(path: DocPath) -> Self {
        Self {
            kind: EditKind::Remove,
            path,
            value: None,
        }
    }

    /// Operation kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> EditKind {
        self.kind
    }

    /// Target path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &DocPath {
        &self.path
    }

    /// Value payload, present for add/replace
    #[inline]
    #[must_use]
    pub fn value(&self) -> Option<&DocNode> {
        self.value.as_ref()
    }

    /// Short description for logs and iteration records
    #[must_use]
    pub fn summary(&self) -> String {
        format!("{} {}", self.kind, self.path)
    }
}

impl Display for EditOperation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

/// Errors constructing an operation from its wire form
#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    /// `op` field names no supported kind (`move`, `copy`, `test` included)
    #[error("unknown operation kind: {0}")]
    UnknownKind(String),

    /// add/replace missing their `value`
    #[error("'{0}' operation requires a value")]
    MissingValue(EditKind),

    /// `path` field is not pointer syntax
    #[error("invalid path: {0}")]
    InvalidPath(#[from] apimend_document::PointerError),
}

#[derive(Deserialize)]
struct RawOperation {
    op: String,
    path: String,
    #[serde(default)]
    value: Option<DocNode>,
}

impl TryFrom<RawOperation> for EditOperation {
    type Error = OperationError;

    fn try_from(raw: RawOperation) -> Result<Self, Self::Error> {
        let kind = raw.op.parse::<EditKind>()?;
        let path = raw.path.parse::<DocPath>()?;
        let value = raw.value;
        if kind.takes_value() && value.is_none() {
            return Err(OperationError::MissingValue(kind));
        }
        Ok(Self { kind, path, value })
    }
}

impl<'de> Deserialize<'de> for EditOperation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawOperation::deserialize(deserializer)?;
        Self::try_from(raw).map_err(de::Error::custom)
    }
}

impl Serialize for EditOperation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = if self.value.is_some() { 3 } else { 2 };
        let mut state = serializer.serialize_struct("EditOperation", fields)?;
        state.serialize_field("op", self.kind.name())?;
        state.serialize_field("path", &self.path.to_string())?;
        if let Some(value) = &self.value {
            state.serialize_field("value", value)?;
        }
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_add() {
        let op: EditOperation =
            serde_json::from_str(r#"{"op": "add", "path": "/security", "value": []}"#).unwrap();
        assert_eq!(op.kind(), EditKind::Add);
        assert_eq!(op.path().to_string(), "/security");
        assert_eq!(op.value(), Some(&DocNode::sequence()));
    }

    #[test]
    fn deserialize_remove_without_value() {
        let op: EditOperation =
            serde_json::from_str(r#"{"op": "remove", "path": "/paths/~1pets"}"#).unwrap();
        assert_eq!(op.kind(), EditKind::Remove);
        assert!(op.value().is_none());
    }

    #[test]
    fn deserialize_unknown_kind_fails() {
        let result: Result<EditOperation, _> =
            serde_json::from_str(r#"{"op": "move", "path": "/a", "value": 1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn deserialize_add_without_value_fails() {
        let result: Result<EditOperation, _> =
            serde_json::from_str(r#"{"op": "add", "path": "/a"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn deserialize_bad_path_fails() {
        let result: Result<EditOperation, _> =
            serde_json::from_str(r#"{"op": "remove", "path": "no-slash"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn serialize_wire_form() {
        let op = EditOperation::add("/security".parse().unwrap(), DocNode::sequence());
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"op": "add", "path": "/security", "value": []})
        );
    }

    #[test]
    fn summary_reads_as_kind_and_path() {
        let op = EditOperation::remove("/components/schemas/Pet".parse().unwrap());
        assert_eq!(op.summary(), "remove /components/schemas/Pet");
    }
}
