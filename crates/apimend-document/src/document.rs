//! Parsed specification documents
//!
//! A [`Document`] is an immutable value: every mutation in the patch layer
//! produces a new `Document`, leaving the prior one intact for rollback.

use crate::error::DocumentError;
use crate::node::DocNode;
use crate::path::{DocPath, PathSegment};

/// Textual format a document was read from and will be written back to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocFormat {
    /// YAML (the common OpenAPI authoring format)
    Yaml,
    /// JSON
    Json,
}

impl DocFormat {
    /// Format name for error messages and file naming
    #[inline]
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
        }
    }

    /// Detect format from text: a leading `{` means JSON, anything else YAML
    ///
    /// Matches the original pipeline's rule, which is good enough because
    /// every OpenAPI document is a top-level mapping.
    #[must_use]
    pub fn detect(text: &str) -> Self {
        if text.trim_start().starts_with('{') {
            Self::Json
        } else {
            Self::Yaml
        }
    }

    /// Guess from a file extension, falling back to content detection
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// In-memory form of the specification under improvement
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: DocNode,
    format: DocFormat,
}

impl Document {
    /// Wrap an already-built tree
    #[inline]
    #[must_use]
    pub fn new(root: DocNode, format: DocFormat) -> Self {
        Self { root, format }
    }

    /// Parse text in an explicit format
    ///
    /// # Errors
    /// Returns [`DocumentError::Parse`] when the text is malformed.
    pub fn parse(text: &str, format: DocFormat) -> Result<Self, DocumentError> {
        let root = match format {
            DocFormat::Yaml => {
                serde_yaml::from_str(text).map_err(|e| DocumentError::Parse {
                    format: "yaml",
                    message: e.to_string(),
                })?
            }
            DocFormat::Json => {
                serde_json::from_str(text).map_err(|e| DocumentError::Parse {
                    format: "json",
                    message: e.to_string(),
                })?
            }
        };
        Ok(Self { root, format })
    }

    /// Parse text, detecting the format first
    ///
    /// # Errors
    /// Returns [`DocumentError::Parse`] when the text is malformed.
    pub fn parse_detect(text: &str) -> Result<Self, DocumentError> {
        Self::parse(text, DocFormat::detect(text))
    }

    /// Render back to text in the source format
    ///
    /// # Errors
    /// Returns [`DocumentError::Serialize`] when rendering fails.
    pub fn serialize(&self) -> Result<String, DocumentError> {
        self.serialize_as(self.format)
    }

    /// Render to text in an explicit format
    ///
    /// # Errors
    /// Returns [`DocumentError::Serialize`] when rendering fails.
    pub fn serialize_as(&self, format: DocFormat) -> Result<String, DocumentError> {
        match format {
            DocFormat::Yaml => serde_yaml::to_string(&self.root).map_err(|e| {
                DocumentError::Serialize {
                    format: "yaml",
                    message: e.to_string(),
                }
            }),
            DocFormat::Json => serde_json::to_string_pretty(&self.root).map_err(|e| {
                DocumentError::Serialize {
                    format: "json",
                    message: e.to_string(),
                }
            }),
        }
    }

    /// Root node
    #[inline]
    #[must_use]
    pub fn root(&self) -> &DocNode {
        &self.root
    }

    /// Source format
    #[inline]
    #[must_use]
    pub fn format(&self) -> DocFormat {
        self.format
    }

    /// New document with a replaced root, keeping the source format
    #[inline]
    #[must_use]
    pub fn with_root(&self, root: DocNode) -> Self {
        Self {
            root,
            format: self.format,
        }
    }

    /// Consume into the root node
    #[inline]
    #[must_use]
    pub fn into_root(self) -> DocNode {
        self.root
    }

    /// Resolve a path to the node it addresses
    ///
    /// Index segments address sequences by position and mappings by their
    /// decimal key form; `-` never resolves (it names a position that does
    /// not exist yet).
    ///
    /// # Errors
    /// Returns [`DocumentError::PathNotFound`] when any step misses.
    pub fn resolve(&self, path: &DocPath) -> Result<&DocNode, DocumentError> {
        resolve_in(&self.root, path).ok_or_else(|| DocumentError::PathNotFound {
            path: path.to_string(),
        })
    }

    /// Whether a path currently resolves
    #[inline]
    #[must_use]
    pub fn contains(&self, path: &DocPath) -> bool {
        resolve_in(&self.root, path).is_some()
    }
}

/// Walk `path` down from `node`
pub(crate) fn resolve_in<'a>(node: &'a DocNode, path: &DocPath) -> Option<&'a DocNode> {
    let mut current = node;
    for segment in path.segments() {
        current = step(current, segment)?;
    }
    Some(current)
}

pub(crate) fn step<'a>(node: &'a DocNode, segment: &PathSegment) -> Option<&'a DocNode> {
    match (node, segment) {
        (DocNode::Mapping(map), seg @ (PathSegment::Key(_) | PathSegment::Index(_))) => {
            map.get(seg.as_key().as_str())
        }
        (DocNode::Sequence(seq), PathSegment::Index(i)) => seq.get(*i),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    const PETSTORE_YAML: &str = r#"openapi: 3.0.0
info:
  title: Petstore
  version: 1.0.0
paths:
  /pets:
    get:
      responses:
        '200':
          description: ok
"#;

    #[test]
    fn detect_json_vs_yaml() {
        assert_eq!(DocFormat::detect("{\"a\": 1}"), DocFormat::Json);
        assert_eq!(DocFormat::detect("  {\"a\": 1}"), DocFormat::Json);
        assert_eq!(DocFormat::detect("a: 1"), DocFormat::Yaml);
    }

    #[test]
    fn parse_yaml_document() {
        let doc = Document::parse(PETSTORE_YAML, DocFormat::Yaml).unwrap();
        assert_eq!(doc.format(), DocFormat::Yaml);
        assert_eq!(
            doc.root()
                .get("info")
                .and_then(|i| i.get("title"))
                .and_then(DocNode::as_str),
            Some("Petstore")
        );
    }

    #[test]
    fn parse_malformed_fails() {
        let result = Document::parse("{not json", DocFormat::Json);
        assert!(matches!(result, Err(DocumentError::Parse { format: "json", .. })));

        let result = Document::parse(": [", DocFormat::Yaml);
        assert!(matches!(result, Err(DocumentError::Parse { format: "yaml", .. })));
    }

    #[test]
    fn round_trip_yaml_structural_equality() {
        let doc = Document::parse(PETSTORE_YAML, DocFormat::Yaml).unwrap();
        let text = doc.serialize().unwrap();
        let again = Document::parse(&text, DocFormat::Yaml).unwrap();
        assert_eq!(doc.root(), again.root());
    }

    #[test]
    fn round_trip_json_structural_equality() {
        let text = r#"{"openapi": "3.0.0", "paths": {"/pets": {"get": {"summary": "list"}}}}"#;
        let doc = Document::parse(text, DocFormat::Json).unwrap();
        let rendered = doc.serialize().unwrap();
        let again = Document::parse(&rendered, DocFormat::Json).unwrap();
        assert_eq!(doc.root(), again.root());
    }

    #[test]
    fn resolve_paths() {
        let doc = Document::parse(PETSTORE_YAML, DocFormat::Yaml).unwrap();

        let path = DocPath::from_str("/paths/~1pets/get/responses/200/description").unwrap();
        assert_eq!(doc.resolve(&path).unwrap().as_str(), Some("ok"));

        let missing = DocPath::from_str("/paths/~1dogs").unwrap();
        assert!(matches!(
            doc.resolve(&missing),
            Err(DocumentError::PathNotFound { .. })
        ));
    }

    #[test]
    fn resolve_root_is_whole_document() {
        let doc = Document::parse(PETSTORE_YAML, DocFormat::Yaml).unwrap();
        assert_eq!(doc.resolve(&DocPath::root()).unwrap(), doc.root());
    }

    #[test]
    fn resolve_index_into_sequence() {
        let doc = Document::parse("tags:\n  - pets\n  - store\n", DocFormat::Yaml).unwrap();
        let path = DocPath::from_str("/tags/1").unwrap();
        assert_eq!(doc.resolve(&path).unwrap().as_str(), Some("store"));

        let out_of_bounds = DocPath::from_str("/tags/5").unwrap();
        assert!(doc.resolve(&out_of_bounds).is_err());
    }

    #[test]
    fn resolve_numeric_key_in_mapping() {
        // Pointer /responses/200 must reach a "200" mapping key
        let doc = Document::parse("responses:\n  '200':\n    ok: true\n", DocFormat::Yaml).unwrap();
        let path = DocPath::from_str("/responses/200/ok").unwrap();
        assert_eq!(doc.resolve(&path).unwrap(), &DocNode::Bool(true));
    }

    #[test]
    fn with_root_preserves_format() {
        let doc = Document::parse("{}", DocFormat::Json).unwrap();
        let updated = doc.with_root(DocNode::from("replaced"));
        assert_eq!(updated.format(), DocFormat::Json);
        assert_eq!(updated.root().as_str(), Some("replaced"));
        // original untouched
        assert_eq!(doc.root(), &DocNode::mapping());
    }
}
