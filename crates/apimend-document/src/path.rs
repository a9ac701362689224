//! JSON Pointer paths into a document
//!
//! Provides [`DocPath`], the address an edit operation targets. Syntax is
//! RFC 6901: segments separated by `/`, `~0`/`~1` escapes, `-` for the
//! one-past-end position of a sequence.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// One step of a [`DocPath`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Mapping key
    Key(String),
    /// Sequence index (also usable as a numeric mapping key)
    Index(usize),
    /// One-past-end of a sequence (`-` in pointer syntax); valid only as the
    /// final segment of an `add` target
    Append,
}

impl PathSegment {
    /// Key text for mapping lookups
    ///
    /// Index segments address numeric-looking mapping keys by their decimal
    /// form, matching how pointers are resolved contextually.
    #[must_use]
    pub fn as_key(&self) -> String {
        match self {
            Self::Key(k) => k.clone(),
            Self::Index(i) => i.to_string(),
            Self::Append => "-".to_string(),
        }
    }

    /// Sequence index, if this segment can address one
    #[inline]
    #[must_use]
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Index(i) => Some(*i),
            _ => None,
        }
    }
}

/// Path into a document tree
///
/// The empty path addresses the document root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DocPath(Vec<PathSegment>);

impl DocPath {
    /// Root path
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Path from explicit segments
    #[inline]
    #[must_use]
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }

    /// Segments from root to leaf
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for the root path
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Alias for [`DocPath::is_root`], matching container conventions
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parent path, or `None` at the root
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Final segment, or `None` at the root
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&PathSegment> {
        self.0.last()
    }

    /// Append a key segment, returning a new path
    #[inline]
    #[must_use]
    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut new = self.clone();
        new.0.push(PathSegment::Key(key.into()));
        new
    }

    /// Append an index segment, returning a new path
    #[inline]
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        let mut new = self.clone();
        new.0.push(PathSegment::Index(index));
        new
    }
}

fn escape(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

fn unescape(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

impl Display for DocPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for segment in &self.0 {
            match segment {
                PathSegment::Key(k) => write!(f, "/{}", escape(k))?,
                PathSegment::Index(i) => write!(f, "/{i}")?,
                PathSegment::Append => write!(f, "/-")?,
            }
        }
        Ok(())
    }
}

impl FromStr for DocPath {
    type Err = PointerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::root());
        }
        let rest = s
            .strip_prefix('/')
            .ok_or_else(|| PointerError::MissingLeadingSlash(s.to_string()))?;

        let segments = rest
            .split('/')
            .map(|token| {
                if token == "-" {
                    return PathSegment::Append;
                }
                // Digit-only tokens become indices; "01" style tokens stay
                // keys per RFC 6901 array-index rules
                let numeric = !token.is_empty()
                    && token.bytes().all(|b| b.is_ascii_digit())
                    && (token == "0" || !token.starts_with('0'));
                if numeric {
                    token
                        .parse::<usize>()
                        .map_or_else(|_| PathSegment::Key(unescape(token)), PathSegment::Index)
                } else {
                    PathSegment::Key(unescape(token))
                }
            })
            .collect();

        Ok(Self(segments))
    }
}

impl From<Vec<PathSegment>> for DocPath {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }
}

/// Errors parsing pointer syntax
#[derive(Debug, thiserror::Error)]
pub enum PointerError {
    /// Non-empty pointer must start with `/`
    #[error("pointer '{0}' must start with '/'")]
    MissingLeadingSlash(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_root() {
        let path: DocPath = "".parse().unwrap();
        assert!(path.is_root());
        assert_eq!(path.to_string(), "");
    }

    #[test]
    fn path_keys_and_indices() {
        let path: DocPath = "/paths/~1pets/get/parameters/0".parse().unwrap();
        assert_eq!(
            path.segments(),
            &[
                PathSegment::Key("paths".into()),
                PathSegment::Key("/pets".into()),
                PathSegment::Key("get".into()),
                PathSegment::Key("parameters".into()),
                PathSegment::Index(0),
            ]
        );
    }

    #[test]
    fn path_append_token() {
        let path: DocPath = "/security/-".parse().unwrap();
        assert_eq!(path.last(), Some(&PathSegment::Append));
    }

    #[test]
    fn path_leading_zero_is_key() {
        let path: DocPath = "/a/01".parse().unwrap();
        assert_eq!(path.last(), Some(&PathSegment::Key("01".into())));
    }

    #[test]
    fn path_missing_slash_rejected() {
        let result: Result<DocPath, _> = "security".parse();
        assert!(matches!(result, Err(PointerError::MissingLeadingSlash(_))));
    }

    #[test]
    fn path_display_round_trip() {
        for pointer in ["", "/security", "/paths/~1pets~0x/get", "/items/3/-"] {
            let path: DocPath = pointer.parse().unwrap();
            assert_eq!(path.to_string(), pointer);
        }
    }

    #[test]
    fn path_parent_and_last() {
        let path: DocPath = "/components/securitySchemes".parse().unwrap();
        let parent = path.parent().unwrap();
        assert_eq!(parent.to_string(), "/components");
        assert_eq!(path.last().unwrap().as_key(), "securitySchemes");
        assert!(DocPath::root().parent().is_none());
    }

    #[test]
    fn path_builders() {
        let path = DocPath::root().key("paths").key("/pets").index(2);
        assert_eq!(path.to_string(), "/paths/~1pets/2");
    }

    #[test]
    fn path_empty_segment_is_empty_key() {
        // "/" addresses the "" key at the root, per RFC 6901
        let path: DocPath = "/".parse().unwrap();
        assert_eq!(path.segments(), &[PathSegment::Key(String::new())]);
    }
}
