//! Tree-of-variant document nodes
//!
//! Provides [`DocNode`], the tagged union an API specification is held in
//! between parse and serialize. Mappings preserve insertion order so a
//! round-trip keeps keys where the author put them.

use indexmap::IndexMap;
use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single node in a parsed document
///
/// # Invariants
/// - Mapping keys are unique and keep insertion order
/// - Scalars are the only leaves; `Null` is a value, not an absence
#[derive(Debug, Clone, PartialEq)]
pub enum DocNode {
    /// Explicit null
    Null,
    /// Boolean scalar
    Bool(bool),
    /// Integer scalar
    Int(i64),
    /// Floating point scalar
    Float(f64),
    /// String scalar
    String(String),
    /// Ordered sequence of nodes
    Sequence(Vec<DocNode>),
    /// Order-preserving mapping of string keys to nodes
    Mapping(IndexMap<String, DocNode>),
}

impl DocNode {
    /// Empty mapping node
    #[inline]
    #[must_use]
    pub fn mapping() -> Self {
        Self::Mapping(IndexMap::new())
    }

    /// Empty sequence node
    #[inline]
    #[must_use]
    pub fn sequence() -> Self {
        Self::Sequence(Vec::new())
    }

    /// Check for `Null`
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Check for a scalar (non-container) node
    #[inline]
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Self::Sequence(_) | Self::Mapping(_))
    }

    /// Mapping view, if this node is a mapping
    #[inline]
    #[must_use]
    pub fn as_mapping(&self) -> Option<&IndexMap<String, DocNode>> {
        match self {
            Self::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Mutable mapping view
    #[inline]
    #[must_use]
    pub fn as_mapping_mut(&mut self) -> Option<&mut IndexMap<String, DocNode>> {
        match self {
            Self::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Sequence view, if this node is a sequence
    #[inline]
    #[must_use]
    pub fn as_sequence(&self) -> Option<&[DocNode]> {
        match self {
            Self::Sequence(seq) => Some(seq),
            _ => None,
        }
    }

    /// Mutable sequence view
    #[inline]
    #[must_use]
    pub fn as_sequence_mut(&mut self) -> Option<&mut Vec<DocNode>> {
        match self {
            Self::Sequence(seq) => Some(seq),
            _ => None,
        }
    }

    /// String view, if this node is a string scalar
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view, if this node is an integer scalar
    #[inline]
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Child by mapping key
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&DocNode> {
        self.as_mapping().and_then(|map| map.get(key))
    }

    /// Child by sequence index
    #[inline]
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<&DocNode> {
        self.as_sequence().and_then(|seq| seq.get(index))
    }

    /// Short human-readable kind name (used in skip reasons)
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) | Self::Float(_) => "number",
            Self::String(_) => "string",
            Self::Sequence(_) => "sequence",
            Self::Mapping(_) => "mapping",
        }
    }
}

impl From<&str> for DocNode {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<i64> for DocNode {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<bool> for DocNode {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl Serialize for DocNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::String(s) => serializer.serialize_str(s),
            Self::Sequence(seq) => {
                let mut state = serializer.serialize_seq(Some(seq.len()))?;
                for node in seq {
                    state.serialize_element(node)?;
                }
                state.end()
            }
            Self::Mapping(map) => {
                let mut state = serializer.serialize_map(Some(map.len()))?;
                for (key, node) in map {
                    state.serialize_entry(key, node)?;
                }
                state.end()
            }
        }
    }
}

/// Mapping key that tolerates non-string scalars
///
/// YAML allows unquoted numeric keys (`200:` under `responses`); those are
/// folded to their decimal string form so the tree stays string-keyed.
struct MapKey(String);

impl<'de> Deserialize<'de> for MapKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeyVisitor;

        impl Visitor<'_> for KeyVisitor {
            type Value = MapKey;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a scalar mapping key")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<MapKey, E> {
                Ok(MapKey(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<MapKey, E> {
                Ok(MapKey(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<MapKey, E> {
                Ok(MapKey(v.to_string()))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<MapKey, E> {
                Ok(MapKey(v.to_string()))
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<MapKey, E> {
                Ok(MapKey(v.to_string()))
            }
        }

        deserializer.deserialize_any(KeyVisitor)
    }
}

impl<'de> Deserialize<'de> for DocNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct NodeVisitor;

        impl<'de> Visitor<'de> for NodeVisitor {
            type Value = DocNode;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a document node")
            }

            fn visit_unit<E: de::Error>(self) -> Result<DocNode, E> {
                Ok(DocNode::Null)
            }

            fn visit_none<E: de::Error>(self) -> Result<DocNode, E> {
                Ok(DocNode::Null)
            }

            fn visit_some<D2: Deserializer<'de>>(self, d: D2) -> Result<DocNode, D2::Error> {
                DocNode::deserialize(d)
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<DocNode, E> {
                Ok(DocNode::Bool(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<DocNode, E> {
                Ok(DocNode::Int(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<DocNode, E> {
                // Values above i64::MAX fall back to float rather than failing
                i64::try_from(v).map_or(Ok(DocNode::Float(v as f64)), |i| Ok(DocNode::Int(i)))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<DocNode, E> {
                Ok(DocNode::Float(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<DocNode, E> {
                Ok(DocNode::String(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<DocNode, E> {
                Ok(DocNode::String(v))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<DocNode, A::Error> {
                let mut nodes = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(node) = seq.next_element()? {
                    nodes.push(node);
                }
                Ok(DocNode::Sequence(nodes))
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<DocNode, A::Error> {
                let mut map = IndexMap::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((MapKey(key), value)) = access.next_entry()? {
                    map.insert(key, value);
                }
                Ok(DocNode::Mapping(map))
            }
        }

        deserializer.deserialize_any(NodeVisitor)
    }
}
