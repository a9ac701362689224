//! apimend-document — order-preserving specification trees
//!
//! The document model the rest of the pipeline operates on:
//! - [`DocNode`]: tagged union of mapping/sequence/scalar nodes
//! - [`DocPath`]: RFC 6901 pointer into a tree
//! - [`Document`]: immutable parsed document with YAML/JSON round-trips
//!
//! # Example
//!
//! ```rust
//! use apimend_document::{DocFormat, DocPath, Document};
//! use std::str::FromStr;
//!
//! let doc = Document::parse("info:\n  title: Petstore\n", DocFormat::Yaml)?;
//! let title = doc.resolve(&DocPath::from_str("/info/title")?)?;
//! assert_eq!(title.as_str(), Some("Petstore"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod document;
pub mod error;
pub mod node;
pub mod path;

pub use document::{DocFormat, Document};
pub use error::DocumentError;
pub use node::DocNode;
pub use path::{DocPath, PathSegment, PointerError};
