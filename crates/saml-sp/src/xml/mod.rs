//! Namespace-aware XML tree and exclusive canonicalization of its subtrees.
//!
//! Signature checks need parent/child navigation, resolved namespaces and
//! the source span of every element. The tree here is built once from
//! `quick-xml` events and is read-only afterwards; canonical bytes come
//! from `bergshamra-c14n`.

mod canonical;
mod document;

pub use canonical::{canonicalize, C14nOptions};
pub use document::{Attribute, Element, NodeId, NodeKind, XmlDocument};
