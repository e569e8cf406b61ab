//! Core of a standards-conforming DOM engine.
//!
//! This crate implements the in-memory tree model and the algorithms that
//! maintain its invariants under mutation, following the WHATWG DOM Living
//! Standard: node identity and ownership, tree validity, insertion/removal/
//! replacement/cloning, event dispatch through the propagation path, ranges
//! and live collections, and the abort-signal composition graph.
//!
//! Out of scope: HTML/XML parsing, CSS selector matching beyond the
//! `matches(selector)` contract, script execution and custom-element
//! upgrades, JavaScript host bindings.

pub mod abort;
pub mod error;
pub mod event;
pub mod event_target;
pub mod live_collections;
pub mod mutation_ops;
pub mod node;
pub mod range;
pub mod string_pool;
pub mod traversal;
pub mod validation;

pub use error::{DomException, ErrorName};
pub use node::{Node, NodeData, NodeKind, NodeRef};

/// A namespace URI recognized by this engine.
///
/// SPECLINK: <https://dom.spec.whatwg.org/#concept-namespace>
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub enum Namespace {
    Html,
    MathMl,
    Svg,
    XLink,
    Xml,
    XmlNs,
}

impl Namespace {
    pub fn uri(&self) -> &'static str {
        match self {
            Namespace::Html => "http://www.w3.org/1999/xhtml",
            Namespace::MathMl => "http://www.w3.org/1998/Math/MathML",
            Namespace::Svg => "http://www.w3.org/2000/svg",
            Namespace::XLink => "http://www.w3.org/1999/xlink",
            Namespace::Xml => "http://www.w3.org/XML/1998/namespace",
            Namespace::XmlNs => "http://www.w3.org/2000/xmlns/",
        }
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.uri())
    }
}

/// A namespace-qualified name, interned through a [`string_pool::StringPool`]
/// so that two names obtained from the same document compare equal by
/// pointer identity.
///
/// SPECLINK: <https://dom.spec.whatwg.org/#concept-attribute-qualified-name>
#[derive(Clone, Debug)]
pub struct QualifiedName {
    pub prefix: Option<string_pool::Handle>,
    pub namespace: Option<Namespace>,
    pub local: string_pool::Handle,
}

impl QualifiedName {
    pub fn new(
        prefix: Option<string_pool::Handle>,
        namespace: Option<Namespace>,
        local: string_pool::Handle,
    ) -> Self {
        QualifiedName {
            prefix,
            namespace,
            local,
        }
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#concept-attribute-qualified-name>
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix.as_str(), self.local.as_str()),
            None => self.local.as_str().to_string(),
        }
    }
}

impl PartialEq for QualifiedName {
    fn eq(&self, other: &Self) -> bool {
        self.namespace == other.namespace && self.local == other.local
    }
}
impl Eq for QualifiedName {}

/// An attribute: a namespaced name plus a value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub name: QualifiedName,
    pub value: String,
}
