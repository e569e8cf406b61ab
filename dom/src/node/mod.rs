//! The common `Node` record and the operations shared by every node kind.
//!
//! SPECLINK: <https://dom.spec.whatwg.org/#interface-node>
//!
//! Every tree participant is a [`Node`], discriminated by [`NodeKind`] with
//! variant-specific state carried in [`NodeData`]. Per design note in the
//! specification this core carries (prototype-chain composition in the
//! source is re-expressed as a tagged union plus small per-variant newtype
//! wrappers below), there is no runtime type reflection: every downcast
//! checks `Node::kind`.
//!
//! Ownership follows spec.md §3/§9: `parent` and `owner_document` are weak
//! (do not keep the target alive); the forward sibling chain
//! (`next_sibling`/`first_child`) is the strong, tree-owning direction, with
//! `previous_sibling`/`last_child` as weak back-pointers for O(1) access.
//! This avoids the Document↔Node reference cycle the spec calls out.

pub mod attr;
pub mod character_data;
pub mod document;
pub mod document_fragment;
pub mod document_type;
pub mod element;
pub mod shadow_root;

pub use attr::Attr;
pub use character_data::{CharacterData, CharacterDataKind};
pub use document::Document;
pub use document_fragment::DocumentFragment;
pub use document_type::DocumentType;
pub use element::Element;
pub use shadow_root::ShadowRoot;

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::error::{DomException, ErrorName};

/// A strong, externally-held reference to a node (an "acquire").
pub type NodeRef = Rc<Node>;
/// A weak, non-counting reference (parent links, `owner_document`).
pub type WeakNodeRef = Weak<Node>;

/// SPECLINK: <https://dom.spec.whatwg.org/#dom-node-nodetype>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Element,
    Attr,
    Text,
    CdataSection,
    ProcessingInstruction,
    Comment,
    Document,
    DocumentType,
    DocumentFragment,
    ShadowRoot,
}

impl NodeKind {
    /// The legacy `nodeType` numeric constant.
    pub fn node_type(self) -> u16 {
        match self {
            NodeKind::Element => 1,
            NodeKind::Attr => 2,
            NodeKind::Text => 3,
            NodeKind::CdataSection => 4,
            NodeKind::ProcessingInstruction => 7,
            NodeKind::Comment => 8,
            NodeKind::Document => 9,
            NodeKind::DocumentType => 10,
            NodeKind::DocumentFragment => 11,
            NodeKind::ShadowRoot => 11, // ShadowRoot is a DocumentFragment subtype.
        }
    }
}

/// Variant-specific payload. See spec.md §3 "Variant-specific attributes".
pub enum NodeData {
    Document(document::DocumentData),
    DocumentType(document_type::DocumentTypeData),
    DocumentFragment,
    Element(element::ElementData),
    Attr(attr::AttrData),
    CharacterData(character_data::CharacterDataData),
    ShadowRoot(shadow_root::ShadowRootData),
}

/// A hook run synchronously after a node is spliced into (or out of) the
/// tree. Stands in for the embedder-supplied "insertion steps"/"removing
/// steps" the spec names (script execution, custom-element upgrades,
/// form association) — this core only provides the call site.
pub type VariantHook = Rc<dyn Fn(&NodeRef)>;

/// The common node record.
pub struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) data: RefCell<NodeData>,

    owner_document: RefCell<WeakNodeRef>,
    parent: RefCell<WeakNodeRef>,
    previous_sibling: RefCell<WeakNodeRef>,
    next_sibling: RefCell<Option<NodeRef>>,
    first_child: RefCell<Option<NodeRef>>,
    last_child: RefCell<WeakNodeRef>,

    is_connected: Cell<bool>,
    ref_count: Cell<usize>,

    pub(crate) event_target: crate::event_target::EventTarget,
}

impl Node {
    pub(crate) fn new_rc(kind: NodeKind, data: NodeData, owner_document: Option<&NodeRef>) -> NodeRef {
        let node = Rc::new(Node {
            kind,
            data: RefCell::new(data),
            owner_document: RefCell::new(
                owner_document.map(Rc::downgrade).unwrap_or_default(),
            ),
            parent: RefCell::new(Weak::new()),
            previous_sibling: RefCell::new(Weak::new()),
            next_sibling: RefCell::new(None),
            first_child: RefCell::new(None),
            last_child: RefCell::new(Weak::new()),
            is_connected: Cell::new(false),
            ref_count: Cell::new(1),
            event_target: crate::event_target::EventTarget::new(),
        });
        log::trace!("created node kind={:?}", node.kind);
        node
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    // -- ref-count bookkeeping, spec.md §3 "Lifecycles" ----------------------

    /// Number of external holders. Tree membership alone does not increase
    /// this; only explicit [`Node::acquire`] calls do.
    pub fn ref_count(&self) -> usize {
        self.ref_count.get()
    }

    /// Take an external reference, incrementing [`Node::ref_count`].
    pub fn acquire(self: &NodeRef) -> NodeRef {
        self.ref_count.set(self.ref_count.get() + 1);
        Rc::clone(self)
    }

    /// Release an external reference, decrementing [`Node::ref_count`].
    pub fn release(node: NodeRef) {
        node.ref_count.set(node.ref_count.get().saturating_sub(1));
        drop(node);
    }

    // -- tree queries, spec.md §4.2 -------------------------------------

    /// For `Document` nodes, returns the node itself. For every other kind,
    /// returns the document it was created by (weakly referenced).
    pub fn owner_document(&self) -> Option<NodeRef> {
        self.owner_document.borrow().upgrade()
    }

    pub(crate) fn set_owner_document(&self, doc: Option<&NodeRef>) {
        *self.owner_document.borrow_mut() = doc.map(Rc::downgrade).unwrap_or_default();
    }

    pub fn parent(&self) -> Option<NodeRef> {
        self.parent.borrow().upgrade()
    }

    pub(crate) fn set_parent(&self, parent: Option<&NodeRef>) {
        *self.parent.borrow_mut() = parent.map(Rc::downgrade).unwrap_or_default();
    }

    pub fn previous_sibling(&self) -> Option<NodeRef> {
        self.previous_sibling.borrow().upgrade()
    }

    pub(crate) fn set_previous_sibling(&self, node: Option<&NodeRef>) {
        *self.previous_sibling.borrow_mut() = node.map(Rc::downgrade).unwrap_or_default();
    }

    pub fn next_sibling(&self) -> Option<NodeRef> {
        self.next_sibling.borrow().clone()
    }

    pub(crate) fn set_next_sibling(&self, node: Option<NodeRef>) {
        *self.next_sibling.borrow_mut() = node;
    }

    pub fn first_child(&self) -> Option<NodeRef> {
        self.first_child.borrow().clone()
    }

    pub(crate) fn set_first_child(&self, node: Option<NodeRef>) {
        *self.first_child.borrow_mut() = node;
    }

    pub fn last_child(&self) -> Option<NodeRef> {
        self.last_child.borrow().upgrade()
    }

    pub(crate) fn set_last_child(&self, node: Option<&NodeRef>) {
        *self.last_child.borrow_mut() = node.map(Rc::downgrade).unwrap_or_default();
    }

    pub fn has_children(&self) -> bool {
        self.first_child.borrow().is_some()
    }

    /// Snapshot of this node's children, in tree order.
    ///
    /// SPECLINK: <https://dom.spec.whatwg.org/#concept-tree-child>
    pub fn children(&self) -> Vec<NodeRef> {
        let mut out = Vec::new();
        let mut current = self.first_child();
        while let Some(node) = current {
            current = node.next_sibling();
            out.push(node);
        }
        out
    }

    pub fn is_connected(&self) -> bool {
        self.is_connected.get()
    }

    pub(crate) fn set_is_connected(&self, connected: bool) {
        self.is_connected.set(connected);
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#concept-tree-root>
    pub fn root(self: &NodeRef) -> NodeRef {
        let mut current = Rc::clone(self);
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#concept-tree-index>
    pub fn index(self: &NodeRef) -> usize {
        let mut index = 0;
        let mut current = self.previous_sibling();
        while let Some(node) = current {
            index += 1;
            current = node.previous_sibling();
        }
        index
    }

    /// Inclusive ancestors, nearest first (self, parent, grandparent, ...).
    ///
    /// SPECLINK: <https://dom.spec.whatwg.org/#concept-tree-inclusive-ancestor>
    pub fn inclusive_ancestors(self: &NodeRef) -> Vec<NodeRef> {
        let mut nodes = vec![Rc::clone(self)];
        let mut current = self.parent();
        while let Some(ancestor) = current {
            current = ancestor.parent();
            nodes.push(ancestor);
        }
        nodes
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#concept-tree-inclusive-descendant>
    pub fn inclusive_descendants(self: &NodeRef) -> Vec<NodeRef> {
        let mut out = vec![Rc::clone(self)];
        for child in self.children() {
            out.extend(child.inclusive_descendants());
        }
        out
    }

    pub fn is_inclusive_ancestor_of(self: &NodeRef, other: &NodeRef) -> bool {
        let mut current = Some(Rc::clone(other));
        while let Some(node) = current {
            if Rc::ptr_eq(self, &node) {
                return true;
            }
            current = node.parent();
        }
        false
    }

    pub fn is_ancestor_of(self: &NodeRef, other: &NodeRef) -> bool {
        match other.parent() {
            Some(parent) => self.is_inclusive_ancestor_of(&parent),
            None => false,
        }
    }

    /// `other` must be `null` returns `false` (spec.md §4.2 failure case).
    ///
    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-node-contains>
    pub fn contains(self: &NodeRef, other: Option<&NodeRef>) -> bool {
        match other {
            None => false,
            Some(other) => self.is_inclusive_ancestor_of(other),
        }
    }

    pub fn is_same_node(self: &NodeRef, other: &NodeRef) -> bool {
        Rc::ptr_eq(self, other)
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-node-comparedocumentposition>
    pub const DOCUMENT_POSITION_DISCONNECTED: u16 = 1;
    pub const DOCUMENT_POSITION_PRECEDING: u16 = 2;
    pub const DOCUMENT_POSITION_FOLLOWING: u16 = 4;
    pub const DOCUMENT_POSITION_CONTAINS: u16 = 8;
    pub const DOCUMENT_POSITION_CONTAINED_BY: u16 = 16;
    pub const DOCUMENT_POSITION_IMPLEMENTATION_SPECIFIC: u16 = 32;

    pub fn compare_document_position(self: &NodeRef, other: &NodeRef) -> u16 {
        if Rc::ptr_eq(self, other) {
            return 0;
        }
        if !Rc::ptr_eq(&self.root(), &other.root()) {
            // Disconnected: the direction is arbitrary but must be stable.
            // We break the tie using the nodes' allocation addresses, which
            // is stable for the lifetime of both allocations.
            let (a, b) = (Rc::as_ptr(self) as usize, Rc::as_ptr(other) as usize);
            let direction = if a < b {
                Node::DOCUMENT_POSITION_FOLLOWING
            } else {
                Node::DOCUMENT_POSITION_PRECEDING
            };
            return Node::DOCUMENT_POSITION_DISCONNECTED
                | Node::DOCUMENT_POSITION_IMPLEMENTATION_SPECIFIC
                | direction;
        }
        if self.is_inclusive_ancestor_of(other) {
            return Node::DOCUMENT_POSITION_CONTAINED_BY | Node::DOCUMENT_POSITION_FOLLOWING;
        }
        if other.is_inclusive_ancestor_of(self) {
            return Node::DOCUMENT_POSITION_CONTAINS | Node::DOCUMENT_POSITION_PRECEDING;
        }
        if self.is_following(other) {
            Node::DOCUMENT_POSITION_FOLLOWING
        } else {
            Node::DOCUMENT_POSITION_PRECEDING
        }
    }

    /// `true` iff `self` comes after `other` in tree order. Assumes neither
    /// is an inclusive ancestor of the other (callers check that first).
    pub fn is_following(self: &NodeRef, other: &NodeRef) -> bool {
        // Root-first ancestor chains, so index 0 is the shared tree root.
        let mut self_path = self.inclusive_ancestors();
        self_path.reverse();
        let mut other_path = other.inclusive_ancestors();
        other_path.reverse();

        if !Rc::ptr_eq(&self_path[0], &other_path[0]) {
            return false; // different trees
        }

        let mut depth = 0;
        while depth + 1 < self_path.len()
            && depth + 1 < other_path.len()
            && Rc::ptr_eq(&self_path[depth + 1], &other_path[depth + 1])
        {
            depth += 1;
        }
        // `self_path[depth + 1]` and `other_path[depth + 1]` are the two
        // distinct children of the lowest common ancestor that lead to
        // `self` and `other` respectively.
        self_path[depth + 1].index() > other_path[depth + 1].index()
    }

    pub fn is_child_of(self: &NodeRef, parent: &NodeRef) -> bool {
        self.parent().is_some_and(|p| Rc::ptr_eq(&p, parent))
    }

    // -- structural predicates -------------------------------------------

    pub fn is_document(&self) -> bool {
        self.kind == NodeKind::Document
    }
    pub fn is_document_fragment(&self) -> bool {
        matches!(self.kind, NodeKind::DocumentFragment | NodeKind::ShadowRoot)
    }
    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }
    pub fn is_attr(&self) -> bool {
        self.kind == NodeKind::Attr
    }
    pub fn is_text(&self) -> bool {
        matches!(self.kind, NodeKind::Text | NodeKind::CdataSection)
    }
    pub fn is_comment(&self) -> bool {
        self.kind == NodeKind::Comment
    }
    pub fn is_processing_instruction(&self) -> bool {
        self.kind == NodeKind::ProcessingInstruction
    }
    pub fn is_doctype(&self) -> bool {
        self.kind == NodeKind::DocumentType
    }
    pub fn is_character_data(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Text | NodeKind::CdataSection | NodeKind::Comment | NodeKind::ProcessingInstruction
        )
    }
    pub fn is_shadow_root(&self) -> bool {
        self.kind == NodeKind::ShadowRoot
    }

    /// Whether this node is insertable per spec.md §4.4 rule 4.
    pub(crate) fn is_insertable_kind(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::DocumentFragment
                | NodeKind::DocumentType
                | NodeKind::Element
                | NodeKind::Text
                | NodeKind::CdataSection
                | NodeKind::Comment
                | NodeKind::ProcessingInstruction
                | NodeKind::ShadowRoot
        )
    }

    // -- textContent / normalize, spec.md §4.2 ---------------------------

    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-node-textcontent>
    pub fn text_content(self: &NodeRef) -> Option<String> {
        match self.kind {
            NodeKind::Document | NodeKind::DocumentType => None,
            NodeKind::Text | NodeKind::CdataSection | NodeKind::Comment | NodeKind::ProcessingInstruction => {
                Some(character_data::data_of(self))
            }
            _ => {
                let mut out = String::new();
                for descendant in self.children_text_descendants() {
                    out.push_str(&character_data::data_of(&descendant));
                }
                Some(out)
            }
        }
    }

    fn children_text_descendants(self: &NodeRef) -> Vec<NodeRef> {
        let mut out = Vec::new();
        for child in self.children() {
            if child.is_text() {
                out.push(Rc::clone(&child));
            } else if !child.is_comment() && !child.is_processing_instruction() {
                out.extend(child.children_text_descendants());
            }
        }
        out
    }

    /// Setting `textContent` replaces all children with a single text node
    /// (or removes all children if `value` is `None`).
    pub fn set_text_content(self: &NodeRef, value: Option<&str>) -> Result<(), DomException> {
        if matches!(self.kind, NodeKind::Document | NodeKind::DocumentType) {
            return Ok(());
        }
        let doc = self
            .owner_document()
            .or_else(|| self.is_document().then(|| Rc::clone(self)))
            .expect("non-document node must have an owner document");
        let replacement = value.filter(|s| !s.is_empty()).map(|s| {
            character_data::new_text_node(&doc, s)
        });
        crate::mutation_ops::replace_all(self, replacement.as_ref())
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-node-normalize>
    pub fn normalize(self: &NodeRef) {
        let mut child = self.first_child();
        while let Some(node) = child {
            let next = node.next_sibling();
            if node.is_text() {
                // Merge immediately-following text siblings into `node`.
                let mut run_next = next.clone();
                while let Some(sibling) = run_next {
                    if !sibling.is_text() {
                        break;
                    }
                    let sibling_data = character_data::data_of(&sibling);
                    character_data::append_data_raw(&node, &sibling_data);
                    let after = sibling.next_sibling();
                    crate::mutation_ops::remove(&sibling);
                    run_next = after;
                }
                if character_data::data_of(&node).is_empty() {
                    let after = node.next_sibling();
                    crate::mutation_ops::remove(&node);
                    child = after;
                    continue;
                }
                child = node.next_sibling();
            } else {
                node.normalize();
                child = next;
            }
        }
    }

    // -- equality / cloning, spec.md §4.2 --------------------------------

    /// Structural equality: same kind, same attributes, same children in
    /// order, same character data.
    ///
    /// SPECLINK: <https://dom.spec.whatwg.org/#concept-node-equals>
    pub fn is_equal_node(self: &NodeRef, other: Option<&NodeRef>) -> bool {
        let Some(other) = other else { return false };
        if self.kind != other.kind {
            return false;
        }
        match self.kind {
            NodeKind::DocumentType => {
                let a = document_type::data_of(self);
                let b = document_type::data_of(other);
                a == b
            }
            NodeKind::Element => {
                let a = element::data_of(self);
                let b = element::data_of(other);
                if a.name.namespace != b.name.namespace
                    || a.name.local.as_str() != b.name.local.as_str()
                    || a.attributes.borrow().len() != b.attributes.borrow().len()
                {
                    return false;
                }
                let a_attrs = a.attributes.borrow();
                let b_attrs = b.attributes.borrow();
                for attr in a_attrs.iter() {
                    let found = b_attrs.iter().any(|o| {
                        o.name.namespace == attr.name.namespace
                            && o.name.local.as_str() == attr.name.local.as_str()
                            && o.value == attr.value
                    });
                    if !found {
                        return false;
                    }
                }
            }
            NodeKind::Attr => {
                let a = attr::data_of(self);
                let b = attr::data_of(other);
                if a.name != b.name || a.value.borrow().clone() != b.value.borrow().clone() {
                    return false;
                }
            }
            NodeKind::Text | NodeKind::CdataSection | NodeKind::Comment | NodeKind::ProcessingInstruction => {
                if character_data::data_of(self) != character_data::data_of(other) {
                    return false;
                }
            }
            _ => {}
        }
        let self_children = self.children();
        let other_children = other.children();
        if self_children.len() != other_children.len() {
            return false;
        }
        self_children
            .iter()
            .zip(other_children.iter())
            .all(|(a, b)| a.is_equal_node(Some(b)))
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-node-clonenode>
    pub fn clone_node(self: &NodeRef, deep: bool) -> NodeRef {
        let owner = self
            .owner_document()
            .unwrap_or_else(|| Rc::clone(self));
        let clone = self.clone_single(&owner);
        if deep {
            for child in self.children() {
                let child_clone = child.clone_node(true);
                crate::mutation_ops::append(&clone, &child_clone)
                    .expect("cloned children are always insertable");
            }
        }
        clone
    }

    fn clone_single(self: &NodeRef, owner: &NodeRef) -> NodeRef {
        let data = match &*self.data.borrow() {
            NodeData::Document(d) => NodeData::Document(d.clone_fresh()),
            NodeData::DocumentType(d) => NodeData::DocumentType(d.clone()),
            NodeData::DocumentFragment => NodeData::DocumentFragment,
            NodeData::Element(e) => NodeData::Element(e.clone()),
            NodeData::Attr(a) => NodeData::Attr(a.clone()),
            NodeData::CharacterData(c) => NodeData::CharacterData(c.clone()),
            NodeData::ShadowRoot(s) => NodeData::ShadowRoot(s.clone()),
        };
        let owner_for_new = if self.is_document() { None } else { Some(owner) };
        Node::new_rc(self.kind, data, owner_for_new)
    }

    // -- debug ------------------------------------------------------------

    pub fn debug_label(&self) -> String {
        match &*self.data.borrow() {
            NodeData::Document(_) => "#document".to_string(),
            NodeData::DocumentType(d) => format!("DOCTYPE {}", d.name),
            NodeData::DocumentFragment => "#document-fragment".to_string(),
            NodeData::ShadowRoot(_) => "#shadow-root".to_string(),
            NodeData::Element(e) => format!("<{}>", e.name.qualified_name()),
            NodeData::Attr(a) => format!("@{}", a.name.qualified_name()),
            NodeData::CharacterData(c) => c.kind.debug_tag().to_string(),
        }
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("kind", &self.kind)
            .field("label", &self.debug_label())
            .field("children", &self.children().len())
            .field("is_connected", &self.is_connected())
            .finish()
    }
}

/// Helper shared by the validation/mutation modules: maps an out-of-range
/// `NotFoundError` precondition failure the way spec.md §4.4 orders checks.
pub(crate) fn not_found() -> DomException {
    DomException::from(ErrorName::NotFoundError)
}

pub(crate) fn hierarchy_request() -> DomException {
    DomException::from(ErrorName::HierarchyRequestError)
}

#[cfg(test)]
mod tests {
    use super::document::Document;

    #[test]
    fn contains_is_false_for_null() {
        let doc = Document::new();
        assert!(!doc.node().contains(None));
    }

    #[test]
    fn compare_document_position_self_is_zero() {
        let doc = Document::new();
        assert_eq!(doc.node().compare_document_position(doc.node()), 0);
    }

    #[test]
    fn clone_node_is_equal_node() {
        let doc = Document::new();
        let el = doc.create_element("div").unwrap();
        el.node().set_text_content(Some("hi")).unwrap();
        let clone = el.node().clone_node(true);
        assert!(el.node().is_equal_node(Some(&clone)));
    }
}
