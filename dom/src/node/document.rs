//! SPECLINK: <https://dom.spec.whatwg.org/#interface-document>
//!
//! A `Document` owns the node arena, the string pool, the id index, and a
//! monotonically increasing `tree_revision` counter that live collections
//! use to invalidate their cached snapshots (spec.md §4.7).
//!
//! Destruction is two-phase (spec.md §5): when the document's external
//! holders drop to zero, [`Document::teardown`] walks the tree running
//! removal hooks, drops the string pool and id index, then releases the
//! arena registry — freeing any node that was created but never externally
//! held nor attached (an "orphan").

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{DomException, ErrorName};
use crate::string_pool::{Handle, StringPool};
use crate::{Namespace, QualifiedName};

use super::character_data::{CharacterDataData, CharacterDataKind};
use super::element::{self, Element};
use super::{Node, NodeData, NodeKind, NodeRef, VariantHook, WeakNodeRef};

pub struct DocumentData {
    pub(crate) string_pool: StringPool,
    pub(crate) tree_revision: Cell<u64>,
    pub(crate) id_index: RefCell<HashMap<Handle, WeakNodeRef>>,
    /// Every node this document has ever created, keeping it alive until
    /// teardown even if the caller's own handle was dropped without being
    /// inserted into the tree. This is the "arena" spec.md §3/§5 describes.
    arena: RefCell<Vec<NodeRef>>,
    removal_hooks: RefCell<Vec<VariantHook>>,
    insertion_hooks: RefCell<Vec<VariantHook>>,
    pub(crate) is_html_document: bool,
    pub content_type: String,
    torn_down: Cell<bool>,
    pub(crate) live_ranges: RefCell<Vec<std::rc::Weak<crate::range::RangeInner>>>,
    pub(crate) live_node_iterators: RefCell<Vec<std::rc::Weak<crate::traversal::NodeIteratorInner>>>,
}

impl DocumentData {
    fn new() -> Self {
        DocumentData {
            string_pool: StringPool::new(),
            tree_revision: Cell::new(0),
            id_index: RefCell::new(HashMap::new()),
            arena: RefCell::new(Vec::new()),
            removal_hooks: RefCell::new(Vec::new()),
            insertion_hooks: RefCell::new(Vec::new()),
            is_html_document: false,
            content_type: "application/xml".to_string(),
            torn_down: Cell::new(false),
            live_ranges: RefCell::new(Vec::new()),
            live_node_iterators: RefCell::new(Vec::new()),
        }
    }

    /// A `Document.cloneNode()` gets an independent arena/string pool/id
    /// index; it shares no state with the original.
    pub(crate) fn clone_fresh(&self) -> Self {
        let mut fresh = DocumentData::new();
        fresh.is_html_document = self.is_html_document;
        fresh.content_type = self.content_type.clone();
        fresh
    }
}

pub(crate) fn data_of(node: &NodeRef) -> std::cell::Ref<'_, DocumentData> {
    std::cell::Ref::map(node.data.borrow(), |d| match d {
        NodeData::Document(doc) => doc,
        _ => panic!("node is not a Document"),
    })
}

pub(crate) fn bump_revision(doc: &NodeRef) {
    let data = data_of(doc);
    data.tree_revision.set(data.tree_revision.get() + 1);
}

pub(crate) fn sync_id_index(doc: &NodeRef, element: &NodeRef) {
    let data = data_of(doc);
    let mut index = data.id_index.borrow_mut();
    index.retain(|_, weak| weak.upgrade().is_some());
    let current_id = Element(Rc::clone(element)).id();
    // Remove any stale mapping pointing at this element under a different id.
    index.retain(|_, weak| !weak.upgrade().is_some_and(|n| Rc::ptr_eq(&n, element)));
    if !current_id.is_empty() {
        let handle = data.string_pool.intern(&current_id);
        index.insert(handle, Rc::downgrade(element));
    }
}

/// Newtype view over a `Node` known to be a `Document`.
#[derive(Clone)]
pub struct Document(pub NodeRef);

impl std::ops::Deref for Document {
    type Target = NodeRef;
    fn deref(&self) -> &NodeRef {
        &self.0
    }
}

impl Document {
    /// Creates a fresh, empty XML document (no `documentElement`).
    pub fn new() -> Document {
        let node = Node::new_rc(NodeKind::Document, NodeData::Document(DocumentData::new()), None);
        Document(node)
    }

    /// Creates a fresh HTML document (`tagName` uppercasing kicks in for
    /// elements in the HTML namespace).
    pub fn new_html() -> Document {
        let doc = Document::new();
        {
            let mut data = doc.0.data.borrow_mut();
            if let NodeData::Document(d) = &mut *data {
                d.is_html_document = true;
                d.content_type = "text/html".to_string();
            }
        }
        doc
    }

    pub fn node(&self) -> &NodeRef {
        &self.0
    }

    pub fn content_type(&self) -> String {
        data_of(&self.0).content_type.clone()
    }

    pub fn tree_revision(&self) -> u64 {
        data_of(&self.0).tree_revision.get()
    }

    pub fn string_pool(&self) -> std::cell::Ref<'_, StringPool> {
        std::cell::Ref::map(self.0.data.borrow(), |d| match d {
            NodeData::Document(doc) => &doc.string_pool,
            _ => unreachable!(),
        })
    }

    fn register(&self, node: &NodeRef) {
        data_of(&self.0).arena.borrow_mut().push(Rc::clone(node));
    }

    pub fn add_removal_hook(&self, hook: VariantHook) {
        data_of(&self.0).removal_hooks.borrow_mut().push(hook);
    }
    pub fn add_insertion_hook(&self, hook: VariantHook) {
        data_of(&self.0).insertion_hooks.borrow_mut().push(hook);
    }
    pub(crate) fn run_insertion_steps(&self, node: &NodeRef) {
        for hook in data_of(&self.0).insertion_hooks.borrow().iter() {
            hook(node);
        }
    }
    pub(crate) fn run_removing_steps(&self, node: &NodeRef) {
        for hook in data_of(&self.0).removal_hooks.borrow().iter() {
            hook(node);
        }
    }

    // -- factories, spec.md §4.6 -----------------------------------------

    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-document-createelement>
    pub fn create_element(&self, local_name: &str) -> Result<Element, DomException> {
        self.create_element_ns(Some(Namespace::Html), None, local_name)
    }

    pub fn create_element_ns(
        &self,
        namespace: Option<Namespace>,
        prefix: Option<&str>,
        local_name: &str,
    ) -> Result<Element, DomException> {
        if local_name.is_empty() {
            return Err(DomException::from(ErrorName::InvalidCharacterError));
        }
        let pool = self.string_pool();
        let local = pool.intern(local_name);
        let prefix = prefix.map(|p| pool.intern(p));
        drop(pool);
        let node = Node::new_rc(
            NodeKind::Element,
            NodeData::Element(element::ElementData {
                name: QualifiedName::new(prefix, namespace, local),
                attributes: RefCell::new(Vec::new()),
                shadow_root: RefCell::new(None),
            }),
            Some(&self.0),
        );
        self.register(&node);
        Ok(Element(node))
    }

    pub fn create_text_node(&self, data: &str) -> super::character_data::CharacterData {
        let node = super::character_data::new_text_node(&self.0, data);
        self.register(&node);
        super::character_data::CharacterData(node)
    }

    pub fn create_comment(&self, data: &str) -> super::character_data::CharacterData {
        let node = Node::new_rc(
            NodeKind::Comment,
            NodeData::CharacterData(CharacterDataData {
                kind: CharacterDataKind::Comment,
                data: RefCell::new(data.to_string()),
            }),
            Some(&self.0),
        );
        self.register(&node);
        super::character_data::CharacterData(node)
    }

    pub fn create_processing_instruction(
        &self,
        target: &str,
        data: &str,
    ) -> Result<super::character_data::CharacterData, DomException> {
        if target.is_empty() || data.contains("?>") {
            return Err(DomException::from(ErrorName::InvalidCharacterError));
        }
        let handle = self.string_pool().intern(target);
        let node = Node::new_rc(
            NodeKind::ProcessingInstruction,
            NodeData::CharacterData(CharacterDataData {
                kind: CharacterDataKind::ProcessingInstruction { target: handle },
                data: RefCell::new(data.to_string()),
            }),
            Some(&self.0),
        );
        self.register(&node);
        Ok(super::character_data::CharacterData(node))
    }

    pub fn create_document_fragment(&self) -> super::document_fragment::DocumentFragment {
        let node = Node::new_rc(NodeKind::DocumentFragment, NodeData::DocumentFragment, Some(&self.0));
        self.register(&node);
        super::document_fragment::DocumentFragment(node)
    }

    pub fn create_document_type(
        &self,
        name: &str,
        public_id: &str,
        system_id: &str,
    ) -> super::document_type::DocumentType {
        let node = Node::new_rc(
            NodeKind::DocumentType,
            NodeData::DocumentType(super::document_type::DocumentTypeData {
                name: name.to_string(),
                public_id: public_id.to_string(),
                system_id: system_id.to_string(),
            }),
            Some(&self.0),
        );
        self.register(&node);
        super::document_type::DocumentType(node)
    }

    pub fn create_range(&self) -> crate::range::Range {
        crate::range::Range::new(Rc::clone(&self.0))
    }

    pub(crate) fn register_range(&self, range: std::rc::Weak<crate::range::RangeInner>) {
        data_of(&self.0).live_ranges.borrow_mut().push(range);
    }

    pub(crate) fn register_node_iterator(&self, iterator: std::rc::Weak<crate::traversal::NodeIteratorInner>) {
        data_of(&self.0).live_node_iterators.borrow_mut().push(iterator);
    }

    pub fn create_node_iterator(
        &self,
        root: NodeRef,
        what_to_show: u32,
        filter: Option<Rc<dyn crate::traversal::NodeFilter>>,
    ) -> crate::traversal::NodeIterator {
        crate::traversal::NodeIterator::new(root, what_to_show, filter)
    }

    pub fn create_tree_walker(
        &self,
        root: NodeRef,
        what_to_show: u32,
        filter: Option<Rc<dyn crate::traversal::NodeFilter>>,
    ) -> crate::traversal::TreeWalker {
        crate::traversal::TreeWalker::new(root, what_to_show, filter)
    }

    // -- lookups, spec.md §4.6 -------------------------------------------

    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-nonelementparentnode-getelementbyid>
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeRef> {
        if id.is_empty() {
            return None;
        }
        let data = data_of(&self.0);
        let handle = data.string_pool.intern(id);
        data.id_index.borrow().get(&handle).and_then(|w| w.upgrade())
    }

    pub fn get_elements_by_tag_name(&self, name: &str) -> crate::live_collections::HtmlCollection {
        crate::live_collections::HtmlCollection::by_tag_name(Rc::clone(&self.0), name)
    }

    pub fn get_elements_by_class_name(&self, names: &str) -> crate::live_collections::HtmlCollection {
        crate::live_collections::HtmlCollection::by_class_name(Rc::clone(&self.0), names)
    }

    /// First Element child of the document.
    pub fn document_element(&self) -> Option<NodeRef> {
        self.0.children().into_iter().find(|n| n.is_element())
    }

    /// SPECLINK: <https://html.spec.whatwg.org/multipage/dom.html#dom-document-body>
    pub fn body(&self) -> Option<NodeRef> {
        self.document_element()?
            .children()
            .into_iter()
            .find(|n| n.is_element() && matches!(element::data_of(n).name.local.as_str(), "body" | "frameset"))
    }

    // -- two-phase destruction, spec.md §5 --------------------------------

    /// Explicitly tears the document down: runs removal hooks over the
    /// whole tree, releases the string pool and id index, then drops the
    /// arena registry. Idempotent.
    pub fn teardown(&self) {
        let data = data_of(&self.0);
        if data.torn_down.get() {
            return;
        }
        data.torn_down.set(true);
        drop(data);

        log::debug!("document teardown: entering two-phase destruction");
        for node in self.0.inclusive_descendants() {
            if !Rc::ptr_eq(&node, &self.0) {
                self.run_removing_steps(&node);
            }
        }
        let data = data_of(&self.0);
        data.id_index.borrow_mut().clear();
        let mut arena = data.arena.borrow_mut();
        arena.clear();
    }
}

impl Drop for DocumentData {
    fn drop(&mut self) {
        if !self.torn_down.get() {
            self.torn_down.set(true);
            log::debug!("document dropped without explicit teardown; running it defensively");
            self.id_index.borrow_mut().clear();
            self.arena.borrow_mut().clear();
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Document::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_elements_by_tag_name_reflects_insertions_without_refresh() {
        let doc = Document::new();
        let root = doc.create_element("root").unwrap();
        crate::mutation_ops::append(&doc.0, &root).unwrap();
        for id in ["1", "2", "3"] {
            let p = doc.create_element("paragraph").unwrap();
            p.set_attribute("id", id).unwrap();
            crate::mutation_ops::append(&root, &p).unwrap();
        }
        let collection = doc.get_elements_by_tag_name("paragraph");
        assert_eq!(collection.length(), 3);
        assert_eq!(
            Element::try_from_node(collection.item(0).unwrap()).unwrap().id(),
            "1"
        );

        let fourth = doc.create_element("paragraph").unwrap();
        crate::mutation_ops::append(&root, &fourth).unwrap();
        assert_eq!(collection.length(), 4);
    }

    #[test]
    fn get_element_by_id_tracks_attribute_mutation() {
        let doc = Document::new();
        let el = doc.create_element("div").unwrap();
        crate::mutation_ops::append(&doc.0, &el).unwrap();
        el.set_attribute("id", "main").unwrap();
        assert!(doc.get_element_by_id("main").is_some());
        el.remove_attribute("id");
        assert!(doc.get_element_by_id("main").is_none());
    }

    #[test]
    fn empty_id_never_matches() {
        let doc = Document::new();
        assert!(doc.get_element_by_id("").is_none());
    }
}
