//! `NodeIterator` and `TreeWalker`.
//!
//! SPECLINK: <https://dom.spec.whatwg.org/#traversal>

use std::cell::RefCell;
use std::rc::Rc;

use crate::node::NodeRef;

/// SPECLINK: <https://dom.spec.whatwg.org/#dom-nodefilter-accept_node>
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterResult {
    Accept,
    Reject,
    Skip,
}

pub trait NodeFilter {
    fn accept_node(&self, node: &NodeRef) -> FilterResult;
}

pub const SHOW_ALL: u32 = 0xFFFFFFFF;
pub const SHOW_ELEMENT: u32 = 0x1;
pub const SHOW_TEXT: u32 = 0x4;
pub const SHOW_COMMENT: u32 = 0x80;

fn what_to_show_mask(node: &NodeRef) -> u32 {
    match node.kind() {
        crate::node::NodeKind::Element => SHOW_ELEMENT,
        crate::node::NodeKind::Text => SHOW_TEXT,
        crate::node::NodeKind::Comment => SHOW_COMMENT,
        _ => 0,
    }
}

fn passes(node: &NodeRef, what_to_show: u32, filter: &Option<Rc<dyn NodeFilter>>) -> FilterResult {
    let mask = what_to_show_mask(node);
    if mask != 0 && what_to_show & mask == 0 {
        return FilterResult::Skip;
    }
    match filter {
        Some(f) => f.accept_node(node),
        None => FilterResult::Accept,
    }
}

/// SPECLINK: <https://dom.spec.whatwg.org/#interface-nodeiterator>
///
/// State lives behind an `Rc` so a weak handle to it can be registered with
/// the owner document, which calls back into [`adjust_for_node_removal`]
/// when a node is removed, following the same registration pattern
/// [`crate::range::Range`] uses for its boundary points.
pub(crate) struct NodeIteratorInner {
    root: NodeRef,
    what_to_show: u32,
    filter: Option<Rc<dyn NodeFilter>>,
    reference: RefCell<NodeRef>,
    before: RefCell<bool>,
}

pub struct NodeIterator {
    inner: Rc<NodeIteratorInner>,
}

impl NodeIterator {
    pub fn new(root: NodeRef, what_to_show: u32, filter: Option<Rc<dyn NodeFilter>>) -> Self {
        let inner = Rc::new(NodeIteratorInner {
            reference: RefCell::new(Rc::clone(&root)),
            before: RefCell::new(true),
            root: Rc::clone(&root),
            what_to_show,
            filter,
        });
        let weak = Rc::downgrade(&inner);
        if let Some(doc) = root.owner_document().or_else(|| root.is_document().then(|| Rc::clone(&root))) {
            crate::node::document::Document(doc).register_node_iterator(weak);
        }
        NodeIterator { inner }
    }

    pub fn root(&self) -> &NodeRef {
        &self.inner.root
    }

    fn flat_order(&self) -> Vec<NodeRef> {
        self.inner.root.inclusive_descendants()
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-nodeiterator-nextnode>
    pub fn next_node(&self) -> Option<NodeRef> {
        let order = self.flat_order();
        let current_index = order.iter().position(|n| Rc::ptr_eq(n, &self.inner.reference.borrow()))?;
        let start = if *self.inner.before.borrow() { current_index } else { current_index + 1 };
        for candidate in order.get(start..)? {
            if passes(candidate, self.inner.what_to_show, &self.inner.filter) == FilterResult::Accept {
                *self.inner.reference.borrow_mut() = Rc::clone(candidate);
                *self.inner.before.borrow_mut() = false;
                return Some(Rc::clone(candidate));
            }
        }
        None
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-nodeiterator-previousnode>
    pub fn previous_node(&self) -> Option<NodeRef> {
        let order = self.flat_order();
        let current_index = order.iter().position(|n| Rc::ptr_eq(n, &self.inner.reference.borrow()))?;
        let end = if *self.inner.before.borrow() { current_index } else { current_index + 1 };
        for candidate in order[..end].iter().rev() {
            if passes(candidate, self.inner.what_to_show, &self.inner.filter) == FilterResult::Accept {
                *self.inner.reference.borrow_mut() = Rc::clone(candidate);
                *self.inner.before.borrow_mut() = true;
                return Some(Rc::clone(candidate));
            }
        }
        None
    }
}

/// Called after a node is unlinked from its parent but before its own
/// parent/sibling fields are cleared, so `old_node`'s pre-removal position
/// (previous sibling, parent, next sibling) is still readable.
///
/// SPECLINK: <https://dom.spec.whatwg.org/#nodeiterator-pre-removing-steps>
pub(crate) fn adjust_for_node_removal(old_node: &NodeRef) {
    let Some(doc) = old_node
        .owner_document()
        .or_else(|| old_node.is_document().then(|| Rc::clone(old_node)))
    else {
        return;
    };
    let data = crate::node::document::data_of(&doc);
    let mut iterators = data.live_node_iterators.borrow_mut();
    iterators.retain(|weak| weak.strong_count() > 0);
    for weak in iterators.iter() {
        let Some(inner) = weak.upgrade() else { continue };
        if Rc::ptr_eq(old_node, &inner.root) {
            continue;
        }
        let reference = inner.reference.borrow().clone();
        if !old_node.is_inclusive_ancestor_of(&reference) {
            continue;
        }

        if *inner.before.borrow() {
            let next = first_following_non_descendant(old_node)
                .filter(|next| inner.root.is_inclusive_ancestor_of(next));
            if let Some(next) = next {
                *inner.reference.borrow_mut() = next;
                continue;
            }
            *inner.before.borrow_mut() = false;
        }

        if let Some(previous) = old_node.previous_sibling() {
            *inner.reference.borrow_mut() = previous;
        } else if let Some(parent) = old_node.parent() {
            *inner.reference.borrow_mut() = parent;
        }
    }
}

fn first_following_non_descendant(node: &NodeRef) -> Option<NodeRef> {
    if let Some(next) = node.next_sibling() {
        return Some(next);
    }
    let mut current = node.parent();
    while let Some(ancestor) = current {
        if let Some(next) = ancestor.next_sibling() {
            return Some(next);
        }
        current = ancestor.parent();
    }
    None
}

/// SPECLINK: <https://dom.spec.whatwg.org/#interface-treewalker>
pub struct TreeWalker {
    root: NodeRef,
    what_to_show: u32,
    filter: Option<Rc<dyn NodeFilter>>,
    current: RefCell<NodeRef>,
}

impl TreeWalker {
    pub fn new(root: NodeRef, what_to_show: u32, filter: Option<Rc<dyn NodeFilter>>) -> Self {
        TreeWalker {
            current: RefCell::new(Rc::clone(&root)),
            root,
            what_to_show,
            filter,
        }
    }

    pub fn current_node(&self) -> NodeRef {
        Rc::clone(&self.current.borrow())
    }

    pub fn set_current_node(&self, node: NodeRef) {
        *self.current.borrow_mut() = node;
    }

    fn accept(&self, node: &NodeRef) -> FilterResult {
        passes(node, self.what_to_show, &self.filter)
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-treewalker-parentnode>
    pub fn parent_node(&self) -> Option<NodeRef> {
        let mut node = self.current.borrow().parent()?;
        while !Rc::ptr_eq(&node, &self.root) {
            if self.accept(&node) == FilterResult::Accept {
                *self.current.borrow_mut() = Rc::clone(&node);
                return Some(node);
            }
            node = node.parent()?;
        }
        None
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-treewalker-firstchild>
    pub fn first_child(&self) -> Option<NodeRef> {
        self.traverse_children(true)
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-treewalker-lastchild>
    pub fn last_child(&self) -> Option<NodeRef> {
        self.traverse_children(false)
    }

    fn traverse_children(&self, forward: bool) -> Option<NodeRef> {
        let mut node = {
            let current = self.current.borrow();
            if forward { current.first_child() } else { current.last_child() }
        }?;
        loop {
            match self.accept(&node) {
                FilterResult::Accept => {
                    *self.current.borrow_mut() = Rc::clone(&node);
                    return Some(node);
                }
                FilterResult::Skip => {
                    if let Some(child) = if forward { node.first_child() } else { node.last_child() } {
                        node = child;
                        continue;
                    }
                }
                FilterResult::Reject => {}
            }
            let sibling = if forward { node.next_sibling() } else { node.previous_sibling() };
            match sibling {
                Some(s) => node = s,
                None => return None,
            }
        }
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-treewalker-nextsibling>
    pub fn next_sibling(&self) -> Option<NodeRef> {
        self.traverse_siblings(true)
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-treewalker-previoussibling>
    pub fn previous_sibling(&self) -> Option<NodeRef> {
        self.traverse_siblings(false)
    }

    fn traverse_siblings(&self, forward: bool) -> Option<NodeRef> {
        let mut node = self.current.borrow().clone();
        if Rc::ptr_eq(&node, &self.root) {
            return None;
        }
        loop {
            let sibling = if forward { node.next_sibling() } else { node.previous_sibling() };
            match sibling {
                Some(mut candidate) => loop {
                    match self.accept(&candidate) {
                        FilterResult::Accept => {
                            *self.current.borrow_mut() = Rc::clone(&candidate);
                            return Some(candidate);
                        }
                        FilterResult::Skip => {
                            let descend = if forward { candidate.first_child() } else { candidate.last_child() };
                            match descend {
                                Some(d) => candidate = d,
                                None => break,
                            }
                        }
                        FilterResult::Reject => break,
                    }
                },
                None => {}
            }
            match node.parent() {
                Some(parent) if !Rc::ptr_eq(&parent, &self.root) && self.accept(&parent) == FilterResult::Skip => {
                    node = parent;
                }
                _ => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::document::Document;

    #[test]
    fn node_iterator_walks_elements_in_tree_order() {
        let doc = Document::new();
        let root = doc.create_element("root").unwrap();
        crate::mutation_ops::append(&doc.0, root.node()).unwrap();
        let a = doc.create_element("a").unwrap();
        crate::mutation_ops::append(root.node(), a.node()).unwrap();
        let b = doc.create_element("b").unwrap();
        crate::mutation_ops::append(root.node(), b.node()).unwrap();

        let iter = NodeIterator::new(Rc::clone(root.node()), SHOW_ALL, None);
        assert!(Rc::ptr_eq(&iter.next_node().unwrap(), root.node()));
        assert!(Rc::ptr_eq(&iter.next_node().unwrap(), a.node()));
        assert!(Rc::ptr_eq(&iter.next_node().unwrap(), b.node()));
        assert!(iter.next_node().is_none());
    }

    #[test]
    fn tree_walker_first_child_and_parent_node_roundtrip() {
        let doc = Document::new();
        let root = doc.create_element("root").unwrap();
        crate::mutation_ops::append(&doc.0, root.node()).unwrap();
        let a = doc.create_element("a").unwrap();
        crate::mutation_ops::append(root.node(), a.node()).unwrap();

        let walker = TreeWalker::new(Rc::clone(root.node()), SHOW_ALL, None);
        let child = walker.first_child().unwrap();
        assert!(Rc::ptr_eq(&child, a.node()));
        let parent = walker.parent_node().unwrap();
        assert!(Rc::ptr_eq(&parent, root.node()));
    }

    #[test]
    fn removing_the_reference_node_moves_iterator_to_its_previous_sibling() {
        let doc = Document::new();
        let root = doc.create_element("root").unwrap();
        crate::mutation_ops::append(&doc.0, root.node()).unwrap();
        let a = doc.create_element("a").unwrap();
        crate::mutation_ops::append(root.node(), a.node()).unwrap();
        let b = doc.create_element("b").unwrap();
        crate::mutation_ops::append(root.node(), b.node()).unwrap();

        let iter = NodeIterator::new(Rc::clone(root.node()), SHOW_ALL, None);
        assert!(Rc::ptr_eq(&iter.next_node().unwrap(), root.node()));
        assert!(Rc::ptr_eq(&iter.next_node().unwrap(), a.node()));
        assert!(Rc::ptr_eq(&iter.next_node().unwrap(), b.node()));

        // Reference is `b`, pointer-before-reference is false (just returned
        // by next_node). Removing `b` should fall back to its previous
        // sibling, `a`, so a subsequent previousNode() still lands on `a`.
        crate::mutation_ops::remove(b.node());
        assert!(Rc::ptr_eq(&iter.previous_node().unwrap(), a.node()));
    }
}
