//! Tree-mutation algorithms: insert, remove, replace, adopt.
//!
//! SPECLINK: <https://dom.spec.whatwg.org/#mutation-algorithms>
//!
//! Every public entry point here validates with [`crate::validation`] first,
//! then performs the splice, then fires the document's insertion/removal
//! hooks and bumps `tree_revision` so live collections know to re-walk.

use std::rc::Rc;

use crate::error::DomException;
use crate::node::document;
use crate::node::{NodeKind, NodeRef};
use crate::validation::{ensure_pre_insertion_validity, ensure_pre_removal_validity, ensure_pre_replacement_validity};

/// SPECLINK: <https://dom.spec.whatwg.org/#concept-node-pre-insert>
pub fn pre_insert(
    node: &NodeRef,
    parent: &NodeRef,
    child: Option<&NodeRef>,
) -> Result<NodeRef, DomException> {
    ensure_pre_insertion_validity(node, parent, child)?;
    let reference_child = match child {
        Some(child) if Rc::ptr_eq(child, node) => node.next_sibling(),
        other => other.cloned(),
    };
    adopt(node, &parent.owner_document().unwrap_or_else(|| Rc::clone(parent)));
    insert(node, parent, reference_child.as_ref());
    Ok(Rc::clone(node))
}

/// SPECLINK: <https://dom.spec.whatwg.org/#concept-node-insert>
///
/// Splices `node` (flattening it first if it is a `DocumentFragment`) into
/// `parent`'s child list immediately before `child`, or at the end if
/// `child` is `None`. Assumes the caller already validated and adopted.
pub(crate) fn insert(node: &NodeRef, parent: &NodeRef, child: Option<&NodeRef>) {
    let nodes: Vec<NodeRef> = if node.kind() == NodeKind::DocumentFragment {
        let children = node.children();
        for c in &children {
            remove(c);
        }
        children
    } else {
        vec![Rc::clone(node)]
    };

    for n in &nodes {
        splice_one(n, parent, child);
    }

    if let Some(doc) = parent.owner_document().or_else(|| parent.is_document().then(|| Rc::clone(parent))) {
        let doc_view = document::Document(doc);
        for n in &nodes {
            mark_connected(n, parent.is_connected());
            doc_view.run_insertion_steps(n);
        }
        document::bump_revision(&doc_view);
    }
}

fn mark_connected(node: &NodeRef, connected: bool) {
    node.set_is_connected(connected);
    for child in node.children() {
        mark_connected(&child, connected);
    }
}

fn splice_one(node: &NodeRef, parent: &NodeRef, child: Option<&NodeRef>) {
    let previous = match child {
        Some(child) => child.previous_sibling(),
        None => parent.last_child(),
    };

    node.set_parent(Some(parent));
    node.set_previous_sibling(previous.as_ref());
    node.set_next_sibling(child.cloned());

    match &previous {
        Some(previous) => previous.set_next_sibling(Some(Rc::clone(node))),
        None => parent.set_first_child(Some(Rc::clone(node))),
    }
    match child {
        Some(child) => child.set_previous_sibling(Some(node)),
        None => parent.set_last_child(Some(node)),
    }
}

/// SPECLINK: <https://dom.spec.whatwg.org/#concept-node-append>
pub fn append(parent: &NodeRef, node: &NodeRef) -> Result<NodeRef, DomException> {
    pre_insert(node, parent, None)
}

/// SPECLINK: <https://dom.spec.whatwg.org/#concept-node-remove>
///
/// Unconditional splice-out; assumes `node` is currently a child of some
/// parent (it is a no-op otherwise). Runs the owner document's removing
/// steps and bumps `tree_revision`.
pub fn remove(node: &NodeRef) -> NodeRef {
    let Some(parent) = node.parent() else {
        return Rc::clone(node);
    };
    let index = node.index();

    let previous = node.previous_sibling();
    let next = node.next_sibling();

    match &previous {
        Some(previous) => previous.set_next_sibling(next.clone()),
        None => parent.set_first_child(next.clone()),
    }
    match &next {
        Some(next) => next.set_previous_sibling(previous.as_ref()),
        None => parent.set_last_child(previous.as_ref()),
    }

    crate::range::adjust_for_node_removal(node, &parent, index);
    crate::traversal::adjust_for_node_removal(node);

    node.set_parent(None);
    node.set_previous_sibling(None);
    node.set_next_sibling(None);

    if let Some(doc) = node.owner_document() {
        let doc_view = document::Document(doc);
        doc_view.run_removing_steps(node);
        document::bump_revision(&doc_view);
    }
    mark_connected(node, false);
    Rc::clone(node)
}

/// SPECLINK: <https://dom.spec.whatwg.org/#concept-node-pre-remove>
pub fn pre_remove(node: &NodeRef, parent: &NodeRef) -> Result<NodeRef, DomException> {
    ensure_pre_removal_validity(node, parent)?;
    Ok(remove(node))
}

/// SPECLINK: <https://dom.spec.whatwg.org/#concept-node-replace>
pub fn replace(child: &NodeRef, node: &NodeRef, parent: &NodeRef) -> Result<NodeRef, DomException> {
    if !child.is_child_of(parent) {
        return Err(crate::error::DomException::from(crate::error::ErrorName::NotFoundError));
    }
    ensure_pre_replacement_validity(node, parent, child)?;
    // Reference point for the splice: `child`'s next sibling, unless `node`
    // is itself that sibling (then it would be moving to where it already
    // sits once `child` is gone).
    let reference = child.next_sibling().filter(|r| !Rc::ptr_eq(r, node));

    remove(child);
    adopt(node, &parent.owner_document().unwrap_or_else(|| Rc::clone(parent)));
    insert(node, parent, reference.as_ref());
    Ok(Rc::clone(child))
}

/// SPECLINK: <https://dom.spec.whatwg.org/#concept-node-replace-all>
///
/// Used by `Node.textContent`'s setter and `innerHTML`-style replacement:
/// every existing child is removed, then `node` (if any) is inserted.
pub fn replace_all(parent: &NodeRef, node: Option<&NodeRef>) -> Result<(), DomException> {
    for child in parent.children() {
        remove(&child);
    }
    if let Some(node) = node {
        insert(node, parent, None);
    }
    if let Some(doc) = parent.owner_document().or_else(|| parent.is_document().then(|| Rc::clone(parent))) {
        document::bump_revision(&document::Document(doc));
    }
    Ok(())
}

/// SPECLINK: <https://dom.spec.whatwg.org/#concept-node-adopt>
///
/// Moves `node` (and its descendants) into `document`'s ownership,
/// detaching it from any current parent first.
pub fn adopt(node: &NodeRef, document: &NodeRef) {
    if node.owner_document().is_some_and(|d| Rc::ptr_eq(&d, document)) {
        return;
    }
    if node.parent().is_some() {
        remove(node);
    }
    set_owner_recursive(node, document);
}

fn set_owner_recursive(node: &NodeRef, document: &NodeRef) {
    node.set_owner_document(Some(document));
    for child in node.children() {
        set_owner_recursive(&child, document);
    }
}

/// SPECLINK: <https://dom.spec.whatwg.org/#dom-parentnode-movebefore>
///
/// Like [`pre_insert`] but never detaches-and-reattaches fires as a single
/// atomic step: a node already connected keeps its `is_connected` state
/// across the move instead of toggling disconnected in between.
pub fn move_before(node: &NodeRef, parent: &NodeRef, child: Option<&NodeRef>) -> Result<(), DomException> {
    ensure_pre_insertion_validity(node, parent, child)?;
    if let Some(old_parent) = node.parent() {
        let previous = node.previous_sibling();
        let next = node.next_sibling();
        match &previous {
            Some(previous) => previous.set_next_sibling(next.clone()),
            None => old_parent.set_first_child(next.clone()),
        }
        match &next {
            Some(next) => next.set_previous_sibling(previous.as_ref()),
            None => old_parent.set_last_child(previous.as_ref()),
        }
    }
    splice_one(node, parent, child);
    if let Some(doc) = parent.owner_document().or_else(|| parent.is_document().then(|| Rc::clone(parent))) {
        document::bump_revision(&document::Document(doc));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::document::Document;

    #[test]
    fn append_then_remove_clears_parent_link() {
        let doc = Document::new();
        let parent = doc.create_element("ul").unwrap();
        append(&doc.0, parent.node()).unwrap();
        let child = doc.create_element("li").unwrap();
        append(parent.node(), child.node()).unwrap();
        assert!(child.node().is_child_of(parent.node()));
        remove(child.node());
        assert!(child.node().parent().is_none());
        assert!(!parent.node().has_children());
    }

    #[test]
    fn inserting_fragment_flattens_its_children() {
        let doc = Document::new();
        let parent = doc.create_element("ul").unwrap();
        append(&doc.0, parent.node()).unwrap();
        let fragment = doc.create_document_fragment();
        for _ in 0..3 {
            let li = doc.create_element("li").unwrap();
            append(fragment.node(), li.node()).unwrap();
        }
        append(parent.node(), fragment.node()).unwrap();
        assert_eq!(parent.node().children().len(), 3);
        assert!(!fragment.node().has_children());
    }

    #[test]
    fn adopting_into_another_document_reassigns_owner() {
        let first = Document::new();
        let second = Document::new();
        let el = first.create_element("div").unwrap();
        append(&first.0, el.node()).unwrap();
        adopt(el.node(), &second.0);
        assert!(std::rc::Rc::ptr_eq(&el.node().owner_document().unwrap(), &second.0));
        assert!(el.node().parent().is_none());
    }

    #[test]
    fn cross_document_append_adopts_automatically() {
        let first = Document::new();
        let second = Document::new();
        let el = first.create_element("div").unwrap();
        append(&second.0, el.node()).unwrap();
        assert!(std::rc::Rc::ptr_eq(&el.node().owner_document().unwrap(), &second.0));
    }

    #[test]
    fn remove_marks_subtree_disconnected() {
        let doc = Document::new();
        let parent = doc.create_element("div").unwrap();
        append(&doc.0, parent.node()).unwrap();
        let child = doc.create_element("span").unwrap();
        append(parent.node(), child.node()).unwrap();
        assert!(child.node().is_connected());
        remove(parent.node());
        assert!(!parent.node().is_connected());
        assert!(!child.node().is_connected());
    }
}
