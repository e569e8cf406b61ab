//! Pre-insertion, pre-removal and pre-replacement validity checks.
//!
//! SPECLINK: <https://dom.spec.whatwg.org/#concept-node-ensure-pre-insertion-validity>
//!
//! These are pure predicates over the tree as it stands; [`crate::mutation_ops`]
//! calls them before actually splicing anything, and propagates whatever
//! `DomException` they return without running any of the mutation steps.
//!
//! Insertion and replacement have textually similar but distinct Document-
//! child-count rules (spec.md §3 invariant 4 / §8): replacing an existing
//! document Element or DocumentType with another of the same kind is legal
//! even though the document already "has" one, precisely because the one
//! it has is about to be removed. [`ensure_pre_insertion_validity`] and
//! [`ensure_pre_replacement_validity`] are kept as two separate entry
//! points rather than one function with a "replacing" flag threaded
//! through `child`, so that [`crate::mutation_ops::pre_insert`] and
//! [`crate::mutation_ops::move_before`] — which only ever pass a genuine
//! reference child, never a node about to be removed — cannot accidentally
//! take the replacement exception.

use std::rc::Rc;

use crate::error::{DomException, ErrorName};
use crate::node::{NodeKind, NodeRef};

fn ensure_hierarchy_validity(node: &NodeRef, parent: &NodeRef) -> Result<(), DomException> {
    if !matches!(
        parent.kind(),
        NodeKind::Document | NodeKind::DocumentFragment | NodeKind::Element | NodeKind::ShadowRoot
    ) {
        return Err(DomException::from(ErrorName::HierarchyRequestError));
    }
    if node.is_inclusive_ancestor_of(parent) || Rc::ptr_eq(node, parent) {
        return Err(DomException::from(ErrorName::HierarchyRequestError));
    }
    Ok(())
}

fn ensure_insertable_kind(node: &NodeRef, parent: &NodeRef) -> Result<(), DomException> {
    if !node.is_insertable_kind() {
        return Err(DomException::from(ErrorName::HierarchyRequestError));
    }
    if node.kind() == NodeKind::Text && parent.kind() == NodeKind::Document {
        return Err(DomException::from(ErrorName::HierarchyRequestError));
    }
    if node.kind() == NodeKind::DocumentType && parent.kind() != NodeKind::Document {
        return Err(DomException::from(ErrorName::HierarchyRequestError));
    }
    Ok(())
}

/// SPECLINK: <https://dom.spec.whatwg.org/#concept-node-ensure-pre-insertion-validity>
///
/// Checked in this order, matching the standard: parent kind, hierarchy
/// (node is not an inclusive ancestor of parent, and not parent itself),
/// child's membership in parent, node's insertable kind, then the
/// per-parent-kind child-count/ordering constraints. `child`, when given,
/// is always a genuine reference point already present in `parent` — never
/// a node in the process of being replaced.
pub(crate) fn ensure_pre_insertion_validity(
    node: &NodeRef,
    parent: &NodeRef,
    child: Option<&NodeRef>,
) -> Result<(), DomException> {
    ensure_hierarchy_validity(node, parent)?;
    if let Some(child) = child {
        if !child.is_child_of(parent) {
            return Err(DomException::from(ErrorName::NotFoundError));
        }
    }
    ensure_insertable_kind(node, parent)?;
    if parent.kind() == NodeKind::Document {
        validate_document_parent(node, &parent.children(), child)?;
    }
    Ok(())
}

/// SPECLINK: <https://dom.spec.whatwg.org/#concept-node-replace>
///
/// Like [`ensure_pre_insertion_validity`], but for replacing `old_child`
/// (already a child of `parent`) with `node`. The document-level child-
/// count checks are run against `parent`'s children with `old_child`
/// excluded, since `old_child` is about to be removed — this is the only
/// place that exclusion is allowed to happen.
pub(crate) fn ensure_pre_replacement_validity(
    node: &NodeRef,
    parent: &NodeRef,
    old_child: &NodeRef,
) -> Result<(), DomException> {
    ensure_hierarchy_validity(node, parent)?;
    ensure_insertable_kind(node, parent)?;
    if parent.kind() == NodeKind::Document {
        let children: Vec<NodeRef> = parent
            .children()
            .into_iter()
            .filter(|c| !Rc::ptr_eq(c, old_child))
            .collect();
        let reference = old_child.next_sibling().filter(|next| !Rc::ptr_eq(next, node));
        validate_document_parent(node, &children, reference.as_ref())?;
    }
    Ok(())
}

fn validate_document_parent(
    node: &NodeRef,
    children: &[NodeRef],
    child: Option<&NodeRef>,
) -> Result<(), DomException> {
    let element_children = node.kind() == NodeKind::DocumentFragment
        && node.children().iter().filter(|c| c.is_element()).count() > 1;
    if element_children {
        return Err(DomException::from(ErrorName::HierarchyRequestError));
    }
    if node.kind() == NodeKind::DocumentFragment && node.children().iter().any(|c| c.is_text()) {
        return Err(DomException::from(ErrorName::HierarchyRequestError));
    }

    let doc_has_element = children.iter().any(|c| c.is_element());
    let incoming_is_element =
        node.is_element() || (node.kind() == NodeKind::DocumentFragment && node.children().iter().any(|c| c.is_element()));

    if incoming_is_element {
        if doc_has_element {
            return Err(DomException::from(ErrorName::HierarchyRequestError));
        }
        if let Some(child) = child {
            if children
                .iter()
                .skip_while(|c| !Rc::ptr_eq(c, child))
                .skip(1)
                .any(|c| c.is_doctype())
            {
                return Err(DomException::from(ErrorName::HierarchyRequestError));
            }
        }
    }
    if node.kind() == NodeKind::DocumentType {
        let has_doctype = children.iter().any(|c| c.is_doctype());
        if has_doctype {
            return Err(DomException::from(ErrorName::HierarchyRequestError));
        }
        if let Some(child) = child {
            if children.iter().take_while(|c| !Rc::ptr_eq(c, child)).any(|c| c.is_element()) {
                return Err(DomException::from(ErrorName::HierarchyRequestError));
            }
        } else if doc_has_element {
            return Err(DomException::from(ErrorName::HierarchyRequestError));
        }
    }
    Ok(())
}

/// SPECLINK: <https://dom.spec.whatwg.org/#concept-node-pre-remove>
pub(crate) fn ensure_pre_removal_validity(node: &NodeRef, parent: &NodeRef) -> Result<(), DomException> {
    if !node.is_child_of(parent) {
        return Err(DomException::from(ErrorName::NotFoundError));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::document::Document;

    #[test]
    fn inserting_ancestor_into_descendant_is_hierarchy_request_error() {
        let doc = Document::new();
        let parent = doc.create_element("div").unwrap();
        crate::mutation_ops::append(&doc.0, &parent).unwrap();
        let child = doc.create_element("span").unwrap();
        crate::mutation_ops::append(&parent, &child).unwrap();
        let err = ensure_pre_insertion_validity(parent.node(), child.node(), None).unwrap_err();
        assert_eq!(err.name, ErrorName::HierarchyRequestError);
    }

    #[test]
    fn second_document_element_is_rejected() {
        let doc = Document::new();
        let root = doc.create_element("html").unwrap();
        crate::mutation_ops::append(&doc.0, &root).unwrap();
        let second = doc.create_element("html").unwrap();
        let err = ensure_pre_insertion_validity(second.node(), &doc.0, None).unwrap_err();
        assert_eq!(err.name, ErrorName::HierarchyRequestError);
    }

    #[test]
    fn child_not_found_reports_not_found_before_hierarchy_check() {
        let doc = Document::new();
        let parent = doc.create_element("div").unwrap();
        crate::mutation_ops::append(&doc.0, &parent).unwrap();
        let stray = doc.create_element("span").unwrap();
        let node = doc.create_element("b").unwrap();
        let err = ensure_pre_insertion_validity(node.node(), parent.node(), Some(stray.node())).unwrap_err();
        assert_eq!(err.name, ErrorName::NotFoundError);
    }

    #[test]
    fn inserting_second_element_before_existing_document_element_is_rejected() {
        // doc.children() == [html]; insertBefore(newDiv, html) must still
        // be rejected even though `html` (the reference child) is itself
        // an element — the reference-child exception belongs only to
        // replaceChild, not insertBefore.
        let doc = Document::new();
        let html = doc.create_element("html").unwrap();
        crate::mutation_ops::append(&doc.0, &html).unwrap();
        let new_div = doc.create_element("div").unwrap();
        let err = ensure_pre_insertion_validity(new_div.node(), &doc.0, Some(html.node())).unwrap_err();
        assert_eq!(err.name, ErrorName::HierarchyRequestError);
    }

    #[test]
    fn replacing_the_document_element_with_another_element_is_allowed() {
        let doc = Document::new();
        let html = doc.create_element("html").unwrap();
        crate::mutation_ops::append(&doc.0, &html).unwrap();
        let replacement = doc.create_element("body").unwrap();
        assert!(ensure_pre_replacement_validity(replacement.node(), &doc.0, html.node()).is_ok());
    }
}
