//! `AbstractRange`, `Range`, `StaticRange` and live boundary-point tracking.
//!
//! SPECLINK: <https://dom.spec.whatwg.org/#ranges>
//!
//! A `Range`'s boundary points move as the tree around them mutates (a
//! "live range"); `StaticRange` is a plain snapshot that never moves.
//! Every live `Range` registers a weak handle to its inner state with its
//! document, which calls back into [`adjust_for_character_data_mutation`]
//! and [`adjust_for_node_removal`] as those mutations happen.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

use crate::error::{DomException, ErrorName};
use crate::node::document::Document;
use crate::node::NodeRef;

/// SPECLINK: <https://dom.spec.whatwg.org/#dom-range-start_to_start>
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareHow {
    StartToStart,
    StartToEnd,
    EndToEnd,
    EndToStart,
}

fn node_length(node: &NodeRef) -> usize {
    if node.is_character_data() {
        crate::node::character_data::CharacterData(Rc::clone(node)).length()
    } else {
        node.children().len()
    }
}

/// A point in the tree: a reference node plus a child-or-character offset.
///
/// SPECLINK: <https://dom.spec.whatwg.org/#concept-range-bp>
#[derive(Clone)]
pub struct BoundaryPoint {
    pub node: NodeRef,
    pub offset: usize,
}

impl BoundaryPoint {
    fn position(&self) -> Vec<usize> {
        // Root-first path of child indices, with `self.offset` appended,
        // so two boundary points compare lexicographically by this vector
        // exactly as tree order requires.
        let mut ancestors = self.node.inclusive_ancestors();
        ancestors.reverse();
        let mut path: Vec<usize> = ancestors.windows(2).map(|w| w[1].index()).collect();
        path.push(self.offset);
        path
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#concept-range-bp-position>
    pub fn compare(&self, other: &BoundaryPoint) -> Ordering {
        self.position().cmp(&other.position())
    }
}

/// Boundary points a `StaticRange`/`Range` share.
///
/// SPECLINK: <https://dom.spec.whatwg.org/#interface-abstractrange>
pub trait AbstractRange {
    fn start(&self) -> BoundaryPoint;
    fn end(&self) -> BoundaryPoint;
    fn collapsed(&self) -> bool {
        let (s, e) = (self.start(), self.end());
        Rc::ptr_eq(&s.node, &e.node) && s.offset == e.offset
    }
}

/// A non-live, immutable pair of boundary points.
///
/// SPECLINK: <https://dom.spec.whatwg.org/#interface-staticrange>
pub struct StaticRange {
    start: BoundaryPoint,
    end: BoundaryPoint,
}

impl StaticRange {
    pub fn new(start: BoundaryPoint, end: BoundaryPoint) -> Self {
        StaticRange { start, end }
    }
}

impl AbstractRange for StaticRange {
    fn start(&self) -> BoundaryPoint {
        self.start.clone()
    }
    fn end(&self) -> BoundaryPoint {
        self.end.clone()
    }
}

pub(crate) struct RangeInner {
    start: RefCell<BoundaryPoint>,
    end: RefCell<BoundaryPoint>,
}

/// A live range: its boundary points shift to stay meaningful across tree
/// and character-data mutations.
///
/// SPECLINK: <https://dom.spec.whatwg.org/#interface-range>
#[derive(Clone)]
pub struct Range {
    inner: Rc<RangeInner>,
}

impl AbstractRange for Range {
    fn start(&self) -> BoundaryPoint {
        self.inner.start.borrow().clone()
    }
    fn end(&self) -> BoundaryPoint {
        self.inner.end.borrow().clone()
    }
}

impl Range {
    pub(crate) fn new(document_root: NodeRef) -> Self {
        let inner = Rc::new(RangeInner {
            start: RefCell::new(BoundaryPoint { node: Rc::clone(&document_root), offset: 0 }),
            end: RefCell::new(BoundaryPoint { node: document_root, offset: 0 }),
        });
        let weak = Rc::downgrade(&inner);
        let range = Range { inner };
        if let Some(doc) = range.start().node.owner_document().or_else(|| range.start().node.is_document().then(|| Rc::clone(&range.start().node))) {
            Document(doc).register_range(weak);
        }
        range
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-range-setstart>
    pub fn set_start(&self, node: NodeRef, offset: usize) -> Result<(), DomException> {
        *self.inner.start.borrow_mut() = BoundaryPoint { node, offset };
        self.fix_ordering();
        Ok(())
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-range-setend>
    pub fn set_end(&self, node: NodeRef, offset: usize) -> Result<(), DomException> {
        *self.inner.end.borrow_mut() = BoundaryPoint { node, offset };
        self.fix_ordering();
        Ok(())
    }

    fn fix_ordering(&self) {
        let start = self.inner.start.borrow().clone();
        let end = self.inner.end.borrow().clone();
        if start.compare(&end) == Ordering::Greater {
            *self.inner.end.borrow_mut() = start;
        }
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-range-setstartbefore>
    pub fn set_start_before(&self, ref_node: &NodeRef) -> Result<(), DomException> {
        let parent = ref_node.parent().ok_or_else(|| DomException::from(ErrorName::InvalidNodeTypeError))?;
        self.set_start(parent, ref_node.index())
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-range-setstartafter>
    pub fn set_start_after(&self, ref_node: &NodeRef) -> Result<(), DomException> {
        let parent = ref_node.parent().ok_or_else(|| DomException::from(ErrorName::InvalidNodeTypeError))?;
        self.set_start(parent, ref_node.index() + 1)
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-range-setendbefore>
    pub fn set_end_before(&self, ref_node: &NodeRef) -> Result<(), DomException> {
        let parent = ref_node.parent().ok_or_else(|| DomException::from(ErrorName::InvalidNodeTypeError))?;
        self.set_end(parent, ref_node.index())
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-range-setendafter>
    pub fn set_end_after(&self, ref_node: &NodeRef) -> Result<(), DomException> {
        let parent = ref_node.parent().ok_or_else(|| DomException::from(ErrorName::InvalidNodeTypeError))?;
        self.set_end(parent, ref_node.index() + 1)
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-range-collapse>
    pub fn collapse(&self, to_start: bool) {
        if to_start {
            *self.inner.end.borrow_mut() = self.start();
        } else {
            *self.inner.start.borrow_mut() = self.end();
        }
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-range-selectnode>
    pub fn select_node(&self, node: &NodeRef) -> Result<(), DomException> {
        let parent = node.parent().ok_or_else(|| DomException::from(ErrorName::InvalidNodeTypeError))?;
        let index = node.index();
        *self.inner.start.borrow_mut() = BoundaryPoint { node: Rc::clone(&parent), offset: index };
        *self.inner.end.borrow_mut() = BoundaryPoint { node: parent, offset: index + 1 };
        Ok(())
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-range-selectnodecontents>
    pub fn select_node_contents(&self, node: &NodeRef) -> Result<(), DomException> {
        if node.is_doctype() {
            return Err(DomException::from(ErrorName::InvalidNodeTypeError));
        }
        let length = node_length(node);
        *self.inner.start.borrow_mut() = BoundaryPoint { node: Rc::clone(node), offset: 0 };
        *self.inner.end.borrow_mut() = BoundaryPoint { node: Rc::clone(node), offset: length };
        Ok(())
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-range-compareboundarypoints>
    pub fn compare_boundary_points(&self, how: CompareHow, other: &Range) -> Ordering {
        let (this_point, other_point) = match how {
            CompareHow::StartToStart => (self.start(), other.start()),
            CompareHow::StartToEnd => (self.end(), other.start()),
            CompareHow::EndToEnd => (self.end(), other.end()),
            CompareHow::EndToStart => (self.start(), other.end()),
        };
        this_point.compare(&other_point)
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-range-comparepoint>
    pub fn compare_point(&self, node: &NodeRef, offset: usize) -> Ordering {
        let point = BoundaryPoint { node: Rc::clone(node), offset };
        if point.compare(&self.start()) == Ordering::Less {
            Ordering::Less
        } else if point.compare(&self.end()) == Ordering::Greater {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-range-intersectsnode>
    pub fn intersects_node(&self, node: &NodeRef) -> bool {
        let Some(parent) = node.parent() else {
            // A node with no parent intersects only a range that also has
            // no common ancestor with it to compare against; treat it as a
            // miss rather than panicking on `index()`.
            return false;
        };
        let offset = node.index();
        let start = self.start();
        let end = self.end();
        let before_start = BoundaryPoint { node: Rc::clone(&parent), offset }.compare(&start) == Ordering::Less;
        let after_end = BoundaryPoint { node: parent, offset: offset + 1 }.compare(&end) == Ordering::Greater;
        !before_start && !after_end
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-range-clonerange>
    pub fn clone_range(&self) -> Range {
        let inner = Rc::new(RangeInner {
            start: RefCell::new(self.start()),
            end: RefCell::new(self.end()),
        });
        let weak = Rc::downgrade(&inner);
        let range = Range { inner };
        if let Some(doc) = range
            .start()
            .node
            .owner_document()
            .or_else(|| range.start().node.is_document().then(|| Rc::clone(&range.start().node)))
        {
            Document(doc).register_range(weak);
        }
        range
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-range-deletecontents>
    ///
    /// Simple-range case only: removes every top-level child strictly
    /// between the boundary points when both fall in the same parent.
    pub fn delete_contents(&self) -> Result<(), DomException> {
        let start = self.start();
        let end = self.end();
        if !Rc::ptr_eq(&start.node, &end.node) {
            return Err(DomException::from(ErrorName::InvalidStateError));
        }
        if start.node.is_character_data() {
            let cd = crate::node::character_data::CharacterData(Rc::clone(&start.node));
            return cd.delete_data(start.offset, end.offset - start.offset);
        }
        let children = start.node.children();
        for child in children[start.offset..end.offset].iter() {
            crate::mutation_ops::remove(child);
        }
        let collapsed = BoundaryPoint { node: start.node, offset: start.offset };
        *self.inner.end.borrow_mut() = collapsed.clone();
        *self.inner.start.borrow_mut() = collapsed;
        Ok(())
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-range-clonecontents>
    pub fn clone_contents(&self) -> Vec<NodeRef> {
        let start = self.start();
        let end = self.end();
        if !Rc::ptr_eq(&start.node, &end.node) || start.node.is_character_data() {
            return Vec::new();
        }
        start.node.children()[start.offset..end.offset]
            .iter()
            .map(|n| n.clone_node(true))
            .collect()
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-range-extractcontents>
    ///
    /// Simple-range case only, matching [`Range::delete_contents`] and
    /// [`Range::clone_contents`]: clones then removes the nodes strictly
    /// between the boundary points.
    pub fn extract_contents(&self) -> Result<Vec<NodeRef>, DomException> {
        let extracted = self.clone_contents();
        self.delete_contents()?;
        Ok(extracted)
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-range-surroundcontents>
    pub fn surround_contents(&self, new_parent: &NodeRef) -> Result<(), DomException> {
        let start = self.start();
        let end = self.end();
        if !Rc::ptr_eq(&start.node, &end.node) && start.node.is_character_data() {
            return Err(DomException::from(ErrorName::InvalidStateError));
        }
        if new_parent.is_doctype() {
            return Err(DomException::from(ErrorName::InvalidNodeTypeError));
        }
        let owner = start
            .node
            .owner_document()
            .or_else(|| start.node.is_document().then(|| Rc::clone(&start.node)))
            .ok_or(DomException::from(ErrorName::InvalidStateError))?;
        let fragment = Document(owner).create_document_fragment();
        for node in self.extract_contents()? {
            crate::mutation_ops::append(&fragment, &node)?;
        }
        crate::mutation_ops::replace_all(new_parent, None)?;
        self.insert_node(new_parent)?;
        crate::mutation_ops::append(new_parent, &fragment)?;
        self.select_node(new_parent)
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-range-insertnode>
    ///
    /// Simple-range case: inserts `node` as a child of the start boundary's
    /// container at the start offset, splitting text data there first.
    pub fn insert_node(&self, node: &NodeRef) -> Result<(), DomException> {
        let start = self.start();
        if start.node.is_character_data() {
            let cd = crate::node::character_data::CharacterData(Rc::clone(&start.node));
            let tail = cd.substring_data(start.offset, cd.length() - start.offset)?;
            cd.replace_data(start.offset, cd.length() - start.offset, "")?;
            let Some(parent) = start.node.parent() else {
                return Err(DomException::from(ErrorName::InvalidStateError));
            };
            let reference = start.node.next_sibling();
            crate::mutation_ops::pre_insert(node, &parent, reference.as_ref())?;
            if !tail.is_empty() {
                let tail_node = Document(
                    start
                        .node
                        .owner_document()
                        .unwrap_or_else(|| Rc::clone(&parent)),
                )
                .create_text_node(&tail);
                crate::mutation_ops::pre_insert(&tail_node, &parent, reference.as_ref())?;
            }
            return Ok(());
        }
        let reference = start.node.children().get(start.offset).cloned();
        crate::mutation_ops::pre_insert(node, &start.node, reference.as_ref())?;
        Ok(())
    }
}

/// Called after [`crate::node::character_data::CharacterData::replace_data`]
/// mutates `node`'s data, shifting any live range boundary that pointed
/// past the mutation point.
///
/// SPECLINK: <https://dom.spec.whatwg.org/#concept-cd-replace> step 8
pub(crate) fn adjust_for_character_data_mutation(node: &NodeRef, offset: usize, delta: isize) {
    let Some(doc) = node
        .owner_document()
        .or_else(|| node.is_document().then(|| Rc::clone(node)))
    else {
        return;
    };
    for_each_live_range(&doc, |boundary| {
        if Rc::ptr_eq(&boundary.node, node) && boundary.offset > offset {
            boundary.offset = (boundary.offset as isize + delta).max(offset as isize) as usize;
        }
    });
}

/// Called after a node is removed from its parent, collapsing any live
/// range boundary inside the removed subtree to the removal point, and
/// shifting boundaries in the same parent past the removed index.
///
/// SPECLINK: <https://dom.spec.whatwg.org/#concept-node-remove> step 18
pub(crate) fn adjust_for_node_removal(node: &NodeRef, parent: &NodeRef, index: usize) {
    let Some(doc) = parent
        .owner_document()
        .or_else(|| parent.is_document().then(|| Rc::clone(parent)))
    else {
        return;
    };
    for_each_live_range(&doc, |boundary| {
        if node.is_inclusive_ancestor_of(&boundary.node) || Rc::ptr_eq(&boundary.node, node) {
            boundary.node = Rc::clone(parent);
            boundary.offset = index;
        } else if Rc::ptr_eq(&boundary.node, parent) && boundary.offset > index {
            boundary.offset -= 1;
        }
    });
}

fn for_each_live_range(doc: &NodeRef, mut f: impl FnMut(&mut BoundaryPoint)) {
    let data = crate::node::document::data_of(doc);
    let mut ranges = data.live_ranges.borrow_mut();
    ranges.retain(|weak| weak.strong_count() > 0);
    for weak in ranges.iter() {
        if let Some(inner) = weak.upgrade() {
            let mut start = inner.start.borrow_mut();
            f(&mut start);
            drop(start);
            let mut end = inner.end.borrow_mut();
            f(&mut end);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::document::Document;

    #[test]
    fn range_collapsed_when_start_equals_end() {
        let doc = Document::new();
        let range = doc.create_range();
        assert!(range.collapsed());
    }

    #[test]
    fn character_data_replace_shifts_range_boundary_past_insertion() {
        let doc = Document::new();
        let text = doc.create_text_node("hello world");
        crate::mutation_ops::append(&doc.0, text.node()).unwrap();
        let range = doc.create_range();
        range.set_start(Rc::clone(text.node()), 8).unwrap();
        range.set_end(Rc::clone(text.node()), 8).unwrap();
        text.insert_data(0, "XXX").unwrap();
        assert_eq!(range.start().offset, 11);
    }

    #[test]
    fn removing_boundary_node_collapses_range_to_parent() {
        let doc = Document::new();
        let root = doc.create_element("root").unwrap();
        crate::mutation_ops::append(&doc.0, root.node()).unwrap();
        let a = doc.create_element("a").unwrap();
        crate::mutation_ops::append(root.node(), a.node()).unwrap();
        let b = doc.create_element("b").unwrap();
        crate::mutation_ops::append(root.node(), b.node()).unwrap();

        let range = doc.create_range();
        range.set_start(Rc::clone(a.node()), 0).unwrap();
        range.set_end(Rc::clone(a.node()), 0).unwrap();
        crate::mutation_ops::remove(a.node());
        assert!(Rc::ptr_eq(&range.start().node, root.node()));
    }

    #[test]
    fn select_node_brackets_node_in_its_parent() {
        let doc = Document::new();
        let root = doc.create_element("root").unwrap();
        crate::mutation_ops::append(&doc.0, root.node()).unwrap();
        let a = doc.create_element("a").unwrap();
        crate::mutation_ops::append(root.node(), a.node()).unwrap();

        let range = doc.create_range();
        range.select_node(a.node()).unwrap();
        assert!(Rc::ptr_eq(&range.start().node, root.node()));
        assert_eq!(range.start().offset, 0);
        assert_eq!(range.end().offset, 1);
    }

    #[test]
    fn select_node_contents_spans_full_child_count() {
        let doc = Document::new();
        let root = doc.create_element("root").unwrap();
        crate::mutation_ops::append(&doc.0, root.node()).unwrap();
        for _ in 0..3 {
            let child = doc.create_element("c").unwrap();
            crate::mutation_ops::append(root.node(), child.node()).unwrap();
        }
        let range = doc.create_range();
        range.select_node_contents(root.node()).unwrap();
        assert_eq!(range.start().offset, 0);
        assert_eq!(range.end().offset, 3);
    }

    #[test]
    fn set_start_before_and_after_use_parent_index() {
        let doc = Document::new();
        let root = doc.create_element("root").unwrap();
        crate::mutation_ops::append(&doc.0, root.node()).unwrap();
        let a = doc.create_element("a").unwrap();
        crate::mutation_ops::append(root.node(), a.node()).unwrap();

        let range = doc.create_range();
        range.set_start_before(a.node()).unwrap();
        assert_eq!(range.start().offset, 0);
        range.set_start_after(a.node()).unwrap();
        assert_eq!(range.start().offset, 1);
    }

    #[test]
    fn collapse_to_start_moves_end_to_start() {
        let doc = Document::new();
        let root = doc.create_element("root").unwrap();
        crate::mutation_ops::append(&doc.0, root.node()).unwrap();
        for _ in 0..2 {
            let child = doc.create_element("c").unwrap();
            crate::mutation_ops::append(root.node(), child.node()).unwrap();
        }
        let range = doc.create_range();
        range.select_node_contents(root.node()).unwrap();
        range.collapse(true);
        assert_eq!(range.end().offset, range.start().offset);
    }

    #[test]
    fn compare_boundary_points_start_to_start() {
        let doc = Document::new();
        let root = doc.create_element("root").unwrap();
        crate::mutation_ops::append(&doc.0, root.node()).unwrap();
        let a = doc.create_element("a").unwrap();
        crate::mutation_ops::append(root.node(), a.node()).unwrap();
        let b = doc.create_element("b").unwrap();
        crate::mutation_ops::append(root.node(), b.node()).unwrap();

        let first = doc.create_range();
        first.select_node(a.node()).unwrap();
        let second = doc.create_range();
        second.select_node(b.node()).unwrap();
        assert_eq!(first.compare_boundary_points(CompareHow::StartToStart, &second), Ordering::Less);
    }

    #[test]
    fn intersects_node_true_only_for_nodes_inside_the_range() {
        let doc = Document::new();
        let root = doc.create_element("root").unwrap();
        crate::mutation_ops::append(&doc.0, root.node()).unwrap();
        let a = doc.create_element("a").unwrap();
        crate::mutation_ops::append(root.node(), a.node()).unwrap();
        let b = doc.create_element("b").unwrap();
        crate::mutation_ops::append(root.node(), b.node()).unwrap();

        let range = doc.create_range();
        range.select_node(a.node()).unwrap();
        assert!(range.intersects_node(a.node()));
        assert!(!range.intersects_node(b.node()));
    }

    #[test]
    fn insert_node_splits_text_at_the_start_offset() {
        let doc = Document::new();
        let text = doc.create_text_node("helloworld");
        crate::mutation_ops::append(&doc.0, text.node()).unwrap();
        let range = doc.create_range();
        range.set_start(Rc::clone(text.node()), 5).unwrap();
        range.set_end(Rc::clone(text.node()), 5).unwrap();

        let marker = doc.create_element("marker").unwrap();
        range.insert_node(marker.node()).unwrap();

        let children = doc.0.children();
        assert_eq!(children.len(), 3);
        assert!(Rc::ptr_eq(&children[1], marker.node()));
    }

    #[test]
    fn extract_contents_removes_and_returns_nodes() {
        let doc = Document::new();
        let root = doc.create_element("root").unwrap();
        crate::mutation_ops::append(&doc.0, root.node()).unwrap();
        let a = doc.create_element("a").unwrap();
        crate::mutation_ops::append(root.node(), a.node()).unwrap();

        let range = doc.create_range();
        range.select_node(a.node()).unwrap();
        let extracted = range.extract_contents().unwrap();
        assert_eq!(extracted.len(), 1);
        assert!(!root.node().has_children());
    }
}
