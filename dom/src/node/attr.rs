//! SPECLINK: <https://dom.spec.whatwg.org/#interface-attr>

use std::cell::RefCell;

use crate::QualifiedName;

use super::{NodeData, NodeRef, WeakNodeRef};

#[derive(Clone)]
pub struct AttrData {
    pub name: QualifiedName,
    pub value: RefCell<String>,
    pub owner_element: RefCell<WeakNodeRef>,
}

pub(crate) fn data_of(node: &NodeRef) -> std::cell::Ref<'_, AttrData> {
    std::cell::Ref::map(node.data.borrow(), |d| match d {
        NodeData::Attr(a) => a,
        _ => panic!("node is not an Attr"),
    })
}

/// Newtype view over a `Node` known to be an `Attr`.
#[derive(Clone)]
pub struct Attr(pub NodeRef);

impl std::ops::Deref for Attr {
    type Target = NodeRef;
    fn deref(&self) -> &NodeRef {
        &self.0
    }
}

impl Attr {
    pub fn try_from_node(node: NodeRef) -> Option<Attr> {
        node.is_attr().then_some(Attr(node))
    }

    pub fn local_name(&self) -> String {
        data_of(&self.0).name.local.as_str().to_string()
    }

    pub fn name(&self) -> String {
        data_of(&self.0).name.qualified_name()
    }

    pub fn value(&self) -> String {
        data_of(&self.0).value.borrow().clone()
    }

    pub fn set_value(&self, value: &str) {
        *data_of(&self.0).value.borrow_mut() = value.to_string();
    }

    pub fn owner_element(&self) -> Option<NodeRef> {
        data_of(&self.0).owner_element.borrow().upgrade()
    }

    /// Always `true` for this core; "specified" only ever differed from
    /// `true` for attributes with DTD defaults, which this core's HTML/XML
    /// parsing is out of scope for.
    pub fn specified(&self) -> bool {
        true
    }
}
