//! SPECLINK: <https://dom.spec.whatwg.org/#interface-shadowroot>

use super::{NodeData, NodeRef, WeakNodeRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowRootMode {
    Open,
    Closed,
}

#[derive(Clone)]
pub struct ShadowRootData {
    pub mode: ShadowRootMode,
    pub host: WeakNodeRef,
}

pub(crate) fn data_of(node: &NodeRef) -> std::cell::Ref<'_, ShadowRootData> {
    std::cell::Ref::map(node.data.borrow(), |d| match d {
        NodeData::ShadowRoot(s) => s,
        _ => panic!("node is not a ShadowRoot"),
    })
}

/// Newtype view over a `Node` known to be a `ShadowRoot`.
#[derive(Clone)]
pub struct ShadowRoot(pub NodeRef);

impl std::ops::Deref for ShadowRoot {
    type Target = NodeRef;
    fn deref(&self) -> &NodeRef {
        &self.0
    }
}

impl ShadowRoot {
    pub fn try_from_node(node: NodeRef) -> Option<ShadowRoot> {
        node.is_shadow_root().then_some(ShadowRoot(node))
    }

    pub fn mode(&self) -> ShadowRootMode {
        data_of(&self.0).mode
    }

    pub fn host(&self) -> Option<NodeRef> {
        data_of(&self.0).host.upgrade()
    }
}
