//! SPECLINK: <https://dom.spec.whatwg.org/#interface-documentfragment>

use super::NodeRef;

/// Newtype view over a `Node` known to be a `DocumentFragment`.
#[derive(Clone)]
pub struct DocumentFragment(pub NodeRef);

impl std::ops::Deref for DocumentFragment {
    type Target = NodeRef;
    fn deref(&self) -> &NodeRef {
        &self.0
    }
}

impl DocumentFragment {
    pub fn try_from_node(node: NodeRef) -> Option<DocumentFragment> {
        (node.kind() == super::NodeKind::DocumentFragment).then_some(DocumentFragment(node))
    }

    pub fn node(&self) -> &NodeRef {
        &self.0
    }
}
