//! SPECLINK: <https://dom.spec.whatwg.org/#interface-documenttype>

use super::{NodeData, NodeRef};

#[derive(Clone, PartialEq, Eq)]
pub struct DocumentTypeData {
    pub name: String,
    pub public_id: String,
    pub system_id: String,
}

pub(crate) fn data_of(node: &NodeRef) -> DocumentTypeData {
    match &*node.data.borrow() {
        NodeData::DocumentType(d) => d.clone(),
        _ => panic!("node is not a DocumentType"),
    }
}

/// Newtype view over a `Node` known to be a `DocumentType`.
#[derive(Clone)]
pub struct DocumentType(pub NodeRef);

impl std::ops::Deref for DocumentType {
    type Target = NodeRef;
    fn deref(&self) -> &NodeRef {
        &self.0
    }
}

impl DocumentType {
    pub fn try_from_node(node: NodeRef) -> Option<DocumentType> {
        node.is_doctype().then_some(DocumentType(node))
    }

    pub fn name(&self) -> String {
        data_of(&self.0).name
    }
    pub fn public_id(&self) -> String {
        data_of(&self.0).public_id
    }
    pub fn system_id(&self) -> String {
        data_of(&self.0).system_id
    }
}
