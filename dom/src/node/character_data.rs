//! Text, Comment, ProcessingInstruction and CDATASection all share the
//! `CharacterData` mutation surface.
//!
//! SPECLINK: <https://dom.spec.whatwg.org/#interface-characterdata>

use std::cell::RefCell;

use crate::error::{DomException, ErrorName};
use crate::string_pool::Handle;

use super::{Node, NodeData, NodeKind, NodeRef};

#[derive(Clone, PartialEq, Eq)]
pub enum CharacterDataKind {
    Text,
    CdataSection,
    Comment,
    ProcessingInstruction { target: Handle },
}

impl CharacterDataKind {
    pub(crate) fn debug_tag(&self) -> &'static str {
        match self {
            CharacterDataKind::Text => "#text",
            CharacterDataKind::CdataSection => "#cdata-section",
            CharacterDataKind::Comment => "#comment",
            CharacterDataKind::ProcessingInstruction { .. } => "#processing-instruction",
        }
    }
}

#[derive(Clone)]
pub struct CharacterDataData {
    pub kind: CharacterDataKind,
    pub data: RefCell<String>,
}

impl PartialEq for CharacterDataData {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && *self.data.borrow() == *other.data.borrow()
    }
}
impl Eq for CharacterDataData {}

pub(crate) fn data_of(node: &NodeRef) -> String {
    match &*node.data.borrow() {
        NodeData::CharacterData(c) => c.data.borrow().clone(),
        _ => panic!("node is not CharacterData"),
    }
}

pub(crate) fn append_data_raw(node: &NodeRef, extra: &str) {
    match &*node.data.borrow() {
        NodeData::CharacterData(c) => c.data.borrow_mut().push_str(extra),
        _ => panic!("node is not CharacterData"),
    }
}

pub(crate) fn new_text_node(document: &NodeRef, data: &str) -> NodeRef {
    Node::new_rc(
        NodeKind::Text,
        NodeData::CharacterData(CharacterDataData {
            kind: CharacterDataKind::Text,
            data: RefCell::new(data.to_string()),
        }),
        Some(document),
    )
}

/// Newtype view over a `Node` known to be CharacterData (Text, Comment,
/// ProcessingInstruction, or CDATASection).
#[derive(Clone)]
pub struct CharacterData(pub NodeRef);

impl std::ops::Deref for CharacterData {
    type Target = NodeRef;
    fn deref(&self) -> &NodeRef {
        &self.0
    }
}

impl CharacterData {
    pub fn try_from_node(node: NodeRef) -> Option<CharacterData> {
        node.is_character_data().then_some(CharacterData(node))
    }

    pub fn node(&self) -> &NodeRef {
        &self.0
    }

    pub fn data(&self) -> String {
        data_of(&self.0)
    }

    pub fn set_data(&self, value: &str) {
        self.replace_data(0, self.length(), value).expect("full replace is always in range");
    }

    pub fn length(&self) -> usize {
        data_of(&self.0).chars().count()
    }

    fn check_offset(&self, offset: usize) -> Result<(), DomException> {
        if offset > self.length() {
            Err(DomException::from(ErrorName::IndexSizeError))
        } else {
            Ok(())
        }
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-characterdata-substringdata>
    pub fn substring_data(&self, offset: usize, count: usize) -> Result<String, DomException> {
        self.check_offset(offset)?;
        let data = data_of(&self.0);
        let chars: Vec<char> = data.chars().collect();
        let end = (offset + count).min(chars.len());
        Ok(chars[offset..end].iter().collect())
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#concept-cd-replace>
    pub fn replace_data(&self, offset: usize, count: usize, data: &str) -> Result<(), DomException> {
        self.check_offset(offset)?;
        let length = self.length();
        let count = count.min(length - offset);
        let new_data = {
            let current = data_of(&self.0);
            let chars: Vec<char> = current.chars().collect();
            let mut out = String::new();
            out.extend(chars[..offset].iter());
            out.push_str(data);
            out.extend(chars[offset + count..].iter());
            out
        };
        let delta = data.chars().count() as isize - count as isize;
        match &*self.0.data.borrow() {
            NodeData::CharacterData(c) => *c.data.borrow_mut() = new_data,
            _ => unreachable!(),
        }
        crate::range::adjust_for_character_data_mutation(&self.0, offset, delta);
        Ok(())
    }

    pub fn append_data(&self, data: &str) {
        let length = self.length();
        self.replace_data(length, 0, data).expect("append is always in range");
    }

    pub fn insert_data(&self, offset: usize, data: &str) -> Result<(), DomException> {
        self.replace_data(offset, 0, data)
    }

    pub fn delete_data(&self, offset: usize, count: usize) -> Result<(), DomException> {
        self.replace_data(offset, count, "")
    }
}

#[cfg(test)]
mod tests {
    use crate::node::document::Document;

    #[test]
    fn append_then_delete_restores_original() {
        let doc = Document::new();
        let text = doc.create_text_node("hello");
        let original_len = text.length();
        text.append_data(" world");
        text.delete_data(original_len, " world".chars().count()).unwrap();
        assert_eq!(text.data(), "hello");
    }

    #[test]
    fn replace_data_out_of_range_is_index_size_error() {
        let doc = Document::new();
        let text = doc.create_text_node("hi");
        let err = text.replace_data(10, 0, "x").unwrap_err();
        assert_eq!(err.name, crate::error::ErrorName::IndexSizeError);
    }

    #[test]
    fn substring_data_clamps_count() {
        let doc = Document::new();
        let text = doc.create_text_node("hello");
        assert_eq!(text.substring_data(1, 100).unwrap(), "ello");
    }
}
