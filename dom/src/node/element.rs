//! SPECLINK: <https://dom.spec.whatwg.org/#interface-element>

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::{DomException, ErrorName};
use crate::string_pool::Handle;
use crate::{Namespace, QualifiedName};

use super::{Node, NodeData, NodeKind, NodeRef};

pub struct ElementData {
    pub name: QualifiedName,
    /// Ordered attribute list, keyed by `(namespace, local_name)`.
    /// SPECLINK: <https://dom.spec.whatwg.org/#concept-element-attribute>
    pub attributes: RefCell<Vec<NodeRef>>,
    pub shadow_root: RefCell<Option<NodeRef>>,
}

impl Clone for ElementData {
    fn clone(&self) -> Self {
        // cloneNode copies attribute *values*, not the original Attr nodes
        // (each clone gets freshly constructed, unattached Attr nodes).
        let attributes = self
            .attributes
            .borrow()
            .iter()
            .map(|attr| {
                let data = super::attr::data_of(attr);
                Node::new_rc(
                    NodeKind::Attr,
                    NodeData::Attr(super::attr::AttrData {
                        name: data.name.clone(),
                        value: RefCell::new(data.value.borrow().clone()),
                        owner_element: RefCell::new(std::rc::Weak::new()),
                    }),
                    attr.owner_document().as_ref(),
                )
            })
            .collect();
        ElementData {
            name: self.name.clone(),
            attributes: RefCell::new(attributes),
            shadow_root: RefCell::new(None),
        }
    }
}

pub(crate) fn data_of(node: &NodeRef) -> std::cell::Ref<'_, ElementData> {
    std::cell::Ref::map(node.data.borrow(), |d| match d {
        NodeData::Element(e) => e,
        _ => panic!("node is not an Element"),
    })
}

/// Newtype view over a `Node` known to be an `Element`.
#[derive(Clone)]
pub struct Element(pub NodeRef);

impl std::ops::Deref for Element {
    type Target = NodeRef;
    fn deref(&self) -> &NodeRef {
        &self.0
    }
}

impl Element {
    pub fn try_from_node(node: NodeRef) -> Option<Element> {
        node.is_element().then_some(Element(node))
    }

    pub fn node(&self) -> &NodeRef {
        &self.0
    }

    pub fn local_name(&self) -> Handle {
        data_of(&self.0).name.local.clone()
    }

    pub fn namespace(&self) -> Option<Namespace> {
        data_of(&self.0).name.namespace
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-element-tagname>
    pub fn tag_name(&self) -> String {
        let data = data_of(&self.0);
        let qualified = data.name.qualified_name();
        let in_html_document = self
            .0
            .owner_document()
            .is_some_and(|doc| super::document::data_of(&doc).is_html_document);
        if data.name.namespace == Some(Namespace::Html) && in_html_document {
            qualified.to_ascii_uppercase()
        } else {
            qualified
        }
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-element-getattribute>
    pub fn get_attribute(&self, name: &str) -> Option<String> {
        self.get_attribute_node(name)
            .map(|attr| super::attr::data_of(&attr).value.borrow().clone())
    }

    pub fn get_attribute_node(&self, name: &str) -> Option<NodeRef> {
        data_of(&self.0)
            .attributes
            .borrow()
            .iter()
            .find(|attr| super::attr::data_of(attr).name.qualified_name() == name)
            .cloned()
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.get_attribute_node(name).is_some()
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-element-setattribute>
    pub fn set_attribute(&self, name: &str, value: &str) -> Result<(), DomException> {
        if !is_valid_attribute_name(name) {
            return Err(DomException::from(ErrorName::InvalidCharacterError));
        }
        if let Some(existing) = self.get_attribute_node(name) {
            super::attr::data_of(&existing).value.replace(value.to_string());
        } else {
            let doc = self
                .0
                .owner_document()
                .expect("element must have an owner document");
            let local = super::document::data_of(&doc).string_pool.intern(name);
            let attr = Node::new_rc(
                NodeKind::Attr,
                NodeData::Attr(super::attr::AttrData {
                    name: QualifiedName::new(None, None, local),
                    value: RefCell::new(value.to_string()),
                    owner_element: RefCell::new(Rc::downgrade(&self.0)),
                }),
                Some(&doc),
            );
            data_of(&self.0).attributes.borrow_mut().push(attr);
        }
        if name == "id" {
            self.sync_id_index();
        }
        Ok(())
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-element-removeattribute>
    pub fn remove_attribute(&self, name: &str) {
        let data = data_of(&self.0);
        data.attributes
            .borrow_mut()
            .retain(|attr| super::attr::data_of(attr).name.qualified_name() != name);
        drop(data);
        if name == "id" {
            self.sync_id_index();
        }
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-element-toggleattribute>
    pub fn toggle_attribute(&self, name: &str, force: Option<bool>) -> Result<bool, DomException> {
        if !is_valid_attribute_name(name) {
            return Err(DomException::from(ErrorName::InvalidCharacterError));
        }
        let present = self.has_attribute(name);
        match force {
            Some(true) | None if !present => {
                self.set_attribute(name, "")?;
                Ok(true)
            }
            Some(false) | None if present => {
                self.remove_attribute(name);
                Ok(false)
            }
            _ => Ok(present),
        }
    }

    fn sync_id_index(&self) {
        if let Some(doc) = self.0.owner_document() {
            super::document::sync_id_index(&doc, &self.0);
        }
    }

    pub fn id(&self) -> String {
        self.get_attribute("id").unwrap_or_default()
    }

    pub fn set_id(&self, value: &str) -> Result<(), DomException> {
        self.set_attribute("id", value)
    }

    pub fn class_name(&self) -> String {
        self.get_attribute("class").unwrap_or_default()
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-element-classlist>
    pub fn class_list(&self) -> crate::live_collections::DomTokenList {
        crate::live_collections::DomTokenList::new(Rc::clone(&self.0), "class")
    }

    pub fn shadow_root(&self) -> Option<NodeRef> {
        data_of(&self.0).shadow_root.borrow().clone()
    }

    pub fn attach_shadow(&self, mode: super::shadow_root::ShadowRootMode) -> Result<NodeRef, DomException> {
        if data_of(&self.0).shadow_root.borrow().is_some() {
            return Err(DomException::from(ErrorName::InvalidStateError));
        }
        let doc = self.0.owner_document().expect("element has owner document");
        let shadow = Node::new_rc(
            NodeKind::ShadowRoot,
            NodeData::ShadowRoot(super::shadow_root::ShadowRootData {
                mode,
                host: Rc::downgrade(&self.0),
            }),
            Some(&doc),
        );
        *data_of(&self.0).shadow_root.borrow_mut() = Some(Rc::clone(&shadow));
        Ok(shadow)
    }

    /// External collaborator contract: selector matching is implemented by
    /// the embedder. Returning `NotSupportedError` is the correct behavior
    /// for a core that carries no selector engine of its own.
    ///
    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-element-matches>
    pub fn matches(&self, _selector: &str, engine: &dyn SelectorEngine) -> Result<bool, DomException> {
        engine.matches(&self.0, _selector)
    }

    pub fn closest(
        &self,
        selector: &str,
        engine: &dyn SelectorEngine,
    ) -> Result<Option<NodeRef>, DomException> {
        let mut current = Some(Rc::clone(&self.0));
        while let Some(node) = current {
            if node.is_element() && engine.matches(&node, selector)? {
                return Ok(Some(node));
            }
            current = node.parent();
        }
        Ok(None)
    }
}

/// The selector-matching surface this core exposes without implementing it
/// itself (spec.md §1: "the selector engine is external").
pub trait SelectorEngine {
    fn matches(&self, element: &NodeRef, selector: &str) -> Result<bool, DomException>;
}

fn is_valid_attribute_name(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(|c| c.is_whitespace() || c == '/' || c == '>')
}

#[cfg(test)]
mod tests {
    use crate::node::document::Document;

    #[test]
    fn set_get_has_remove_attribute_roundtrip() {
        let doc = Document::new();
        let div = doc.create_element("div").unwrap();
        assert!(!div.has_attribute("data-id"));
        div.set_attribute("data-id", "123").unwrap();
        assert_eq!(div.get_attribute("data-id").as_deref(), Some("123"));
        div.remove_attribute("data-id");
        assert!(!div.has_attribute("data-id"));
    }

    #[test]
    fn toggle_attribute_flips_presence() {
        let doc = Document::new();
        let div = doc.create_element("div").unwrap();
        assert!(div.toggle_attribute("hidden", None).unwrap());
        assert!(div.has_attribute("hidden"));
        assert!(!div.toggle_attribute("hidden", None).unwrap());
        assert!(!div.has_attribute("hidden"));
    }

    #[test]
    fn clone_shallow_preserves_attributes_and_owner() {
        let doc = Document::new();
        let div = doc.create_element("div").unwrap();
        div.set_attribute("data-id", "123").unwrap();
        let clone = div.node().clone_node(false);
        let clone = super::Element::try_from_node(clone).unwrap();
        assert_eq!(clone.get_attribute("data-id").as_deref(), Some("123"));
        assert!(std::rc::Rc::ptr_eq(
            &clone.node().owner_document().unwrap(),
            &div.node().owner_document().unwrap()
        ));
    }
}
