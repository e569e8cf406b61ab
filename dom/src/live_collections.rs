//! Live and static collections: `HTMLCollection`, `NodeList`, `NamedNodeMap`,
//! `DOMTokenList`.
//!
//! SPECLINK: <https://dom.spec.whatwg.org/#interface-htmlcollection>
//!
//! Live collections cache their last snapshot alongside the root's
//! `tree_revision` at the time it was taken; a collection compares the
//! current revision before using the cache, re-walking the tree only when
//! it has actually changed, instead of on every access (spec.md §4.7).

use std::cell::RefCell;
use std::rc::Rc;

use crate::node::document;
use crate::node::element::Element;
use crate::node::NodeRef;

enum Filter {
    TagName(String),
    ClassName(Vec<String>),
    All,
}

fn root_revision(root: &NodeRef) -> u64 {
    root.owner_document()
        .or_else(|| root.is_document().then(|| Rc::clone(root)))
        .map(|doc| document::Document(doc).tree_revision())
        .unwrap_or(0)
}

fn matches(node: &NodeRef, filter: &Filter) -> bool {
    if !node.is_element() {
        return false;
    }
    match filter {
        Filter::All => true,
        Filter::TagName(name) => name == "*" || Element(Rc::clone(node)).tag_name() == *name,
        Filter::ClassName(wanted) => {
            let el = Element(Rc::clone(node));
            let classes: Vec<&str> = el.class_name().split_whitespace().collect();
            wanted.iter().all(|w| classes.contains(&w.as_str()))
        }
    }
}

fn collect(root: &NodeRef, filter: &Filter) -> Vec<NodeRef> {
    let mut out = Vec::new();
    for child in root.children() {
        if matches(&child, filter) {
            out.push(Rc::clone(&child));
        }
        out.extend(collect(&child, filter));
    }
    out
}

struct Cache {
    revision: u64,
    items: Vec<NodeRef>,
}

/// SPECLINK: <https://dom.spec.whatwg.org/#interface-htmlcollection>
pub struct HtmlCollection {
    root: NodeRef,
    filter: Filter,
    cache: RefCell<Option<Cache>>,
}

impl HtmlCollection {
    pub fn by_tag_name(root: NodeRef, name: &str) -> Self {
        HtmlCollection {
            root,
            filter: Filter::TagName(name.to_string()),
            cache: RefCell::new(None),
        }
    }

    pub fn by_class_name(root: NodeRef, names: &str) -> Self {
        HtmlCollection {
            root,
            filter: Filter::ClassName(names.split_whitespace().map(String::from).collect()),
            cache: RefCell::new(None),
        }
    }

    fn refresh(&self) {
        let current = root_revision(&self.root);
        let needs_refresh = match &*self.cache.borrow() {
            Some(c) => c.revision != current,
            None => true,
        };
        if needs_refresh {
            *self.cache.borrow_mut() = Some(Cache {
                revision: current,
                items: collect(&self.root, &self.filter),
            });
        }
    }

    pub fn length(&self) -> usize {
        self.refresh();
        self.cache.borrow().as_ref().unwrap().items.len()
    }

    pub fn item(&self, index: usize) -> Option<NodeRef> {
        self.refresh();
        self.cache.borrow().as_ref().unwrap().items.get(index).cloned()
    }

    pub fn named_item(&self, name: &str) -> Option<NodeRef> {
        if name.is_empty() {
            return None;
        }
        self.refresh();
        self.cache
            .borrow()
            .as_ref()
            .unwrap()
            .items
            .iter()
            .find(|n| Element(Rc::clone(n)).id() == name || Element(Rc::clone(n)).get_attribute("name").as_deref() == Some(name))
            .cloned()
    }
}

/// SPECLINK: <https://dom.spec.whatwg.org/#interface-nodelist>
///
/// `childNodes` is live; `querySelectorAll` and similar return a static
/// snapshot. Both share this type, distinguished by `live`.
pub struct NodeList {
    root: NodeRef,
    live: bool,
    snapshot: RefCell<Option<Cache>>,
}

impl NodeList {
    pub fn live_children_of(root: NodeRef) -> Self {
        NodeList {
            root,
            live: true,
            snapshot: RefCell::new(None),
        }
    }

    pub fn static_from_root(root: NodeRef, items: Vec<NodeRef>) -> Self {
        NodeList {
            root,
            live: false,
            snapshot: RefCell::new(Some(Cache { revision: 0, items })),
        }
    }

    fn refresh(&self) {
        if !self.live {
            return;
        }
        let current = root_revision(&self.root);
        let needs_refresh = match &*self.snapshot.borrow() {
            Some(c) => c.revision != current,
            None => true,
        };
        if needs_refresh {
            *self.snapshot.borrow_mut() = Some(Cache {
                revision: current,
                items: self.root.children(),
            });
        }
    }

    pub fn length(&self) -> usize {
        self.refresh();
        self.snapshot.borrow().as_ref().unwrap().items.len()
    }

    pub fn item(&self, index: usize) -> Option<NodeRef> {
        self.refresh();
        self.snapshot.borrow().as_ref().unwrap().items.get(index).cloned()
    }
}

/// SPECLINK: <https://dom.spec.whatwg.org/#interface-namednodemap>
pub struct NamedNodeMap {
    owner: NodeRef,
}

impl NamedNodeMap {
    pub fn new(owner: NodeRef) -> Self {
        NamedNodeMap { owner }
    }

    fn element(&self) -> Element {
        Element::try_from_node(Rc::clone(&self.owner)).expect("NamedNodeMap owner is an Element")
    }

    pub fn length(&self) -> usize {
        crate::node::element::data_of(&self.owner).attributes.borrow().len()
    }

    pub fn item(&self, index: usize) -> Option<NodeRef> {
        crate::node::element::data_of(&self.owner).attributes.borrow().get(index).cloned()
    }

    pub fn get_named_item(&self, name: &str) -> Option<NodeRef> {
        self.element().get_attribute_node(name)
    }
}

/// SPECLINK: <https://dom.spec.whatwg.org/#interface-domtokenlist>
pub struct DomTokenList {
    owner: NodeRef,
    attribute: String,
}

impl DomTokenList {
    pub fn new(owner: NodeRef, attribute: &str) -> Self {
        DomTokenList {
            owner,
            attribute: attribute.to_string(),
        }
    }

    fn element(&self) -> Element {
        Element::try_from_node(Rc::clone(&self.owner)).expect("DOMTokenList owner is an Element")
    }

    fn tokens(&self) -> Vec<String> {
        self.element()
            .get_attribute(&self.attribute)
            .unwrap_or_default()
            .split_whitespace()
            .map(String::from)
            .collect()
    }

    fn write(&self, tokens: Vec<String>) {
        self.element()
            .set_attribute(&self.attribute, &tokens.join(" "))
            .expect("token-derived attribute values are always valid");
    }

    pub fn value(&self) -> String {
        self.element().get_attribute(&self.attribute).unwrap_or_default()
    }

    pub fn length(&self) -> usize {
        self.tokens().len()
    }

    pub fn item(&self, index: usize) -> Option<String> {
        self.tokens().get(index).cloned()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens().iter().any(|t| t == token)
    }

    pub fn add(&self, token: &str) {
        let mut tokens = self.tokens();
        if !tokens.iter().any(|t| t == token) {
            tokens.push(token.to_string());
            self.write(tokens);
        }
    }

    pub fn remove(&self, token: &str) {
        let mut tokens = self.tokens();
        tokens.retain(|t| t != token);
        self.write(tokens);
    }

    pub fn toggle(&self, token: &str, force: Option<bool>) -> bool {
        let present = self.contains(token);
        match force {
            Some(true) | None if !present => {
                self.add(token);
                true
            }
            Some(false) | None if present => {
                self.remove(token);
                false
            }
            _ => present,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::document::Document;

    #[test]
    fn html_collection_is_live_without_manual_refresh() {
        let doc = Document::new();
        let root = doc.create_element("root").unwrap();
        crate::mutation_ops::append(&doc.0, root.node()).unwrap();
        let collection = HtmlCollection::by_tag_name(Rc::clone(root.node()), "item");
        assert_eq!(collection.length(), 0);

        let item = doc.create_element("item").unwrap();
        crate::mutation_ops::append(root.node(), item.node()).unwrap();
        assert_eq!(collection.length(), 1);
    }

    #[test]
    fn named_item_with_empty_name_never_matches() {
        let doc = Document::new();
        let root = doc.create_element("root").unwrap();
        crate::mutation_ops::append(&doc.0, root.node()).unwrap();
        let item = doc.create_element("item").unwrap();
        item.set_attribute("id", "").unwrap();
        crate::mutation_ops::append(root.node(), item.node()).unwrap();
        let collection = HtmlCollection::by_tag_name(Rc::clone(root.node()), "item");
        assert!(collection.named_item("").is_none());
    }

    #[test]
    fn class_list_add_remove_toggle() {
        let doc = Document::new();
        let el = doc.create_element("div").unwrap();
        let list = el.class_list();
        assert!(!list.contains("active"));
        list.add("active");
        assert!(list.contains("active"));
        assert_eq!(el.class_name(), "active");
        assert!(!list.toggle("active", None));
        assert!(!list.contains("active"));
        list.remove("nonexistent");
        assert_eq!(list.length(), 0);
    }

    #[test]
    fn node_list_live_children_reflects_removal() {
        let doc = Document::new();
        let root = doc.create_element("root").unwrap();
        crate::mutation_ops::append(&doc.0, root.node()).unwrap();
        let child = doc.create_element("item").unwrap();
        crate::mutation_ops::append(root.node(), child.node()).unwrap();
        let list = NodeList::live_children_of(Rc::clone(root.node()));
        assert_eq!(list.length(), 1);
        crate::mutation_ops::remove(child.node());
        assert_eq!(list.length(), 0);
    }
}
