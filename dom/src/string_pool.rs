//! Interns name strings for identity comparison.
//!
//! SPECLINK: <https://dom.spec.whatwg.org/#concept-element-attributes-namespaceuri>
//! names names compared across a document (tag names, attribute local
//! names) are compared by *pointer* equality once interned, per spec.md
//! §3 invariant 8.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::rc::Rc;

/// A pool-owned, reference-counted string.
///
/// Two handles compare equal (`==`) iff they were produced by the *same*
/// pool from equal bytes; handles from different pools never compare equal
/// even when their bytes match, preserving the per-document interning
/// guarantee.
#[derive(Clone)]
pub struct Handle(Rc<str>);

impl Handle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for Handle {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl PartialEq for Handle {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for Handle {}

impl Hash for Handle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Rc::as_ptr(&self.0) as *const ()).hash(state);
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for Handle {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

/// Scoped to one [`crate::node::document::Document`]; cleared when the
/// document is destroyed.
#[derive(Default)]
pub struct StringPool {
    table: RefCell<HashMap<Box<str>, Handle>>,
}

impl StringPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a stable handle for `s`, interning it on first use.
    /// Idempotent: repeated calls with equal bytes return an equal handle.
    pub fn intern(&self, s: &str) -> Handle {
        if let Some(handle) = self.table.borrow().get(s) {
            return handle.clone();
        }
        let handle = Handle(Rc::from(s));
        self.table
            .borrow_mut()
            .insert(Box::from(s), handle.clone());
        handle
    }

    pub fn len(&self) -> usize {
        self.table.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_idempotent_and_pointer_stable() {
        let pool = StringPool::new();
        let a = pool.intern("div");
        let b = pool.intern("div");
        assert_eq!(a, b);
        assert!(Rc::ptr_eq(&a.0, &b.0));
    }

    #[test]
    fn handles_from_different_pools_never_compare_equal() {
        let pool_a = StringPool::new();
        let pool_b = StringPool::new();
        let a = pool_a.intern("div");
        let b = pool_b.intern("div");
        assert_ne!(a, b);
        assert_eq!(a.as_str(), b.as_str());
    }

    #[test]
    fn distinct_bytes_intern_distinct_handles() {
        let pool = StringPool::new();
        let a = pool.intern("div");
        let b = pool.intern("span");
        assert_ne!(a, b);
    }
}
