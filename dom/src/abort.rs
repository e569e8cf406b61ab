//! `AbortController` / `AbortSignal`, including the `AbortSignal.any()`
//! dependent-signal composition graph.
//!
//! SPECLINK: <https://dom.spec.whatwg.org/#interface-abortsignal>
//!
//! Signals are not tree nodes, so they do not route through
//! [`crate::event_target`]'s capture/bubble propagation; each signal keeps
//! its own flat list of `abort` listeners instead.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::{DomException, ErrorName};

struct AbortSignalInner {
    aborted: Cell<bool>,
    reason: RefCell<Option<DomException>>,
    listeners: RefCell<Vec<Rc<dyn Fn()>>>,
    /// Dependent signals created via `AbortSignal::any`, notified when this
    /// signal (one of their sources) aborts.
    dependents: RefCell<Vec<std::rc::Weak<AbortSignalInner>>>,
}

/// SPECLINK: <https://dom.spec.whatwg.org/#interface-abortsignal>
#[derive(Clone)]
pub struct AbortSignal {
    inner: Rc<AbortSignalInner>,
}

impl AbortSignal {
    fn new() -> Self {
        AbortSignal {
            inner: Rc::new(AbortSignalInner {
                aborted: Cell::new(false),
                reason: RefCell::new(None),
                listeners: RefCell::new(Vec::new()),
                dependents: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn aborted(&self) -> bool {
        self.inner.aborted.get()
    }

    pub fn reason(&self) -> Option<DomException> {
        *self.inner.reason.borrow()
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-abortsignal-throwifaborted>
    pub fn throw_if_aborted(&self) -> Result<(), DomException> {
        match self.reason() {
            Some(reason) => Err(reason),
            None => Ok(()),
        }
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-abortsignal-onabort>
    pub fn on_abort(&self, callback: Rc<dyn Fn()>) {
        if self.aborted() {
            callback();
            return;
        }
        self.inner.listeners.borrow_mut().push(callback);
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-abortsignal-any>
    ///
    /// Returns a signal that aborts as soon as any of `signals` does,
    /// carrying that source's reason forward.
    pub fn any(signals: &[AbortSignal]) -> AbortSignal {
        let composed = AbortSignal::new();
        for source in signals {
            if source.aborted() {
                composed.signal_abort(source.reason().unwrap_or(DomException::from(ErrorName::AbortError)));
                return composed;
            }
            source
                .inner
                .dependents
                .borrow_mut()
                .push(Rc::downgrade(&composed.inner));
        }
        composed
    }

    fn signal_abort(&self, reason: DomException) {
        if self.inner.aborted.get() {
            return;
        }
        self.inner.aborted.set(true);
        *self.inner.reason.borrow_mut() = Some(reason);

        for listener in self.inner.listeners.borrow().iter() {
            listener();
        }

        let dependents = self.inner.dependents.borrow().clone();
        for dependent in dependents {
            if let Some(dep_inner) = dependent.upgrade() {
                (AbortSignal { inner: dep_inner }).signal_abort(reason);
            }
        }
    }
}

/// SPECLINK: <https://dom.spec.whatwg.org/#interface-abortcontroller>
pub struct AbortController {
    signal: AbortSignal,
}

impl AbortController {
    pub fn new() -> Self {
        AbortController { signal: AbortSignal::new() }
    }

    pub fn signal(&self) -> AbortSignal {
        self.signal.clone()
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-abortcontroller-abort>
    pub fn abort(&self, reason: Option<DomException>) {
        self.signal
            .signal_abort(reason.unwrap_or(DomException::from(ErrorName::AbortError)));
    }
}

impl Default for AbortController {
    fn default() -> Self {
        AbortController::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell as StdCell;

    #[test]
    fn controller_abort_marks_signal_aborted_with_reason() {
        let controller = AbortController::new();
        let signal = controller.signal();
        assert!(!signal.aborted());
        controller.abort(None);
        assert!(signal.aborted());
        assert_eq!(signal.reason().unwrap().name, crate::error::ErrorName::AbortError);
    }

    #[test]
    fn any_aborts_as_soon_as_one_source_aborts() {
        let a = AbortController::new();
        let b = AbortController::new();
        let composed = AbortSignal::any(&[a.signal(), b.signal()]);
        assert!(!composed.aborted());
        b.abort(None);
        assert!(composed.aborted());
    }

    #[test]
    fn any_with_already_aborted_source_is_aborted_immediately() {
        let a = AbortController::new();
        a.abort(None);
        let composed = AbortSignal::any(&[a.signal()]);
        assert!(composed.aborted());
    }

    #[test]
    fn source_listeners_fire_before_dependent_signals_abort() {
        let a = AbortController::new();
        let composed = AbortSignal::any(&[a.signal()]);
        let order = Rc::new(RefCell::new(Vec::new()));
        let o1 = Rc::clone(&order);
        a.signal().on_abort(Rc::new(move || o1.borrow_mut().push("source")));
        let o2 = Rc::clone(&order);
        composed.on_abort(Rc::new(move || o2.borrow_mut().push("dependent")));
        a.abort(None);
        assert_eq!(*order.borrow(), vec!["source", "dependent"]);
    }

    #[test]
    fn on_abort_listener_fires_once_signal_aborts() {
        let controller = AbortController::new();
        let fired = Rc::new(StdCell::new(false));
        let flag = Rc::clone(&fired);
        controller.signal().on_abort(Rc::new(move || flag.set(true)));
        controller.abort(None);
        assert!(fired.get());
    }
}
