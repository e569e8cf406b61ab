//! `EventTarget` and event dispatch along the propagation path.
//!
//! SPECLINK: <https://dom.spec.whatwg.org/#interface-eventtarget>
//!
//! Every [`crate::node::Node`] embeds one `EventTarget`. Dispatch walks the
//! ancestor chain top-down for the capturing phase, invokes at-target
//! listeners, then walks back down bottom-up for the bubbling phase,
//! exactly as `other_examples`-style toy DOMs do it, generalized here to
//! the full capture/at-target/bubble three-phase model.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::{DomException, ErrorName};
use crate::event::{Event, EventPhase};
use crate::node::NodeRef;

type Callback = Rc<dyn Fn(&NodeRef, &Event)>;

struct Listener {
    event_type: String,
    callback: Callback,
    capture: bool,
    once: bool,
    removed: Cell<bool>,
}

/// Per-node listener registry.
#[derive(Default)]
pub struct EventTarget {
    listeners: RefCell<Vec<Rc<Listener>>>,
}

impl EventTarget {
    pub fn new() -> Self {
        EventTarget::default()
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-eventtarget-addeventlistener>
    pub fn add_event_listener(&self, event_type: &str, capture: bool, once: bool, callback: Callback) {
        self.listeners.borrow_mut().push(Rc::new(Listener {
            event_type: event_type.to_string(),
            callback,
            capture,
            once,
            removed: Cell::new(false),
        }));
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-eventtarget-removeeventlistener>
    ///
    /// Identity is by reference equality of the stored callback, since this
    /// core has no JS-level function-object identity to compare against.
    pub fn remove_event_listener(&self, event_type: &str, capture: bool, callback: &Callback) {
        self.listeners.borrow_mut().retain(|l| {
            !(l.event_type == event_type && l.capture == capture && Rc::ptr_eq(&l.callback, callback))
        });
    }

    fn matching(&self, event_type: &str, phase: EventPhase) -> Vec<Rc<Listener>> {
        let want_capture = phase == EventPhase::Capturing;
        self.listeners
            .borrow()
            .iter()
            .filter(|l| !l.removed.get() && l.event_type == event_type)
            .filter(|l| phase == EventPhase::AtTarget || l.capture == want_capture)
            .cloned()
            .collect()
    }
}

fn invoke(node: &NodeRef, event: &Event, phase: EventPhase) {
    event.set_current_target(Some(Rc::clone(node)));
    event.set_phase(phase);
    for listener in node.event_target.matching(&event.event_type, phase) {
        if event.immediate_propagation_stopped() {
            break;
        }
        if listener.once {
            listener.removed.set(true);
        }
        (listener.callback)(node, event);
    }
    node.event_target
        .listeners
        .borrow_mut()
        .retain(|l| !(l.once && l.removed.get()));
}

/// Ancestor chain from `target` up to (and root-first including) its
/// topmost ancestor, crossing from a `ShadowRoot` to its host only when
/// `composed` is set — otherwise propagation stops at the shadow boundary.
///
/// SPECLINK: <https://dom.spec.whatwg.org/#concept-event-path> (composed path)
fn composed_path(target: &NodeRef, composed: bool) -> Vec<NodeRef> {
    let mut path = Vec::new();
    let mut current = Some(Rc::clone(target));
    while let Some(node) = current {
        let next = if node.is_shadow_root() {
            if composed {
                crate::node::shadow_root::ShadowRoot(Rc::clone(&node)).host()
            } else {
                None
            }
        } else {
            node.parent()
        };
        path.push(node);
        current = next;
    }
    path.reverse();
    path
}

/// SPECLINK: <https://dom.spec.whatwg.org/#concept-event-dispatch>
///
/// Rejects re-entrant dispatch of an `Event` object already in flight, per
/// the dispatch algorithm's first step. Otherwise returns `true` unless a
/// cancelable listener called `preventDefault()`.
pub fn dispatch_event(target: &NodeRef, event: &Event) -> Result<bool, DomException> {
    if event.is_dispatching() {
        return Err(DomException::from(ErrorName::InvalidStateError));
    }
    event.set_target(Some(Rc::clone(target)));
    event.mark_dispatched();

    let path = composed_path(target, event.composed);
    let capture_path = &path[..path.len().saturating_sub(1)];

    for node in capture_path {
        invoke(node, event, EventPhase::Capturing);
        if event.propagation_stopped() {
            return Ok(finish(event));
        }
    }

    invoke(target, event, EventPhase::AtTarget);
    if event.propagation_stopped() || !event.bubbles {
        return Ok(finish(event));
    }

    for node in capture_path.iter().rev() {
        invoke(node, event, EventPhase::Bubbling);
        if event.propagation_stopped() {
            break;
        }
    }

    Ok(finish(event))
}

fn finish(event: &Event) -> bool {
    event.set_phase(EventPhase::None);
    event.set_current_target(None);
    event.clear_dispatched();
    !event.default_prevented()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventInit;
    use crate::node::document::Document;
    use std::cell::{Cell, RefCell};

    #[test]
    fn bubbling_visits_target_then_ancestors_in_order() {
        let doc = Document::new();
        let parent = doc.create_element("div").unwrap();
        crate::mutation_ops::append(&doc.0, parent.node()).unwrap();
        let child = doc.create_element("span").unwrap();
        crate::mutation_ops::append(parent.node(), child.node()).unwrap();

        let order = Rc::new(RefCell::new(Vec::new()));
        let o1 = Rc::clone(&order);
        child.node().event_target.add_event_listener(
            "click",
            false,
            false,
            Rc::new(move |_node, _ev| o1.borrow_mut().push("child")),
        );
        let o2 = Rc::clone(&order);
        parent.node().event_target.add_event_listener(
            "click",
            false,
            false,
            Rc::new(move |_node, _ev| o2.borrow_mut().push("parent")),
        );

        let event = Event::new("click", EventInit { bubbles: true, cancelable: false, composed: false });
        dispatch_event(child.node(), &event).unwrap();
        assert_eq!(*order.borrow(), vec!["child", "parent"]);
    }

    #[test]
    fn stop_propagation_prevents_ancestor_listeners() {
        let doc = Document::new();
        let parent = doc.create_element("div").unwrap();
        crate::mutation_ops::append(&doc.0, parent.node()).unwrap();
        let child = doc.create_element("span").unwrap();
        crate::mutation_ops::append(parent.node(), child.node()).unwrap();

        let parent_called = Rc::new(Cell::new(false));
        child.node().event_target.add_event_listener(
            "click",
            false,
            false,
            Rc::new(|_node, ev: &Event| ev.stop_propagation()),
        );
        let flag = Rc::clone(&parent_called);
        parent.node().event_target.add_event_listener(
            "click",
            false,
            false,
            Rc::new(move |_node, _ev| flag.set(true)),
        );

        let event = Event::new("click", EventInit { bubbles: true, cancelable: false, composed: false });
        dispatch_event(child.node(), &event).unwrap();
        assert!(!parent_called.get());
    }

    #[test]
    fn prevent_default_result_reflects_in_return_value() {
        let doc = Document::new();
        let el = doc.create_element("button").unwrap();
        el.node().event_target.add_event_listener(
            "click",
            false,
            false,
            Rc::new(|_node, ev: &Event| ev.prevent_default()),
        );
        let event = Event::new("click", EventInit { bubbles: false, cancelable: true, composed: false });
        assert!(!dispatch_event(el.node(), &event).unwrap());
    }

    #[test]
    fn redispatching_an_in_flight_event_is_rejected() {
        let doc = Document::new();
        let el = doc.create_element("button").unwrap();
        let event = Event::new("click", EventInit { bubbles: false, cancelable: false, composed: false });
        el.node().event_target.add_event_listener(
            "click",
            false,
            false,
            Rc::new({
                let el = Rc::clone(el.node());
                move |_node, ev: &Event| {
                    assert_eq!(
                        dispatch_event(&el, ev).unwrap_err().name,
                        crate::error::ErrorName::InvalidStateError
                    );
                }
            }),
        );
        assert!(dispatch_event(el.node(), &event).unwrap());
    }

    #[test]
    fn composed_event_crosses_shadow_boundary_into_host_ancestors() {
        let doc = Document::new();
        let host = doc.create_element("host-el").unwrap();
        crate::mutation_ops::append(&doc.0, host.node()).unwrap();
        let shadow = host.attach_shadow(crate::node::shadow_root::ShadowRootMode::Open).unwrap();
        let inner = doc.create_element("inner").unwrap();
        crate::mutation_ops::append(&shadow, inner.node()).unwrap();

        let host_called = Rc::new(Cell::new(false));
        let flag = Rc::clone(&host_called);
        host.node().event_target.add_event_listener(
            "click",
            false,
            false,
            Rc::new(move |_node, _ev| flag.set(true)),
        );

        let event = Event::new("click", EventInit { bubbles: true, cancelable: false, composed: true });
        dispatch_event(inner.node(), &event).unwrap();
        assert!(host_called.get());
    }

    #[test]
    fn non_composed_event_does_not_cross_shadow_boundary() {
        let doc = Document::new();
        let host = doc.create_element("host-el").unwrap();
        crate::mutation_ops::append(&doc.0, host.node()).unwrap();
        let shadow = host.attach_shadow(crate::node::shadow_root::ShadowRootMode::Open).unwrap();
        let inner = doc.create_element("inner").unwrap();
        crate::mutation_ops::append(&shadow, inner.node()).unwrap();

        let host_called = Rc::new(Cell::new(false));
        let flag = Rc::clone(&host_called);
        host.node().event_target.add_event_listener(
            "click",
            false,
            false,
            Rc::new(move |_node, _ev| flag.set(true)),
        );

        let event = Event::new("click", EventInit { bubbles: true, cancelable: false, composed: false });
        dispatch_event(inner.node(), &event).unwrap();
        assert!(!host_called.get());
    }
}
