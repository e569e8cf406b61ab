//! The `Event` record and its propagation-path bookkeeping.
//!
//! SPECLINK: <https://dom.spec.whatwg.org/#interface-event>

use std::cell::Cell;
use std::rc::Rc;

use crate::node::NodeRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPhase {
    None,
    Capturing,
    AtTarget,
    Bubbling,
}

impl EventPhase {
    pub fn as_u16(self) -> u16 {
        match self {
            EventPhase::None => 0,
            EventPhase::Capturing => 1,
            EventPhase::AtTarget => 2,
            EventPhase::Bubbling => 3,
        }
    }
}

/// An in-flight event, mutated as it walks its propagation path.
///
/// SPECLINK: <https://dom.spec.whatwg.org/#concept-event>
pub struct Event {
    pub event_type: String,
    pub bubbles: bool,
    pub cancelable: bool,
    pub composed: bool,
    target: Cell<Option<NodeRef>>,
    current_target: Cell<Option<NodeRef>>,
    phase: Cell<EventPhase>,
    default_prevented: Cell<bool>,
    propagation_stopped: Cell<bool>,
    immediate_propagation_stopped: Cell<bool>,
    dispatched: Cell<bool>,
}

#[derive(Debug, Clone, Copy)]
pub struct EventInit {
    pub bubbles: bool,
    pub cancelable: bool,
    pub composed: bool,
}

impl Default for EventInit {
    fn default() -> Self {
        EventInit {
            bubbles: false,
            cancelable: false,
            composed: false,
        }
    }
}

impl Event {
    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-event-event>
    pub fn new(event_type: &str, init: EventInit) -> Self {
        Event {
            event_type: event_type.to_string(),
            bubbles: init.bubbles,
            cancelable: init.cancelable,
            composed: init.composed,
            target: Cell::new(None),
            current_target: Cell::new(None),
            phase: Cell::new(EventPhase::None),
            default_prevented: Cell::new(false),
            propagation_stopped: Cell::new(false),
            immediate_propagation_stopped: Cell::new(false),
            dispatched: Cell::new(false),
        }
    }

    pub fn target(&self) -> Option<NodeRef> {
        let target = self.target.take();
        self.target.set(target.clone());
        target
    }

    pub(crate) fn set_target(&self, node: Option<NodeRef>) {
        self.target.set(node);
    }

    pub fn current_target(&self) -> Option<NodeRef> {
        let current = self.current_target.take();
        self.current_target.set(current.clone());
        current
    }

    pub(crate) fn set_current_target(&self, node: Option<NodeRef>) {
        self.current_target.set(node);
    }

    pub fn event_phase(&self) -> EventPhase {
        self.phase.get()
    }

    pub(crate) fn set_phase(&self, phase: EventPhase) {
        self.phase.set(phase);
    }

    pub fn is_trusted(&self) -> bool {
        // Every event originates from the application in this core; there
        // is no privileged/host-originated distinction to make here.
        true
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-event-preventdefault>
    pub fn prevent_default(&self) {
        if self.cancelable {
            self.default_prevented.set(true);
        }
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-event-stoppropagation>
    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }

    /// SPECLINK: <https://dom.spec.whatwg.org/#dom-event-stopimmediatepropagation>
    pub fn stop_immediate_propagation(&self) {
        self.propagation_stopped.set(true);
        self.immediate_propagation_stopped.set(true);
    }

    pub fn immediate_propagation_stopped(&self) -> bool {
        self.immediate_propagation_stopped.get()
    }

    pub(crate) fn mark_dispatched(&self) {
        self.dispatched.set(true);
    }

    pub(crate) fn clear_dispatched(&self) {
        self.dispatched.set(false);
    }

    pub fn is_dispatching(&self) -> bool {
        self.dispatched.get()
    }
}

pub type EventRc = Rc<Event>;
