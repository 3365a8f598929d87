//! Click dispatch with bubbling.

use std::rc::Rc;

use super::{Document, NodeId};

/// Kinds of events the document can dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Click,
}

/// An event travelling from its target up through its ancestors.
#[derive(Debug, Clone)]
pub struct Event {
    kind: EventKind,
    target: NodeId,
    current_target: NodeId,
    propagation_stopped: bool,
}

impl Event {
    fn new(kind: EventKind, target: NodeId) -> Self {
        Self {
            kind,
            target,
            current_target: target,
            propagation_stopped: false,
        }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Node the event was dispatched at.
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// Node whose listeners are currently running.
    pub fn current_target(&self) -> NodeId {
        self.current_target
    }

    /// Keep the event from reaching any further ancestor.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

/// A click listener. Listeners only read the document.
pub type Listener = Rc<dyn Fn(&mut Event, &Document)>;

impl Document {
    pub fn add_event_listener(&mut self, node: NodeId, listener: Listener) {
        self.listeners.entry(node).or_default().push(listener);
    }

    pub fn listener_count(&self, node: NodeId) -> usize {
        self.listeners.get(&node).map_or(0, Vec::len)
    }

    /// Dispatch a click at `target` and bubble it to the document node.
    ///
    /// Stopping propagation finishes the listeners on the current node and
    /// skips every ancestor. The finished event is returned.
    pub fn dispatch_click(&self, target: NodeId) -> Event {
        let mut event = Event::new(EventKind::Click, target);
        if !self.contains(target) {
            return event;
        }

        let path: Vec<NodeId> = std::iter::once(target).chain(self.ancestors(target)).collect();
        for node in path {
            let Some(listeners) = self.listeners.get(&node) else {
                continue;
            };
            event.current_target = node;
            for listener in listeners.clone() {
                listener(&mut event, self);
            }
            if event.propagation_stopped {
                break;
            }
        }
        event
    }
}
