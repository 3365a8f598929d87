//! Child-list mutation observation.

use serde::{Deserialize, Serialize};

use super::{Document, NodeId};

/// Handle returned by [`Document::observe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(usize);

/// What an observer listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObserveOptions {
    /// Report insertions and removals of children.
    pub child_list: bool,
    /// Extend observation to every descendant of the target.
    pub subtree: bool,
}

impl Default for ObserveOptions {
    fn default() -> Self {
        Self {
            child_list: true,
            subtree: true,
        }
    }
}

/// One child-list change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    /// Parent whose children changed.
    pub target: NodeId,
    pub added_nodes: Vec<NodeId>,
    pub removed_nodes: Vec<NodeId>,
}

#[derive(Debug)]
pub(super) struct Observer {
    target: NodeId,
    options: ObserveOptions,
    queue: Vec<MutationRecord>,
}

impl Document {
    /// Start recording child-list changes at or below `target`.
    pub fn observe(&mut self, target: NodeId, options: ObserveOptions) -> ObserverId {
        let id = ObserverId(self.observers.len());
        self.observers.push(Some(Observer {
            target,
            options,
            queue: Vec::new(),
        }));
        id
    }

    /// Drain the records queued for an observer since the last call.
    pub fn take_records(&mut self, id: ObserverId) -> Vec<MutationRecord> {
        self.observers
            .get_mut(id.0)
            .and_then(|o| o.as_mut())
            .map(|o| std::mem::take(&mut o.queue))
            .unwrap_or_default()
    }

    /// Whether an observer has undelivered records.
    pub fn has_pending(&self, id: ObserverId) -> bool {
        self.observers
            .get(id.0)
            .and_then(|o| o.as_ref())
            .is_some_and(|o| !o.queue.is_empty())
    }

    /// Stop an observer. Queued records are discarded.
    pub fn disconnect(&mut self, id: ObserverId) {
        if let Some(slot) = self.observers.get_mut(id.0) {
            *slot = None;
        }
    }

    pub(super) fn queue_mutation(&mut self, record: MutationRecord) {
        if self.observers.iter().all(|o| o.is_none()) {
            return;
        }
        let interested: Vec<usize> = self
            .observers
            .iter()
            .enumerate()
            .filter_map(|(i, o)| o.as_ref().map(|o| (i, o)))
            .filter(|(_, o)| {
                o.options.child_list
                    && (o.target == record.target
                        || (o.options.subtree && self.is_inclusive_ancestor(o.target, record.target)))
            })
            .map(|(i, _)| i)
            .collect();

        for i in interested {
            if let Some(Some(observer)) = self.observers.get_mut(i) {
                observer.queue.push(record.clone());
            }
        }
    }
}
