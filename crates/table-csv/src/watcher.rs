//! Mutation-driven discovery of tables added after the first scan.

use crate::dom::{Document, NodeId, ObserveOptions, ObserverId};
use crate::locator::Annotator;
use crate::types::ScanReport;

/// Upper bound on batches handled by one [`TableWatcher::settle`] call.
/// Annotation itself queues a batch (wrappers and triggers), which the next
/// round re-scans without adding anything, so real pages settle in two or
/// three rounds.
const MAX_SETTLE_ROUNDS: usize = 64;

/// A live subscription: the annotator plus the observer feeding it.
///
/// Created by [`TableWatcher::install`]; stops observing when
/// [`TableWatcher::dispose`] is called.
#[derive(Debug)]
pub struct TableWatcher {
    annotator: Annotator,
    observer: ObserverId,
    target: NodeId,
}

/// What one delivered batch produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Added element nodes the annotator was run on.
    pub scanned_roots: usize,
    pub scans: Vec<ScanReport>,
}

impl BatchReport {
    pub fn annotated_count(&self) -> usize {
        self.scans.iter().map(ScanReport::annotated_count).sum()
    }
}

impl TableWatcher {
    /// Observe the page body (subtree-deep), then scan what is already there.
    ///
    /// Returns the watcher and the report of that first scan.
    pub fn install(doc: &mut Document, mut annotator: Annotator) -> (Self, ScanReport) {
        let target = doc.body();
        let observer = doc.observe(target, ObserveOptions::default());
        let initial = annotator.annotate(doc, target);
        tracing::info!(
            "Watching {target} for new tables; initial scan annotated {}",
            initial.annotated_count()
        );
        (
            Self {
                annotator,
                observer,
                target,
            },
            initial,
        )
    }

    pub fn annotator(&self) -> &Annotator {
        &self.annotator
    }

    /// Node being observed.
    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn has_pending(&self, doc: &Document) -> bool {
        doc.has_pending(self.observer)
    }

    /// Handle one batch of queued mutations.
    ///
    /// Every added node that is an element is scanned, in the order the
    /// records report them. Removals are ignored.
    pub fn deliver(&mut self, doc: &mut Document) -> BatchReport {
        let records = doc.take_records(self.observer);
        let mut batch = BatchReport::default();

        for record in records {
            for node in record.added_nodes {
                if !doc.is_element(node) {
                    continue;
                }
                batch.scanned_roots += 1;
                let report = self.annotator.annotate(doc, node);
                if report.matched > 0 {
                    batch.scans.push(report);
                }
            }
        }

        if batch.annotated_count() > 0 {
            tracing::debug!(
                "Batch annotated {} tables across {} added elements",
                batch.annotated_count(),
                batch.scanned_roots
            );
        }
        batch
    }

    /// Deliver batches until none are queued, returning how many tables
    /// were annotated in total.
    pub fn settle(&mut self, doc: &mut Document) -> usize {
        let mut annotated = 0;
        for _ in 0..MAX_SETTLE_ROUNDS {
            if !self.has_pending(doc) {
                return annotated;
            }
            annotated += self.deliver(doc).annotated_count();
        }
        tracing::warn!("Mutations still pending after {MAX_SETTLE_ROUNDS} batches");
        annotated
    }

    /// Stop observing. Triggers already attached keep working.
    pub fn dispose(self, doc: &mut Document) -> Annotator {
        doc.disconnect(self.observer);
        tracing::debug!("Stopped watching {}", self.target);
        self.annotator
    }
}
