//! Table discovery and export-trigger injection.
//!
//! A scan pass finds every `<table>` and `<div role="table">` at or below a
//! root, wraps each one that has not been handled yet in a
//! `<div class="table-csv-wrapper">`, and appends a trigger button after it.
//! Clicking the trigger serializes that exact element and hands the CSV to
//! the [`ExportSink`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::dom::{Document, DomError, DomResult, ElementData, Event, Listener, NodeData, NodeId};
use crate::serializer::table_to_csv;
use crate::sink::{ExportSink, Notifier};
use crate::types::{
    ExportOptions, ExportOutcome, ExportResult, IndexScope, ProcessedRecord, ScanReport, TableKind,
};

/// Classify an element as table-like, if it is.
pub fn classify(el: &ElementData) -> Option<TableKind> {
    match el.name() {
        "table" => Some(TableKind::Table),
        "div" if is_role_table(el) => Some(TableKind::RoleContainer),
        _ => None,
    }
}

fn is_role_table(el: &ElementData) -> bool {
    el.attr("role")
        .is_some_and(|role| role.eq_ignore_ascii_case("table"))
}

fn is_role_container(el: &ElementData) -> bool {
    el.name() == "div" && is_role_table(el)
}

/// Table-like elements at or below `root`, in document order.
pub fn find_table_like(doc: &Document, root: NodeId) -> Vec<(NodeId, TableKind)> {
    doc.descendants(root)
        .into_iter()
        .filter_map(|id| doc.element(id).and_then(classify).map(|kind| (id, kind)))
        .collect()
}

/// Serialize `element` and save it, or show the notice when there is nothing
/// to save. Never fails: sink errors are logged and reported in the outcome.
pub fn export_element(
    doc: &Document,
    element: NodeId,
    filename: &str,
    sink: &dyn ExportSink,
    notifier: &dyn Notifier,
    notice: &str,
) -> ExportOutcome {
    if !doc.is_connected(element) {
        tracing::debug!("Table {element} is no longer in the page");
        notifier.notify(notice);
        return ExportOutcome::Detached;
    }

    match table_to_csv(doc, Some(element)) {
        Some(csv) if !csv.is_empty() => match sink.save(&csv, filename) {
            Ok(()) => ExportOutcome::Saved {
                filename: filename.to_string(),
                bytes: csv.len(),
            },
            Err(e) => {
                tracing::error!("Failed to save {filename}: {e}");
                ExportOutcome::Failed {
                    error: e.to_string(),
                }
            }
        },
        _ => {
            notifier.notify(notice);
            ExportOutcome::Empty
        }
    }
}

/// Finds tables and attaches export triggers, remembering what it handled.
pub struct Annotator {
    options: ExportOptions,
    sink: Rc<dyn ExportSink>,
    notifier: Rc<dyn Notifier>,
    records: Vec<ProcessedRecord>,
    by_element: HashMap<NodeId, usize>,
    outcomes: Rc<RefCell<Vec<ExportOutcome>>>,
    scans: u64,
    page_index: usize,
}

impl std::fmt::Debug for Annotator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Annotator")
            .field("options", &self.options)
            .field("records", &self.records.len())
            .field("scans", &self.scans)
            .finish()
    }
}

impl Annotator {
    pub fn new(
        options: ExportOptions,
        sink: Rc<dyn ExportSink>,
        notifier: Rc<dyn Notifier>,
    ) -> ExportResult<Self> {
        options.validate()?;
        Ok(Self {
            options,
            sink,
            notifier,
            records: Vec::new(),
            by_element: HashMap::new(),
            outcomes: Rc::new(RefCell::new(Vec::new())),
            scans: 0,
            page_index: 0,
        })
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Every element annotated so far, in the order it was annotated.
    pub fn records(&self) -> &[ProcessedRecord] {
        &self.records
    }

    pub fn record_for(&self, element: NodeId) -> Option<&ProcessedRecord> {
        self.by_element.get(&element).map(|&i| &self.records[i])
    }

    pub fn is_processed(&self, element: NodeId) -> bool {
        self.by_element.contains_key(&element)
    }

    /// What every trigger click so far ended in, in click order.
    pub fn outcomes(&self) -> Vec<ExportOutcome> {
        self.outcomes.borrow().clone()
    }

    /// Number of scan passes run.
    pub fn scans(&self) -> u64 {
        self.scans
    }

    /// Run one scan pass rooted at `root`.
    ///
    /// Roots that are not elements (text, comments, unknown ids) are ignored,
    /// so this can be called on anything a mutation batch reports.
    pub fn annotate(&mut self, doc: &mut Document, root: NodeId) -> ScanReport {
        let mut report = ScanReport::default();
        if !matches!(
            doc.data(root),
            Some(NodeData::Element(_)) | Some(NodeData::Document)
        ) {
            return report;
        }

        self.scans += 1;
        let candidates = find_table_like(doc, root);
        report.matched = candidates.len();
        if report.matched > 0 {
            tracing::info!("Found {} new table-like elements.", report.matched);
        }

        for (position, (element, kind)) in candidates.into_iter().enumerate() {
            if self.already_handled(doc, element) {
                tracing::debug!("Skipping {element}: already has an export trigger");
                report.already_processed += 1;
                continue;
            }
            if kind == TableKind::Table && doc.closest(element, is_role_container).is_some() {
                tracing::debug!("Skipping {element}: inside a role=table container");
                report.nested += 1;
                continue;
            }

            let index = match self.options.index_scope {
                IndexScope::PerScan => position + 1,
                IndexScope::Page => self.page_index + 1,
            };
            match self.wrap(doc, element, kind, index) {
                Ok(record) => {
                    if self.options.index_scope == IndexScope::Page {
                        self.page_index += 1;
                    }
                    match self.by_element.get(&element).copied() {
                        Some(i) => self.records[i] = record.clone(),
                        None => {
                            self.by_element.insert(element, self.records.len());
                            self.records.push(record.clone());
                        }
                    }
                    report.annotated.push(record);
                }
                Err(e) => {
                    tracing::debug!("Could not wrap {element}: {e}");
                    report.failed += 1;
                }
            }
        }

        report
    }

    /// An element counts as handled while it sits directly in a wrapper.
    /// One the host moved out of its wrapper gets wrapped again.
    fn already_handled(&self, doc: &Document, element: NodeId) -> bool {
        let parent = doc.parent(element);
        if parent.is_some_and(|p| doc.has_class(p, &self.options.wrapper_class)) {
            return true;
        }
        match self.record_for(element) {
            Some(record) if parent == Some(record.wrapper) => true,
            Some(_) => {
                tracing::debug!("{element} left its wrapper, wrapping it again");
                false
            }
            None => false,
        }
    }

    fn wrap(
        &self,
        doc: &mut Document,
        element: NodeId,
        kind: TableKind,
        index: usize,
    ) -> ExportResult<ProcessedRecord> {
        let parent = doc
            .parent(element)
            .ok_or_else(|| DomError::Hierarchy(format!("{element} has no parent")))?;

        // Build the wrapper off-page so a failure leaves the page untouched.
        let filename = self.options.filename_for(index);
        let trigger = doc.create_element("button");
        doc.set_attribute(trigger, "type", "button")?;
        doc.add_class(trigger, &self.options.trigger_class)?;
        doc.set_text_content(trigger, &self.options.trigger_label)?;
        doc.add_event_listener(trigger, self.trigger_listener(element, filename.clone()));

        let wrapper = doc.create_element("div");
        doc.add_class(wrapper, &self.options.wrapper_class)?;
        doc.append_child(wrapper, trigger)?;

        move_into_wrapper(doc, parent, element, wrapper, trigger)?;

        Ok(ProcessedRecord {
            element,
            wrapper,
            trigger,
            kind,
            index,
            filename,
            scan: self.scans,
        })
    }

    /// Click handler bound to one element. The element id is captured here,
    /// never looked up from the trigger's position at click time.
    fn trigger_listener(&self, element: NodeId, filename: String) -> Listener {
        let sink = Rc::clone(&self.sink);
        let notifier = Rc::clone(&self.notifier);
        let notice = self.options.empty_notice.clone();
        let outcomes = Rc::clone(&self.outcomes);
        Rc::new(move |event: &mut Event, doc: &Document| {
            event.stop_propagation();
            let outcome = export_element(
                doc,
                element,
                &filename,
                sink.as_ref(),
                notifier.as_ref(),
                &notice,
            );
            tracing::debug!(?outcome, "Export trigger for {element} finished");
            outcomes.borrow_mut().push(outcome);
        })
    }
}

/// Put `wrapper` in `element`'s slot, then move `element` into it ahead of
/// `trigger`. If the move fails the wrapper is taken out again.
fn move_into_wrapper(
    doc: &mut Document,
    parent: NodeId,
    element: NodeId,
    wrapper: NodeId,
    trigger: NodeId,
) -> DomResult<()> {
    doc.insert_before(parent, wrapper, Some(element))?;
    if let Err(e) = doc.insert_before(wrapper, element, Some(trigger)) {
        if let Err(undo) = doc.remove_child(parent, wrapper) {
            tracing::warn!("Could not take wrapper {wrapper} back out: {undo}");
        }
        return Err(e);
    }
    Ok(())
}
