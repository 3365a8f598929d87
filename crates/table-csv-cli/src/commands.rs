//! Command implementations, kept apart from argument parsing so they can be
//! driven directly from tests.

use std::path::Path;
use std::rc::Rc;

use table_csv::serializer::rows;
use table_csv::{
    Annotator, Document, ExportError, ExportOptions, ExportSink, LogNotifier, MemorySink, RecordingNotifier,
    TableWatcher,
};

use crate::types::{CliError, CliResult, ExportSummary, TableSummary};

/// Read an HTML file from disk.
pub fn read_page(path: &Path) -> CliResult<String> {
    if !path.exists() {
        return Err(CliError::InputNotFound(path.display().to_string()));
    }
    Ok(std::fs::read_to_string(path)?)
}

/// Parse a page and let the watcher annotate it until no mutations remain.
fn annotated_page(
    html: &str,
    options: ExportOptions,
    sink: Rc<dyn ExportSink>,
    notifier: Rc<RecordingNotifier>,
) -> CliResult<(Document, TableWatcher)> {
    let mut doc = Document::parse_html(html);
    let annotator = Annotator::new(options, sink, notifier)?;
    let (mut watcher, _initial) = TableWatcher::install(&mut doc, annotator);
    watcher.settle(&mut doc);
    Ok((doc, watcher))
}

/// Click every export trigger on the page, in discovery order.
pub fn export_page(
    html: &str,
    options: ExportOptions,
    sink: Rc<dyn ExportSink>,
) -> CliResult<ExportSummary> {
    let notifier = Rc::new(RecordingNotifier::new());
    let (doc, watcher) = annotated_page(html, options, sink, Rc::clone(&notifier))?;

    let mut summary = ExportSummary::default();
    for record in watcher.annotator().records() {
        tracing::debug!("Clicking trigger for {}", record.filename);
        doc.dispatch_click(record.trigger);
        summary.triggered += 1;
    }
    summary.notices = notifier.messages();
    summary.outcomes = watcher.annotator().outcomes();

    tracing::info!(
        "Exported {} of {} tables",
        summary.exported(),
        summary.triggered
    );
    if summary.failed() > 0 {
        tracing::warn!("{} exports could not be saved", summary.failed());
    }
    Ok(summary)
}

/// Export every table and return the CSV text in memory, in discovery order.
pub fn export_to_memory(
    html: &str,
    options: ExportOptions,
) -> CliResult<(ExportSummary, Rc<MemorySink>)> {
    let sink = Rc::new(MemorySink::new());
    let summary = export_page(html, options, sink.clone())?;
    Ok((summary, sink))
}

/// The page markup after annotation: wrappers and triggers included.
pub fn annotate_page(html: &str, options: ExportOptions) -> CliResult<String> {
    let (doc, _watcher) = annotated_page(
        html,
        options,
        Rc::new(MemorySink::new()),
        Rc::new(RecordingNotifier::new()),
    )?;
    Ok(doc.to_html().map_err(ExportError::from)?)
}

/// Describe every table the page would get a trigger for.
pub fn list_tables(html: &str, options: ExportOptions) -> CliResult<Vec<TableSummary>> {
    let mut doc = Document::parse_html(html);
    let mut annotator = Annotator::new(options, Rc::new(MemorySink::new()), Rc::new(LogNotifier))?;
    let root = doc.root();
    let report = annotator.annotate(&mut doc, root);

    Ok(report
        .annotated
        .iter()
        .map(|record| {
            let widths: Vec<usize> = rows(&doc, record.element).map(|cells| cells.len()).collect();
            TableSummary {
                index: record.index,
                filename: record.filename.clone(),
                kind: record.kind,
                element: record.element,
                rows: widths.len(),
                columns: widths.iter().copied().max().unwrap_or(0),
            }
        })
        .collect())
}
