//! Edge case integration tests for table-csv.
//!
//! Covers discovery, idempotence, escaping, empty exports and dynamic pages,
//! driven through the same paths the command-line front end uses.

use std::cell::Cell;
use std::rc::Rc;

use table_csv::{
    Annotator, DirectorySink, Document, Event, ExportOptions, MemorySink, NodeId,
    RecordingNotifier, TableWatcher, EMPTY_EXPORT_NOTICE, TRIGGER_CLASS, WRAPPER_CLASS,
};
use table_csv_cli::commands::{annotate_page, export_page, export_to_memory, list_tables, read_page};
use table_csv_cli::config::load_options;
use table_csv_cli::CliError;

// ─────────────────────── helpers ───────────────────────

struct Page {
    doc: Document,
    watcher: TableWatcher,
    sink: Rc<MemorySink>,
    notifier: Rc<RecordingNotifier>,
}

/// Parse a page and install the watcher, as a content script would on load.
fn load(html: &str) -> Page {
    let mut doc = Document::parse_html(html);
    let sink = Rc::new(MemorySink::new());
    let notifier = Rc::new(RecordingNotifier::new());
    let annotator =
        Annotator::new(ExportOptions::default(), sink.clone(), notifier.clone()).unwrap();
    let (mut watcher, _) = TableWatcher::install(&mut doc, annotator);
    watcher.settle(&mut doc);
    Page {
        doc,
        watcher,
        sink,
        notifier,
    }
}

fn with_class(doc: &Document, class: &str) -> Vec<NodeId> {
    doc.descendants(doc.root())
        .into_iter()
        .filter(|&id| doc.has_class(id, class))
        .collect()
}

fn by_id(doc: &Document, id: &str) -> NodeId {
    doc.descendants(doc.root())
        .into_iter()
        .find(|&n| doc.attr(n, "id") == Some(id))
        .unwrap()
}

fn csv_for_cell(text: &str) -> String {
    let html = format!("<table><tr><td>{text}</td></tr></table>");
    let (_, sink) = export_to_memory(&html, ExportOptions::default()).unwrap();
    sink.saved()[0].content.clone()
}

// ═══════════════════════════════════════════════════════
// DISCOVERY
// ═══════════════════════════════════════════════════════

/// Test 1: running the annotator twice leaves one wrapper and trigger each.
#[test]
fn test_01_rescan_does_not_double_wrap() {
    let mut page = load(
        "<body><table><tr><td>a</td></tr></table><table><tr><td>b</td></tr></table></body>",
    );
    let body = page.doc.body();

    // Dispose hands the annotator back so the same page can be rescanned by hand.
    let mut annotator = page.watcher.dispose(&mut page.doc);
    let report = annotator.annotate(&mut page.doc, body);

    assert_eq!(report.annotated_count(), 0);
    assert_eq!(with_class(&page.doc, WRAPPER_CLASS).len(), 2);
    assert_eq!(with_class(&page.doc, TRIGGER_CLASS).len(), 2);
}

/// Test 2: a composite widget gets exactly one trigger.
#[test]
fn test_02_role_container_gets_single_trigger() {
    let page = load(
        r#"<body><div role="table" id="grid">
             <div class="header"><table><tr><th>A</th><th>B</th></tr></table></div>
             <div class="rows"><table><tr><td>1</td><td>2</td></tr></table></div>
           </div></body>"#,
    );
    let triggers = with_class(&page.doc, TRIGGER_CLASS);
    assert_eq!(triggers.len(), 1);

    let grid = by_id(&page.doc, "grid");
    assert!(page.watcher.annotator().is_processed(grid));

    page.doc.dispatch_click(triggers[0]);
    assert_eq!(page.sink.saved()[0].content, "A,B\n1,2");
}

/// Test 3: tables inserted after load are discovered, old ones untouched.
#[test]
fn test_03_dynamic_insertion() {
    let mut page = load(r#"<body><table><tr><td>old</td></tr></table><main id="app"></main></body>"#);
    let before = with_class(&page.doc, WRAPPER_CLASS);
    assert_eq!(before.len(), 1);

    // Host page renders a fragment, then inserts it.
    let app = by_id(&page.doc, "app");
    let card = page.doc.create_element("div");
    let table = page.doc.create_element("table");
    let row = page.doc.create_element("tr");
    let cell = page.doc.create_element("td");
    let text = page.doc.create_text("new");
    page.doc.append_child(cell, text).unwrap();
    page.doc.append_child(row, cell).unwrap();
    page.doc.append_child(table, row).unwrap();
    page.doc.append_child(card, table).unwrap();
    page.doc.append_child(app, card).unwrap();

    assert_eq!(page.watcher.settle(&mut page.doc), 1);

    let after = with_class(&page.doc, WRAPPER_CLASS);
    assert_eq!(after.len(), 2);
    assert!(after.contains(&before[0]));

    let record = page.watcher.annotator().record_for(table).unwrap();
    assert_eq!(record.filename, "table_export_1.csv");
    page.doc.dispatch_click(record.trigger);
    assert_eq!(page.sink.saved()[0].content, "new");
}

/// Test 4: the host page's own click handlers never see trigger clicks.
#[test]
fn test_04_trigger_click_does_not_bubble() {
    let mut page = load(r#"<body><div id="row-link"><table><tr><td>x</td></tr></table></div></body>"#);
    let link = by_id(&page.doc, "row-link");
    let navigations = Rc::new(Cell::new(0));
    let seen = Rc::clone(&navigations);
    page.doc.add_event_listener(
        link,
        Rc::new(move |_e: &mut Event, _d: &Document| seen.set(seen.get() + 1)),
    );

    let trigger = with_class(&page.doc, TRIGGER_CLASS)[0];
    let event = page.doc.dispatch_click(trigger);
    assert!(event.propagation_stopped());
    assert_eq!(navigations.get(), 0);
    assert_eq!(page.sink.len(), 1);

    // Clicks elsewhere inside the wrapper still reach the host.
    let cell = page
        .doc
        .descendants(link)
        .into_iter()
        .find(|&n| page.doc.tag_name(n) == Some("td"))
        .unwrap();
    page.doc.dispatch_click(cell);
    assert_eq!(navigations.get(), 1);
}

// ═══════════════════════════════════════════════════════
// SERIALIZATION
// ═══════════════════════════════════════════════════════

/// Test 5: quotes are doubled and the value quoted.
#[test]
fn test_05_quote_escaping() {
    assert_eq!(csv_for_cell(r#"He said "hi""#), r#""He said ""hi""""#);
}

/// Test 6: commas force quoting.
#[test]
fn test_06_comma_quoting() {
    assert_eq!(csv_for_cell("a,b"), r#""a,b""#);
}

/// Test 7: line breaks collapse to a space and do not by themselves quote.
#[test]
fn test_07_newline_collapse() {
    assert_eq!(csv_for_cell("two<br>lines"), "two lines");
    assert_eq!(csv_for_cell("<pre>pre\nformatted</pre>"), "pre formatted");
}

/// Test 8: rows without cells leave no blank line.
#[test]
fn test_08_empty_rows_skipped() {
    let html = "<table><tr><td>1</td></tr><tr></tr><tr><td>2</td></tr></table>";
    let (_, sink) = export_to_memory(html, ExportOptions::default()).unwrap();
    assert_eq!(sink.saved()[0].content, "1\n2");
}

/// Test 9: the worked example from the documentation.
#[test]
fn test_09_end_to_end_example() {
    let html = "<table><tr><th>Name</th><th>City</th></tr>\
                <tr><td>O'Brien, J.</td><td>NYC</td></tr></table>";
    let (summary, sink) = export_to_memory(html, ExportOptions::default()).unwrap();
    assert_eq!(summary.exported(), 1);
    assert_eq!(sink.saved()[0].content, "Name,City\n\"O'Brien, J.\",NYC");
}

// ═══════════════════════════════════════════════════════
// EMPTY AND MISSING TABLES
// ═══════════════════════════════════════════════════════

/// Test 10: an empty table shows the notice instead of downloading.
#[test]
fn test_10_empty_table_notice() {
    let page = load("<body><table><tr></tr></table></body>");
    let trigger = with_class(&page.doc, TRIGGER_CLASS)[0];
    page.doc.dispatch_click(trigger);
    assert!(page.sink.is_empty());
    assert_eq!(page.notifier.messages(), vec![EMPTY_EXPORT_NOTICE.to_string()]);
}

/// Test 11: a table removed by the host after annotation falls back to the notice.
#[test]
fn test_11_removed_table_notice() {
    let mut page = load("<body><table><tr><td>gone</td></tr></table></body>");
    let record = page.watcher.annotator().records()[0].clone();
    page.doc.remove_child(record.wrapper, record.element).unwrap();
    page.watcher.settle(&mut page.doc);

    page.doc.dispatch_click(record.trigger);
    assert!(page.sink.is_empty());
    assert_eq!(page.notifier.messages().len(), 1);
}

// ═══════════════════════════════════════════════════════
// FRONT END
// ═══════════════════════════════════════════════════════

/// Test 12: exporting to a directory writes one file per non-empty table.
#[test]
fn test_12_export_to_directory() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("page.html");
    std::fs::write(
        &input,
        "<table><tr><td>a</td></tr></table><table></table><table><tr><td>c</td></tr></table>",
    )
    .unwrap();

    let html = read_page(&input).unwrap();
    let out = dir.path().join("csv");
    let sink = Rc::new(DirectorySink::new(&out));
    let summary = export_page(&html, ExportOptions::default(), sink.clone()).unwrap();

    assert_eq!(summary.triggered, 3);
    assert_eq!(summary.notices.len(), 1);
    assert_eq!(std::fs::read_to_string(out.join("table_export_1.csv")).unwrap(), "a");
    assert_eq!(std::fs::read_to_string(out.join("table_export_3.csv")).unwrap(), "c");
    assert!(!out.join("table_export_2.csv").exists());
    assert_eq!(sink.written().len(), 2);
}

/// Test 13: exporting twice keeps the first files.
#[test]
fn test_13_repeated_export_keeps_files() {
    let dir = tempfile::tempdir().unwrap();
    let html = "<table><tr><td>v</td></tr></table>";
    for _ in 0..2 {
        let sink = Rc::new(DirectorySink::new(dir.path()));
        export_page(html, ExportOptions::default(), sink).unwrap();
    }
    assert!(dir.path().join("table_export_1.csv").exists());
    assert!(dir.path().join("table_export_1 (1).csv").exists());
}

/// Test 14: annotated markup re-parsed later is not wrapped again.
#[test]
fn test_14_saved_annotated_page_is_stable() {
    let html = "<body><table><tr><td>1</td></tr></table></body>";
    let once = annotate_page(html, ExportOptions::default()).unwrap();
    let twice = annotate_page(&once, ExportOptions::default()).unwrap();
    assert_eq!(twice.matches(WRAPPER_CLASS).count(), 1);
    assert_eq!(twice.matches(TRIGGER_CLASS).count(), 1);
    assert_eq!(twice.matches("<table>").count(), 1);
}

/// Test 15: options from a config file flow through to filenames and labels.
#[test]
fn test_15_custom_options() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{"filename_prefix": "report_", "trigger_label": "Save CSV"}"#,
    )
    .unwrap();
    let options = load_options(Some(&path)).unwrap();

    let html = "<table><tr><td>1</td></tr></table>";
    let tables = list_tables(html, options.clone()).unwrap();
    assert_eq!(tables[0].filename, "report_1.csv");

    let annotated = annotate_page(html, options).unwrap();
    assert!(annotated.contains(">Save CSV</button>"));
}

/// Test 16: a missing input file is reported, not panicked on.
#[test]
fn test_16_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    let err = read_page(&dir.path().join("nope.html")).unwrap_err();
    assert!(matches!(err, CliError::InputNotFound(_)));
}

/// Test 17: a save that fails is counted as failed, and the export errors out.
#[test]
fn test_17_failed_save_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, "").unwrap();

    let sink = Rc::new(DirectorySink::new(blocker.join("csv")));
    let summary = export_page(
        "<table><tr><td>a</td></tr></table>",
        ExportOptions::default(),
        sink.clone(),
    )
    .unwrap();

    assert_eq!(summary.triggered, 1);
    assert_eq!(summary.exported(), 0);
    assert_eq!(summary.failed(), 1);
    assert!(summary.notices.is_empty());
    assert!(sink.written().is_empty());

    let err = summary.ensure_saved().unwrap_err();
    assert!(matches!(err, CliError::SaveFailed { failed: 1, .. }));
    assert_ne!(err.exit_code(), 0);
}

/// Test 18: a column the page hides still exports its text.
#[test]
fn test_18_hidden_column_exported() {
    let html = r#"<table><tr><td style="display:none">42</td><td>Name</td></tr></table>"#;
    let (_, sink) = export_to_memory(html, ExportOptions::default()).unwrap();
    assert_eq!(sink.saved()[0].content, "42,Name");
}
