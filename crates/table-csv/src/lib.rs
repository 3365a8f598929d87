//! table-csv: find tables in a page, give each one an export trigger, and
//! turn its cells into CSV on demand.

pub mod dom;
pub mod locator;
pub mod serializer;
pub mod sink;
pub mod types;
pub mod watcher;

pub use dom::{Document, DomError, DomResult, Event, NodeId};
pub use locator::{export_element, find_table_like, Annotator};
pub use serializer::{sanitize_cell, table_to_csv};
pub use sink::{DirectorySink, ExportSink, LogNotifier, MemorySink, Notifier, RecordingNotifier};
pub use types::*;
pub use watcher::{BatchReport, TableWatcher};
