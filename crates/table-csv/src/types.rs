//! Core data types for table discovery and export.

use serde::{Deserialize, Serialize};

use crate::dom::{DomError, NodeId};

/// Class carried by every wrapper this crate inserts.
pub const WRAPPER_CLASS: &str = "table-csv-wrapper";

/// Class carried by every export trigger.
pub const TRIGGER_CLASS: &str = "csv-download-button";

/// Visible label of an export trigger.
pub const TRIGGER_LABEL: &str = "⬇️ CSV";

/// Filename prefix; the discovery index and `.csv` follow it.
pub const FILENAME_PREFIX: &str = "table_export_";

/// Notice shown when there is nothing to export.
pub const EMPTY_EXPORT_NOTICE: &str = "Could not export this table (it might be empty).";

/// How filename indices are assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexScope {
    /// Indices restart at 1 in every scan pass.
    #[default]
    PerScan,
    /// One counter for the lifetime of the annotator.
    Page,
}

/// Tunables for annotation and export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub wrapper_class: String,
    pub trigger_class: String,
    pub trigger_label: String,
    pub filename_prefix: String,
    pub index_scope: IndexScope,
    pub empty_notice: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            wrapper_class: WRAPPER_CLASS.to_string(),
            trigger_class: TRIGGER_CLASS.to_string(),
            trigger_label: TRIGGER_LABEL.to_string(),
            filename_prefix: FILENAME_PREFIX.to_string(),
            index_scope: IndexScope::PerScan,
            empty_notice: EMPTY_EXPORT_NOTICE.to_string(),
        }
    }
}

impl ExportOptions {
    /// Reject options that would produce unusable markup or filenames.
    pub fn validate(&self) -> ExportResult<()> {
        for (field, value) in [
            ("wrapper_class", &self.wrapper_class),
            ("trigger_class", &self.trigger_class),
        ] {
            if value.trim().is_empty() || value.split_ascii_whitespace().count() != 1 {
                return Err(ExportError::InvalidOptions(format!(
                    "{field} must be a single class name, got {value:?}"
                )));
            }
        }
        if self
            .filename_prefix
            .chars()
            .any(|c| matches!(c, '/' | '\\' | '\0'))
            || self.filename_prefix.contains("..")
        {
            return Err(ExportError::InvalidOptions(format!(
                "filename_prefix must not contain path separators, got {:?}",
                self.filename_prefix
            )));
        }
        Ok(())
    }

    /// Download name for the table at a 1-based discovery index.
    pub fn filename_for(&self, index: usize) -> String {
        format!("{}{index}.csv", self.filename_prefix)
    }
}

/// Which kind of table-like element was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    /// A `<table>` element.
    Table,
    /// A `<div role="table">` container.
    RoleContainer,
}

/// The record kept for every element that received a trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedRecord {
    pub element: NodeId,
    pub wrapper: NodeId,
    pub trigger: NodeId,
    pub kind: TableKind,
    /// 1-based discovery index used for the filename.
    pub index: usize,
    pub filename: String,
    /// Scan pass that annotated the element, starting at 1.
    pub scan: u64,
}

/// Summary of one scan pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    /// Table-like elements matched under the root.
    pub matched: usize,
    /// Records created by this pass, in discovery order.
    pub annotated: Vec<ProcessedRecord>,
    /// Elements skipped because they were handled before.
    pub already_processed: usize,
    /// Plain tables skipped because a role container encloses them.
    pub nested: usize,
    /// Elements that could not be wrapped (no parent, or a DOM error).
    pub failed: usize,
}

impl ScanReport {
    pub fn annotated_count(&self) -> usize {
        self.annotated.len()
    }
}

/// What happened when a trigger fired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ExportOutcome {
    Saved { filename: String, bytes: usize },
    /// Nothing to export; the notice was shown.
    Empty,
    /// The element is no longer in the page; the notice was shown.
    Detached,
    Failed { error: String },
}

/// Errors that can occur while exporting.
#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("DOM error: {0}")]
    Dom(#[from] DomError),

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Invalid options: {0}")]
    InvalidOptions(String),
}

/// Convenience result type.
pub type ExportResult<T> = Result<T, ExportError>;
