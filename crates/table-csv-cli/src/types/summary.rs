//! Reports printed by the commands.

use serde::Serialize;

use table_csv::{ExportOutcome, NodeId, TableKind};

use super::error::{CliError, CliResult};

/// One discovered table, as shown by `list`.
#[derive(Debug, Clone, Serialize)]
pub struct TableSummary {
    pub index: usize,
    pub filename: String,
    pub kind: TableKind,
    pub element: NodeId,
    /// Lines the CSV export would contain.
    pub rows: usize,
    /// Widest row, in cells.
    pub columns: usize,
}

/// Result of clicking every trigger on a page.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportSummary {
    /// Triggers that were clicked.
    pub triggered: usize,
    /// Notices shown instead of saving.
    pub notices: Vec<String>,
    /// How each click ended, in click order.
    pub outcomes: Vec<ExportOutcome>,
}

impl ExportSummary {
    /// Clicks that ended in a saved file.
    pub fn exported(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ExportOutcome::Saved { .. }))
            .count()
    }

    /// Clicks whose save failed.
    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ExportOutcome::Failed { .. }))
            .count()
    }

    /// Error out if any save failed.
    pub fn ensure_saved(&self) -> CliResult<()> {
        match self.failed() {
            0 => Ok(()),
            failed => Err(CliError::SaveFailed {
                failed,
                triggered: self.triggered,
            }),
        }
    }
}
