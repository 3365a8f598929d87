//! Where exported CSV goes, and how the user is told when it can't.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use crate::types::{ExportError, ExportResult};

/// Saves CSV text under a filename.
pub trait ExportSink {
    fn save(&self, content: &str, filename: &str) -> ExportResult<()>;
}

/// Shows a message to the user.
pub trait Notifier {
    fn notify(&self, message: &str);
}

/// Reject anything but a bare file name.
fn check_filename(filename: &str) -> ExportResult<()> {
    let path = Path::new(filename);
    let bare = path.file_name().and_then(|n| n.to_str()) == Some(filename);
    if filename.is_empty() || !bare || filename.contains(|c: char| c == '/' || c == '\\') {
        return Err(ExportError::InvalidFilename(filename.to_string()));
    }
    Ok(())
}

/// Writes each export as a UTF-8 file in one directory.
///
/// Existing files are never overwritten: like a browser download, `name.csv`
/// becomes `name (1).csv`, `name (2).csv` and so on.
#[derive(Debug)]
pub struct DirectorySink {
    dir: PathBuf,
    written: RefCell<Vec<PathBuf>>,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: RefCell::new(Vec::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Paths written so far, in order.
    pub fn written(&self) -> Vec<PathBuf> {
        self.written.borrow().clone()
    }

    fn free_path(&self, filename: &str) -> PathBuf {
        let candidate = self.dir.join(filename);
        if !candidate.exists() {
            return candidate;
        }
        let (stem, ext) = match filename.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
            _ => (filename, None),
        };
        (1u32..)
            .map(|n| match ext {
                Some(ext) => self.dir.join(format!("{stem} ({n}).{ext}")),
                None => self.dir.join(format!("{stem} ({n})")),
            })
            .find(|p| !p.exists())
            .unwrap_or(candidate)
    }
}

impl ExportSink for DirectorySink {
    fn save(&self, content: &str, filename: &str) -> ExportResult<()> {
        check_filename(filename)?;
        std::fs::create_dir_all(&self.dir)?;
        let path = self.free_path(filename);
        std::fs::write(&path, content.as_bytes())?;
        tracing::info!("Saved {} bytes to {}", content.len(), path.display());
        self.written.borrow_mut().push(path);
        Ok(())
    }
}

/// One export held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedExport {
    pub filename: String,
    pub content: String,
}

/// Keeps exports in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    saved: RefCell<Vec<SavedExport>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saved(&self) -> Vec<SavedExport> {
        self.saved.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.saved.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.saved.borrow().is_empty()
    }
}

impl ExportSink for MemorySink {
    fn save(&self, content: &str, filename: &str) -> ExportResult<()> {
        check_filename(filename)?;
        self.saved.borrow_mut().push(SavedExport {
            filename: filename.to_string(),
            content: content.to_string(),
        });
        Ok(())
    }
}

/// Reports notices as warnings in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        tracing::warn!("{message}");
    }
}

/// Keeps every notice for later inspection.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: RefCell<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        tracing::warn!("{message}");
        self.messages.borrow_mut().push(message.to_string());
    }
}
