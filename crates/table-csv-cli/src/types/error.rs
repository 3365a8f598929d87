//! Error types for the command-line front end.

/// All errors the commands can return.
#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Export error: {0}")]
    Export(#[from] table_csv::ExportError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Input not found: {0}")]
    InputNotFound(String),

    #[error("{failed} of {triggered} exports could not be saved")]
    SaveFailed { failed: usize, triggered: usize },
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InputNotFound(_) => 2,
            CliError::Config(_) => 3,
            CliError::Io(_)
            | CliError::Json(_)
            | CliError::Export(_)
            | CliError::SaveFailed { .. } => 1,
        }
    }
}

pub type CliResult<T> = Result<T, CliError>;
