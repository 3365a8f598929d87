//! Configuration loading and resolution.

use std::path::{Path, PathBuf};

use table_csv::ExportOptions;

use crate::types::{CliError, CliResult};

/// Environment variable naming an options file.
pub const CONFIG_ENV: &str = "TABLE_CSV_CONFIG";

/// Resolve the options file path.
///
/// Explicit flag, then `TABLE_CSV_CONFIG`, then `.table-csv/config.json` in
/// the working directory. `None` means built-in defaults.
pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(PathBuf::from(path));
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        if !env_path.is_empty() {
            return Some(PathBuf::from(env_path));
        }
    }

    let cwd_config = PathBuf::from(".table-csv/config.json");
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    None
}

/// Load and validate export options. Missing fields take their defaults.
pub fn load_options(path: Option<&Path>) -> CliResult<ExportOptions> {
    let Some(path) = path else {
        return Ok(ExportOptions::default());
    };

    let raw = std::fs::read_to_string(path).map_err(|e| {
        CliError::Config(format!("Failed to read {}: {e}", path.display()))
    })?;
    let options: ExportOptions = serde_json::from_str(&raw)
        .map_err(|e| CliError::Config(format!("Invalid options in {}: {e}", path.display())))?;
    options
        .validate()
        .map_err(|e| CliError::Config(format!("{}: {e}", path.display())))?;

    tracing::info!("Loaded options from {}", path.display());
    Ok(options)
}
