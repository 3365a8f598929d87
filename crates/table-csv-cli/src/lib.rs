//! table-csv command-line front end: export every table in an HTML page as CSV.

pub mod commands;
pub mod config;
pub mod types;

pub use commands::{annotate_page, export_page, export_to_memory, list_tables, read_page};
pub use config::{load_options, resolve_config_path};
pub use types::{CliError, CliResult};
