//! table-csv entry point.

use std::path::PathBuf;
use std::rc::Rc;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use table_csv::DirectorySink;
use table_csv_cli::commands::{annotate_page, export_page, export_to_memory, list_tables, read_page};
use table_csv_cli::config::{load_options, resolve_config_path};
use table_csv_cli::CliError;

#[derive(Parser)]
#[command(
    name = "table-csv",
    about = "Find the tables in an HTML page and export each one as CSV",
    version
)]
struct Cli {
    /// Path to a JSON options file (falls back to TABLE_CSV_CONFIG).
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Click every export trigger and save the CSV files.
    Export {
        /// HTML page to read.
        input: PathBuf,

        /// Directory the CSV files are saved to.
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,

        /// Print the CSV to stdout instead of saving files.
        #[arg(long)]
        stdout: bool,
    },

    /// Print the page with wrappers and export triggers inserted.
    Annotate {
        /// HTML page to read.
        input: PathBuf,

        /// Write the markup here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the tables that would get an export trigger, as JSON.
    List {
        /// HTML page to read.
        input: PathBuf,
    },

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   table-csv completions bash > ~/.local/share/bash-completion/completions/table-csv
    ///   table-csv completions zsh > ~/.zfunc/_table-csv
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config_path = resolve_config_path(cli.config.as_deref());
    let options = load_options(config_path.as_deref())?;

    match cli.command {
        Commands::Export {
            input,
            out_dir,
            stdout,
        } => {
            let html = read_page(&input)?;
            if stdout {
                let (summary, sink) = export_to_memory(&html, options)?;
                for (i, export) in sink.saved().iter().enumerate() {
                    if i > 0 {
                        println!();
                    }
                    println!("==> {} <==", export.filename);
                    println!("{}", export.content);
                }
                report_notices(&summary.notices);
                summary.ensure_saved()?;
            } else {
                let sink = Rc::new(DirectorySink::new(&out_dir));
                let summary = export_page(&html, options, sink.clone())?;
                for path in sink.written() {
                    println!("{}", path.display());
                }
                report_notices(&summary.notices);
                tracing::info!(
                    "{} tables exported to {}",
                    summary.exported(),
                    out_dir.display()
                );
                summary.ensure_saved()?;
            }
        }

        Commands::Annotate { input, output } => {
            let html = read_page(&input)?;
            let annotated = annotate_page(&html, options)?;
            match output {
                Some(path) => std::fs::write(&path, annotated)?,
                None => println!("{annotated}"),
            }
        }

        Commands::List { input } => {
            let html = read_page(&input)?;
            let tables = list_tables(&html, options)?;
            let info = serde_json::json!({
                "input": input.display().to_string(),
                "table_count": tables.len(),
                "tables": tables,
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "table-csv", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn report_notices(notices: &[String]) {
    for notice in notices {
        eprintln!("{notice}");
    }
}
