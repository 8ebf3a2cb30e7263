use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process;
use tracing::info;

use access_export::config::{self, Config, ExportFormat};
use access_export::error::{Error, EXIT_STATUS_EXPORT_FAILED, EXIT_STATUS_INVALID_USAGE};
use access_export::utils::logging::init_logging;
use access_export::{AccessExportClient, ExportRequest, TableFilter};

#[derive(Parser, Debug)]
#[command(name = "access_export")]
#[command(about = "Export a desktop database into SQLite or CSV files")]
#[command(version)]
#[command(after_help = "EXAMPLES:
    # Export every table into a new SQLite database
    access_export northwind.json northwind.sqlite

    # Export two tables as CSV files into an existing directory
    access_export northwind.json out/ --format csv --tables Customers,Orders")]
struct Cli {
    /// Source database snapshot
    #[arg(value_name = "SOURCE")]
    source: PathBuf,

    /// New SQLite file, or an existing directory for CSV output
    #[arg(value_name = "TARGET")]
    target: PathBuf,

    /// Only export these tables (comma separated, case sensitive)
    #[arg(short, long, value_delimiter = ',', num_args = 1..)]
    tables: Option<Vec<String>>,

    /// Output format (default: sqlite, or the configured format)
    #[arg(short, long, value_enum)]
    format: Option<FormatArg>,

    /// Configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose logging (debug level)
    #[arg(short, long)]
    verbose: bool,

    /// Set log level explicitly
    #[arg(long, value_enum)]
    log_level: Option<LogLevel>,

    /// Output logs in JSON format
    #[arg(long)]
    json_logs: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Sqlite,
    Csv,
}

impl From<FormatArg> for ExportFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Sqlite => ExportFormat::Sqlite,
            FormatArg::Csv => ExportFormat::Csv,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => EXIT_STATUS_INVALID_USAGE,
            };
            let _ = e.print();
            process::exit(code);
        }
    };

    if let Err(err) = run(cli) {
        let code = err
            .downcast_ref::<Error>()
            .map(Error::exit_code)
            .unwrap_or(EXIT_STATUS_EXPORT_FAILED);

        if code == EXIT_STATUS_EXPORT_FAILED {
            eprintln!("Error during export: {:#}", err);
        } else {
            eprintln!("{:#}", err);
        }
        process::exit(code);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => config::load_from_file(path)?,
        None => Config::default(),
    };

    initialize_logging(&cli, &config)?;

    let request = ExportRequest {
        source: cli.source,
        target: cli.target,
        format: cli
            .format
            .map(ExportFormat::from)
            .unwrap_or(config.export.format),
        filter: TableFilter::from_option(cli.tables.or_else(|| config.export.tables.clone())),
    };

    let client = AccessExportClient::new(config)?;

    // The export is sequential; one thread is enough
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;

    info!(
        "Starting access_export v{} ({} -> {})",
        env!("CARGO_PKG_VERSION"),
        request.source.display(),
        request.target.display()
    );

    let summary = runtime.block_on(client.run(&request))?;

    info!(
        tables = summary.rows.len(),
        indexes = summary.indexes_created,
        rows = summary.total_rows(),
        "Export complete"
    );

    Ok(())
}

fn initialize_logging(cli: &Cli, config: &Config) -> Result<()> {
    let mut logging = config.logging.clone().unwrap_or_default();

    if let Some(level) = cli.log_level {
        logging.level = level.as_str().to_string();
    } else if cli.verbose {
        logging.level = "debug".to_string();
    }

    if cli.json_logs {
        logging.format = "json".to_string();
    }

    init_logging(&logging)?;
    Ok(())
}
