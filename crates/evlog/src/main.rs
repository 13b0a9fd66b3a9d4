//! Evlog - Audit log exporter
//!
//! # Usage
//!
//! ```bash
//! # Export with the default config lookup (evlog.toml, configs/evlog.toml)
//! evlog
//! evlog export --config configs/evlog.toml
//!
//! # Read everything once and exit
//! evlog export --archive
//!
//! # Decode a log directory to stdout without a sink
//! evlog read /var/1C/srvinfo/reg_1541/ab12/1Cv8Log --limit 20
//! ```

mod cmd;

use std::path::Path;

use anyhow::Result;
use clap::{Parser, Subcommand};
use evlog_config::{Config, LogFormat, LogOutput};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

/// Evlog - Audit log exporter
#[derive(Parser, Debug)]
#[command(name = "evlog")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    // Global args that apply to export when no subcommand given
    /// Path to configuration file (error if specified but not found)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export the audit log into the configured sink
    Export(cmd::export::ExportArgs),

    /// Decode a log directory and print records to stdout
    Read(cmd::read::ReadArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Export(mut args)) => {
            // CLI global --config overrides subcommand config if both specified
            if args.config.is_none() && cli.config.is_some() {
                args.config = cli.config;
            }
            let log = resolve_log_settings(cli.log_level.as_deref(), args.config.as_deref());
            init_logging(&log)?;
            cmd::export::run(args).await
        }
        Some(Command::Read(args)) => {
            // Records go to stdout, so only problems are logged, to stderr
            let log = LogSettings {
                level: cli.log_level.unwrap_or_else(|| "warn".to_string()),
                format: LogFormat::Console,
                output: LogOutput::Stderr,
            };
            init_logging(&log)?;
            cmd::read::run(args).await
        }
        // No subcommand = export (default behavior)
        None => {
            let log = resolve_log_settings(cli.log_level.as_deref(), cli.config.as_deref());
            init_logging(&log)?;
            let args = cmd::export::ExportArgs {
                config: cli.config,
                archive: false,
            };
            cmd::export::run(args).await
        }
    }
}

/// Resolved logging setup
struct LogSettings {
    level: String,
    format: LogFormat,
    output: LogOutput,
}

/// Resolve logging: CLI flag > config file > defaults
fn resolve_log_settings(cli_level: Option<&str>, config_path: Option<&Path>) -> LogSettings {
    let config = config_path
        .filter(|path| path.exists())
        .and_then(|path| Config::from_file(path).ok())
        .or_else(|| {
            cmd::export::DEFAULT_CONFIG_PATHS
                .iter()
                .map(Path::new)
                .find(|path| path.exists())
                .and_then(|path| Config::from_file(path).ok())
        });

    let log = config.map(|c| c.log).unwrap_or_default();
    LogSettings {
        level: cli_level.map_or_else(|| log.level.directive(), str::to_string),
        format: log.format,
        output: log.output,
    }
}

/// Initialize the tracing subscriber for logging
fn init_logging(settings: &LogSettings) -> Result<()> {
    let filter = EnvFilter::try_new(&settings.level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    let writer = match settings.output {
        LogOutput::Stdout => BoxMakeWriter::new(std::io::stdout),
        LogOutput::Stderr => BoxMakeWriter::new(std::io::stderr),
    };

    let layer: Box<dyn Layer<Registry> + Send + Sync> = match settings.format {
        LogFormat::Console => fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_writer(writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_writer(writer)
            .boxed(),
    };

    tracing_subscriber::registry().with(layer).with(filter).init();

    Ok(())
}
