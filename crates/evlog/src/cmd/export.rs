//! Export command - Run the exporter
//!
//! Tails the configured log directory into the configured sink until a
//! shutdown signal arrives, or until all data is read in archive mode.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use evlog_config::{Config, SinkConfig, StdoutFormat};
use evlog_pipeline::{Exporter, ExporterSettings};
use evlog_sinks::{
    ClickHouseConfig, ClickHouseSink, DiskPlaintextConfig, DiskPlaintextSink, EventSink, NullSink,
    OutputFormat, StdoutConfig, StdoutSink,
};
use evlog_sources::TailerSettings;

/// Config files tried when `--config` is not given
pub const DEFAULT_CONFIG_PATHS: [&str; 2] = ["evlog.toml", "configs/evlog.toml"];

/// Export command arguments
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Path to configuration file (defaults to evlog.toml if not specified)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Stop at the end of the newest file instead of waiting for new records
    #[arg(long)]
    pub archive: bool,
}

/// Run the export command
pub async fn run(args: ExportArgs) -> Result<()> {
    let config_path = args
        .config
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(default)".to_string());

    info!(
        version = env!("CARGO_PKG_VERSION"),
        platform = std::env::consts::OS,
        arch = std::env::consts::ARCH,
        config = %config_path,
        "evlog starting"
    );

    let mut config = load_config(args.config)?;
    if args.archive {
        config.exporter.live_mode = false;
    }

    if let Err(e) = run_exporter(config).await {
        error!(error = %e, "export failed");
        return Err(e);
    }

    info!("evlog shutdown complete");
    Ok(())
}

/// Load the explicit config, or the first default path that exists
fn load_config(path: Option<PathBuf>) -> Result<Config> {
    match path {
        Some(path) => {
            // User explicitly provided config path - must exist
            if !path.exists() {
                return Err(anyhow::anyhow!("config file not found: {}", path.display()));
            }
            Config::from_file(&path).context("failed to load configuration")
        }
        None => {
            for path in DEFAULT_CONFIG_PATHS.iter().map(PathBuf::from) {
                if path.exists() {
                    info!(config = %path.display(), "using config file");
                    return Config::from_file(&path).context("failed to load configuration");
                }
            }
            Err(anyhow::anyhow!(
                "no config file found (tried {}); the source log_folder must be configured",
                DEFAULT_CONFIG_PATHS.join(", ")
            ))
        }
    }
}

async fn run_exporter(config: Config) -> Result<()> {
    let cancel = CancellationToken::new();

    let sink = build_sink(&config.sink).await?;
    info!(sink = config.sink.type_name(), name = sink.name(), "sink ready");

    let settings = exporter_settings(&config)?;
    let exporter = Exporter::new(settings, Arc::clone(&sink));
    let mut handle = tokio::spawn(exporter.run(cancel.clone()));

    let result = tokio::select! {
        result = &mut handle => result,
        () = wait_for_shutdown() => {
            info!("shutdown signal received, finishing queued batches");
            cancel.cancel();
            handle.await
        }
    };

    let snapshot = result.context("exporter task panicked")?.context("export stopped")?;

    let sink_metrics = sink.metrics().snapshot();
    info!(
        records_written = snapshot.records_written,
        last_id = snapshot.last_id,
        sink_batches = sink_metrics.batches_written,
        sink_bytes = sink_metrics.bytes_written,
        sink_errors = sink_metrics.write_errors,
        "final metrics"
    );

    Ok(())
}

/// Map the exporter section onto pipeline settings
fn exporter_settings(config: &Config) -> Result<ExporterSettings> {
    let exporter = &config.exporter;
    let log_folder = exporter
        .log_folder
        .clone()
        .context("exporter.log_folder is not configured")?;

    Ok(ExporterSettings {
        tailer: TailerSettings {
            log_folder,
            live_mode: exporter.live_mode,
            reading_timeout: exporter.reading_timeout,
            time_zone: exporter.time_zone,
            presentation: exporter.presentation,
        },
        portion_size: exporter.portion_size,
        queue_factor: exporter.queue_factor,
        write_parallelism: exporter.write_parallelism,
        skip_events_before: exporter.skip_events_before,
        metrics_interval: config.metrics.effective_interval(),
    })
}

/// Instantiate the configured sink
async fn build_sink(config: &SinkConfig) -> Result<Arc<dyn EventSink>> {
    let sink: Arc<dyn EventSink> = match config {
        SinkConfig::Null(_) => Arc::new(NullSink::new()),
        SinkConfig::Stdout(cfg) => {
            let format = match cfg.format {
                StdoutFormat::Text => OutputFormat::Text,
                StdoutFormat::Json => OutputFormat::Json,
            };
            Arc::new(StdoutSink::with_config(StdoutConfig {
                color: cfg.color,
                format,
            }))
        }
        SinkConfig::DiskPlaintext(cfg) => {
            let disk = DiskPlaintextConfig {
                path: cfg.path.clone(),
                file_name: cfg.file_name.clone(),
            };
            let sink = DiskPlaintextSink::open(disk)
                .await
                .with_context(|| format!("failed to open disk sink at {}", cfg.path.display()))?;
            Arc::new(sink)
        }
        SinkConfig::Clickhouse(cfg) => {
            Arc::new(ClickHouseSink::new(ClickHouseConfig {
                url: cfg.url.clone(),
                database: cfg.database.clone(),
                table: cfg.table.clone(),
                username: cfg.username.clone(),
                password: cfg.password.clone(),
                create_schema: cfg.create_schema,
            }))
        }
    };
    Ok(sink)
}

/// Wait for Ctrl+C or SIGTERM
async fn wait_for_shutdown() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_exporter_settings_mapping() {
        let config = Config::from_str(
            r#"
[metrics]
enabled = false

[exporter]
log_folder = "/srv/1Cv8Log"
live_mode = false
portion_size = 7
write_parallelism = 3
reading_timeout = "2s"
time_zone = "utc"
"#,
        )
        .unwrap();

        let settings = exporter_settings(&config).unwrap();
        assert_eq!(settings.tailer.log_folder, PathBuf::from("/srv/1Cv8Log"));
        assert!(!settings.tailer.live_mode);
        assert_eq!(settings.tailer.reading_timeout, Duration::from_secs(2));
        assert_eq!(settings.portion_size, 7);
        assert_eq!(settings.write_parallelism, 3);
        assert!(settings.metrics_interval.is_none());
    }

    #[test]
    fn test_missing_explicit_config() {
        let dir = TempDir::new().unwrap();
        let err = load_config(Some(dir.path().join("absent.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[tokio::test]
    async fn test_build_sinks() {
        let dir = TempDir::new().unwrap();

        let null = build_sink(&SinkConfig::Null(Default::default())).await.unwrap();
        assert_eq!(null.name(), "null");

        let stdout = build_sink(&SinkConfig::default()).await.unwrap();
        assert_eq!(stdout.name(), "stdout");

        let disk_config = Config::from_str(&format!(
            "[exporter]\nlog_folder = \"logs\"\n[sink]\ntype = \"disk_plaintext\"\npath = {:?}\n",
            dir.path().display().to_string()
        ))
        .unwrap();
        let disk = build_sink(&disk_config.sink).await.unwrap();
        assert_eq!(disk.name(), "disk_plaintext");
        assert!(disk.read_position().await.unwrap().is_none());
    }
}
