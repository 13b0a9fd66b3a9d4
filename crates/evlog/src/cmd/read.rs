//! Read command - Decode a log directory to stdout
//!
//! Outputs in the stdout sink's format without touching any checkpoint.
//! Records are numbered from 1 in read order.
//!
//! # Usage
//!
//! ```bash
//! evlog read /srv/1Cv8Log                       # everything, then exit
//! evlog read /srv/1Cv8Log --limit 100 --json    # first 100 as JSON lines
//! evlog read /srv/1Cv8Log --follow              # keep printing new records
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use evlog_protocol::Presentation;
use evlog_sinks::{OutputFormat, StdoutConfig, StdoutSink};
use evlog_sources::{SourceTimeZone, TailEvent, Tailer, TailerSettings};
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Read command arguments
#[derive(Args, Debug)]
pub struct ReadArgs {
    /// Log directory holding 1Cv8.lgf and the *.lgp files
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,

    /// Stop after this many records
    #[arg(short = 'n', long)]
    pub limit: Option<u64>,

    /// Print JSON lines instead of text
    #[arg(long)]
    pub json: bool,

    /// Keep waiting for new records at the end of the newest file
    #[arg(short, long)]
    pub follow: bool,

    /// Time zone the timestamps were written in (local, utc, +HH:MM)
    #[arg(long, default_value = "local")]
    pub time_zone: SourceTimeZone,

    /// Code table revision (short, long)
    #[arg(long, default_value = "short")]
    pub presentation: Presentation,

    /// Disable colors in text output
    #[arg(long)]
    pub no_color: bool,
}

/// Run the read command
pub async fn run(args: ReadArgs) -> Result<()> {
    let settings = TailerSettings {
        log_folder: args.dir.clone(),
        live_mode: args.follow,
        reading_timeout: Duration::from_millis(500),
        time_zone: args.time_zone,
        presentation: args.presentation,
    };

    let renderer = StdoutSink::with_config(if args.json {
        StdoutConfig::json()
    } else {
        StdoutConfig {
            color: !args.no_color,
            format: OutputFormat::Text,
        }
    });

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let mut out = io::stdout().lock();
    read_records(settings, args.limit, &renderer, &cancel, &mut out)
        .await
        .with_context(|| format!("failed to read {}", args.dir.display()))?;
    Ok(())
}

/// Print records until the directory is drained, `limit` is reached or
/// `cancel` fires; returns the number printed
async fn read_records(
    settings: TailerSettings,
    limit: Option<u64>,
    renderer: &StdoutSink,
    cancel: &CancellationToken,
    out: &mut impl Write,
) -> Result<u64> {
    let mut tailer = Tailer::open(settings, None).await?;
    let mut count = 0u64;

    while limit.is_none_or(|limit| count < limit) {
        match tailer.next(cancel).await? {
            TailEvent::Record(mut record) => {
                count += 1;
                record.id = count;
                let text = renderer.render(std::slice::from_ref(&record))?;
                out.write_all(text.as_bytes())?;
            }
            TailEvent::TimedOut => out.flush()?,
            TailEvent::Drained | TailEvent::Cancelled => break,
        }
    }

    out.flush()?;
    Ok(count)
}
