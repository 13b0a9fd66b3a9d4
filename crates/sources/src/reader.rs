//! Record reader for one data file
//!
//! Decodes successive nodes of a data file into [`EventRecord`] values,
//! resolving reference indices through the shared [`ReferenceResolver`].
//!
//! # Field layout
//!
//! ```text
//! idx  field               idx  field
//!  0   timestamp            9   comment
//!  1   transaction status  10   metadata (ref)
//!  2   {tx date, tx num}   11   data (tagged union)
//!  3   user (ref)          12   data presentation
//!  4   computer (ref)      13   server (ref)
//!  5   application (ref)   14   main port (ref)
//!  6   connection          15   add port (ref)
//!  7   event (ref)         16   session
//!  8   severity
//! ```

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use evlog_protocol::{EventRecord, FormatError, Node, Presentation};

use crate::resolver::{Category, ReferenceResolver};
use crate::stream::NodeStream;
use crate::timezone::SourceTimeZone;
use crate::{Result, SourceError};

/// Timestamp layout of field 0
const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Transaction dates count 1/10000 s from 0001-01-01
const TRANSACTION_TICKS_PER_SECOND: i64 = 10_000;

/// Reader over one rotated data file
pub struct RecordReader {
    stream: NodeStream,
    file_name: String,
    time_zone: SourceTimeZone,
    presentation: Presentation,
    /// Set by the directory watch when the file is removed
    gone: Arc<AtomicBool>,
}

impl RecordReader {
    /// Open a data file positioned at its start
    pub async fn open(
        path: &Path,
        time_zone: SourceTimeZone,
        presentation: Presentation,
    ) -> Result<Self> {
        let stream = NodeStream::open(path).await?;
        let file_name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            stream,
            file_name,
            time_zone,
            presentation,
            gone: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Share a removal flag maintained by a directory watch
    pub fn with_gone_flag(mut self, gone: Arc<AtomicBool>) -> Self {
        self.gone = gone;
        self
    }

    pub fn path(&self) -> &Path {
        self.stream.path()
    }

    /// File name without extension, as stored in checkpoints
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Byte offset right after the last decoded record
    pub fn position(&self) -> u64 {
        self.stream.position()
    }

    /// True if an unfinished record is buffered
    pub fn has_partial(&self) -> bool {
        self.stream.has_partial()
    }

    /// Resume decoding at `offset`, which must be a record boundary
    pub async fn set_position(&mut self, offset: u64) -> Result<()> {
        self.stream.seek(offset).await
    }

    /// Decode the next complete record
    ///
    /// Returns `None` at the current end of data. If the file has been removed
    /// by then, `SourceGone` is returned instead, flagged with whether a
    /// partial record was left behind.
    pub async fn next(&mut self, resolver: &mut ReferenceResolver) -> Result<Option<EventRecord>> {
        let Some(node) = self.stream.next_node().await? else {
            if self.is_gone().await {
                return Err(SourceError::SourceGone {
                    path: self.path().to_path_buf(),
                    pending: self.has_partial(),
                });
            }
            return Ok(None);
        };

        let record = self.map_record(&node, resolver).await?;
        Ok(Some(record))
    }

    async fn is_gone(&self) -> bool {
        if self.gone.load(Ordering::Acquire) {
            return true;
        }
        !tokio::fs::try_exists(self.stream.path()).await.unwrap_or(true)
    }

    async fn map_record(
        &self,
        node: &Node,
        resolver: &mut ReferenceResolver,
    ) -> Result<EventRecord> {
        let path = self.stream.path();
        let fmt_err = |e: FormatError| SourceError::format(path, e);
        let presentation = self.presentation;

        let date_time = parse_timestamp(node.str_field(0).map_err(fmt_err)?, self.time_zone)
            .ok_or_else(|| fmt_err(FormatError::invalid_field(0, "invalid timestamp")))?;
        let transaction_status = presentation
            .transaction_status(node.str_field(1).map_err(fmt_err)?)
            .to_string();
        let (transaction_date, transaction_number) =
            parse_transaction(node.list_field(2).map_err(fmt_err)?, self.time_zone).map_err(fmt_err)?;

        let (user, user_uuid) = resolver
            .referenced_value(Category::Users, node.int_field(3).map_err(fmt_err)?)
            .await?;
        let computer = resolver
            .value(Category::Computers, node.int_field(4).map_err(fmt_err)?)
            .await?;
        let application = resolver
            .value(Category::Applications, node.int_field(5).map_err(fmt_err)?)
            .await?;
        let connection = node.int_field(6).map_err(fmt_err)?;
        let event = resolver
            .value(Category::Events, node.int_field(7).map_err(fmt_err)?)
            .await?;
        let severity = presentation
            .severity(node.str_field(8).map_err(fmt_err)?)
            .to_string();
        let comment = node.str_field(9).map_err(fmt_err)?.to_string();
        let (metadata, metadata_uuid) = resolver
            .referenced_value(Category::Metadata, node.int_field(10).map_err(fmt_err)?)
            .await?;
        let data = flatten_data(node.field(11).map_err(fmt_err)?).trim().to_string();
        let data_presentation = node.str_field(12).map_err(fmt_err)?.to_string();
        let server = resolver
            .value(Category::Servers, node.int_field(13).map_err(fmt_err)?)
            .await?;
        let main_port = port(
            &resolver
                .value(Category::MainPorts, node.int_field(14).map_err(fmt_err)?)
                .await?,
            14,
        )
        .map_err(fmt_err)?;
        let add_port = port(
            &resolver
                .value(Category::AddPorts, node.int_field(15).map_err(fmt_err)?)
                .await?,
            15,
        )
        .map_err(fmt_err)?;
        let session = node.int_field(16).map_err(fmt_err)?;

        Ok(EventRecord {
            file_name: self.file_name.clone(),
            end_position: self.stream.position(),
            lgf_end_position: resolver.position(),
            id: 0,
            date_time,
            transaction_status,
            transaction_date,
            transaction_number,
            user_uuid,
            user,
            computer,
            application: presentation.application(&application).to_string(),
            connection,
            event: presentation.event(&event).to_string(),
            severity,
            comment,
            metadata_uuid,
            metadata,
            data,
            data_presentation,
            server,
            main_port,
            add_port,
            session,
        })
    }
}

fn parse_timestamp(raw: &str, time_zone: SourceTimeZone) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT).ok()?;
    time_zone.to_utc(naive)
}

/// `{hexDate, hexNumber}`; a zero date means no transaction
fn parse_transaction(
    node: &Node,
    time_zone: SourceTimeZone,
) -> std::result::Result<(Option<DateTime<Utc>>, i64), FormatError> {
    let invalid = |what: &str| FormatError::invalid_field(2, format!("invalid transaction {what}"));

    let ticks = i64::from_str_radix(node.str_field(0)?.trim(), 16).map_err(|_| invalid("date"))?;
    let number = i64::from_str_radix(node.str_field(1)?.trim(), 16).map_err(|_| invalid("number"))?;

    if ticks == 0 {
        return Ok((None, number));
    }

    let epoch = NaiveDate::from_ymd_opt(1, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| invalid("epoch"))?;
    let naive = epoch
        .checked_add_signed(chrono::Duration::seconds(ticks / TRANSACTION_TICKS_PER_SECOND))
        .ok_or_else(|| invalid("date"))?;
    let date = time_zone.to_utc(naive).ok_or_else(|| invalid("date"))?;

    Ok((Some(date), number))
}

/// Port numbers are stored as reference values; empty means 0
fn port(raw: &str, index: usize) -> std::result::Result<i32, FormatError> {
    if raw.is_empty() {
        return Ok(0);
    }
    raw.trim()
        .parse()
        .map_err(|_| FormatError::invalid_field(index, format!("invalid port {raw:?}")))
}

/// Flatten the tagged data union into text
///
/// - `R` reference and `S` string yield their value
/// - `U` undefined yields nothing
/// - `B` boolean yields `true`/`false`
/// - `P` composite yields one `Item N: value` line per non-empty sub-field
///
/// Unknown tags yield nothing.
pub(crate) fn flatten_data(node: &Node) -> String {
    let Some(items) = node.as_list() else {
        return node.as_str().to_string();
    };

    let value = || items.get(1).map(Node::as_str).unwrap_or_default();
    match items.first().map(Node::as_str) {
        Some("R" | "S") => value().to_string(),
        Some("B") => match items.get(1).map(Node::as_str) {
            Some("0") => "false".to_string(),
            Some(_) => "true".to_string(),
            None => String::new(),
        },
        Some("P") => {
            let mut out = String::new();
            let Some(fields) = items.get(1).and_then(Node::as_list) else {
                return out;
            };
            for (i, field) in fields.iter().enumerate().skip(1) {
                let value = flatten_data(field);
                if !value.is_empty() {
                    let _ = writeln!(out, "Item {i}: {value}");
                }
            }
            out
        }
        _ => String::new(),
    }
}
