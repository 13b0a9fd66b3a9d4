//! Fixture writers for log directories
//!
//! Helpers that write reference and data files in the on-disk layout, for
//! tests of this crate and of the export pipeline. Everything is synchronous
//! `std::fs` so it can be used from any test.
//!
//! # Example
//!
//! ```ignore
//! use evlog_sources::test::{LogDir, EventLine};
//!
//! let dir = LogDir::create(tmp.path())?;
//! dir.append_reference(&[LogDir::user(1, "Alice")])?;
//! dir.write_data_file("20240315000000", &[EventLine::new("20240315103000").user(1)], 0)?;
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use evlog_protocol::{DATA_FILE_EXTENSION, REFERENCE_FILE_NAME};

/// Header written at the top of reference and data files
pub const FILE_HEADER: &str = "1CV8LOG(ver 2.0)\r\n7f3c1e2a-5b6d-4c8e-9f0a-1b2c3d4e5f60\r\n\r\n";

/// Deterministic uuid for fixture entry `index`
pub fn uuid(index: u32) -> String {
    format!("10000000-0000-0000-0000-{index:012}")
}

/// Base modification time for fixture files; offsets are added in seconds
pub fn base_time() -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000)
}

/// A log directory under construction
#[derive(Debug, Clone)]
pub struct LogDir {
    path: PathBuf,
}

impl LogDir {
    /// Use `path` as a log directory and write an empty reference file
    pub fn create(path: &Path) -> io::Result<Self> {
        fs::create_dir_all(path)?;
        let dir = Self {
            path: path.to_path_buf(),
        };
        fs::write(dir.reference_path(), FILE_HEADER)?;
        Ok(dir)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn reference_path(&self) -> PathBuf {
        self.path.join(REFERENCE_FILE_NAME)
    }

    pub fn data_path(&self, name: &str) -> PathBuf {
        self.path.join(format!("{name}.{DATA_FILE_EXTENSION}"))
    }

    /// Users entry `{1,uuid,"name",index}`
    pub fn user(index: u32, name: &str) -> String {
        format!("{{1,{},{},{index}}},\r\n", uuid(index), quote(name))
    }

    /// Metadata entry `{5,uuid,"name",index}`
    pub fn metadata(index: u32, name: &str) -> String {
        format!("{{5,{},{},{index}}},\r\n", uuid(index), quote(name))
    }

    /// Plain entry `{category,"value",index}`
    pub fn plain(category: u8, index: u32, value: &str) -> String {
        format!("{{{category},{},{index}}},\r\n", quote(value))
    }

    /// Append entries to the reference file
    pub fn append_reference(&self, entries: &[String]) -> io::Result<()> {
        append(&self.reference_path(), &entries.concat())
    }

    /// Write a data file with `events` and set its modification time to
    /// `base_time() + mtime_offset` seconds
    pub fn write_data_file(
        &self,
        name: &str,
        events: &[EventLine],
        mtime_offset: u64,
    ) -> io::Result<PathBuf> {
        let path = self.data_path(name);
        let mut text = String::from(FILE_HEADER);
        for event in events {
            text.push_str(&event.render());
        }
        fs::write(&path, text)?;
        set_mtime(&path, mtime_offset)?;
        Ok(path)
    }

    /// Append events to an existing data file, keeping its modification time
    /// at `base_time() + mtime_offset` seconds
    pub fn append_events(
        &self,
        name: &str,
        events: &[EventLine],
        mtime_offset: u64,
    ) -> io::Result<()> {
        let path = self.data_path(name);
        let text: String = events.iter().map(EventLine::render).collect();
        append(&path, &text)?;
        set_mtime(&path, mtime_offset)
    }
}

/// Append raw text to a file
pub fn append(path: &Path, text: &str) -> io::Result<()> {
    let mut file = OpenOptions::new().append(true).create(true).open(path)?;
    file.write_all(text.as_bytes())?;
    file.sync_all()
}

/// Set the modification time of `path` to `base_time() + offset` seconds
pub fn set_mtime(path: &Path, offset: u64) -> io::Result<()> {
    let file = File::options().write(true).open(path)?;
    file.set_modified(base_time() + Duration::from_secs(offset))
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// One data file entry with sensible defaults
#[derive(Debug, Clone)]
pub struct EventLine {
    pub timestamp: String,
    pub transaction_status: String,
    pub transaction: (String, String),
    pub user: u32,
    pub computer: u32,
    pub application: u32,
    pub connection: u64,
    pub event: u32,
    pub severity: String,
    pub comment: String,
    pub metadata: u32,
    /// Raw data node, e.g. `{"S","text"}`
    pub data: String,
    pub data_presentation: String,
    pub server: u32,
    pub main_port: u32,
    pub add_port: u32,
    pub session: u64,
}

impl EventLine {
    pub fn new(timestamp: &str) -> Self {
        Self {
            timestamp: timestamp.to_string(),
            transaction_status: "N".to_string(),
            transaction: ("0".to_string(), "0".to_string()),
            user: 0,
            computer: 0,
            application: 0,
            connection: 1,
            event: 0,
            severity: "I".to_string(),
            comment: String::new(),
            metadata: 0,
            data: "{\"U\"}".to_string(),
            data_presentation: String::new(),
            server: 0,
            main_port: 0,
            add_port: 0,
            session: 1,
        }
    }

    pub fn user(mut self, index: u32) -> Self {
        self.user = index;
        self
    }

    pub fn event(mut self, index: u32) -> Self {
        self.event = index;
        self
    }

    pub fn comment(mut self, comment: &str) -> Self {
        self.comment = comment.to_string();
        self
    }

    pub fn data(mut self, data: &str) -> Self {
        self.data = data.to_string();
        self
    }

    pub fn session(mut self, session: u64) -> Self {
        self.session = session;
        self
    }

    /// Entry text as written by the platform, spread over several lines
    pub fn render(&self) -> String {
        format!(
            "{{{},{},\r\n{{{},{}}},{},{},{},{},{},{},{},{},\r\n{},{},{},{},{},{}\r\n}},\r\n",
            self.timestamp,
            self.transaction_status,
            self.transaction.0,
            self.transaction.1,
            self.user,
            self.computer,
            self.application,
            self.connection,
            self.event,
            self.severity,
            quote(&self.comment),
            self.metadata,
            self.data,
            quote(&self.data_presentation),
            self.server,
            self.main_port,
            self.add_port,
            self.session,
        )
    }
}
