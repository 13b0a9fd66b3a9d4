//! Reference resolver
//!
//! The reference file maps `(category, index)` pairs used by data records to
//! user names, computers, event codes and so on. It only ever grows, so the
//! resolver reads it forward, caching every entry it passes, and only reads
//! further when a lookup misses the cache.
//!
//! # Entry shapes
//!
//! ```text
//! {1,a1b2c3d4-...,"Alice",7},      uuid-bearing (Users, Metadata)
//! {2,"WS-042",3},                  plain
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use evlog_protocol::Node;
use tracing::debug;

use crate::stream::NodeStream;
use crate::{Result, SourceError};

/// Reference table category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Category {
    Users = 1,
    Computers = 2,
    Applications = 3,
    Events = 4,
    Metadata = 5,
    Servers = 6,
    MainPorts = 7,
    AddPorts = 8,
}

impl Category {
    /// Category for a stored code; 0 and codes from 9 up are not tracked
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Users),
            2 => Some(Self::Computers),
            3 => Some(Self::Applications),
            4 => Some(Self::Events),
            5 => Some(Self::Metadata),
            6 => Some(Self::Servers),
            7 => Some(Self::MainPorts),
            8 => Some(Self::AddPorts),
            _ => None,
        }
    }

    /// True for categories whose entries carry a uuid
    #[inline]
    pub fn has_uuid(self) -> bool {
        matches!(self, Self::Users | Self::Metadata)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Users => "users",
            Self::Computers => "computers",
            Self::Applications => "applications",
            Self::Events => "events",
            Self::Metadata => "metadata",
            Self::Servers => "servers",
            Self::MainPorts => "main_ports",
            Self::AddPorts => "add_ports",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default)]
struct Entry {
    value: String,
    uuid: String,
}

/// Forward-only, lazily opened reader of the reference file
///
/// Owned by a single decode task; no internal locking.
pub struct ReferenceResolver {
    path: PathBuf,
    stream: Option<NodeStream>,
    entries: HashMap<(Category, u32), Entry>,
}

impl ReferenceResolver {
    /// Create a resolver for `path`; the file is not touched until needed
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            stream: None,
            entries: HashMap::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Byte offset right after the last entry read
    pub fn position(&self) -> u64 {
        self.stream.as_ref().map_or(0, NodeStream::position)
    }

    /// Plain value for `(category, index)`; index 0 means no value
    pub async fn value(&mut self, category: Category, index: u32) -> Result<String> {
        if index == 0 {
            return Ok(String::new());
        }
        Ok(self.entry(category, index).await?.value.clone())
    }

    /// `(value, uuid)` for `(category, index)`; index 0 means no value
    pub async fn referenced_value(
        &mut self,
        category: Category,
        index: u32,
    ) -> Result<(String, String)> {
        if index == 0 {
            return Ok((String::new(), String::new()));
        }
        let entry = self.entry(category, index).await?;
        Ok((entry.value.clone(), entry.uuid.clone()))
    }

    /// Read entries until the cursor reaches `offset` or the end of the file
    ///
    /// Used to rebuild the cache up to a checkpointed position.
    pub async fn seek(&mut self, offset: u64) -> Result<()> {
        while self.position() < offset {
            if !self.read_entry().await? {
                break;
            }
        }
        debug!(
            path = %self.path.display(),
            target = offset,
            position = self.position(),
            entries = self.entries.len(),
            "reference cache seeded"
        );
        Ok(())
    }

    async fn entry(&mut self, category: Category, index: u32) -> Result<&Entry> {
        let key = (category, index);
        while !self.entries.contains_key(&key) {
            if !self.read_entry().await? {
                return Err(SourceError::ResolverLookup { category, index });
            }
        }
        self.entries
            .get(&key)
            .ok_or(SourceError::ResolverLookup { category, index })
    }

    /// Read and cache one node; false at end of file
    async fn read_entry(&mut self) -> Result<bool> {
        let stream = match self.stream {
            Some(ref mut stream) => stream,
            None => {
                if !tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
                    return Err(SourceError::ReferenceMissing(self.path.clone()));
                }
                self.stream.insert(NodeStream::open(&self.path).await?)
            }
        };

        let Some(node) = stream.next_node().await? else {
            return Ok(false);
        };

        if let Some((key, entry)) = parse_entry(&node).map_err(|e| SourceError::format(&self.path, e))? {
            self.entries.insert(key, entry);
        }
        Ok(true)
    }
}

/// Map a reference node to its cache key and entry; untracked categories yield `None`
fn parse_entry(
    node: &Node,
) -> std::result::Result<Option<((Category, u32), Entry)>, evlog_protocol::FormatError> {
    let Some(category) = Category::from_code(node.int_field(0)?) else {
        return Ok(None);
    };

    let (entry, index) = if category.has_uuid() {
        let entry = Entry {
            uuid: node.str_field(1)?.to_string(),
            value: node.str_field(2)?.to_string(),
        };
        (entry, node.int_field(3)?)
    } else {
        let entry = Entry {
            value: node.str_field(1)?.to_string(),
            uuid: String::new(),
        };
        (entry, node.int_field(2)?)
    };

    Ok(Some(((category, index), entry)))
}
