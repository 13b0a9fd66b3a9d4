//! Incremental node stream over a growing file
//!
//! Reads the file in chunks into a `BytesMut` buffer and hands out complete
//! nodes. The reported position is always the byte offset right after the
//! last consumed node, so it can be stored and passed back to `seek`.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use bytes::{Buf, BytesMut};
use evlog_protocol::{Node, has_partial_node, next_node};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::{Result, SourceError};

/// Bytes requested from the file per read
const READ_CHUNK: usize = 64 * 1024;

pub(crate) struct NodeStream {
    path: PathBuf,
    file: File,
    buf: BytesMut,
    /// File offset of `buf[0]`
    position: u64,
}

impl NodeStream {
    pub(crate) async fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .await
            .map_err(|e| SourceError::io(path, e))?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            buf: BytesMut::with_capacity(READ_CHUNK),
            position: 0,
        })
    }

    #[inline]
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Offset right after the last consumed node
    #[inline]
    pub(crate) fn position(&self) -> u64 {
        self.position
    }

    /// True if buffered bytes hold the start of an unfinished node
    #[inline]
    pub(crate) fn has_partial(&self) -> bool {
        has_partial_node(&self.buf)
    }

    /// Continue reading from `offset`, dropping anything buffered
    pub(crate) async fn seek(&mut self, offset: u64) -> Result<()> {
        self.file
            .seek(SeekFrom::Start(offset))
            .await
            .map_err(|e| SourceError::io(&self.path, e))?;
        self.buf.clear();
        self.position = offset;
        Ok(())
    }

    /// Next complete node, or `None` once the file has no complete node left
    ///
    /// A partial node stays buffered and is completed by later calls once the
    /// writer appends the rest.
    pub(crate) async fn next_node(&mut self) -> Result<Option<Node>> {
        loop {
            let decoded = next_node(&self.buf).map_err(|e| SourceError::format(&self.path, e))?;
            if let Some((node, consumed)) = decoded {
                self.buf.advance(consumed);
                self.position += consumed as u64;
                return Ok(Some(node));
            }

            self.buf.reserve(READ_CHUNK);
            let read = self
                .file
                .read_buf(&mut self.buf)
                .await
                .map_err(|e| SourceError::io(&self.path, e))?;
            if read == 0 {
                return Ok(None);
            }
        }
    }
}
