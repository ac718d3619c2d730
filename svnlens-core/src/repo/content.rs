//! File content queries

use std::io::{self, Read};
use tracing::debug;

use super::Repository;
use crate::engine::BlobReader;
use crate::error::{Error, Result};
use crate::object::{NodeRecord, Revnum};
use crate::path;
use crate::properties::svn_props;

/// Single-pass reader over the bytes of one file at one revision
///
/// Reading again requires a new [`Repository::file_content`] call. The
/// underlying engine reader is released by [`ContentStream::close`] or drop.
pub struct ContentStream {
    reader: Option<BlobReader>,
    size: u64,
}

impl ContentStream {
    /// Total byte length of the file
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Release the reader; later reads return end of stream
    pub fn close(&mut self) {
        self.reader = None;
    }
}

impl Read for ContentStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.reader.as_mut() {
            Some(reader) => reader.read(buf),
            None => Ok(0),
        }
    }
}

impl std::fmt::Debug for ContentStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentStream")
            .field("size", &self.size)
            .field("open", &self.reader.is_some())
            .finish()
    }
}

impl Repository {
    fn file_node(&self, p: &str, rev: Revnum) -> Result<NodeRecord> {
        let node = self.node(p, rev)?;
        if !node.is_file() {
            return Err(Error::NotAFile {
                path: p.to_string(),
                rev,
            });
        }
        Ok(node)
    }

    /// Byte length of the file `path` at `rev`
    pub fn file_size(&self, path: &str, rev: Revnum) -> Result<u64> {
        let p = path::normalize(path);
        debug!(path = %p, rev, "file_size");
        Ok(self.file_node(&p, rev)?.size)
    }

    /// `svn:mime-type` of `path` at `rev`, or the configured default
    pub fn mime_type(&self, path: &str, rev: Revnum) -> Result<String> {
        let p = path::normalize(path);
        debug!(path = %p, rev, "mime_type");
        let node = self.node(&p, rev)?;
        let props = self.node_props(&node)?;
        Ok(props
            .get(svn_props::MIME_TYPE)
            .cloned()
            .unwrap_or_else(|| self.config.default_mime_type.clone()))
    }

    /// Stream the stored bytes of the file `path` at `rev`, untransformed
    pub fn file_content(&self, path: &str, rev: Revnum) -> Result<ContentStream> {
        let p = path::normalize(path);
        debug!(path = %p, rev, "file_content");
        let node = self.file_node(&p, rev)?;
        let reader: BlobReader = match node.content {
            Some(id) => self.engine()?.open_blob(&id)?,
            None => Box::new(io::empty()),
        };
        Ok(ContentStream {
            reader: Some(reader),
            size: node.size,
        })
    }
}
