//! Repository engine abstraction
//!
//! The engine is the storage collaborator underneath the query layer. It
//! exposes a small primitive set: youngest revision, revision metadata,
//! the tree snapshot of a revision, streamed blob contents, property sets and
//! the changed-path list of a revision. Writes go through [`Transaction`].
//!
//! Engines report faults with `anyhow` and absence with `Option`; they never
//! decide which user-facing error applies.

pub mod disk;
pub mod memory;
pub mod runtime;
pub mod txn;

pub use disk::DiskEngine;
pub use memory::MemoryEngine;
pub use runtime::RuntimeGuard;
pub use txn::Transaction;

use anyhow::Result;
use std::io::Read;

use crate::object::{ObjectId, PathChange, RevisionRecord, Revnum, Snapshot};
use crate::properties::PropertySet;

/// Single-pass reader over stored file bytes
pub type BlobReader = Box<dyn Read + Send>;

/// Everything a transaction hands to the engine on commit
#[derive(Debug, Clone)]
pub struct NewRevision {
    /// Revision the transaction was based on; must still be the youngest
    pub base_rev: Revnum,
    pub author: String,
    pub timestamp: i64,
    pub log: String,
    pub snapshot: Snapshot,
    pub changes: Vec<PathChange>,
}

/// Primitive operations every repository engine provides
pub trait RepositoryEngine: Send {
    /// Repository UUID
    fn uuid(&self) -> &str;

    /// Highest committed revision
    fn youngest(&self) -> Result<Revnum>;

    /// Commit metadata of a revision, `None` past the youngest revision
    fn revision(&self, rev: Revnum) -> Result<Option<RevisionRecord>>;

    /// Tree snapshot of a revision, `None` past the youngest revision
    fn root(&self, rev: Revnum) -> Result<Option<Snapshot>>;

    /// Open a fresh reader over a content blob
    fn open_blob(&self, id: &ObjectId) -> Result<BlobReader>;

    /// Load a property set object
    fn read_props(&self, id: &ObjectId) -> Result<PropertySet>;

    /// Changed-path records of a revision, ordered by path
    fn changed_paths(&self, rev: Revnum) -> Result<Vec<PathChange>>;

    /// Store file contents, returning their id
    fn write_blob(&mut self, data: &[u8]) -> Result<ObjectId>;

    /// Store a property set, returning its id
    fn write_props(&mut self, props: &PropertySet) -> Result<ObjectId>;

    /// Persist a new revision; returns its number
    fn commit_revision(&mut self, revision: NewRevision) -> Result<Revnum>;

    /// Read a whole blob into memory
    fn read_blob(&self, id: &ObjectId) -> Result<Vec<u8>> {
        let mut reader = self.open_blob(id)?;
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Start a transaction against the youngest revision
    fn begin_txn(&mut self, author: &str, log: &str) -> Result<Transaction<'_>>
    where
        Self: Sized,
    {
        Transaction::begin(self, author, log)
    }
}
