//! In-memory engine
//!
//! Keeps every object and revision in process memory. Useful for tests and
//! for scratch repositories that never touch disk.

use anyhow::{Result, anyhow, bail};
use bytes::Bytes;
use std::collections::HashMap;
use std::io::Cursor;

use super::{BlobReader, NewRevision, RepositoryEngine};
use crate::object::{ObjectId, PathChange, RevisionRecord, Revnum, Snapshot};
use crate::properties::PropertySet;

/// In-memory repository engine
pub struct MemoryEngine {
    /// Object storage
    objects: HashMap<ObjectId, Bytes>,

    /// Revision records, indexed by revision number
    revisions: Vec<RevisionRecord>,

    /// Changed paths per revision
    changes: HashMap<Revnum, Vec<PathChange>>,

    /// Repository UUID
    uuid: String,
}

impl MemoryEngine {
    /// Create an engine holding only the empty revision 0
    pub fn new() -> Self {
        let mut engine = Self {
            objects: HashMap::new(),
            revisions: Vec::new(),
            changes: HashMap::new(),
            uuid: uuid::Uuid::new_v4().to_string(),
        };
        let tree = Snapshot::empty(0);
        let root = engine.put(Bytes::from(tree.to_bytes().unwrap_or_default()));
        engine.revisions.push(RevisionRecord {
            rev: 0,
            author: String::new(),
            timestamp: chrono::Utc::now().timestamp(),
            log: String::new(),
            root,
        });
        engine
    }

    fn put(&mut self, data: Bytes) -> ObjectId {
        let id = ObjectId::from_data(&data);
        self.objects.entry(id).or_insert(data);
        id
    }

    fn get(&self, id: &ObjectId) -> Result<&Bytes> {
        self.objects
            .get(id)
            .ok_or_else(|| anyhow!("Object {} not found", id))
    }
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RepositoryEngine for MemoryEngine {
    fn uuid(&self) -> &str {
        &self.uuid
    }

    fn youngest(&self) -> Result<Revnum> {
        Ok(self.revisions.len() as Revnum - 1)
    }

    fn revision(&self, rev: Revnum) -> Result<Option<RevisionRecord>> {
        Ok(self.revisions.get(rev as usize).cloned())
    }

    fn root(&self, rev: Revnum) -> Result<Option<Snapshot>> {
        match self.revisions.get(rev as usize) {
            Some(record) => Ok(Some(Snapshot::from_bytes(self.get(&record.root)?)?)),
            None => Ok(None),
        }
    }

    fn open_blob(&self, id: &ObjectId) -> Result<BlobReader> {
        // Bytes clones share the buffer
        Ok(Box::new(Cursor::new(self.get(id)?.clone())))
    }

    fn read_props(&self, id: &ObjectId) -> Result<PropertySet> {
        Ok(PropertySet::from_bytes(self.get(id)?)?)
    }

    fn changed_paths(&self, rev: Revnum) -> Result<Vec<PathChange>> {
        Ok(self.changes.get(&rev).cloned().unwrap_or_default())
    }

    fn write_blob(&mut self, data: &[u8]) -> Result<ObjectId> {
        Ok(self.put(Bytes::copy_from_slice(data)))
    }

    fn write_props(&mut self, props: &PropertySet) -> Result<ObjectId> {
        Ok(self.put(Bytes::from(props.to_bytes()?)))
    }

    fn commit_revision(&mut self, revision: NewRevision) -> Result<Revnum> {
        let youngest = self.youngest()?;
        if revision.base_rev != youngest {
            bail!(
                "Transaction based on r{} is out of date (youngest is r{})",
                revision.base_rev,
                youngest
            );
        }
        let rev = youngest + 1;
        let root = self.put(Bytes::from(revision.snapshot.to_bytes()?));
        self.revisions.push(RevisionRecord {
            rev,
            author: revision.author,
            timestamp: revision.timestamp,
            log: revision.log,
            root,
        });
        self.changes.insert(rev, revision.changes);
        Ok(rev)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_memory_engine_starts_at_zero() {
        let engine = MemoryEngine::new();
        assert_eq!(engine.youngest().unwrap(), 0);
        assert_eq!(engine.uuid().len(), 36);
        let r0 = engine.revision(0).unwrap().unwrap();
        assert!(r0.author.is_empty());
        assert!(engine.revision(1).unwrap().is_none());
        assert!(engine.root(0).unwrap().unwrap().contains(""));
    }

    #[test]
    fn test_blob_streams_are_fresh() {
        let mut engine = MemoryEngine::new();
        let id = engine.write_blob(b"Hello, World!").unwrap();

        let mut first = String::new();
        engine.open_blob(&id).unwrap().read_to_string(&mut first).unwrap();
        let second = engine.read_blob(&id).unwrap();
        assert_eq!(first.as_bytes(), second.as_slice());
    }

    #[test]
    fn test_stale_transaction_is_rejected() {
        let mut engine = MemoryEngine::new();
        let stale = NewRevision {
            base_rev: 5,
            author: "bob".into(),
            timestamp: 0,
            log: String::new(),
            snapshot: Snapshot::empty(6),
            changes: Vec::new(),
        };
        assert!(engine.commit_revision(stale).is_err());
        assert_eq!(engine.youngest().unwrap(), 0);
    }
}
