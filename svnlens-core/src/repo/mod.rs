//! Repository query surface
//!
//! [`Repository`] owns one engine connection and answers read-only questions
//! about committed history. The query groups live in sibling modules as
//! further `impl Repository` blocks:
//! - `revisions`: latest revision and commit metadata
//! - `history`: last changing revision of a path, bounded path history
//! - `tree`: directory listings
//! - `content`: file size, MIME type, streamed file bytes
//! - `props`: versioned properties
//! - `diff`: unified diff of one path at one revision
//! - `changeset`: commit metadata plus every changed path

mod changeset;
mod content;
mod diff;
mod history;
mod props;
mod revisions;
mod tree;

pub use changeset::{ChangedPath, Changeset};
pub use content::ContentStream;
pub use revisions::Commit;
pub use tree::Entry;

use anyhow::anyhow;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::QueryConfig;
use crate::engine::{DiskEngine, MemoryEngine, RepositoryEngine, RuntimeGuard};
use crate::error::{Error, Result};
use crate::object::{NodeRecord, Revnum, Snapshot};
use crate::properties::PropertySet;

/// Handle on one repository
///
/// Lifecycle is open -> closed. Every query on a closed handle fails with
/// [`Error::Closed`]. A handle serves one caller at a time; concurrent
/// readers open their own handles.
pub struct Repository {
    location: Option<PathBuf>,
    engine: Option<Box<dyn RepositoryEngine>>,
    config: QueryConfig,
    runtime: Option<RuntimeGuard>,
}

impl Repository {
    /// Open an existing on-disk repository
    pub fn open(location: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(location, QueryConfig::default())
    }

    /// Open an existing on-disk repository with custom query settings
    pub fn open_with_config(location: impl AsRef<Path>, config: QueryConfig) -> Result<Self> {
        let location = location.as_ref().to_path_buf();
        let runtime = RuntimeGuard::acquire();
        let engine = DiskEngine::open(&location).map_err(|source| Error::Open {
            location: location.clone(),
            source,
        })?;
        info!("Opened repository at {:?} (UUID: {})", location, engine.uuid());
        Ok(Self {
            location: Some(location),
            engine: Some(Box::new(engine)),
            config,
            runtime: Some(runtime),
        })
    }

    /// Create a new on-disk repository holding only revision 0
    pub fn create(location: impl AsRef<Path>) -> Result<Self> {
        let location = location.as_ref().to_path_buf();
        let runtime = RuntimeGuard::acquire();
        let engine = DiskEngine::create(&location).map_err(|e| Error::Create {
            location: location.clone(),
            reason: format!("{:#}", e),
        })?;
        Ok(Self {
            location: Some(location),
            engine: Some(Box::new(engine)),
            config: QueryConfig::default(),
            runtime: Some(runtime),
        })
    }

    /// Wrap an already-open engine
    pub fn from_engine(engine: impl RepositoryEngine + 'static, config: QueryConfig) -> Self {
        Self {
            location: None,
            engine: Some(Box::new(engine)),
            config,
            runtime: Some(RuntimeGuard::acquire()),
        }
    }

    /// Fresh in-memory repository holding only revision 0
    pub fn in_memory() -> Self {
        Self::from_engine(MemoryEngine::new(), QueryConfig::default())
    }

    /// Release the engine connection; fails with `Closed` when already closed
    pub fn close(&mut self) -> Result<()> {
        self.engine.take().ok_or(Error::Closed)?;
        self.runtime = None;
        info!("Closed repository {:?}", self.location);
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.engine.is_some()
    }

    /// On-disk location, `None` for in-memory repositories
    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Repository UUID
    pub fn uuid(&self) -> Result<String> {
        Ok(self.engine()?.uuid().to_string())
    }

    /// Engine of an open handle
    pub(crate) fn engine(&self) -> Result<&dyn RepositoryEngine> {
        self.engine.as_deref().ok_or(Error::Closed)
    }

    /// Youngest revision, failing when `rev` lies beyond it
    pub(crate) fn check_rev(&self, rev: Revnum) -> Result<Revnum> {
        let youngest = self.engine()?.youngest()?;
        if rev > youngest {
            return Err(Error::RevisionNotFound { rev, youngest });
        }
        Ok(youngest)
    }

    /// Tree snapshot of a committed revision
    pub(crate) fn snapshot(&self, rev: Revnum) -> Result<Snapshot> {
        self.check_rev(rev)?;
        let snapshot = self
            .engine()?
            .root(rev)?
            .ok_or_else(|| anyhow!("Snapshot for r{} is missing", rev))?;
        Ok(snapshot)
    }

    /// Node at `path` in revision `rev`
    pub(crate) fn node(&self, path: &str, rev: Revnum) -> Result<NodeRecord> {
        self.snapshot(rev)?
            .get(path)
            .cloned()
            .ok_or_else(|| Error::path_not_found(path, rev))
    }

    pub(crate) fn node_props(&self, node: &NodeRecord) -> Result<PropertySet> {
        match node.props {
            Some(id) => Ok(self.engine()?.read_props(&id)?),
            None => Ok(PropertySet::new()),
        }
    }

    /// Whole contents of a file node
    pub(crate) fn node_content(&self, node: &NodeRecord) -> Result<Vec<u8>> {
        match node.content {
            Some(id) => Ok(self.engine()?.read_blob(&id)?),
            None => Ok(Vec::new()),
        }
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("location", &self.location)
            .field("open", &self.is_open())
            .field("config", &self.config)
            .finish()
    }
}
