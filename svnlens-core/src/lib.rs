//! SvnLens Core Library
//!
//! Read-side query and diff layer over a Subversion-style revision store:
//! - Object model (snapshots, node records, changed paths)
//! - Repository engines (disk-persistent with SQLite index, in-memory)
//! - Engine transactions for producing history
//! - Unified-diff formatting
//! - Query surface: revisions, path history, trees, content, properties,
//!   diffs and changesets

pub mod config;
pub mod diff;
pub mod engine;
pub mod error;
pub mod object;
pub mod path;
pub mod properties;
pub mod repo;

pub use config::QueryConfig;
pub use engine::{DiskEngine, MemoryEngine, RepositoryEngine, Transaction};
pub use error::{Error, Result};
pub use object::{ChangeAction, CopySource, NodeKind, ObjectId, Revnum};
pub use properties::{PropertySet, svn_props};
pub use repo::{ChangedPath, Changeset, Commit, ContentStream, Entry, Repository};
