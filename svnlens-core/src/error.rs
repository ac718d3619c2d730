//! Error model for repository queries
//!
//! Engines report opaque faults through `anyhow` and absent values through
//! `Option`; the query layer turns those into the typed variants below, always
//! carrying the path and revision involved.

use crate::object::Revnum;
use std::path::PathBuf;

/// Result type for repository operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while opening or querying a repository
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Cannot open repository at {location:?}: {source}")]
    Open {
        location: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Cannot create repository at {location:?}: {reason}")]
    Create { location: PathBuf, reason: String },

    #[error("Repository handle is closed")]
    Closed,

    #[error("No such revision {rev} (youngest is {youngest})")]
    RevisionNotFound { rev: Revnum, youngest: Revnum },

    #[error("Path not found: '{path}' at r{rev}")]
    PathNotFound { path: String, rev: Revnum },

    #[error("Not a directory: '{path}' at r{rev}")]
    NotADirectory { path: String, rev: Revnum },

    #[error("Not a file: '{path}' at r{rev}")]
    NotAFile { path: String, rev: Revnum },

    #[error("Property '{key}' not set on '{path}' at r{rev}")]
    PropertyNotFound { path: String, rev: Revnum, key: String },

    #[error("Invalid revision range r{start}:r{end}")]
    InvalidRange { start: Revnum, end: Revnum },

    #[error("Engine error: {0:#}")]
    Engine(#[from] anyhow::Error),
}

impl Error {
    pub(crate) fn path_not_found(path: &str, rev: Revnum) -> Self {
        Error::PathNotFound {
            path: path.to_string(),
            rev,
        }
    }

    /// True for failures caused by the caller's arguments rather than the store
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::RevisionNotFound { .. }
                | Error::PathNotFound { .. }
                | Error::PropertyNotFound { .. }
        )
    }
}
