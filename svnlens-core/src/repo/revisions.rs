//! Revision metadata queries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Repository;
use crate::error::{Error, Result};
use crate::object::{RevisionRecord, Revnum};

/// Commit metadata of one revision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub revision: Revnum,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub log: String,
}

impl From<RevisionRecord> for Commit {
    fn from(record: RevisionRecord) -> Self {
        Self {
            revision: record.rev,
            author: record.author,
            timestamp: DateTime::from_timestamp(record.timestamp, 0).unwrap_or_default(),
            log: record.log,
        }
    }
}

impl Repository {
    /// Highest committed revision
    pub fn latest_revision(&self) -> Result<Revnum> {
        Ok(self.engine()?.youngest()?)
    }

    /// Commit metadata of `rev`
    pub fn commit_info(&self, rev: Revnum) -> Result<Commit> {
        let youngest = self.check_rev(rev)?;
        debug!(rev, "commit_info");
        self.engine()?
            .revision(rev)?
            .map(Commit::from)
            .ok_or(Error::RevisionNotFound { rev, youngest })
    }

    /// Commits of `from..=to`, ascending
    pub fn commits(&self, from: Revnum, to: Revnum) -> Result<Vec<Commit>> {
        if from > to {
            return Err(Error::InvalidRange { start: from, end: to });
        }
        self.check_rev(to)?;
        debug!(from, to, "commits");
        (from..=to).map(|rev| self.commit_info(rev)).collect()
    }
}
