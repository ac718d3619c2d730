//! Changesets: commit metadata plus every changed path

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use super::{Commit, Repository};
use crate::error::Result;
use crate::object::{ChangeAction, CopySource, NodeKind, PathChange, Revnum};

/// One path changed by a revision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedPath {
    pub path: String,
    pub change_kind: ChangeAction,
    pub node_kind: NodeKind,
    pub copy_from: Option<CopySource>,
    /// Unified diff; empty when suppressed, binary, deleted or unchanged text
    pub diff: String,
}

/// Everything a revision changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changeset {
    pub commit: Commit,
    pub changed_paths: BTreeMap<String, ChangedPath>,
}

impl Changeset {
    /// Paths with their single-letter action codes, as `svn log -v` prints them
    pub fn summary(&self) -> impl Iterator<Item = (char, &ChangedPath)> {
        self.changed_paths.values().map(|c| (c.change_kind.code(), c))
    }
}

fn wants_diff(change: &PathChange) -> bool {
    change.node_kind == NodeKind::File && change.action != ChangeAction::Delete && change.text_mod
}

impl Repository {
    /// Commit of `rev` and its changed paths, with diffs unless `suppress_diff`
    pub fn changeset(&self, rev: Revnum, suppress_diff: bool) -> Result<Changeset> {
        let commit = self.commit_info(rev)?;
        debug!(rev, suppress_diff, "changeset");

        let mut changed_paths = BTreeMap::new();
        for change in self.engine()?.changed_paths(rev)? {
            let diff = if !suppress_diff && wants_diff(&change) {
                let diff = self.path_diff(&change.path, rev)?;
                if diff.binary { String::new() } else { diff.text }
            } else {
                String::new()
            };
            changed_paths.insert(
                change.path.clone(),
                ChangedPath {
                    path: change.path,
                    change_kind: change.action,
                    node_kind: change.node_kind,
                    copy_from: change.copy_from,
                    diff,
                },
            );
        }

        Ok(Changeset {
            commit,
            changed_paths,
        })
    }
}
