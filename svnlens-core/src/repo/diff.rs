//! Per-path unified diffs

use tracing::{debug, warn};

use super::Repository;
use super::history::{copy_source_of, origin_of};
use crate::diff::{header, is_binary, unified_diff};
use crate::error::{Error, Result};
use crate::object::{ChangeAction, NodeRecord, Revnum};
use crate::path;
use crate::properties::svn_props;

/// Rendered diff of one path plus whether either side was binary
pub(crate) struct PathDiff {
    pub text: String,
    pub binary: bool,
}

impl Repository {
    /// Unified diff of `path` between its previous state and `rev`
    ///
    /// The old side is the copy source when `path` was copied at `rev`,
    /// nothing when it was added at `rev`, and `rev - 1` otherwise.
    /// Binary content yields the header lines only.
    pub fn diff(&self, path: &str, rev: Revnum) -> Result<String> {
        let p = path::normalize(path);
        debug!(path = %p, rev, "diff");
        let diff = self.path_diff(&p, rev)?;
        if diff.binary {
            warn!(path = %p, rev, "Binary content, diff reduced to header");
        }
        Ok(diff.text)
    }

    pub(crate) fn path_diff(&self, p: &str, rev: Revnum) -> Result<PathDiff> {
        let youngest = self.check_rev(rev)?;
        if rev == 0 {
            return Err(Error::RevisionNotFound { rev, youngest });
        }

        let changes = self.engine()?.changed_paths(rev)?;
        let (old_rev, old_node, new_node) = match self.snapshot(rev)?.get(p).cloned() {
            Some(node) => match origin_of(&changes, p) {
                Some(origin) if origin.action == ChangeAction::Copy => {
                    match copy_source_of(origin, p) {
                        Some((source, source_rev)) => {
                            let old = self.snapshot(source_rev)?.get(&source).cloned();
                            (source_rev, old, Some(node))
                        }
                        None => (0, None, Some(node)),
                    }
                }
                Some(_) => (0, None, Some(node)),
                None => (rev - 1, self.snapshot(rev - 1)?.get(p).cloned(), Some(node)),
            },
            None => {
                let old = self
                    .snapshot(rev - 1)?
                    .get(p)
                    .cloned()
                    .ok_or_else(|| Error::path_not_found(p, rev))?;
                (rev - 1, Some(old), None)
            }
        };

        if old_node.iter().chain(new_node.iter()).any(NodeRecord::is_dir) {
            return Err(Error::NotAFile {
                path: p.to_string(),
                rev,
            });
        }

        let old = match &old_node {
            Some(node) => self.node_content(node)?,
            None => Vec::new(),
        };
        let new = match &new_node {
            Some(node) => self.node_content(node)?,
            None => Vec::new(),
        };
        if old == new {
            return Ok(PathDiff {
                text: String::new(),
                binary: false,
            });
        }

        let binary = self.is_binary_side(old_node.as_ref(), &old)?
            || self.is_binary_side(new_node.as_ref(), &new)?;
        let text = if binary {
            header(p, old_rev, rev)
        } else {
            unified_diff(p, old_rev, &old, rev, &new, self.config.diff_context)
        };
        Ok(PathDiff { text, binary })
    }

    fn is_binary_side(&self, node: Option<&NodeRecord>, data: &[u8]) -> Result<bool> {
        if let Some(node) = node {
            let props = self.node_props(node)?;
            if props
                .get(svn_props::MIME_TYPE)
                .is_some_and(|mime| svn_props::is_binary_mime_type(mime))
            {
                return Ok(true);
            }
        }
        Ok(is_binary(data, self.config.binary_sniff_len))
    }
}
