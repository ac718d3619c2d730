//! Path history queries

use tracing::debug;

use super::{Commit, Repository};
use crate::error::{Error, Result};
use crate::object::{ChangeAction, PathChange, Revnum};
use crate::path;

/// Deepest add or copy among `changes` that covers `p` (the path itself or
/// an ancestor directory)
pub(crate) fn origin_of<'a>(changes: &'a [PathChange], p: &str) -> Option<&'a PathChange> {
    changes
        .iter()
        .filter(|c| matches!(c.action, ChangeAction::Add | ChangeAction::Copy))
        .filter(|c| path::is_same_or_descendant(p, &c.path))
        .max_by_key(|c| c.path.len())
}

/// Where `p` came from when `origin` is a copy covering it
pub(crate) fn copy_source_of(origin: &PathChange, p: &str) -> Option<(String, Revnum)> {
    let source = origin.copy_from.as_ref()?;
    let rest = path::strip_ancestor(p, &origin.path);
    Some((path::join(&source.path, rest), source.rev))
}

/// Whether a commit with `changes` touched `p`
fn touches(changes: &[PathChange], p: &str) -> bool {
    changes.iter().any(|c| {
        path::is_same_or_descendant(&c.path, p)
            || (path::is_strict_ancestor(&c.path, p) && c.action != ChangeAction::Modify)
    })
}

impl Repository {
    /// Greatest revision `<= bound` in which `path` (or anything below it)
    /// changed
    pub fn last_path_rev(&self, path: &str, bound: Revnum) -> Result<Revnum> {
        let p = path::normalize(path);
        debug!(path = %p, bound, "last_path_rev");
        Ok(self.node(&p, bound)?.created_rev)
    }

    /// Commits in `from..=to` that touched `path`, ascending, following
    /// copies backward; at most `limit` entries (0 = unbounded), oldest kept
    pub fn history(
        &self,
        path: &str,
        from: Revnum,
        to: Revnum,
        limit: usize,
    ) -> Result<Vec<Commit>> {
        if from > to {
            return Err(Error::InvalidRange { start: from, end: to });
        }
        self.check_rev(to)?;
        let p = path::normalize(path);
        debug!(path = %p, from, to, limit, "history");

        let mut start = None;
        for rev in (from..=to).rev() {
            if self.snapshot(rev)?.contains(&p) {
                start = Some(rev);
                break;
            }
        }
        let mut rev = start.ok_or_else(|| Error::path_not_found(&p, to))?;

        let engine = self.engine()?;
        let mut current = p;
        let mut revs = Vec::new();
        while rev >= from && rev > 0 {
            let changes = engine.changed_paths(rev)?;
            if touches(&changes, &current) {
                revs.push(rev);
            }
            match origin_of(&changes, &current) {
                Some(origin) if origin.action == ChangeAction::Copy => {
                    match copy_source_of(origin, &current) {
                        Some((source, source_rev)) => {
                            debug!(
                                from = %current,
                                to = %source,
                                rev = source_rev,
                                "following copy"
                            );
                            current = source;
                            rev = source_rev;
                        }
                        None => break,
                    }
                }
                Some(_) => break,
                None => rev -= 1,
            }
        }

        revs.reverse();
        if limit > 0 {
            revs.truncate(limit);
        }
        revs.into_iter().map(|r| self.commit_info(r)).collect()
    }
}
