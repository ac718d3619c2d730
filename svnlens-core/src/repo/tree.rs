//! Directory listings

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Repository;
use crate::error::{Error, Result};
use crate::object::{NodeKind, Revnum};
use crate::path;

/// One child of a directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,
    pub kind: NodeKind,
    /// Byte length for files, 0 for directories
    pub size: u64,
    /// Last revision that changed this entry or anything below it
    pub created_rev: Revnum,
}

impl Repository {
    /// Immediate children of the directory `path` at `rev`, sorted by name
    pub fn tree(&self, path: &str, rev: Revnum) -> Result<Vec<Entry>> {
        let p = path::normalize(path);
        debug!(path = %p, rev, "tree");
        let snapshot = self.snapshot(rev)?;
        match snapshot.get(&p) {
            None => return Err(Error::path_not_found(&p, rev)),
            Some(node) if !node.is_dir() => return Err(Error::NotADirectory { path: p, rev }),
            Some(_) => {}
        }

        Ok(snapshot
            .children(&p)
            .map(|(name, node)| Entry {
                name: name.to_string(),
                kind: node.kind,
                size: node.size,
                created_rev: node.created_rev,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{MemoryEngine, RepositoryEngine};
    use crate::QueryConfig;

    #[test]
    fn test_tree_lists_depth_one() {
        let mut engine = MemoryEngine::new();
        let mut txn = engine.begin_txn("u", "layout").unwrap();
        txn.mkdir("trunk").unwrap();
        txn.mkdir("trunk/src").unwrap();
        txn.add_file("trunk/src/main.go", "package main\n").unwrap();
        txn.add_file("trunk/README", "hi\n").unwrap();
        txn.commit().unwrap();
        let repo = Repository::from_engine(engine, QueryConfig::default());

        let entries = repo.tree("/trunk/", 1).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "README");
        assert_eq!(entries[0].kind, NodeKind::File);
        assert_eq!(entries[0].size, 3);
        assert_eq!(entries[1].name, "src");
        assert_eq!(entries[1].kind, NodeKind::Directory);

        assert_eq!(repo.tree("", 1).unwrap().len(), 1);
        assert!(repo.tree("", 0).unwrap().is_empty());
        assert!(matches!(repo.tree("trunk/README", 1), Err(Error::NotADirectory { .. })));
        assert!(matches!(repo.tree("trunk", 0), Err(Error::PathNotFound { .. })));
    }
}
