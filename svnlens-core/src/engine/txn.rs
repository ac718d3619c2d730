//! Engine transactions
//!
//! A transaction stages edits against the youngest revision's snapshot and
//! commits them as one new revision. It is the only way history gets written;
//! the query layer never mutates anything.
//!
//! Edits to the same path coalesce into a single changed-path record:
//! copy beats add beats modify, a delete followed by an add reports the add,
//! and an add followed by a delete leaves no record at all.

use anyhow::{Result, anyhow, bail};
use std::collections::{BTreeMap, BTreeSet};

use super::{NewRevision, RepositoryEngine};
use crate::object::{ChangeAction, CopySource, NodeKind, NodeRecord, PathChange, Revnum, Snapshot};
use crate::path;
use crate::properties::PropertySet;

/// Staged edits on top of one base revision
pub struct Transaction<'e> {
    engine: &'e mut dyn RepositoryEngine,
    base_rev: Revnum,
    base: Snapshot,
    tree: Snapshot,
    changes: BTreeMap<String, PathChange>,
    author: String,
    log: String,
    timestamp: i64,
}

impl<'e> Transaction<'e> {
    /// Begin a transaction based on the engine's youngest revision
    pub fn begin(engine: &'e mut dyn RepositoryEngine, author: &str, log: &str) -> Result<Self> {
        let base_rev = engine.youngest()?;
        let base = engine
            .root(base_rev)?
            .ok_or_else(|| anyhow!("Snapshot for youngest revision r{} is missing", base_rev))?;
        Ok(Self {
            engine,
            base_rev,
            tree: base.clone(),
            base,
            changes: BTreeMap::new(),
            author: author.to_string(),
            log: log.to_string(),
            timestamp: chrono::Utc::now().timestamp(),
        })
    }

    /// Override the commit timestamp (Unix seconds)
    pub fn at(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn base_rev(&self) -> Revnum {
        self.base_rev
    }

    fn require_parent_dir(&self, p: &str) -> Result<()> {
        if p.is_empty() {
            bail!("Cannot replace the repository root");
        }
        let parent = path::parent(p);
        match self.tree.get(parent) {
            Some(node) if node.is_dir() => Ok(()),
            Some(_) => bail!("Parent of '{}' is not a directory", p),
            None => bail!("Parent directory of '{}' does not exist", p),
        }
    }

    /// Add a file, or replace the contents of an existing one
    pub fn add_file(&mut self, file_path: &str, data: impl AsRef<[u8]>) -> Result<()> {
        let p = path::normalize(file_path);
        self.require_parent_dir(&p)?;
        if self.tree.get(&p).is_some_and(NodeRecord::is_dir) {
            bail!("'{}' is a directory", p);
        }
        let data = data.as_ref();
        let size = data.len() as u64;
        let id = self.engine.write_blob(data)?;

        match self.tree.get_mut(&p) {
            Some(node) => {
                if node.content == Some(id) {
                    return Ok(());
                }
                node.content = Some(id);
                node.size = size;
                self.record(&p, ChangeAction::Modify, NodeKind::File, true, false, None);
            }
            None => {
                self.tree.insert(p.clone(), NodeRecord::file(id, size, self.base_rev));
                self.record(&p, ChangeAction::Add, NodeKind::File, true, false, None);
            }
        }
        Ok(())
    }

    /// Create a directory
    pub fn mkdir(&mut self, dir_path: &str) -> Result<()> {
        let p = path::normalize(dir_path);
        self.require_parent_dir(&p)?;
        if self.tree.contains(&p) {
            bail!("'{}' already exists", p);
        }
        self.tree.insert(p.clone(), NodeRecord::directory(self.base_rev));
        self.record(&p, ChangeAction::Add, NodeKind::Directory, false, false, None);
        Ok(())
    }

    /// Delete a node and everything below it
    pub fn delete(&mut self, node_path: &str) -> Result<()> {
        let p = path::normalize(node_path);
        if p.is_empty() {
            bail!("Cannot delete the repository root");
        }
        let node = self
            .tree
            .get(&p)
            .ok_or_else(|| anyhow!("'{}' does not exist", p))?;
        let kind = node.kind;

        self.tree.remove_subtree(&p);
        let below: Vec<String> = self
            .changes
            .keys()
            .filter(|c| path::is_strict_ancestor(&p, c))
            .cloned()
            .collect();
        for c in below {
            self.changes.remove(&c);
        }

        if self.base.contains(&p) {
            self.changes.insert(
                p.clone(),
                PathChange {
                    path: p,
                    action: ChangeAction::Delete,
                    node_kind: kind,
                    text_mod: false,
                    prop_mod: false,
                    copy_from: None,
                },
            );
        } else {
            self.changes.remove(&p);
        }
        Ok(())
    }

    /// Copy a subtree from any committed revision
    pub fn copy(&mut self, from_path: &str, from_rev: Revnum, to_path: &str) -> Result<()> {
        let from = path::normalize(from_path);
        let to = path::normalize(to_path);
        self.require_parent_dir(&to)?;
        if self.tree.contains(&to) {
            bail!("'{}' already exists", to);
        }
        if from_rev > self.base_rev {
            bail!("Copy source revision r{} is newer than r{}", from_rev, self.base_rev);
        }

        let source = self
            .engine
            .root(from_rev)?
            .ok_or_else(|| anyhow!("No snapshot for r{}", from_rev))?;
        let kind = source
            .get(&from)
            .map(|n| n.kind)
            .ok_or_else(|| anyhow!("Copy source '{}' does not exist in r{}", from, from_rev))?;
        if kind == NodeKind::Directory && path::is_same_or_descendant(&to, &from) {
            bail!("Cannot copy '{}' into itself", from);
        }

        for (p, node) in source.subtree(&from) {
            let target = path::join(&to, path::strip_ancestor(p, &from));
            self.tree.insert(target, node.clone());
        }
        self.record(
            &to,
            ChangeAction::Copy,
            kind,
            false,
            false,
            Some(CopySource { path: from, rev: from_rev }),
        );
        Ok(())
    }

    /// Set a versioned property on a node
    pub fn set_prop(&mut self, node_path: &str, key: &str, value: &str) -> Result<()> {
        let p = path::normalize(node_path);
        let mut props = self.props_of(&p)?;
        if props.get(key).map(String::as_str) == Some(value) {
            return Ok(());
        }
        props.set(key.to_string(), value.to_string());
        self.store_props(&p, props)
    }

    /// Remove a versioned property from a node
    pub fn remove_prop(&mut self, node_path: &str, key: &str) -> Result<()> {
        let p = path::normalize(node_path);
        let mut props = self.props_of(&p)?;
        if props.remove(key).is_none() {
            return Ok(());
        }
        self.store_props(&p, props)
    }

    fn props_of(&self, p: &str) -> Result<PropertySet> {
        let node = self
            .tree
            .get(p)
            .ok_or_else(|| anyhow!("'{}' does not exist", p))?;
        match node.props {
            Some(id) => self.engine.read_props(&id),
            None => Ok(PropertySet::new()),
        }
    }

    fn store_props(&mut self, p: &str, props: PropertySet) -> Result<()> {
        let id = if props.is_empty() {
            None
        } else {
            Some(self.engine.write_props(&props)?)
        };
        let node = self
            .tree
            .get_mut(p)
            .ok_or_else(|| anyhow!("'{}' does not exist", p))?;
        node.props = id;
        let kind = node.kind;
        self.record(p, ChangeAction::Modify, kind, false, true, None);
        Ok(())
    }

    fn record(
        &mut self,
        p: &str,
        action: ChangeAction,
        node_kind: NodeKind,
        text_mod: bool,
        prop_mod: bool,
        copy_from: Option<CopySource>,
    ) {
        let fresh = PathChange {
            path: p.to_string(),
            action,
            node_kind,
            text_mod,
            prop_mod,
            copy_from,
        };
        match self.changes.get_mut(p) {
            None => {
                self.changes.insert(p.to_string(), fresh);
            }
            Some(existing) => match (existing.action, action) {
                // delete + add/copy in one transaction is a replacement
                (ChangeAction::Delete, _) => *existing = fresh,
                (_, ChangeAction::Modify) => {
                    existing.text_mod |= text_mod;
                    existing.prop_mod |= prop_mod;
                }
                _ => *existing = fresh,
            },
        }
    }

    /// Paths whose created revision moves to the new revision
    fn touched_paths(&self) -> BTreeSet<String> {
        let mut touched = BTreeSet::new();
        for change in self.changes.values() {
            if change.action == ChangeAction::Copy {
                touched.extend(self.tree.subtree(&change.path).map(|(p, _)| p.to_string()));
            } else if change.action != ChangeAction::Delete {
                touched.insert(change.path.clone());
            }
            touched.extend(path::ancestors(&change.path).map(str::to_string));
        }
        touched
    }

    /// Commit staged edits as a new revision
    pub fn commit(mut self) -> Result<Revnum> {
        let new_rev = self.base_rev + 1;
        for p in self.touched_paths() {
            if let Some(node) = self.tree.get_mut(&p) {
                node.created_rev = new_rev;
            }
        }

        let changes: Vec<PathChange> = std::mem::take(&mut self.changes).into_values().collect();
        let count = changes.len();
        let rev = self.engine.commit_revision(NewRevision {
            base_rev: self.base_rev,
            author: self.author,
            timestamp: self.timestamp,
            log: self.log,
            snapshot: self.tree,
            changes,
        })?;
        tracing::info!(rev, changes = count, "Committed revision");
        Ok(rev)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MemoryEngine;

    fn changes_of(engine: &MemoryEngine, rev: Revnum) -> Vec<(String, ChangeAction)> {
        engine
            .changed_paths(rev)
            .unwrap()
            .into_iter()
            .map(|c| (c.path, c.action))
            .collect()
    }

    #[test]
    fn test_add_and_modify_records() {
        let mut engine = MemoryEngine::new();
        let mut txn = engine.begin_txn("alice", "layout").unwrap();
        txn.mkdir("trunk").unwrap();
        txn.add_file("trunk/a.txt", "one\n").unwrap();
        assert_eq!(txn.commit().unwrap(), 1);

        let mut txn = engine.begin_txn("alice", "edit").unwrap();
        txn.add_file("/trunk/a.txt", "two\n").unwrap();
        assert_eq!(txn.commit().unwrap(), 2);

        assert_eq!(
            changes_of(&engine, 1),
            vec![("trunk".into(), ChangeAction::Add), ("trunk/a.txt".into(), ChangeAction::Add)]
        );
        assert_eq!(changes_of(&engine, 2), vec![("trunk/a.txt".into(), ChangeAction::Modify)]);
    }

    #[test]
    fn test_created_rev_bubbles_to_ancestors_only() {
        let mut engine = MemoryEngine::new();
        let mut txn = engine.begin_txn("alice", "layout").unwrap();
        txn.mkdir("trunk").unwrap();
        txn.add_file("trunk/a.txt", "a").unwrap();
        txn.add_file("trunk/b.txt", "b").unwrap();
        txn.commit().unwrap();

        let mut txn = engine.begin_txn("alice", "edit b").unwrap();
        txn.add_file("trunk/b.txt", "bb").unwrap();
        txn.commit().unwrap();

        let root = engine.root(2).unwrap().unwrap();
        assert_eq!(root.get("").unwrap().created_rev, 2);
        assert_eq!(root.get("trunk").unwrap().created_rev, 2);
        assert_eq!(root.get("trunk/b.txt").unwrap().created_rev, 2);
        assert_eq!(root.get("trunk/a.txt").unwrap().created_rev, 1);
    }

    #[test]
    fn test_identical_content_is_not_a_change() {
        let mut engine = MemoryEngine::new();
        let mut txn = engine.begin_txn("alice", "add").unwrap();
        txn.add_file("a.txt", "same").unwrap();
        txn.commit().unwrap();

        let mut txn = engine.begin_txn("alice", "noop").unwrap();
        txn.add_file("a.txt", "same").unwrap();
        txn.commit().unwrap();
        assert!(changes_of(&engine, 2).is_empty());
    }

    #[test]
    fn test_copy_then_modify_reports_copy() {
        let mut engine = MemoryEngine::new();
        let mut txn = engine.begin_txn("alice", "add").unwrap();
        txn.add_file("a.txt", "v1\n").unwrap();
        txn.commit().unwrap();

        let mut txn = engine.begin_txn("alice", "copy").unwrap();
        txn.copy("a.txt", 1, "b.txt").unwrap();
        txn.add_file("b.txt", "v2\n").unwrap();
        txn.commit().unwrap();

        let changes = engine.changed_paths(2).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].action, ChangeAction::Copy);
        assert!(changes[0].text_mod);
        assert_eq!(
            changes[0].copy_from,
            Some(CopySource { path: "a.txt".into(), rev: 1 })
        );
    }

    #[test]
    fn test_add_then_delete_leaves_no_record() {
        let mut engine = MemoryEngine::new();
        let mut txn = engine.begin_txn("alice", "churn").unwrap();
        txn.mkdir("tmp").unwrap();
        txn.add_file("tmp/x", "x").unwrap();
        txn.delete("tmp").unwrap();
        txn.commit().unwrap();
        assert!(changes_of(&engine, 1).is_empty());
    }

    #[test]
    fn test_delete_then_add_is_replacement() {
        let mut engine = MemoryEngine::new();
        let mut txn = engine.begin_txn("alice", "add").unwrap();
        txn.add_file("a.txt", "old").unwrap();
        txn.commit().unwrap();

        let mut txn = engine.begin_txn("alice", "replace").unwrap();
        txn.delete("a.txt").unwrap();
        txn.add_file("a.txt", "new").unwrap();
        txn.commit().unwrap();
        assert_eq!(changes_of(&engine, 2), vec![("a.txt".into(), ChangeAction::Add)]);
    }

    #[test]
    fn test_property_edits() {
        let mut engine = MemoryEngine::new();
        let mut txn = engine.begin_txn("alice", "props").unwrap();
        txn.add_file("img", "link images").unwrap();
        txn.set_prop("img", "svn:special", "*").unwrap();
        txn.commit().unwrap();

        let changes = engine.changed_paths(1).unwrap();
        assert_eq!(changes[0].action, ChangeAction::Add);
        assert!(changes[0].prop_mod);

        let mut txn = engine.begin_txn("alice", "drop prop").unwrap();
        txn.remove_prop("img", "svn:special").unwrap();
        txn.commit().unwrap();
        let root = engine.root(2).unwrap().unwrap();
        assert!(root.get("img").unwrap().props.is_none());
    }

    #[test]
    fn test_rejects_missing_parent_and_bad_copy() {
        let mut engine = MemoryEngine::new();
        let mut txn = engine.begin_txn("alice", "bad").unwrap();
        assert!(txn.add_file("nope/a.txt", "x").is_err());
        txn.mkdir("dir").unwrap();
        assert!(txn.mkdir("dir").is_err());
        assert!(txn.copy("missing", 0, "dst").is_err());
        assert!(txn.copy("", 0, "dir/self").is_err());
        assert!(txn.delete("").is_err());
    }
}
