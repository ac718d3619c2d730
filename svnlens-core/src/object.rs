//! Core object model for SvnLens
//!
//! Revisions are immutable snapshots of the whole tree. Each snapshot is a
//! flat, path-ordered map of node records; file contents and property sets
//! live in a content-addressed object store and are referenced by id.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::ops::Bound;

use crate::path;

/// Revision number. Revision 0 is the empty pre-history root.
pub type Revnum = u64;

/// Unique identifier for any stored object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId([u8; 32]);

impl ObjectId {
    /// Create a new ObjectId from raw bytes
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Compute ObjectId from data
    pub fn from_data(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        Self(hash.into())
    }

    /// Convert to hexadecimal string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Get raw bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Node type discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Directory,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::File => f.write_str("file"),
            NodeKind::Directory => f.write_str("dir"),
        }
    }
}

/// One versioned node inside a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub kind: NodeKind,
    /// Content blob (files only)
    pub content: Option<ObjectId>,
    /// Content length in bytes (0 for directories)
    pub size: u64,
    /// Property set object, `None` when the node has no properties
    pub props: Option<ObjectId>,
    /// Last revision in which this node (or anything below it) changed
    pub created_rev: Revnum,
}

impl NodeRecord {
    pub fn directory(created_rev: Revnum) -> Self {
        Self {
            kind: NodeKind::Directory,
            content: None,
            size: 0,
            props: None,
            created_rev,
        }
    }

    pub fn file(content: ObjectId, size: u64, created_rev: Revnum) -> Self {
        Self {
            kind: NodeKind::File,
            content: Some(content),
            size,
            props: None,
            created_rev,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }
}

/// Full tree of one revision, keyed by normalized path (`""` is the root)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub nodes: BTreeMap<String, NodeRecord>,
}

impl Snapshot {
    /// A snapshot containing only the root directory
    pub fn empty(rev: Revnum) -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(String::new(), NodeRecord::directory(rev));
        Self { nodes }
    }

    pub fn get(&self, path: &str) -> Option<&NodeRecord> {
        self.nodes.get(path)
    }

    pub fn get_mut(&mut self, path: &str) -> Option<&mut NodeRecord> {
        self.nodes.get_mut(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.nodes.contains_key(path)
    }

    pub fn insert(&mut self, path: String, node: NodeRecord) {
        self.nodes.insert(path, node);
    }

    /// Remove a node together with everything below it
    pub fn remove_subtree(&mut self, path: &str) -> Vec<(String, NodeRecord)> {
        let doomed: Vec<String> = self
            .subtree(path)
            .map(|(p, _)| p.to_string())
            .collect();
        doomed
            .into_iter()
            .filter_map(|p| self.nodes.remove(&p).map(|n| (p, n)))
            .collect()
    }

    /// Iterate over a node and all of its descendants
    pub fn subtree<'a>(
        &'a self,
        root: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a NodeRecord)> + 'a {
        self.nodes
            .range::<str, _>((Bound::Included(root), Bound::Unbounded))
            .take_while(move |(p, _)| p.starts_with(root))
            // "trunk-old" sorts between "trunk" and "trunk/a"
            .filter(move |(p, _)| path::is_same_or_descendant(p, root))
            .map(|(p, n)| (p.as_str(), n))
    }

    /// Immediate children of a directory, ordered by name
    pub fn children<'a>(
        &'a self,
        dir: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a NodeRecord)> + 'a {
        self.subtree(dir)
            .filter(move |(p, _)| *p != dir && path::parent(p) == dir)
            .map(|(p, n)| (path::basename(p), n))
    }

    /// Serialize to binary format
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Deserialize from binary format
    pub fn from_bytes(data: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(data)
    }
}

/// Commit metadata plus the root of the committed tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevisionRecord {
    pub rev: Revnum,
    /// Author name (empty for revision 0)
    pub author: String,
    /// Commit timestamp (Unix seconds)
    pub timestamp: i64,
    /// Log message
    pub log: String,
    /// Snapshot object for this revision
    pub root: ObjectId,
}

/// Kind of change recorded for a path in a revision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Add,
    Modify,
    Delete,
    Copy,
}

impl ChangeAction {
    /// Single-letter code as printed by `svn log -v`
    pub fn code(&self) -> char {
        match self {
            ChangeAction::Add | ChangeAction::Copy => 'A',
            ChangeAction::Modify => 'M',
            ChangeAction::Delete => 'D',
        }
    }

    pub(crate) fn to_i64(self) -> i64 {
        match self {
            ChangeAction::Add => 0,
            ChangeAction::Modify => 1,
            ChangeAction::Delete => 2,
            ChangeAction::Copy => 3,
        }
    }

    pub(crate) fn from_i64(i: i64) -> Option<Self> {
        match i {
            0 => Some(ChangeAction::Add),
            1 => Some(ChangeAction::Modify),
            2 => Some(ChangeAction::Delete),
            3 => Some(ChangeAction::Copy),
            _ => None,
        }
    }
}

/// Source of a copied path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopySource {
    pub path: String,
    pub rev: Revnum,
}

/// One changed-path record of a revision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathChange {
    pub path: String,
    pub action: ChangeAction,
    pub node_kind: NodeKind,
    /// File content differs from the previous state
    pub text_mod: bool,
    /// Property set differs from the previous state
    pub prop_mod: bool,
    pub copy_from: Option<CopySource>,
}
