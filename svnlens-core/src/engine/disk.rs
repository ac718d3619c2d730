//! Disk-persistent engine
//!
//! Stores objects on disk using a content-addressed filesystem (like git
//! objects). Revision metadata and changed-path records live in an SQLite
//! index with WAL mode so range scans over history stay cheap.

use anyhow::{Context, Result, anyhow, bail};
use rusqlite::{Connection, OptionalExtension};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{BlobReader, NewRevision, RepositoryEngine};
use crate::object::{
    ChangeAction, CopySource, NodeKind, ObjectId, PathChange, RevisionRecord, Revnum, Snapshot,
};
use crate::properties::PropertySet;

/// Contents of the `format` marker file
const FORMAT_MARKER: &str = "svnlens-fs 1";

fn kind_to_i64(kind: NodeKind) -> i64 {
    match kind {
        NodeKind::File => 0,
        NodeKind::Directory => 1,
    }
}

fn i64_to_kind(i: i64) -> NodeKind {
    if i == 0 { NodeKind::File } else { NodeKind::Directory }
}

fn bytes_to_oid(bytes: &[u8]) -> Result<ObjectId> {
    let arr: [u8; 32] = bytes
        .try_into()
        .map_err(|_| anyhow!("Corrupt object id of {} bytes", bytes.len()))?;
    Ok(ObjectId::new(arr))
}

fn open_index(root: &Path) -> Result<Connection> {
    let db_path = root.join("revs.sqlite");
    let conn = Connection::open(&db_path)
        .with_context(|| format!("Failed to open SQLite database at {:?}", db_path))?;
    conn.busy_timeout(Duration::from_secs(5))?;
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "cache_size", "-64000")?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;
    Ok(conn)
}

fn create_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS revisions (
            rev INTEGER PRIMARY KEY,
            author TEXT NOT NULL,
            date INTEGER NOT NULL,
            log TEXT NOT NULL,
            root BLOB NOT NULL
        );
        CREATE TABLE IF NOT EXISTS changes (
            rev INTEGER NOT NULL,
            path TEXT NOT NULL,
            action INTEGER NOT NULL,
            kind INTEGER NOT NULL,
            text_mod INTEGER NOT NULL,
            prop_mod INTEGER NOT NULL,
            copy_from_path TEXT,
            copy_from_rev INTEGER,
            PRIMARY KEY (rev, path)
        ) WITHOUT ROWID;",
    )?;
    Ok(())
}

/// Disk-persistent repository engine
///
/// Layout on disk:
/// ```text
/// {root}/
///   format                    repository marker, written last on create
///   uuid                      repository UUID
///   objects/{hash[0..2]}/{hash[2..]}    content-addressed object store
///   revs.sqlite               revisions and changed paths
/// ```
pub struct DiskEngine {
    root: PathBuf,
    uuid: String,
    conn: Connection,
}

impl DiskEngine {
    /// True when `path` holds a repository marker
    pub fn is_repository(path: &Path) -> bool {
        fs::read_to_string(path.join("format"))
            .map(|s| s.trim() == FORMAT_MARKER)
            .unwrap_or(false)
    }

    /// Create a new repository holding the empty revision 0
    pub fn create(path: &Path) -> Result<Self> {
        let root = path.to_path_buf();
        if root.join("format").exists() {
            bail!("{:?} already contains a repository", root);
        }

        fs::create_dir_all(root.join("objects"))
            .with_context(|| format!("Failed to create repository layout at {:?}", root))?;

        let uuid = uuid::Uuid::new_v4().to_string();
        fs::write(root.join("uuid"), &uuid)?;

        let conn = open_index(&root)?;
        create_schema(&conn)?;

        let engine = Self { root, uuid, conn };
        let tree = Snapshot::empty(0);
        let tree_data = tree.to_bytes()?;
        let tree_id = ObjectId::from_data(&tree_data);
        engine.store_object(&tree_id, &tree_data)?;
        engine.conn.execute(
            "INSERT INTO revisions (rev, author, date, log, root) VALUES (0, '', ?1, '', ?2)",
            rusqlite::params![chrono::Utc::now().timestamp(), tree_id.as_bytes().as_slice()],
        )?;

        fs::write(engine.root.join("format"), format!("{}\n", FORMAT_MARKER))?;
        tracing::info!("Created repository at {:?} (UUID: {})", engine.root, engine.uuid);
        Ok(engine)
    }

    /// Open an existing repository
    pub fn open(path: &Path) -> Result<Self> {
        let root = path.to_path_buf();
        if !Self::is_repository(&root) {
            bail!("{:?} is not a repository (missing or unknown format marker)", root);
        }

        let uuid = fs::read_to_string(root.join("uuid"))
            .with_context(|| format!("Failed to read repository UUID in {:?}", root))?
            .trim()
            .to_string();

        if !root.join("revs.sqlite").exists() {
            bail!("Revision index missing in {:?}", root);
        }
        let conn = open_index(&root)?;
        let engine = Self { root, uuid, conn };
        // Fails early on a damaged index
        engine.youngest()?;
        Ok(engine)
    }

    /// Repository directory
    pub fn root_path(&self) -> &Path {
        &self.root
    }

    // ==================== Object Store ====================

    fn object_path(&self, id: &ObjectId) -> PathBuf {
        let hex = id.to_hex();
        self.root.join("objects").join(&hex[..2]).join(&hex[2..])
    }

    fn store_object(&self, id: &ObjectId, data: &[u8]) -> Result<()> {
        let path = self.object_path(id);
        if path.exists() {
            return Ok(()); // Already stored (content-addressed = idempotent)
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        // Write atomically via temp file
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, data)?;
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    fn load_object(&self, id: &ObjectId) -> Result<Vec<u8>> {
        let path = self.object_path(id);
        fs::read(&path).with_context(|| format!("Object {} not found at {:?}", id, path))
    }
}

impl RepositoryEngine for DiskEngine {
    fn uuid(&self) -> &str {
        &self.uuid
    }

    fn youngest(&self) -> Result<Revnum> {
        let max: Option<i64> = self
            .conn
            .query_row("SELECT MAX(rev) FROM revisions", [], |r| r.get(0))?;
        max.map(|r| r as Revnum)
            .ok_or_else(|| anyhow!("Revision index in {:?} is empty", self.root))
    }

    fn revision(&self, rev: Revnum) -> Result<Option<RevisionRecord>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT author, date, log, root FROM revisions WHERE rev = ?1")?;
        let row = stmt
            .query_row([rev as i64], |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, i64>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, Vec<u8>>(3)?,
                ))
            })
            .optional()
            .with_context(|| format!("Failed to read revision r{}", rev))?;

        match row {
            Some((author, timestamp, log, root)) => Ok(Some(RevisionRecord {
                rev,
                author,
                timestamp,
                log,
                root: bytes_to_oid(&root)?,
            })),
            None => Ok(None),
        }
    }

    fn root(&self, rev: Revnum) -> Result<Option<Snapshot>> {
        match self.revision(rev)? {
            Some(record) => {
                let data = self.load_object(&record.root)?;
                let tree = Snapshot::from_bytes(&data)
                    .with_context(|| format!("Corrupt snapshot for r{}", rev))?;
                Ok(Some(tree))
            }
            None => Ok(None),
        }
    }

    fn open_blob(&self, id: &ObjectId) -> Result<BlobReader> {
        let path = self.object_path(id);
        let file = File::open(&path)
            .with_context(|| format!("Blob {} not found at {:?}", id, path))?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn read_props(&self, id: &ObjectId) -> Result<PropertySet> {
        let data = self.load_object(id)?;
        PropertySet::from_bytes(&data).with_context(|| format!("Corrupt property set {}", id))
    }

    fn changed_paths(&self, rev: Revnum) -> Result<Vec<PathChange>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT path, action, kind, text_mod, prop_mod, copy_from_path, copy_from_rev \
             FROM changes WHERE rev = ?1 ORDER BY path",
        )?;
        let mut rows = stmt.query([rev as i64])?;
        let mut changes = Vec::new();
        while let Some(row) = rows.next()? {
            let action: i64 = row.get(1)?;
            let copy_path: Option<String> = row.get(5)?;
            let copy_rev: Option<i64> = row.get(6)?;
            changes.push(PathChange {
                path: row.get(0)?,
                action: ChangeAction::from_i64(action)
                    .ok_or_else(|| anyhow!("Unknown change action {} in r{}", action, rev))?,
                node_kind: i64_to_kind(row.get(2)?),
                text_mod: row.get(3)?,
                prop_mod: row.get(4)?,
                copy_from: match (copy_path, copy_rev) {
                    (Some(path), Some(rev)) => Some(CopySource { path, rev: rev as Revnum }),
                    _ => None,
                },
            });
        }
        Ok(changes)
    }

    fn write_blob(&mut self, data: &[u8]) -> Result<ObjectId> {
        let id = ObjectId::from_data(data);
        self.store_object(&id, data)?;
        Ok(id)
    }

    fn write_props(&mut self, props: &PropertySet) -> Result<ObjectId> {
        let data = props.to_bytes()?;
        let id = ObjectId::from_data(&data);
        self.store_object(&id, &data)?;
        Ok(id)
    }

    fn commit_revision(&mut self, revision: NewRevision) -> Result<Revnum> {
        let youngest = self.youngest()?;
        if revision.base_rev != youngest {
            bail!(
                "Transaction based on r{} is out of date (youngest is r{})",
                revision.base_rev,
                youngest
            );
        }
        let rev = youngest + 1;

        let tree_data = revision.snapshot.to_bytes()?;
        let tree_id = ObjectId::from_data(&tree_data);
        self.store_object(&tree_id, &tree_data)?;

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO revisions (rev, author, date, log, root) VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                rev as i64,
                revision.author,
                revision.timestamp,
                revision.log,
                tree_id.as_bytes().as_slice()
            ],
        )?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO changes (rev, path, action, kind, text_mod, prop_mod, copy_from_path, copy_from_rev) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for change in &revision.changes {
                stmt.execute(rusqlite::params![
                    rev as i64,
                    change.path,
                    change.action.to_i64(),
                    kind_to_i64(change.node_kind),
                    change.text_mod,
                    change.prop_mod,
                    change.copy_from.as_ref().map(|c| c.path.as_str()),
                    change.copy_from.as_ref().map(|c| c.rev as i64),
                ])?;
            }
        }
        tx.commit()
            .with_context(|| format!("Failed to commit r{} to the revision index", rev))?;
        Ok(rev)
    }
}
