//! Catalog store: the durable ledger of archived content.
//!
//! A SQLite file (`katal.db`) in the target directory holds one row per
//! archived file: `(hashid, name, sourcename)`. The catalog is the single
//! oracle for "has this content already been archived". Rows are only ever
//! appended, one batch per commit, inside a single transaction so a failed
//! append leaves the previous rows untouched.

use rusqlite::{Connection, params};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::errors::{KatalError, Result};
use crate::hash::ContentHash;

/// File name of the catalog inside the target directory.
pub const DATABASE_NAME: &str = "katal.db";

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS files (hashid TEXT, name TEXT, sourcename TEXT)";

/// One archived file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub hash: ContentHash,
    /// Name of the copy, relative to the target directory.
    pub stored_target_name: String,
    pub original_source_path: String,
}

pub struct Catalog {
    conn: Connection,
    path: PathBuf,
}

impl Catalog {
    /// Path of the catalog file for a target directory.
    pub fn path_for(target_dir: &Path) -> PathBuf {
        target_dir.join(DATABASE_NAME)
    }

    /// Open the catalog of `target_dir`, creating an empty one if absent.
    pub fn open(target_dir: &Path) -> Result<Self> {
        let path = Self::path_for(target_dir);
        let existed = path.exists();
        let conn = Connection::open(&path).map_err(|e| KatalError::catalog(&path, e))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| KatalError::catalog(&path, e))?;
        if existed {
            debug!(path = %path.display(), "Opened existing catalog");
        } else {
            info!(path = %path.display(), "Created empty catalog");
        }
        Ok(Self { conn, path })
    }

    /// Throwaway catalog for tests and dry runs.
    pub fn open_in_memory() -> Result<Self> {
        let path = PathBuf::from(":memory:");
        let conn = Connection::open_in_memory().map_err(|e| KatalError::catalog(&path, e))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| KatalError::catalog(&path, e))?;
        Ok(Self { conn, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All archived hashes as a membership set.
    pub fn load_hashes(&self) -> Result<HashSet<ContentHash>> {
        let mut stmt = self
            .conn
            .prepare("SELECT hashid FROM files")
            .map_err(|e| KatalError::catalog(&self.path, e))?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| KatalError::catalog(&self.path, e))?;
        let mut hashes = HashSet::new();
        for row in rows {
            let h = row.map_err(|e| KatalError::catalog(&self.path, e))?;
            hashes.insert(ContentHash::from_encoded(h));
        }
        debug!(count = hashes.len(), "Loaded catalog hashes");
        Ok(hashes)
    }

    /// Number of rows; the base of DATABASE_INDEX for a new batch.
    pub fn len(&self) -> Result<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM files", [], |row| row.get(0))
            .map_err(|e| KatalError::catalog(&self.path, e))?;
        Ok(usize::try_from(n).unwrap_or(0))
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// All rows in insertion order.
    pub fn entries(&self) -> Result<Vec<CatalogEntry>> {
        let mut stmt = self
            .conn
            .prepare("SELECT hashid, name, sourcename FROM files ORDER BY rowid")
            .map_err(|e| KatalError::catalog(&self.path, e))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(CatalogEntry {
                    hash: ContentHash::from_encoded(row.get::<_, String>(0)?),
                    stored_target_name: row.get(1)?,
                    original_source_path: row.get(2)?,
                })
            })
            .map_err(|e| KatalError::catalog(&self.path, e))?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| KatalError::catalog(&self.path, e))
    }

    /// Append a batch of entries atomically.
    pub fn append(&mut self, entries: &[CatalogEntry]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let path = self.path.clone();
        let tx = self
            .conn
            .transaction()
            .map_err(|e| KatalError::catalog(&path, e))?;
        {
            let mut stmt = tx
                .prepare_cached("INSERT INTO files (hashid, name, sourcename) VALUES (?1, ?2, ?3)")
                .map_err(|e| KatalError::catalog(&path, e))?;
            for entry in entries {
                stmt.execute(params![
                    entry.hash.as_str(),
                    entry.stored_target_name,
                    entry.original_source_path
                ])
                .map_err(|e| KatalError::catalog(&path, e))?;
            }
        }
        // dropping an uncommitted transaction rolls it back
        tx.commit().map_err(|e| KatalError::catalog(&path, e))?;
        info!(count = entries.len(), path = %path.display(), "Catalog extended");
        Ok(())
    }
}
