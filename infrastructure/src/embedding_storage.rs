use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use domain::models::{IndexEntry, IndexMetadata};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use shared::types::{BotError, Result};
use tracing::{debug, warn};

/// Database file inside an index directory.
pub const INDEX_FILE_NAME: &str = "index.sqlite3";

const META_EMBEDDING_MODEL: &str = "embedding_model";
const META_DIMENSIONS: &str = "dimensions";
const META_CHUNK_SIZE: &str = "chunk_size";
const META_CHUNK_OVERLAP: &str = "chunk_overlap";
const META_ENTRY_COUNT: &str = "entry_count";
const META_SOURCE_MD5: &str = "source_md5";

pub struct EmbeddingStorage {
    conn: Connection,
    path: PathBuf,
}

impl EmbeddingStorage {
    /// Create a fresh database in `dir`, creating the directory if needed.
    pub fn create(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| BotError::io(dir, e))?;
        let path = dir.join(INDEX_FILE_NAME);
        let conn = Connection::open(&path).map_err(storage)?;
        Self::setup_db(&conn).map_err(storage)?;
        Ok(Self { conn, path })
    }

    /// Open an existing index without write access. A missing index is an error.
    pub fn open_read_only(dir: impl AsRef<Path>) -> Result<Self> {
        let path = dir.as_ref().join(INDEX_FILE_NAME);
        if !path.is_file() {
            return Err(BotError::Storage(format!(
                "no vector index at {}",
                path.display()
            )));
        }
        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(storage)?;
        Ok(Self { conn, path })
    }

    fn setup_db(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch(
            "
            PRAGMA synchronous=NORMAL;
            PRAGMA cache_size=-64000;
            PRAGMA temp_store=MEMORY;
            CREATE TABLE IF NOT EXISTS entries (
                position INTEGER PRIMARY KEY,
                text TEXT NOT NULL,
                vector BLOB NOT NULL
            );
            CREATE TABLE IF NOT EXISTS index_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
        ",
        )
    }

    pub fn insert_entries(&self, entries: &[IndexEntry]) -> Result<()> {
        let tx = self.conn.unchecked_transaction().map_err(storage)?;
        {
            let mut stmt = tx
                .prepare("INSERT OR REPLACE INTO entries (position, text, vector) VALUES (?1, ?2, ?3)")
                .map_err(storage)?;
            for entry in entries {
                let vector_bytes = serde_json::to_vec(&entry.vector).map_err(storage)?;
                stmt.execute(params![entry.position as i64, entry.text, vector_bytes])
                    .map_err(storage)?;
            }
        }
        tx.commit().map_err(storage)?;
        debug!(count = entries.len(), path = %self.path.display(), "stored index entries");
        Ok(())
    }

    /// All entries in document order.
    pub fn load_entries(&self) -> Result<Vec<IndexEntry>> {
        let mut stmt = self
            .conn
            .prepare("SELECT position, text, vector FROM entries ORDER BY position")
            .map_err(storage)?;
        let mut rows = stmt.query([]).map_err(storage)?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next().map_err(storage)? {
            let position: i64 = row.get(0).map_err(storage)?;
            let text: String = row.get(1).map_err(storage)?;
            let vector_bytes: Vec<u8> = row.get(2).map_err(storage)?;
            let vector: Vec<f32> = serde_json::from_slice(&vector_bytes).map_err(|e| {
                BotError::Storage(format!("entry {position} has a corrupt vector: {e}"))
            })?;
            let position = usize::try_from(position)
                .map_err(|_| BotError::Storage(format!("entry has negative position {position}")))?;
            entries.push(IndexEntry {
                position,
                text,
                vector,
            });
        }
        Ok(entries)
    }

    pub fn write_metadata(&self, meta: &IndexMetadata) -> Result<()> {
        let pairs = [
            (META_EMBEDDING_MODEL, meta.embedding_model.clone()),
            (META_DIMENSIONS, meta.dimensions.to_string()),
            (META_CHUNK_SIZE, meta.chunk_size.to_string()),
            (META_CHUNK_OVERLAP, meta.chunk_overlap.to_string()),
            (META_ENTRY_COUNT, meta.entry_count.to_string()),
            (META_SOURCE_MD5, meta.source_md5.clone()),
        ];
        let tx = self.conn.unchecked_transaction().map_err(storage)?;
        for (key, value) in pairs {
            tx.execute(
                "INSERT OR REPLACE INTO index_meta (key, value) VALUES (?1, ?2)",
                params![key, value],
            )
            .map_err(storage)?;
        }
        tx.commit().map_err(storage)
    }

    /// Metadata of the index, or `None` when it was never written.
    pub fn read_metadata(&self) -> Result<Option<IndexMetadata>> {
        let Some(embedding_model) = self.meta_value(META_EMBEDDING_MODEL)? else {
            return Ok(None);
        };
        Ok(Some(IndexMetadata {
            embedding_model,
            dimensions: self.meta_number(META_DIMENSIONS)?,
            chunk_size: self.meta_number(META_CHUNK_SIZE)?,
            chunk_overlap: self.meta_number(META_CHUNK_OVERLAP)?,
            entry_count: self.meta_number(META_ENTRY_COUNT)?,
            source_md5: self.meta_value(META_SOURCE_MD5)?.unwrap_or_default(),
        }))
    }

    fn meta_value(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM index_meta WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()
            .map_err(storage)
    }

    fn meta_number(&self, key: &str) -> Result<usize> {
        let raw = self
            .meta_value(key)?
            .ok_or_else(|| BotError::Storage(format!("index metadata is missing `{key}`")))?;
        raw.parse()
            .map_err(|e| BotError::Storage(format!("index metadata `{key}`={raw:?}: {e}")))
    }
}

/// Build a new index next to `dir` and swap it into place only once `build`
/// succeeds. On failure the previous index is left untouched.
pub fn replace_index<T, F>(dir: &Path, build: F) -> Result<T>
where
    F: FnOnce(&Path) -> Result<T>,
{
    let staging = staging_dir(dir);
    if staging.exists() {
        fs::remove_dir_all(&staging).map_err(|e| BotError::io(&staging, e))?;
    }

    let built = match build(&staging) {
        Ok(value) => value,
        Err(err) => {
            let _ = fs::remove_dir_all(&staging);
            return Err(err);
        }
    };

    swap_into_place(&staging, dir)?;
    debug!(dir = %dir.display(), "index swapped into place");
    Ok(built)
}

/// Move `staging` to `dir`. The old `dir` is parked as a backup until the move
/// succeeds and put back if it does not.
fn swap_into_place(staging: &Path, dir: &Path) -> Result<()> {
    let backup = sibling_dir(dir, "backup");
    if backup.exists() {
        fs::remove_dir_all(&backup).map_err(|e| BotError::io(&backup, e))?;
    }

    let had_previous = dir.exists();
    if had_previous {
        fs::rename(dir, &backup).map_err(|e| BotError::io(dir, e))?;
    }

    if let Err(e) = fs::rename(staging, dir) {
        if had_previous {
            if let Err(restore) = fs::rename(&backup, dir) {
                warn!(error = %restore, backup = %backup.display(), "could not restore previous index");
            }
        }
        return Err(BotError::io(dir, e));
    }

    if had_previous {
        if let Err(e) = fs::remove_dir_all(&backup) {
            warn!(error = %e, backup = %backup.display(), "could not remove old index");
        }
    }
    Ok(())
}

fn staging_dir(dir: &Path) -> PathBuf {
    sibling_dir(dir, "staging")
}

fn sibling_dir(dir: &Path, suffix: &str) -> PathBuf {
    let mut name = dir
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "vector_db".into());
    name.push(".");
    name.push(suffix);
    dir.with_file_name(name)
}

fn storage(e: impl Display) -> BotError {
    BotError::Storage(e.to_string())
}
