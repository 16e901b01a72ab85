//! SQLite-backed chunk store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use podium_core::{Chunk, Error, Result, UnitKind};

use crate::schema::SCHEMA_SQL;
use crate::ChunkStore;

/// Chunk store backed by a SQLite database file.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SqliteStore {
    /// Open or create the store. `db_dir` is the data directory; the
    /// file will be `db_dir/podium.db`.
    pub fn open(db_dir: impl AsRef<Path>) -> Result<Self> {
        let db_dir = db_dir.as_ref();
        std::fs::create_dir_all(db_dir).map_err(|e| Error::Storage(e.to_string()))?;
        let db_path = db_dir.join("podium.db");

        let conn = Connection::open(&db_path).map_err(|e| Error::Database(e.to_string()))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| Error::Database(e.to_string()))?;
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| Error::Database(format!("Schema init failed: {e}")))?;

        info!("SqliteStore opened at {}", db_path.display());
        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn row_to_chunk(row: &Row<'_>) -> rusqlite::Result<Chunk> {
        let unit_kind: String = row.get("unit_kind")?;
        Ok(Chunk {
            chunk_id: row.get("chunk_id")?,
            document_id: row.get("document_id")?,
            unit_kind: match unit_kind.as_str() {
                "slide" => UnitKind::Slide,
                _ => UnitKind::Page,
            },
            unit_number: row.get::<_, i64>("unit_number")? as u32,
            text: row.get("text")?,
            char_start: row.get::<_, i64>("char_start")? as usize,
            char_end: row.get::<_, i64>("char_end")? as usize,
        })
    }

    fn now_millis() -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}

#[async_trait]
impl ChunkStore for SqliteStore {
    async fn put_many(&self, chunks: &[Chunk], model_version: &str) -> Result<()> {
        let now = Self::now_millis();
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| Error::Database(e.to_string()))?;
        {
            let mut stmt = tx
                .prepare_cached(
                    "INSERT OR REPLACE INTO chunks \
                     (chunk_id, document_id, unit_kind, unit_number, text, \
                      char_start, char_end, model_version, created_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                )
                .map_err(|e| Error::Database(e.to_string()))?;
            for chunk in chunks {
                stmt.execute(params![
                    chunk.chunk_id,
                    chunk.document_id,
                    chunk.unit_kind.to_string(),
                    chunk.unit_number as i64,
                    chunk.text,
                    chunk.char_start as i64,
                    chunk.char_end as i64,
                    model_version,
                    now,
                ])
                .map_err(|e| Error::Database(e.to_string()))?;
            }
        }
        tx.commit().map_err(|e| Error::Database(e.to_string()))?;
        debug!("Stored {} chunks", chunks.len());
        Ok(())
    }

    async fn get_many(&self, chunk_ids: &[String]) -> Result<Vec<Option<Chunk>>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached("SELECT * FROM chunks WHERE chunk_id = ?1")
            .map_err(|e| Error::Database(e.to_string()))?;

        let mut results = Vec::with_capacity(chunk_ids.len());
        for id in chunk_ids {
            let chunk = stmt
                .query_row(params![id], Self::row_to_chunk)
                .optional()
                .map_err(|e| Error::Database(e.to_string()))?;
            results.push(chunk);
        }
        Ok(results)
    }

    async fn chunk_ids_for_document(&self, document_id: &str) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT chunk_id FROM chunks WHERE document_id = ?1 \
                 ORDER BY unit_number, char_start",
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![document_id], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))?;
        rows.collect::<rusqlite::Result<Vec<String>>>()
            .map_err(|e| Error::Database(e.to_string()))
    }

    async fn delete_by_document(&self, document_id: &str) -> Result<Vec<String>> {
        let removed = self.chunk_ids_for_document(document_id).await?;
        if removed.is_empty() {
            return Ok(removed);
        }
        let conn = self.conn.lock();
        conn.execute(
            "DELETE FROM chunks WHERE document_id = ?1",
            params![document_id],
        )
        .map_err(|e| Error::Database(e.to_string()))?;
        debug!(
            "Deleted {} chunks for document {}",
            removed.len(),
            document_id
        );
        Ok(removed)
    }

    async fn count_for_document(&self, document_id: &str) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM chunks WHERE document_id = ?1",
                params![document_id],
                |row| row.get(0),
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(count as usize)
    }
}
