//! Podium Store — chunk persistence.
//!
//! Chunk text, source attribution, and embedding metadata keyed by
//! chunk id. `get_many` preserves input order and marks unresolved ids
//! explicitly so callers can detect index/store drift; deletion is bulk
//! by document id and returns the removed ids so the caller can purge
//! the matching index entries.

pub mod memory;
pub mod schema;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;

use podium_core::{Chunk, Result};

/// Trait for chunk storage backends.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Insert or replace chunks, recording the embedding model version
    /// they were indexed under. Idempotent per chunk id.
    async fn put_many(&self, chunks: &[Chunk], model_version: &str) -> Result<()>;

    /// Look up chunks by id. Output order matches input order; ids that
    /// do not resolve yield `None` rather than being omitted.
    async fn get_many(&self, chunk_ids: &[String]) -> Result<Vec<Option<Chunk>>>;

    /// All chunk ids currently stored for a document.
    async fn chunk_ids_for_document(&self, document_id: &str) -> Result<Vec<String>>;

    /// Remove all chunks for a document. Returns the removed ids;
    /// deleting a document with no chunks is a no-op.
    async fn delete_by_document(&self, document_id: &str) -> Result<Vec<String>>;

    /// Number of chunks stored for a document.
    async fn count_for_document(&self, document_id: &str) -> Result<usize>;
}
