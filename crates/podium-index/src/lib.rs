//! Podium Index — nearest-neighbor index client.
//!
//! `VectorIndex` abstracts the external index: idempotent upsert,
//! top-K cosine query, idempotent delete. `MemoryIndex` is the
//! in-process implementation; `HttpIndex` talks to a Qdrant-style REST
//! index. Both refuse to mix vectors from different embedding model
//! versions.

pub mod http;
pub mod memory;

pub use http::HttpIndex;
pub use memory::MemoryIndex;

use async_trait::async_trait;
use ndarray::Array1;

use podium_core::{Embedding, Result};

/// Hard cap on K; bounds the cost of a single query.
pub const MAX_K: usize = 50;

/// A query hit: chunk id plus similarity score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredId {
    pub chunk_id: String,
    pub score: f32,
}

/// Trait for vector index backends.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or replace vectors. Re-upserting a chunk id replaces the
    /// prior vector (idempotent).
    async fn upsert(&self, embeddings: &[Embedding]) -> Result<()>;

    /// Top-K most similar chunk ids, descending score. `k` is capped at
    /// [`MAX_K`]. Fails with `VersionMismatch` if `model_version` does
    /// not match the vectors held by the index.
    async fn query(
        &self,
        vector: &Array1<f32>,
        model_version: &str,
        k: usize,
    ) -> Result<Vec<ScoredId>>;

    /// Remove vectors. Deleting an id that is not present is a no-op.
    async fn delete(&self, chunk_ids: &[String]) -> Result<()>;
}
