//! In-memory cosine index.
//!
//! Brute-force search over normalized vectors. Suitable for single-node
//! deployments and for running the pipeline without an external index.

use std::collections::HashMap;

use async_trait::async_trait;
use ndarray::Array1;
use parking_lot::RwLock;
use tracing::debug;

use podium_core::{Embedding, Error, Result};

use crate::{ScoredId, VectorIndex, MAX_K};

/// In-memory vector index bound to one embedding model version.
pub struct MemoryIndex {
    dimension: usize,
    model_version: String,
    /// chunk_id → L2-normalized vector.
    entries: RwLock<HashMap<String, Array1<f32>>>,
}

impl MemoryIndex {
    pub fn new(dimension: usize, model_version: impl Into<String>) -> Self {
        Self {
            dimension,
            model_version: model_version.into(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn check_version(&self, model_version: &str) -> Result<()> {
        if model_version != self.model_version {
            return Err(Error::VersionMismatch {
                expected: self.model_version.clone(),
                actual: model_version.to_string(),
            });
        }
        Ok(())
    }

    fn check_dimension(&self, vector: &Array1<f32>) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(Error::InvalidInput(format!(
                "vector dimension {} does not match index dimension {}",
                vector.len(),
                self.dimension
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn upsert(&self, embeddings: &[Embedding]) -> Result<()> {
        for embedding in embeddings {
            self.check_version(&embedding.model_version)?;
            self.check_dimension(&embedding.vector)?;
        }
        let mut entries = self.entries.write();
        for embedding in embeddings {
            let norm = embedding.vector.dot(&embedding.vector).sqrt();
            let normalized = if norm > 1e-9 {
                &embedding.vector / norm
            } else {
                embedding.vector.clone()
            };
            entries.insert(embedding.chunk_id.clone(), normalized);
        }
        debug!("Upserted {} vectors ({} total)", embeddings.len(), entries.len());
        Ok(())
    }

    async fn query(
        &self,
        vector: &Array1<f32>,
        model_version: &str,
        k: usize,
    ) -> Result<Vec<ScoredId>> {
        self.check_version(model_version)?;
        self.check_dimension(vector)?;

        let norm = vector.dot(vector).sqrt();
        if norm < 1e-9 {
            return Ok(Vec::new());
        }
        let query = vector / norm;

        let entries = self.entries.read();
        let mut hits: Vec<ScoredId> = entries
            .iter()
            .map(|(chunk_id, v)| ScoredId {
                chunk_id: chunk_id.clone(),
                score: query.dot(v),
            })
            .collect();
        drop(entries);

        // Stable ordering for ties so results are reproducible.
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.chunk_id.cmp(&b.chunk_id))
        });
        hits.truncate(k.min(MAX_K));
        Ok(hits)
    }

    async fn delete(&self, chunk_ids: &[String]) -> Result<()> {
        let mut entries = self.entries.write();
        for id in chunk_ids {
            entries.remove(id);
        }
        Ok(())
    }
}
