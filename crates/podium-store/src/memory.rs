//! In-memory chunk store for tests and development builds.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use podium_core::{Chunk, Result};

use crate::ChunkStore;

/// Chunk store that keeps everything in a `HashMap`.
#[derive(Default)]
pub struct MemoryStore {
    chunks: RwLock<HashMap<String, Chunk>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.chunks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.read().is_empty()
    }
}

#[async_trait]
impl ChunkStore for MemoryStore {
    async fn put_many(&self, chunks: &[Chunk], _model_version: &str) -> Result<()> {
        let mut store = self.chunks.write();
        for chunk in chunks {
            store.insert(chunk.chunk_id.clone(), chunk.clone());
        }
        Ok(())
    }

    async fn get_many(&self, chunk_ids: &[String]) -> Result<Vec<Option<Chunk>>> {
        let store = self.chunks.read();
        Ok(chunk_ids.iter().map(|id| store.get(id).cloned()).collect())
    }

    async fn chunk_ids_for_document(&self, document_id: &str) -> Result<Vec<String>> {
        let store = self.chunks.read();
        let mut matching: Vec<&Chunk> = store
            .values()
            .filter(|c| c.document_id == document_id)
            .collect();
        matching.sort_by_key(|c| (c.unit_number, c.char_start));
        Ok(matching.iter().map(|c| c.chunk_id.clone()).collect())
    }

    async fn delete_by_document(&self, document_id: &str) -> Result<Vec<String>> {
        let removed = self.chunk_ids_for_document(document_id).await?;
        let mut store = self.chunks.write();
        for id in &removed {
            store.remove(id);
        }
        Ok(removed)
    }

    async fn count_for_document(&self, document_id: &str) -> Result<usize> {
        let store = self.chunks.read();
        Ok(store
            .values()
            .filter(|c| c.document_id == document_id)
            .count())
    }
}
