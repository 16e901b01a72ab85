//! Ingestion coordination.
//!
//! Ingestion of one document is a single logical transaction: extract →
//! chunk → embed → store → index. Any failure after the initial purge
//! rolls the document's chunks and index entries back out, so retries
//! start from a clean slate. The chunker is deterministic and
//! upsert/delete are idempotent, which makes wholesale retry safe.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::try_join_all;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use podium_core::{
    AnswerResult, DocumentType, Embedding, Error, IngestResult, PipelineConfig, Result,
};
use podium_index::{HttpIndex, MemoryIndex, VectorIndex};
use podium_infer::{create_embedder, create_generator, EmbedderBackend, GeneratorBackend};
use podium_ingest::{chunk_segment, extract};
use podium_rag::RagOrchestrator;
use podium_store::ChunkStore;

/// End-to-end pipeline over one store/index/model wiring.
///
/// Independent documents may be ingested concurrently; the pipeline
/// holds no cross-document mutable state.
pub struct IngestionPipeline {
    embedder: Arc<dyn EmbedderBackend>,
    index: Arc<dyn VectorIndex>,
    store: Arc<dyn ChunkStore>,
    rag: RagOrchestrator,
    config: PipelineConfig,
}

impl IngestionPipeline {
    /// Wire a pipeline from explicit components.
    pub fn new(
        embedder: Arc<dyn EmbedderBackend>,
        index: Arc<dyn VectorIndex>,
        store: Arc<dyn ChunkStore>,
        generator: Arc<dyn GeneratorBackend>,
        config: PipelineConfig,
    ) -> Result<Self> {
        config.validate()?;
        let rag = RagOrchestrator::new(
            embedder.clone(),
            index.clone(),
            store.clone(),
            generator,
            config.clone(),
        );
        Ok(Self {
            embedder,
            index,
            store,
            rag,
            config,
        })
    }

    /// Wire a pipeline from configuration: backend selection follows
    /// the configured endpoints (HTTP when set, deterministic mock /
    /// in-memory index otherwise).
    pub fn from_config(config: PipelineConfig, store: Arc<dyn ChunkStore>) -> Result<Self> {
        config.validate()?;
        let embedder = create_embedder(&config.embedding);
        let generator = create_generator(&config.generation);
        let index: Arc<dyn VectorIndex> = if config.index.endpoint.is_some() {
            Arc::new(HttpIndex::new(
                &config.index,
                embedder.dimension(),
                embedder.model_version(),
            )?)
        } else {
            Arc::new(MemoryIndex::new(
                embedder.dimension(),
                embedder.model_version(),
            ))
        };
        Self::new(embedder, index, store, generator, config)
    }

    /// Ingest one document: all-or-nothing at document granularity.
    ///
    /// Re-ingestion first purges every chunk and index entry from the
    /// prior ingestion; old and new chunks are never merged.
    pub async fn ingest(
        &self,
        document_id: &str,
        bytes: &[u8],
        document_type: DocumentType,
    ) -> Result<IngestResult> {
        if document_id.trim().is_empty() {
            return Err(Error::InvalidInput("document_id must not be empty".into()));
        }

        self.purge(document_id).await?;

        match self.ingest_fresh(document_id, bytes, document_type).await {
            Ok(result) => Ok(result),
            Err(e) => {
                // Roll back partial writes so no orphaned state
                // survives a failed ingestion.
                if let Err(purge_err) = self.purge(document_id).await {
                    warn!(
                        "Rollback after failed ingestion of {} also failed: {}",
                        document_id, purge_err
                    );
                }
                Err(e)
            }
        }
    }

    async fn ingest_fresh(
        &self,
        document_id: &str,
        bytes: &[u8],
        document_type: DocumentType,
    ) -> Result<IngestResult> {
        // Extraction is CPU-bound parsing; keep it off the runtime.
        let segments = {
            let task_document_id = document_id.to_string();
            let bytes = bytes.to_vec();
            tokio::task::spawn_blocking(move || extract(&task_document_id, &bytes, document_type))
                .await
                .map_err(|e| Error::Extraction {
                    document_id: document_id.to_string(),
                    reason: format!("extraction task failed: {e}"),
                })??
        };
        let segment_count = segments.len();

        let chunks: Vec<_> = segments
            .iter()
            .filter(|s| !s.text.trim().is_empty())
            .flat_map(|s| chunk_segment(s, &self.config.chunking))
            .collect();
        let model_version = self.embedder.model_version().to_string();

        if chunks.is_empty() {
            info!(
                "Document {} produced no indexable text ({} segments)",
                document_id, segment_count
            );
            return Ok(IngestResult {
                document_id: document_id.to_string(),
                segment_count,
                chunk_count: 0,
                model_version,
            });
        }

        // Batches embed in parallel; try_join_all keeps batch order, so
        // vectors line up positionally with chunks.
        let batch_futures = chunks.chunks(self.config.embedding.batch_size).map(|batch| {
            let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
            async move {
                bounded(
                    self.config.embedding.total_timeout_ms(),
                    "chunk embedding",
                    self.embedder.embed(&texts),
                )
                .await
            }
        });
        let vectors: Vec<_> = try_join_all(batch_futures)
            .await?
            .into_iter()
            .flatten()
            .collect();
        if vectors.len() != chunks.len() {
            return Err(Error::EmbeddingUnavailable(format!(
                "expected {} vectors, got {}",
                chunks.len(),
                vectors.len()
            )));
        }

        let embeddings: Vec<Embedding> = chunks
            .iter()
            .zip(vectors)
            .map(|(chunk, vector)| Embedding {
                chunk_id: chunk.chunk_id.clone(),
                vector,
                model_version: model_version.clone(),
            })
            .collect();

        self.store.put_many(&chunks, &model_version).await?;
        bounded(
            self.config.index.timeout_ms,
            "index upsert",
            self.index.upsert(&embeddings),
        )
        .await?;

        info!(
            "Ingested document {}: {} segments, {} chunks, model={}",
            document_id,
            segment_count,
            chunks.len(),
            model_version
        );
        Ok(IngestResult {
            document_id: document_id.to_string(),
            segment_count,
            chunk_count: chunks.len(),
            model_version,
        })
    }

    /// Remove a document's chunks and index entries. Idempotent;
    /// unknown documents are a no-op.
    pub async fn delete_document(&self, document_id: &str) -> Result<()> {
        self.purge(document_id).await
    }

    /// Answer a free-text question against the indexed content.
    pub async fn answer_question(
        &self,
        question: &str,
        scope: Option<&[String]>,
        k: Option<usize>,
    ) -> Result<AnswerResult> {
        self.rag.answer(question, scope, k).await
    }

    /// Delete index entries before store rows: if the index is down the
    /// store stays untouched and the purge can simply be retried.
    async fn purge(&self, document_id: &str) -> Result<()> {
        let chunk_ids = self.store.chunk_ids_for_document(document_id).await?;
        if chunk_ids.is_empty() {
            return Ok(());
        }
        bounded(
            self.config.index.timeout_ms,
            "index delete",
            self.index.delete(&chunk_ids),
        )
        .await?;
        let removed = self.store.delete_by_document(document_id).await?;
        debug!(
            "Purged {} chunks for document {}",
            removed.len(),
            document_id
        );
        Ok(())
    }
}

/// Run a pipeline step under a bounded timeout.
async fn bounded<T>(
    timeout_ms: u64,
    operation: &'static str,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match timeout(Duration::from_millis(timeout_ms), fut).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout {
            operation,
            elapsed_ms: timeout_ms,
        }),
    }
}
