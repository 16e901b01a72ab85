//! Per-query orchestration.
//!
//! State machine: Received → Embedding → Retrieving → Grounding →
//! Generating → Completed, with Failed reachable from any state.
//! Embedding/index outages and timeouts produce a `SearchUnavailable`
//! result; a generation failure still returns the retrieved passages.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info, warn};

use podium_core::{
    AnswerResult, AnswerStatus, Error, Passage, PipelineConfig, Result,
};
use podium_index::VectorIndex;
use podium_infer::{EmbedderBackend, GeneratorBackend};
use podium_store::ChunkStore;

use crate::prompt::{build_prompt, SYSTEM_PROMPT};

/// Pipeline state of one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    Received,
    Embedding,
    Retrieving,
    Grounding,
    Generating,
    Completed,
    Failed,
}

/// Answers free-text questions against the indexed content.
pub struct RagOrchestrator {
    embedder: Arc<dyn EmbedderBackend>,
    index: Arc<dyn VectorIndex>,
    store: Arc<dyn ChunkStore>,
    generator: Arc<dyn GeneratorBackend>,
    config: PipelineConfig,
}

impl RagOrchestrator {
    pub fn new(
        embedder: Arc<dyn EmbedderBackend>,
        index: Arc<dyn VectorIndex>,
        store: Arc<dyn ChunkStore>,
        generator: Arc<dyn GeneratorBackend>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            embedder,
            index,
            store,
            generator,
            config,
        }
    }

    /// Answer a question, optionally scoped to a set of document ids,
    /// optionally overriding K.
    ///
    /// Errors are reserved for caller mistakes (empty question) and
    /// misconfiguration (model version mismatch); operational failures
    /// come back as typed `AnswerStatus` values.
    pub async fn answer(
        &self,
        question: &str,
        scope: Option<&[String]>,
        k: Option<usize>,
    ) -> Result<AnswerResult> {
        let mut state = QueryState::Received;
        debug!(?state, "received question");

        if question.trim().is_empty() {
            return Err(Error::InvalidInput("question must not be empty".into()));
        }
        let retrieval = &self.config.retrieval;
        let k = k.unwrap_or(retrieval.default_k).clamp(1, retrieval.max_k);

        // Embedding
        state = QueryState::Embedding;
        debug!(?state, "embedding question");
        let vectors = match bounded(
            self.config.embedding.total_timeout_ms(),
            "question embedding",
            self.embedder.embed(&[question]),
        )
        .await
        {
            Ok(v) => v,
            Err(e @ (Error::EmbeddingUnavailable(_) | Error::Timeout { .. })) => {
                warn!("Search degraded, embedding unavailable: {e}");
                return Ok(AnswerResult::search_unavailable());
            }
            Err(e) => return Err(e),
        };
        let query_vector = vectors
            .into_iter()
            .next()
            .ok_or_else(|| Error::EmbeddingUnavailable("empty embedding batch".into()))?;

        // Retrieving. With a scope filter the index is over-queried up
        // to max_k, since it cannot filter by document natively.
        state = QueryState::Retrieving;
        let fetch_k = if scope.is_some() { retrieval.max_k } else { k };
        let hits = match bounded(
            self.config.index.timeout_ms,
            "index query",
            self.index
                .query(&query_vector, self.embedder.model_version(), fetch_k),
        )
        .await
        {
            Ok(hits) => hits,
            Err(e @ (Error::IndexUnavailable(_) | Error::Timeout { .. })) => {
                warn!("Search degraded, index unavailable: {e}");
                return Ok(AnswerResult::search_unavailable());
            }
            Err(e) => return Err(e),
        };
        debug!(?state, hit_count = hits.len(), "retrieved candidates");

        // Grounding
        state = QueryState::Grounding;
        debug!(?state, "resolving chunk text");
        let ids: Vec<String> = hits.iter().map(|h| h.chunk_id.clone()).collect();
        let resolved = self.store.get_many(&ids).await?;

        let mut passages: Vec<Passage> = Vec::with_capacity(hits.len());
        for (hit, chunk) in hits.iter().zip(resolved) {
            let Some(chunk) = chunk else {
                // Index entry pointing at a chunk the store no longer
                // has; logged, never fatal.
                let drift = Error::StoreDrift(format!(
                    "index returned chunk {} with no stored text",
                    hit.chunk_id
                ));
                warn!("{drift}");
                continue;
            };
            if hit.score < retrieval.min_score {
                continue;
            }
            if let Some(scope) = scope {
                if !scope.contains(&chunk.document_id) {
                    continue;
                }
            }
            passages.push(Passage {
                chunk_id: chunk.chunk_id,
                document_id: chunk.document_id,
                unit_kind: chunk.unit_kind,
                unit_number: chunk.unit_number,
                text: chunk.text,
                score: hit.score,
            });
        }
        passages.truncate(k);

        if passages.is_empty() {
            state = QueryState::Completed;
            debug!(?state, "no relevant content");
            return Ok(AnswerResult::no_relevant_content());
        }
        let confidence = passages[0].score.clamp(0.0, 1.0);

        // Generating
        state = QueryState::Generating;
        debug!(?state, passages = passages.len(), "generating answer");
        let prompt = build_prompt(question, &passages);
        match bounded(
            self.config.generation.timeout_ms,
            "answer generation",
            self.generator.generate(SYSTEM_PROMPT, &prompt),
        )
        .await
        {
            Ok(answer_text) => {
                state = QueryState::Completed;
                info!(
                    ?state,
                    passages = passages.len(),
                    confidence,
                    "answered question"
                );
                Ok(AnswerResult {
                    status: AnswerStatus::Answered,
                    answer_text: Some(answer_text),
                    passages,
                    confidence,
                })
            }
            Err(e) => {
                // Partial success: the passages were found, only the
                // summary is missing.
                state = QueryState::Failed;
                warn!(?state, "generation failed, returning passages only: {e}");
                Ok(AnswerResult {
                    status: AnswerStatus::GenerationUnavailable,
                    answer_text: None,
                    passages,
                    confidence,
                })
            }
        }
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
