//! Pipeline configuration.
//!
//! Every component takes its settings from this struct at construction.
//! Nothing in the pipeline reads environment variables; the embedding
//! host process decides where values come from.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Linear backoff step between embedding retry attempts.
pub const RETRY_BACKOFF_STEP_MS: u64 = 200;

/// Top-level configuration for the ingestion and retrieval pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub embedding: EmbeddingConfig,
    pub generation: GenerationConfig,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub index: IndexConfig,
}

impl PipelineConfig {
    /// Validate cross-field invariants.
    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;
        if self.retrieval.default_k == 0 || self.retrieval.default_k > self.retrieval.max_k {
            return Err(Error::Config(format!(
                "default_k must be in 1..={}, got {}",
                self.retrieval.max_k, self.retrieval.default_k
            )));
        }
        if self.embedding.dimension == 0 {
            return Err(Error::Config("embedding dimension must be non-zero".into()));
        }
        if self.embedding.batch_size == 0 {
            return Err(Error::Config("embedding batch_size must be non-zero".into()));
        }
        Ok(())
    }
}

/// Embedding model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Model identifier sent to the backend.
    pub model: String,
    /// Version tag stored with every vector. Defaults to the model id.
    pub model_version: Option<String>,
    /// Embedding dimension (384 for all-MiniLM-class models).
    pub dimension: usize,
    /// OpenAI-compatible `/embeddings` endpoint. None selects the
    /// deterministic mock backend.
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    /// Texts per backend call.
    pub batch_size: usize,
    pub max_retries: u32,
    pub timeout_ms: u64,
}

impl EmbeddingConfig {
    /// The version tag recorded alongside vectors produced by the live
    /// backend.
    pub fn version_tag(&self) -> &str {
        self.model_version.as_deref().unwrap_or(&self.model)
    }

    /// Budget for one `embed` call including every retry attempt and the
    /// backoff sleeps between them. `timeout_ms` alone bounds a single
    /// HTTP request; an outer timeout must use this figure or retries
    /// never get to run.
    pub fn total_timeout_ms(&self) -> u64 {
        let attempts = self.max_retries as u64 + 1;
        let backoff: u64 = (1..=self.max_retries as u64)
            .map(|n| RETRY_BACKOFF_STEP_MS * n)
            .sum();
        self.timeout_ms * attempts + backoff
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            model_version: None,
            dimension: 384,
            endpoint: None,
            api_key: None,
            batch_size: 32,
            max_retries: 3,
            timeout_ms: 10_000,
        }
    }
}

/// Generative model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Model identifier sent to the backend.
    pub model: String,
    /// OpenAI-compatible `/chat/completions` endpoint.
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub temperature: f64,
    pub max_tokens: usize,
    pub timeout_ms: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            endpoint: None,
            api_key: None,
            temperature: 0.2,
            max_tokens: 512,
            timeout_ms: 30_000,
        }
    }
}

/// Chunk window sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk length in chars.
    pub max_chunk_chars: usize,
    /// Trailing context repeated between consecutive windows.
    pub overlap_chars: usize,
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_chunk_chars == 0 {
            return Err(Error::Config("max_chunk_chars must be non-zero".into()));
        }
        if self.overlap_chars >= self.max_chunk_chars {
            return Err(Error::Config(format!(
                "overlap_chars ({}) must be smaller than max_chunk_chars ({})",
                self.overlap_chars, self.max_chunk_chars
            )));
        }
        Ok(())
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: 1000,
            overlap_chars: 150,
        }
    }
}

/// Retrieval settings for question answering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Passages retrieved per question when the caller gives no override.
    pub default_k: usize,
    /// Hard cap on K; bounds per-query index cost.
    pub max_k: usize,
    /// Similarity floor below which a passage is not considered relevant.
    pub min_score: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_k: 5,
            max_k: 50,
            min_score: 0.3,
        }
    }
}

/// Vector index connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// REST endpoint of the external index. None selects the in-memory
    /// index.
    pub endpoint: Option<String>,
    pub collection: String,
    pub timeout_ms: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            collection: "podium-chunks".to_string(),
            timeout_ms: 10_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        PipelineConfig::default().validate().unwrap();
    }

    #[test]
    fn test_overlap_must_be_smaller_than_window() {
        let cfg = ChunkingConfig {
            max_chunk_chars: 100,
            overlap_chars: 100,
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_default_k_bounded_by_max_k() {
        let mut cfg = PipelineConfig::default();
        cfg.retrieval.default_k = 100;
        cfg.retrieval.max_k = 50;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_total_timeout_covers_all_attempts() {
        let cfg = EmbeddingConfig {
            timeout_ms: 1_000,
            max_retries: 3,
            ..Default::default()
        };
        // 4 attempts plus 200/400/600ms of backoff between them.
        assert_eq!(cfg.total_timeout_ms(), 4_000 + 1_200);

        let cfg = EmbeddingConfig {
            timeout_ms: 1_000,
            max_retries: 0,
            ..Default::default()
        };
        assert_eq!(cfg.total_timeout_ms(), 1_000);
    }

    #[test]
    fn test_version_tag_falls_back_to_model() {
        let cfg = EmbeddingConfig::default();
        assert_eq!(cfg.version_tag(), "text-embedding-3-small");

        let cfg = EmbeddingConfig {
            model_version: Some("v2".into()),
            ..Default::default()
        };
        assert_eq!(cfg.version_tag(), "v2");
    }
}
