//! Embedding backends.
//!
//! `HttpEmbedder` calls an OpenAI-compatible `/embeddings` endpoint.
//! `HashEmbedder` is the degraded-mode backend: deterministic
//! feature-hashed bag-of-words vectors, so token overlap produces
//! correlated similarity without any network access.

use async_trait::async_trait;
use ndarray::Array1;
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::warn;

use podium_core::config::RETRY_BACKOFF_STEP_MS;
use podium_core::{EmbeddingConfig, Error, Result};

/// Model version tag for the degraded-mode embedder. Vectors carrying
/// this tag must never be queried against live-model vectors.
pub const MOCK_MODEL_VERSION: &str = "mock";

/// Trait for embedding backends.
///
/// Output order matches input order exactly; callers rely on positional
/// correspondence between texts and vectors.
#[async_trait]
pub trait EmbedderBackend: Send + Sync {
    /// Embed a batch of texts. One vector per input, same order.
    async fn embed(&self, texts: &[&str]) -> Result<Vec<Array1<f32>>>;

    /// Fixed output dimension.
    fn dimension(&self) -> usize;

    /// Version tag recorded with every vector this backend produces.
    fn model_version(&self) -> &str;
}

// ---------------------------------------------------------------
// Degraded mode
// ---------------------------------------------------------------

/// Deterministic mock embedder.
///
/// Each token is hashed into a bucket with a hash-derived sign
/// (classic feature hashing); the result is L2-normalized. The same
/// text always yields the same vector.
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    fn embed_one(&self, text: &str) -> Array1<f32> {
        let mut vector = Array1::<f32>::zeros(self.dim);
        for token in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let digest = Sha256::digest(token.as_bytes());
            let bucket =
                u64::from_le_bytes(digest[..8].try_into().unwrap()) as usize % self.dim;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }
        let norm = vector.dot(&vector).sqrt();
        if norm > 1e-9 {
            vector /= norm;
        }
        vector
    }
}

#[async_trait]
impl EmbedderBackend for HashEmbedder {
    async fn embed(&self, texts: &[&str]) -> Result<Vec<Array1<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn model_version(&self) -> &str {
        MOCK_MODEL_VERSION
    }
}

// ---------------------------------------------------------------
// Live backend
// ---------------------------------------------------------------

/// Embedder backed by an OpenAI-compatible `/embeddings` endpoint.
pub struct HttpEmbedder {
    client: reqwest::Client,
    config: EmbeddingConfig,
}

impl HttpEmbedder {
    pub fn new(config: EmbeddingConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(config.timeout_ms))
            .build()
            .unwrap_or_default();
        Self { client, config }
    }

    async fn call(&self, texts: &[&str]) -> Result<Vec<Array1<f32>>> {
        let endpoint = self
            .config
            .endpoint
            .as_deref()
            .ok_or_else(|| Error::Config("HttpEmbedder requires an endpoint".into()))?;

        let body = json!({
            "model": self.config.model,
            "input": texts,
        });

        let mut request = self.client.post(endpoint).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::EmbeddingUnavailable(format!("request failed: {e}")))?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::EmbeddingUnavailable(format!(
                "API error {status}: {text}"
            )));
        }

        let parsed: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::EmbeddingUnavailable(format!("bad response body: {e}")))?;
        let data = parsed["data"]
            .as_array()
            .ok_or_else(|| Error::EmbeddingUnavailable("response has no data array".into()))?;
        if data.len() != texts.len() {
            return Err(Error::EmbeddingUnavailable(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                data.len()
            )));
        }

        // The API may reorder entries; `index` restores input order.
        let mut vectors: Vec<Option<Array1<f32>>> = vec![None; texts.len()];
        for entry in data {
            let index = entry["index"]
                .as_u64()
                .ok_or_else(|| Error::EmbeddingUnavailable("entry missing index".into()))?
                as usize;
            let values = entry["embedding"]
                .as_array()
                .ok_or_else(|| Error::EmbeddingUnavailable("entry missing embedding".into()))?;
            if values.len() != self.config.dimension {
                return Err(Error::EmbeddingUnavailable(format!(
                    "expected dimension {}, got {}",
                    self.config.dimension,
                    values.len()
                )));
            }
            let vector: Array1<f32> =
                values.iter().map(|v| v.as_f64().unwrap_or(0.0) as f32).collect();
            if index >= vectors.len() {
                return Err(Error::EmbeddingUnavailable(format!(
                    "embedding index {index} out of range"
                )));
            }
            vectors[index] = Some(vector);
        }
        vectors
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| Error::EmbeddingUnavailable("response missing entries".into()))
    }
}

#[async_trait]
impl EmbedderBackend for HttpEmbedder {
    async fn embed(&self, texts: &[&str]) -> Result<Vec<Array1<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let mut last_err = None;
        for attempt in 0..=self.config.max_retries {
            match self.call(texts).await {
                Ok(vectors) => return Ok(vectors),
                Err(e) => {
                    warn!(
                        "Embedding attempt {}/{} failed: {}",
                        attempt + 1,
                        self.config.max_retries + 1,
                        e
                    );
                    last_err = Some(e);
                    if attempt < self.config.max_retries {
                        tokio::time::sleep(std::time::Duration::from_millis(
                            RETRY_BACKOFF_STEP_MS * (attempt as u64 + 1),
                        ))
                        .await;
                    }
                }
            }
        }
        Err(last_err
            .unwrap_or_else(|| Error::EmbeddingUnavailable("retries exhausted".into())))
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn model_version(&self) -> &str {
        self.config.version_tag()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &Array1<f32>, b: &Array1<f32>) -> f32 {
        a.dot(b)
    }

    #[tokio::test]
    async fn test_hash_embedder_deterministic() {
        let embedder = HashEmbedder::new(64);
        let a = embedder.embed(&["revenue grew forty percent"]).await.unwrap();
        let b = embedder.embed(&["revenue grew forty percent"]).await.unwrap();
        assert_eq!(a[0], b[0]);
        assert_eq!(a[0].len(), 64);
    }

    #[tokio::test]
    async fn test_hash_embedder_output_order_matches_input() {
        let embedder = HashEmbedder::new(64);
        let batch = embedder.embed(&["alpha", "beta", "gamma"]).await.unwrap();
        let alpha = embedder.embed(&["alpha"]).await.unwrap();
        let gamma = embedder.embed(&["gamma"]).await.unwrap();
        assert_eq!(batch[0], alpha[0]);
        assert_eq!(batch[2], gamma[0]);
    }

    #[tokio::test]
    async fn test_token_overlap_raises_similarity() {
        let embedder = HashEmbedder::new(256);
        let vs = embedder
            .embed(&[
                "quarterly revenue grew substantially",
                "how much did revenue grow this quarter",
                "the venue has excellent catering options",
            ])
            .await
            .unwrap();
        // Vectors are normalized, so dot product is cosine similarity.
        let related = cosine(&vs[0], &vs[1]);
        let unrelated = cosine(&vs[2], &vs[1]);
        assert!(
            related > unrelated,
            "expected overlap to score higher: {related} vs {unrelated}"
        );
    }

    #[tokio::test]
    async fn test_empty_text_embeds_to_zero_vector() {
        let embedder = HashEmbedder::new(32);
        let vs = embedder.embed(&[""]).await.unwrap();
        assert!(vs[0].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_mock_version_tag() {
        let embedder = HashEmbedder::new(32);
        assert_eq!(embedder.model_version(), MOCK_MODEL_VERSION);
    }
}
