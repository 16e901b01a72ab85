//! Qdrant-style REST index client.
//!
//! Speaks the collections/points REST surface: `PUT .../points` for
//! upsert, `POST .../points/search` for queries, `POST .../points/delete`
//! for removal. Point ids are the chunk ids reformatted as UUIDs (chunk
//! ids are 32 hex chars, which is exactly a UUID without dashes).
//! Transport failures surface as `IndexUnavailable`.

use async_trait::async_trait;
use ndarray::Array1;
use serde_json::json;
use tracing::debug;

use podium_core::{Embedding, Error, IndexConfig, Result};

use crate::{ScoredId, VectorIndex, MAX_K};

/// Client for an external Qdrant-style vector index.
pub struct HttpIndex {
    client: reqwest::Client,
    base_url: String,
    collection: String,
    dimension: usize,
    model_version: String,
}

impl HttpIndex {
    pub fn new(config: &IndexConfig, dimension: usize, model_version: impl Into<String>) -> Result<Self> {
        let base_url = config
            .endpoint
            .clone()
            .ok_or_else(|| Error::Config("HttpIndex requires an endpoint".into()))?;
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(config.timeout_ms))
            .build()
            .unwrap_or_default();
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            collection: config.collection.clone(),
            dimension,
            model_version: model_version.into(),
        })
    }

    /// Create the collection if it does not exist yet.
    pub async fn ensure_collection(&self) -> Result<()> {
        let url = format!("{}/collections/{}", self.base_url, self.collection);
        let body = json!({
            "vectors": { "size": self.dimension, "distance": "Cosine" }
        });
        let response = self
            .client
            .put(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::IndexUnavailable(format!("request failed: {e}")))?;
        // Conflict means the collection already exists.
        if response.status().is_success() || response.status().as_u16() == 409 {
            Ok(())
        } else {
            Err(Error::IndexUnavailable(format!(
                "collection setup failed with status {}",
                response.status()
            )))
        }
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

    fn points_url(&self, suffix: &str) -> String {
        format!(
            "{}/collections/{}/points{}",
            self.base_url, self.collection, suffix
        )
    }
}

/// Format a 32-hex-char chunk id as a UUID point id.
fn chunk_id_to_point(chunk_id: &str) -> Result<String> {
    if chunk_id.len() != 32 || !chunk_id.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::InvalidInput(format!(
            "chunk id is not 32 hex chars: {chunk_id}"
        )));
    }
    Ok(format!(
        "{}-{}-{}-{}-{}",
        &chunk_id[0..8],
        &chunk_id[8..12],
        &chunk_id[12..16],
        &chunk_id[16..20],
        &chunk_id[20..32]
    ))
}

/// Inverse of [`chunk_id_to_point`].
fn point_to_chunk_id(point_id: &str) -> String {
    point_id.replace('-', "")
}

#[async_trait]
impl VectorIndex for HttpIndex {
    async fn upsert(&self, embeddings: &[Embedding]) -> Result<()> {
        if embeddings.is_empty() {
            return Ok(());
        }
        let mut points = Vec::with_capacity(embeddings.len());
        for embedding in embeddings {
            self.check_version(&embedding.model_version)?;
            points.push(json!({
                "id": chunk_id_to_point(&embedding.chunk_id)?,
                "vector": embedding.vector.to_vec(),
                "payload": { "model_version": embedding.model_version },
            }));
        }

        let response = self
            .client
            .put(self.points_url("?wait=true"))
            .json(&json!({ "points": points }))
            .send()
            .await
            .map_err(|e| Error::IndexUnavailable(format!("upsert failed: {e}")))?;
        if !response.status().is_success() {
            return Err(Error::IndexUnavailable(format!(
                "upsert failed with status {}",
                response.status()
            )));
        }
        debug!("Upserted {} points", embeddings.len());
        Ok(())
    }

    async fn query(
        &self,
        vector: &Array1<f32>,
        model_version: &str,
        k: usize,
    ) -> Result<Vec<ScoredId>> {
        self.check_version(model_version)?;

        let body = json!({
            "vector": vector.to_vec(),
            "limit": k.min(MAX_K),
            "with_payload": false,
        });
        let response = self
            .client
            .post(self.points_url("/search"))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::IndexUnavailable(format!("search failed: {e}")))?;
        if !response.status().is_success() {
            return Err(Error::IndexUnavailable(format!(
                "search failed with status {}",
                response.status()
            )));
        }

        let parsed: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::IndexUnavailable(format!("bad search response: {e}")))?;
        let hits = parsed["result"]
            .as_array()
            .ok_or_else(|| Error::IndexUnavailable("search response has no result".into()))?;

        Ok(hits
            .iter()
            .filter_map(|hit| {
                let id = hit["id"].as_str()?;
                let score = hit["score"].as_f64()? as f32;
                Some(ScoredId {
                    chunk_id: point_to_chunk_id(id),
                    score,
                })
            })
            .collect())
    }

    async fn delete(&self, chunk_ids: &[String]) -> Result<()> {
        if chunk_ids.is_empty() {
            return Ok(());
        }
        let points: Vec<String> = chunk_ids
            .iter()
            .map(|id| chunk_id_to_point(id))
            .collect::<Result<_>>()?;
        let response = self
            .client
            .post(self.points_url("/delete?wait=true"))
            .json(&json!({ "points": points }))
            .send()
            .await
            .map_err(|e| Error::IndexUnavailable(format!("delete failed: {e}")))?;
        if !response.status().is_success() {
            return Err(Error::IndexUnavailable(format!(
                "delete failed with status {}",
                response.status()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_id_roundtrip() {
        let chunk_id = "0123456789abcdef0123456789abcdef";
        let point = chunk_id_to_point(chunk_id).unwrap();
        assert_eq!(point, "01234567-89ab-cdef-0123-456789abcdef");
        assert_eq!(point_to_chunk_id(&point), chunk_id);
    }

    #[test]
    fn test_malformed_chunk_id_rejected() {
        assert!(chunk_id_to_point("short").is_err());
        assert!(chunk_id_to_point("zz23456789abcdef0123456789abcdef").is_err());
    }
}
