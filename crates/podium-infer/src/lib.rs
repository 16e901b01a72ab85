//! Podium Infer — embedding and generation backends.
//!
//! `EmbedderBackend` and `GeneratorBackend` abstract over the external
//! models. With an endpoint configured the live HTTP implementations are
//! used; without one the pipeline runs in degraded mode on deterministic
//! mocks, so ingestion and retrieval stay exercisable offline.

pub mod embedder;
pub mod generator;

pub use embedder::{EmbedderBackend, HashEmbedder, HttpEmbedder, MOCK_MODEL_VERSION};
pub use generator::{CannedGenerator, GeneratorBackend, HttpGenerator};

use std::sync::Arc;

use podium_core::{EmbeddingConfig, GenerationConfig};

/// Select the embedder for the given configuration.
///
/// An endpoint selects the live HTTP backend; no endpoint selects the
/// deterministic mock tagged with the `"mock"` model version.
pub fn create_embedder(config: &EmbeddingConfig) -> Arc<dyn EmbedderBackend> {
    match &config.endpoint {
        Some(endpoint) => {
            tracing::info!(
                "Using HTTP embedder: model={}, endpoint={}",
                config.model,
                endpoint
            );
            Arc::new(HttpEmbedder::new(config.clone()))
        }
        None => {
            tracing::info!(
                "No embedding endpoint configured; using deterministic mock (dim={})",
                config.dimension
            );
            Arc::new(HashEmbedder::new(config.dimension))
        }
    }
}

/// Select the generator for the given configuration.
pub fn create_generator(config: &GenerationConfig) -> Arc<dyn GeneratorBackend> {
    match &config.endpoint {
        Some(endpoint) => {
            tracing::info!(
                "Using HTTP generator: model={}, endpoint={}",
                config.model,
                endpoint
            );
            Arc::new(HttpGenerator::new(config.clone()))
        }
        None => {
            tracing::info!("No generation endpoint configured; using canned generator");
            Arc::new(CannedGenerator::default())
        }
    }
}
