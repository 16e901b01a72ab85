//! Podium Core — error taxonomy, pipeline configuration, domain types.
//!
//! Podium is the ingestion and retrieval core of a conference-content
//! system: uploaded PDFs and slide decks become page/slide-addressable
//! chunks, which are embedded, indexed, and served back as grounded,
//! citable answers to free-text questions.

pub mod config;
pub mod error;
pub mod types;

pub use config::{
    ChunkingConfig, EmbeddingConfig, GenerationConfig, IndexConfig, PipelineConfig,
    RetrievalConfig,
};
pub use error::{Error, Result};
pub use types::{
    AnswerResult, AnswerStatus, Chunk, DocumentType, Embedding, IngestResult, Passage, Segment,
    UnitKind,
};
