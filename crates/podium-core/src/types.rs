//! Domain types shared across the pipeline.

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Declared type of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Pdf,
    Slides,
}

/// The addressable source unit a segment or chunk came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    Page,
    Slide,
}

impl std::fmt::Display for UnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnitKind::Page => write!(f, "page"),
            UnitKind::Slide => write!(f, "slide"),
        }
    }
}

/// One page or slide worth of extracted text. Transient: consumed by the
/// chunker, never persisted.
#[derive(Debug, Clone)]
pub struct Segment {
    pub document_id: String,
    /// 0-based position in extraction order.
    pub ordinal: usize,
    pub unit_kind: UnitKind,
    /// 1-based page/slide number.
    pub unit_number: u32,
    pub text: String,
}

/// A bounded-size window of segment text with source attribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_id: String,
    pub document_id: String,
    pub unit_kind: UnitKind,
    pub unit_number: u32,
    pub text: String,
    /// Char offsets into the source segment text.
    pub char_start: usize,
    pub char_end: usize,
}

impl Chunk {
    /// Deterministic chunk id: identical inputs always produce identical
    /// ids, which makes re-ingestion and retry idempotent.
    pub fn derive_id(
        document_id: &str,
        unit_kind: UnitKind,
        unit_number: u32,
        char_start: usize,
        char_end: usize,
    ) -> String {
        let mut hasher = Sha256::new();
        hasher.update(document_id.as_bytes());
        hasher.update([0u8]);
        hasher.update(format!("{unit_kind}/{unit_number}").as_bytes());
        hasher.update([0u8]);
        hasher.update(format!("{char_start}..{char_end}").as_bytes());
        let digest = hex::encode(hasher.finalize());
        digest[..32].to_string()
    }

    /// Human-readable source attribution, e.g. `page 2`.
    pub fn source_unit(&self) -> String {
        format!("{} {}", self.unit_kind, self.unit_number)
    }
}

/// A chunk vector tagged with the model version that produced it.
#[derive(Debug, Clone)]
pub struct Embedding {
    pub chunk_id: String,
    pub vector: Array1<f32>,
    pub model_version: String,
}

/// A retrieved passage supporting an answer, with provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passage {
    pub chunk_id: String,
    pub document_id: String,
    pub unit_kind: UnitKind,
    pub unit_number: u32,
    pub text: String,
    /// Similarity score from the index query.
    pub score: f32,
}

/// Typed outcome of a question, including the degraded paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerStatus {
    /// Generation succeeded; `answer_text` is grounded in `passages`.
    Answered,
    /// Nothing in the store was relevant enough; no text was generated.
    NoRelevantContent,
    /// Embedding backend or vector index could not be reached.
    SearchUnavailable,
    /// Passages were retrieved but the generative model failed.
    GenerationUnavailable,
}

/// Result of answering a question. Produced fresh per query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResult {
    pub status: AnswerStatus,
    pub answer_text: Option<String>,
    /// Supporting passages in descending-similarity order.
    pub passages: Vec<Passage>,
    /// Derived from the top similarity score, clamped to [0, 1].
    pub confidence: f32,
}

impl AnswerResult {
    pub fn no_relevant_content() -> Self {
        Self {
            status: AnswerStatus::NoRelevantContent,
            answer_text: None,
            passages: Vec::new(),
            confidence: 0.0,
        }
    }

    pub fn search_unavailable() -> Self {
        Self {
            status: AnswerStatus::SearchUnavailable,
            answer_text: None,
            passages: Vec::new(),
            confidence: 0.0,
        }
    }
}

/// Result of ingesting one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResult {
    pub document_id: String,
    pub segment_count: usize,
    pub chunk_count: usize,
    /// Version tag of the vectors written for this document.
    pub model_version: String,
}
