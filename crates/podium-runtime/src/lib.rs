//! Podium Runtime — the pipeline facade.
//!
//! Wires extractor, chunker, embedder, index, store, and the RAG
//! orchestrator together and exposes the three verbs the surrounding
//! application calls: `ingest`, `delete_document`, `answer_question`.

pub mod pipeline;

pub use pipeline::IngestionPipeline;
