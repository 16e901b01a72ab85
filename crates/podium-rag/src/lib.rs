//! Podium RAG — grounded question answering.
//!
//! Each query runs a fixed chain: embed the question, retrieve the
//! nearest chunks, ground them against the chunk store, generate an
//! answer from the grounded passages. Every external failure degrades
//! to a typed `AnswerStatus` instead of surfacing a transport error.

pub mod orchestrator;
pub mod prompt;

pub use orchestrator::{QueryState, RagOrchestrator};
