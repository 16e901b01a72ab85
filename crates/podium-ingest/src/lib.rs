//! Podium Ingest — text extraction and chunking.
//!
//! `extract` turns an uploaded document into an ordered sequence of
//! page/slide segments; `chunk_segment` splits each segment into
//! bounded-size windows that keep their source attribution.

pub mod chunking;
pub mod extract;

pub use chunking::chunk_segment;
pub use extract::extract;
