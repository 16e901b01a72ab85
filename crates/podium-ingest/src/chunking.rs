//! Text chunking.
//!
//! Splits one segment into contiguous windows of at most
//! `max_chunk_chars`, with `overlap_chars` of trailing context repeated
//! between consecutive windows. Offsets are char offsets into the
//! segment text; windows never split a UTF-8 scalar and never cross a
//! page/slide boundary (the chunker only ever sees one segment).

use podium_core::{Chunk, ChunkingConfig, Segment};

/// Chunk a segment into bounded windows.
///
/// Deterministic: the same segment and config always produce identical
/// chunk boundaries, text, and ids. Empty (or whitespace-only) segment
/// text produces zero chunks; text shorter than the window produces
/// exactly one.
pub fn chunk_segment(segment: &Segment, config: &ChunkingConfig) -> Vec<Chunk> {
    if segment.text.trim().is_empty() {
        return Vec::new();
    }

    let chars: Vec<char> = segment.text.chars().collect();
    let total = chars.len();
    let window = config.max_chunk_chars;
    // Floored at one char: an overlap >= the window must not stall the
    // walk, even though `ChunkingConfig::validate` rejects it.
    let step = window.saturating_sub(config.overlap_chars).max(1);

    let mut chunks = Vec::new();
    let mut start = 0usize;
    loop {
        let end = (start + window).min(total);
        let text: String = chars[start..end].iter().collect();
        chunks.push(Chunk {
            chunk_id: Chunk::derive_id(
                &segment.document_id,
                segment.unit_kind,
                segment.unit_number,
                start,
                end,
            ),
            document_id: segment.document_id.clone(),
            unit_kind: segment.unit_kind,
            unit_number: segment.unit_number,
            text,
            char_start: start,
            char_end: end,
        });
        if end == total {
            break;
        }
        start += step;
    }
    chunks
}
