//! PDF page extraction via `lopdf`.
//!
//! `lopdf`'s own `extract_text` is used per page rather than a
//! whole-document pass so page attribution stays exact.

use lopdf::Document;
use tracing::{debug, warn};

use podium_core::{Error, Result, Segment, UnitKind};

/// One segment per physical page, in page order, 1-based page numbers.
pub(crate) fn extract_pages(document_id: &str, bytes: &[u8]) -> Result<Vec<Segment>> {
    let doc = Document::load_mem(bytes).map_err(|e| Error::Extraction {
        document_id: document_id.to_string(),
        reason: format!("failed to parse PDF: {e}"),
    })?;

    let pages = doc.get_pages();
    let mut segments = Vec::with_capacity(pages.len());
    for (ordinal, (&page_number, _)) in pages.iter().enumerate() {
        // A page that cannot be decoded degrades to an empty segment,
        // same as a page with no text at all.
        let text = match doc.extract_text(&[page_number]) {
            Ok(t) => t,
            Err(e) => {
                warn!(
                    "No extractable text on page {} of document {}: {}",
                    page_number, document_id, e
                );
                String::new()
            }
        };
        segments.push(Segment {
            document_id: document_id.to_string(),
            ordinal,
            unit_kind: UnitKind::Page,
            unit_number: page_number,
            text,
        });
    }

    debug!(
        "Extracted {} page segments from document {}",
        segments.len(),
        document_id
    );
    Ok(segments)
}
