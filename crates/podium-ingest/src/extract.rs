//! Text extraction dispatch.
//!
//! One pass per document: a PDF yields one segment per physical page, a
//! slide deck one segment per slide. Segments keep 1-based unit numbers
//! so citations can point at the exact page/slide. Pages or slides with
//! no extractable text yield empty segments; callers filter, not fail.

pub mod pdf;
pub mod slides;

use podium_core::{DocumentType, Result, Segment};

/// Extract ordered segments from an uploaded document.
///
/// Unreadable or corrupt input fails with `Error::Extraction` carrying
/// the document id; nothing is indexed for the document in that case.
pub fn extract(document_id: &str, bytes: &[u8], doc_type: DocumentType) -> Result<Vec<Segment>> {
    match doc_type {
        DocumentType::Pdf => pdf::extract_pages(document_id, bytes),
        DocumentType::Slides => slides::extract_slides(document_id, bytes),
    }
}
