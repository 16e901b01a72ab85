//! Slide deck extraction.
//!
//! A `.pptx` deck is a ZIP archive with one `ppt/slides/slideN.xml`
//! member per slide. Text lives in `<a:t>` runs; all runs on a slide are
//! concatenated in document order with a newline separator. Slide order
//! follows the numeric `N`, not lexical member order (slide10 sorts
//! after slide9).

use std::io::{Cursor, Read};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;
use zip::ZipArchive;

use podium_core::{Error, Result, Segment, UnitKind};

static SLIDE_PATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ppt/slides/slide(\d+)\.xml$").unwrap());
static TEXT_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<a:t(?:\s[^>]*)?>(.*?)</a:t>").unwrap());

/// One segment per slide, 1-based slide numbers.
pub(crate) fn extract_slides(document_id: &str, bytes: &[u8]) -> Result<Vec<Segment>> {
    let extraction_err = |reason: String| Error::Extraction {
        document_id: document_id.to_string(),
        reason,
    };

    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| extraction_err(format!("failed to open deck archive: {e}")))?;

    let mut slide_members: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| {
            let caps = SLIDE_PATH_RE.captures(name)?;
            let n: u32 = caps[1].parse().ok()?;
            Some((n, name.to_string()))
        })
        .collect();
    if slide_members.is_empty() {
        return Err(extraction_err("archive contains no slides".to_string()));
    }
    slide_members.sort_by_key(|(n, _)| *n);

    let mut segments = Vec::with_capacity(slide_members.len());
    for (ordinal, (_, member)) in slide_members.iter().enumerate() {
        let mut xml = String::new();
        archive
            .by_name(member)
            .map_err(|e| extraction_err(format!("failed to read {member}: {e}")))?
            .read_to_string(&mut xml)
            .map_err(|e| extraction_err(format!("failed to read {member}: {e}")))?;

        let runs: Vec<String> = TEXT_RUN_RE
            .captures_iter(&xml)
            .map(|c| unescape_xml(&c[1]))
            .filter(|t| !t.is_empty())
            .collect();

        segments.push(Segment {
            document_id: document_id.to_string(),
            ordinal,
            unit_kind: UnitKind::Slide,
            unit_number: (ordinal + 1) as u32,
            text: runs.join("\n"),
        });
    }

    debug!(
        "Extracted {} slide segments from document {}",
        segments.len(),
        document_id
    );
    Ok(segments)
}

/// Decode the five predefined XML entities.
fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
