//! Request encoding: page records → marked document, PDF bytes → inline part.
//!
//! The quarterly template sends extracted text where every page is introduced
//! by a `[PAGE n]` line, so the model can cite page numbers. The consolidated
//! template sends the PDF itself as a base64 inline part and lets the model
//! read tables from the original layout.

use crate::output::PageRecord;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

/// MIME type of inline PDF parts.
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Marker line placed before the text of page `page`.
pub fn page_marker(page: usize) -> String {
    format!("[PAGE {}]", page)
}

/// Join page records into one document string.
///
/// Each page becomes `[PAGE n]\n<text>`; pages are joined with `\n` in
/// ascending page order regardless of input order. Pure and deterministic.
pub fn mark_pages(pages: &[PageRecord]) -> String {
    let mut ordered: Vec<&PageRecord> = pages.iter().collect();
    ordered.sort_by_key(|p| p.page);

    let marked = ordered
        .iter()
        .map(|p| format!("{}\n{}", page_marker(p.page), p.text))
        .collect::<Vec<_>>()
        .join("\n");

    debug!("Marked {} pages → {} bytes", ordered.len(), marked.len());
    marked
}

/// Inline binary payload for the model request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineData {
    pub mime_type: String,
    /// Base64 (standard alphabet, padded).
    pub data: String,
}

/// Encode PDF bytes as an inline part.
pub fn encode_pdf(bytes: &[u8]) -> InlineData {
    let data = STANDARD.encode(bytes);
    debug!("Encoded PDF → {} bytes base64", data.len());
    InlineData {
        mime_type: PDF_MIME_TYPE.to_string(),
        data,
    }
}
