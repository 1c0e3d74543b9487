//! PDF text extraction: one [`PageRecord`] per page that carries text.
//!
//! ## Why spawn_blocking?
//!
//! Parsing the xref table and decoding content streams is CPU-bound and can
//! take hundreds of milliseconds on a large annual report. Running it on the
//! blocking pool keeps the Tokio workers free to serve other requests.
//!
//! Blank pages are dropped from the record list but still counted in
//! `total_pages`, so `[PAGE n]` markers keep the document's real numbering.

use crate::error::AnalysisError;
use crate::output::{ExtractedDocument, PageRecord};
use crate::pipeline::input::check_pdf_magic;
use lopdf::Document;
use tracing::{debug, info};

/// Extract page text from PDF bytes on the blocking thread pool.
pub async fn extract_pages(bytes: &[u8]) -> Result<ExtractedDocument, AnalysisError> {
    let owned = bytes.to_vec();
    tokio::task::spawn_blocking(move || extract_pages_blocking(&owned))
        .await
        .map_err(|e| AnalysisError::Internal(format!("Extraction task panicked: {}", e)))?
}

/// Blocking implementation of page extraction.
pub fn extract_pages_blocking(bytes: &[u8]) -> Result<ExtractedDocument, AnalysisError> {
    check_pdf_magic(bytes)?;

    let document = Document::load_mem(bytes).map_err(|e| AnalysisError::CorruptPdf {
        detail: e.to_string(),
    })?;

    let pages = document.get_pages();
    let total_pages = pages.len();
    info!("PDF loaded: {} pages", total_pages);

    let mut records = Vec::with_capacity(total_pages);

    // get_pages() is a BTreeMap keyed by 1-based page number, so iteration
    // order is document order.
    for &page_num in pages.keys() {
        let text = document.extract_text(&[page_num]).map_err(|e| {
            AnalysisError::PageExtractionFailed {
                page: page_num,
                detail: e.to_string(),
            }
        })?;

        if text.trim().is_empty() {
            debug!("Page {}: no text, skipped", page_num);
            continue;
        }

        debug!("Page {}: {} chars", page_num, text.len());
        records.push(PageRecord {
            page: page_num as usize,
            text,
        });
    }

    Ok(ExtractedDocument {
        pages: records,
        total_pages,
    })
}
