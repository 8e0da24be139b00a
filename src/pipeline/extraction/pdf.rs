use std::path::Path;

use super::sanitize::normalize_text;
use super::types::{render_pages, PageText};
use super::ExtractionError;

/// Per-page text of a digital PDF (embedded text layer only, no OCR).
pub fn extract_pdf_pages(pdf_bytes: &[u8]) -> Result<Vec<PageText>, ExtractionError> {
    let page_texts = pdf_extract::extract_text_from_mem_by_pages(pdf_bytes)
        .map_err(|e| ExtractionError::PdfParsing(e.to_string()))?;

    Ok(page_texts
        .into_iter()
        .enumerate()
        .map(|(i, text)| PageText {
            page_number: i + 1,
            text: normalize_text(&text),
        })
        .collect())
}

pub fn extract_pdf(path: &Path) -> Result<String, ExtractionError> {
    let bytes = std::fs::read(path)?;
    let pages = extract_pdf_pages(&bytes)?;
    Ok(render_pages(&pages))
}
