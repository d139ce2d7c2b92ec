//! PDF text extraction.
//!
//! Extracts text page by page, interleaving `--- Page i of N ---` markers
//! between page texts. Pages that yield no text are skipped silently; a
//! document where no page yields text is an error.

use crate::error::EngineError;

/// Extract plain text from a PDF byte buffer.
///
/// # Errors
///
/// - [`EngineError::Extraction`] when the PDF cannot be parsed.
/// - [`EngineError::EmptyContent`] when zero pages yield readable text.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, EngineError> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| EngineError::Extraction(e.to_string()))?;

    let total_pages = pages.len();
    let mut extracted = String::new();

    for (page_num, page_text) in pages.iter().enumerate() {
        let trimmed = page_text.trim();
        if trimmed.is_empty() {
            continue;
        }
        extracted.push_str(&format!(
            "\n--- Page {} of {} ---\n",
            page_num + 1,
            total_pages
        ));
        extracted.push_str(trimmed);
        extracted.push('\n');
    }

    let extracted = extracted.trim().to_string();
    if extracted.is_empty() {
        return Err(EngineError::EmptyContent);
    }

    Ok(extracted)
}
