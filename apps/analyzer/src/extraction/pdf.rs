//! PDF text-layer extraction via `pdf-extract`.

use tracing::debug;

use super::{ExtractedText, ExtractionError, TextExtractor};

/// Inserted between the text of consecutive pages.
pub const PAGE_SEPARATOR: &str = "\n\n";

/// Renders each page's text layer in page order.
///
/// A parseable PDF with no text layer (scanned, image-only pages) yields empty
/// text rather than an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn extract_text(&self, bytes: &[u8]) -> Result<ExtractedText, ExtractionError> {
        let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
            .map_err(|e| ExtractionError::Pdf(e.to_string()))?;

        let joined = pages
            .iter()
            .map(|page| page.trim())
            .filter(|page| !page.is_empty())
            .collect::<Vec<_>>()
            .join(PAGE_SEPARATOR);

        let text = ExtractedText::new(&joined);
        debug!(
            pages = pages.len(),
            chars = text.char_count(),
            "PDF text layer extracted"
        );
        Ok(text)
    }
}
