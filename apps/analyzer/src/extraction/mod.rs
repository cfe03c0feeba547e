//! Document text extraction.
//!
//! The set of formats is closed: `DocumentFormat` names every supported
//! extension and `Extractors::for_format` maps each one to exactly one
//! `TextExtractor`. Selection is by declared extension only, never by
//! sniffing the bytes.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

pub mod docx;
pub mod pdf;

pub use docx::DocxExtractor;
pub use pdf::PdfExtractor;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("DOCX archive is malformed: {0}")]
    Archive(String),

    #[error("DOCX part '{0}' is missing")]
    MissingPart(String),

    #[error("DOCX XML is malformed: {0}")]
    Xml(String),

    #[error("extractor aborted: {0}")]
    Aborted(String),
}

/// Supported upload formats, keyed by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

impl DocumentFormat {
    pub const ALL: [DocumentFormat; 2] = [DocumentFormat::Pdf, DocumentFormat::Docx];

    /// Case-insensitive lookup of an extension without its leading dot.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "pdf" => Some(DocumentFormat::Pdf),
            "docx" => Some(DocumentFormat::Docx),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
        }
    }

    /// Human-readable list of accepted extensions, e.g. `pdf or docx`.
    pub fn supported() -> String {
        Self::ALL
            .iter()
            .map(|format| format.extension())
            .collect::<Vec<_>>()
            .join(" or ")
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Plain text pulled out of a document, whitespace-normalized.
///
/// Runs of spaces and tabs collapse to one space, every line is trimmed and
/// consecutive blank lines collapse to a single paragraph break. May be empty:
/// deciding whether empty text is fatal belongs to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtractedText(String);

impl ExtractedText {
    pub fn new(raw: &str) -> Self {
        let mut out = String::with_capacity(raw.len());
        let mut paragraph_break = false;
        for line in raw.lines() {
            let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
            if collapsed.is_empty() {
                paragraph_break = !out.is_empty();
                continue;
            }
            if !out.is_empty() {
                out.push('\n');
                if paragraph_break {
                    out.push('\n');
                }
            }
            paragraph_break = false;
            out.push_str(&collapsed);
        }
        Self(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }
}

/// Converts the raw bytes of one document format into text.
pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, bytes: &[u8]) -> Result<ExtractedText, ExtractionError>;
}

/// One extractor per `DocumentFormat`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Extractors {
    pdf: PdfExtractor,
    docx: DocxExtractor,
}

impl Extractors {
    pub fn new(docx: DocxExtractor) -> Self {
        Self {
            pdf: PdfExtractor,
            docx,
        }
    }

    pub fn for_format(&self, format: DocumentFormat) -> &dyn TextExtractor {
        match format {
            DocumentFormat::Pdf => &self.pdf,
            DocumentFormat::Docx => &self.docx,
        }
    }
}
