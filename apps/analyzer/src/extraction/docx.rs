//! DOCX (OOXML WordprocessingML) text extraction.
//!
//! Reads `word/document.xml` out of the ZIP container and keeps only the
//! contents of `<w:t>` runs. Paragraph ends and `<w:br/>` become newlines,
//! `<w:tab/>` becomes a tab; all other formatting is discarded.

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::result::ZipError;
use zip::ZipArchive;

use super::{ExtractedText, ExtractionError, TextExtractor};

const DOCUMENT_PART: &str = "word/document.xml";
const HEADER_PREFIX: &str = "word/header";
const FOOTER_PREFIX: &str = "word/footer";
/// Maximum decompressed bytes read from a single part (zip-bomb guard).
const MAX_PART_BYTES: u64 = 50 * 1024 * 1024;

type Archive<'a> = ZipArchive<Cursor<&'a [u8]>>;

#[derive(Debug, Clone, Copy, Default)]
pub struct DocxExtractor {
    include_headers_footers: bool,
}

impl DocxExtractor {
    /// With `include_headers_footers`, header parts are emitted before the body
    /// and footer parts after it.
    pub fn new(include_headers_footers: bool) -> Self {
        Self {
            include_headers_footers,
        }
    }
}

impl TextExtractor for DocxExtractor {
    fn extract_text(&self, bytes: &[u8]) -> Result<ExtractedText, ExtractionError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| ExtractionError::Archive(e.to_string()))?;

        let body = run_text(&read_part(&mut archive, DOCUMENT_PART)?)?;

        if !self.include_headers_footers {
            return Ok(ExtractedText::new(&body));
        }

        let mut sections = Vec::new();
        for name in numbered_parts(&archive, HEADER_PREFIX) {
            sections.push(run_text(&read_part(&mut archive, &name)?)?);
        }
        sections.push(body);
        for name in numbered_parts(&archive, FOOTER_PREFIX) {
            sections.push(run_text(&read_part(&mut archive, &name)?)?);
        }
        Ok(ExtractedText::new(&sections.join("\n\n")))
    }
}

fn read_part(archive: &mut Archive<'_>, name: &str) -> Result<Vec<u8>, ExtractionError> {
    let entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Err(ExtractionError::MissingPart(name.to_string())),
        Err(e) => return Err(ExtractionError::Archive(e.to_string())),
    };
    let mut out = Vec::new();
    entry
        .take(MAX_PART_BYTES)
        .read_to_end(&mut out)
        .map_err(|e| ExtractionError::Archive(e.to_string()))?;
    if out.len() as u64 >= MAX_PART_BYTES {
        return Err(ExtractionError::Archive(format!(
            "{name} exceeds size limit ({MAX_PART_BYTES} bytes)"
        )));
    }
    Ok(out)
}

/// `word/header1.xml`, `word/header2.xml`, ... sorted numerically.
fn numbered_parts(archive: &Archive<'_>, prefix: &str) -> Vec<String> {
    let mut names: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with(prefix) && n.ends_with(".xml"))
        .map(String::from)
        .collect();
    names.sort_by_key(|name| {
        name.trim_start_matches(prefix)
            .trim_end_matches(".xml")
            .parse::<u32>()
            .unwrap_or(u32::MAX)
    });
    names
}

fn run_text(xml: &[u8]) -> Result<String, ExtractionError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut out = String::new();
    let mut in_text = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_text = true;
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" => out.push('\t'),
                b"br" | b"cr" | b"p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                let text = t
                    .unescape()
                    .map_err(|e| ExtractionError::Xml(e.to_string()))?;
                out.push_str(&text);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ExtractionError::Xml(format!(
                    "at byte {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}
