//! Text extraction: uploaded bytes + declared media type → plain text.
//!
//! Dispatch is on the *declared* type, never on content sniffing, so a
//! `.txt` upload that happens to start with `%PDF` is still read as text.
//!
//! | Media type | Reader |
//! |------------|--------|
//! | `application/pdf` | `pdf-extract`, all pages concatenated |
//! | `application/vnd.openxmlformats-officedocument.wordprocessingml.document` | `zip` + `quick-xml`, paragraphs joined with `\n` |
//! | `text/plain` | UTF-8 decode, leading BOM dropped |
//! | anything else | empty string |
//!
//! A document with no extractable text is *not* an error here. The caller
//! checks for blank text and reports it to the user before any model call.

use crate::error::AnalyzerError;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{Cursor, Read};
use std::path::Path;
use tracing::{debug, warn};

pub const PDF_MIME: &str = "application/pdf";
pub const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const TEXT_MIME: &str = "text/plain";

/// Declared type of an uploaded document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaType {
    Pdf,
    Docx,
    PlainText,
    /// Anything else; extraction yields an empty string.
    Unsupported(String),
}

impl MediaType {
    /// Parse a MIME type, ignoring parameters such as `; charset=utf-8`.
    pub fn from_mime(mime: &str) -> Self {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            PDF_MIME => MediaType::Pdf,
            DOCX_MIME => MediaType::Docx,
            TEXT_MIME => MediaType::PlainText,
            _ => MediaType::Unsupported(essence),
        }
    }

    /// Infer the type from a file extension (`pdf`, `docx`, `txt`).
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => MediaType::Pdf,
            "docx" => MediaType::Docx,
            "txt" | "text" => MediaType::PlainText,
            other => MediaType::Unsupported(format!(".{other}")),
        }
    }

    /// Parse either a MIME type or one of the short names `pdf`, `docx`, `txt`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => MediaType::Pdf,
            "docx" => MediaType::Docx,
            "txt" | "text" => MediaType::PlainText,
            _ => MediaType::from_mime(s),
        }
    }

    pub fn mime(&self) -> &str {
        match self {
            MediaType::Pdf => PDF_MIME,
            MediaType::Docx => DOCX_MIME,
            MediaType::PlainText => TEXT_MIME,
            MediaType::Unsupported(s) => s,
        }
    }

    fn format_name(&self) -> &'static str {
        match self {
            MediaType::Pdf => "PDF",
            MediaType::Docx => "DOCX",
            MediaType::PlainText => "text",
            MediaType::Unsupported(_) => "unsupported",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

/// Extract plain text from `bytes` according to `media_type`.
///
/// CPU-bound; async callers should run it under `spawn_blocking`.
pub fn extract_text(bytes: &[u8], media_type: &MediaType) -> Result<String, AnalyzerError> {
    let text = match media_type {
        MediaType::Pdf => extract_pdf(bytes)?,
        MediaType::Docx => extract_docx(bytes)?,
        MediaType::PlainText => decode_text(bytes)?,
        MediaType::Unsupported(mime) => {
            warn!("Unsupported media type '{}'; no text extracted", mime);
            String::new()
        }
    };
    debug!(
        "Extracted {} chars from {} bytes of {}",
        text.chars().count(),
        bytes.len(),
        media_type.format_name()
    );
    Ok(text)
}

fn extract_pdf(bytes: &[u8]) -> Result<String, AnalyzerError> {
    // pdf-extract panics on some malformed streams instead of returning Err.
    let result = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes));
    match result {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(AnalyzerError::ExtractionFailed {
            format: "PDF",
            detail: e.to_string(),
        }),
        Err(_) => Err(AnalyzerError::ExtractionFailed {
            format: "PDF",
            detail: "the PDF parser aborted on malformed content".into(),
        }),
    }
}

fn extract_docx(bytes: &[u8]) -> Result<String, AnalyzerError> {
    let docx_err = |detail: String| AnalyzerError::ExtractionFailed {
        format: "DOCX",
        detail,
    };

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| docx_err(format!("invalid DOCX ZIP: {e}")))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| docx_err(format!("missing word/document.xml: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| docx_err(format!("unreadable word/document.xml: {e}")))?;

    docx_paragraphs(&xml)
        .map(|paragraphs| paragraphs.join("\n"))
        .map_err(docx_err)
}

/// Collect paragraph texts from `word/document.xml`, in document order.
///
/// Runs (`w:t`) are concatenated; `w:tab` becomes a tab and `w:br`/`w:cr`
/// a newline. Paragraphs inside tables are included. Text boxes
/// (`w:txbxContent`) are skipped so their nested paragraphs cannot split
/// the paragraph that anchors them.
fn docx_paragraphs(xml: &str) -> Result<Vec<String>, String> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_paragraph = false;
    let mut in_text = false;
    let mut text_box_depth = 0usize;

    loop {
        let event = reader.read_event();
        if text_box_depth > 0 {
            match event {
                Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"txbxContent" => {
                    text_box_depth += 1
                }
                Ok(Event::End(ref e)) if e.local_name().as_ref() == b"txbxContent" => {
                    text_box_depth -= 1
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(format!("malformed XML at byte {}: {e}", reader.buffer_position()))
                }
                _ => {}
            }
            continue;
        }

        match event {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"txbxContent" => text_box_depth = 1,
                b"p" => {
                    in_paragraph = true;
                    current.clear();
                }
                b"t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"p" => paragraphs.push(String::new()),
                b"tab" if in_paragraph => current.push('\t'),
                b"br" | b"cr" if in_paragraph => current.push('\n'),
                _ => {}
            },
            Ok(Event::Text(ref e)) if in_text => {
                let text = e.unescape().map_err(|e| format!("bad text run: {e}"))?;
                current.push_str(&text);
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    in_paragraph = false;
                    paragraphs.push(std::mem::take(&mut current));
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("malformed XML at byte {}: {e}", reader.buffer_position())),
            _ => {}
        }
    }

    Ok(paragraphs)
}

fn decode_text(bytes: &[u8]) -> Result<String, AnalyzerError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    String::from_utf8(bytes.to_vec()).map_err(|e| AnalyzerError::ExtractionFailed {
        format: "text",
        detail: format!("not valid UTF-8: {e}"),
    })
}
