//! PDF export of the six analysis sections.
//!
//! Split in two so the pagination rules can be tested without parsing PDF:
//!
//! - [`layout`] turns [`AnalysisSections`] into [`Page`]s of positioned
//!   [`TextRun`]s (pure, deterministic);
//! - [`write_pdf`] serialises those pages with `lopdf` into an in-memory
//!   byte stream.
//!
//! Page geometry is A4 in points. The cursor starts 40pt below the top edge;
//! before every heading or content line, a cursor under [`BOTTOM_MARGIN`]
//! starts a new page. Content lines are wrapped at word boundaries so long
//! model output never runs off the right edge.

use crate::error::AnalyzerError;
use crate::pipeline::classify::{AnalysisSections, Section};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream, StringFormat};
use tracing::debug;

/// File name offered for download.
pub const EXPORT_FILE_NAME: &str = "Legal_Document_Analysis.pdf";
/// Media type of the export artifact.
pub const EXPORT_MEDIA_TYPE: &str = "application/pdf";

pub const PAGE_WIDTH: i64 = 595;
pub const PAGE_HEIGHT: i64 = 842;
pub const LEFT_MARGIN: i64 = 40;
pub const TOP_Y: i64 = PAGE_HEIGHT - 40;
pub const BOTTOM_MARGIN: i64 = 50;
pub const DOCUMENT_TITLE: &str = "AI Legal Document Analysis";

const TITLE_SIZE: i64 = 14;
const TITLE_ADVANCE: i64 = 30;
const HEADING_SIZE: i64 = 12;
const HEADING_ADVANCE: i64 = 18;
const CONTENT_SIZE: i64 = 10;
const LINE_ADVANCE: i64 = 14;
const SECTION_GAP: i64 = 10;
const USABLE_WIDTH: i64 = PAGE_WIDTH - 2 * LEFT_MARGIN;
/// Helvetica advance widths for ASCII 32..=126, in thousandths of an em
/// (Adobe core font metrics).
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0..?
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // @..O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // P.._
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // `..o
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,      // p..~
];
/// Width assumed for anything outside printable ASCII.
const WIDE_GLYPH: u16 = 1000;

/// The two standard fonts used by the export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource_name(self) -> &'static [u8] {
        match self {
            Font::Regular => b"F1",
            Font::Bold => b"F2",
        }
    }

    fn base_font(self) -> &'static [u8] {
        match self {
            Font::Regular => b"Helvetica",
            Font::Bold => b"Helvetica-Bold",
        }
    }
}

/// A single line of text at an absolute position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub font: Font,
    pub size: i64,
    pub x: i64,
    pub y: i64,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub runs: Vec<TextRun>,
}

struct Cursor {
    pages: Vec<Page>,
    y: i64,
}

impl Cursor {
    fn new() -> Self {
        Self {
            pages: vec![Page::default()],
            y: TOP_Y,
        }
    }

    fn break_if_needed(&mut self) {
        if self.y < BOTTOM_MARGIN {
            self.pages.push(Page::default());
            self.y = TOP_Y;
        }
    }

    fn draw(&mut self, font: Font, size: i64, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(page) = self.pages.last_mut() {
            page.runs.push(TextRun {
                font,
                size,
                x: LEFT_MARGIN,
                y: self.y,
                text: text.to_string(),
            });
        }
    }
}

/// Lay out the title and the six sections in fixed order.
pub fn layout(sections: &AnalysisSections) -> Vec<Page> {
    let mut cursor = Cursor::new();

    cursor.draw(Font::Bold, TITLE_SIZE, DOCUMENT_TITLE);
    cursor.y -= TITLE_ADVANCE;

    for section in Section::ALL {
        cursor.break_if_needed();
        cursor.draw(Font::Bold, HEADING_SIZE, section.marker());
        cursor.y -= HEADING_ADVANCE;

        // A trailing newline and an empty section each take one line.
        for line in sections.get(section).split('\n') {
            for wrapped in wrap_line(line, CONTENT_SIZE) {
                cursor.break_if_needed();
                cursor.draw(Font::Regular, CONTENT_SIZE, &wrapped);
                cursor.y -= LINE_ADVANCE;
            }
        }
        cursor.y -= SECTION_GAP;
    }

    debug!("PDF layout: {} page(s)", cursor.pages.len());
    cursor.pages
}

/// Serialise laid-out pages into a PDF byte stream.
pub fn write_pdf(pages: &[Page]) -> Result<Vec<u8>, AnalyzerError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut fonts = Dictionary::new();
    for font in [Font::Regular, Font::Bold] {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => Object::Name(font.base_font().to_vec()),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(font.resource_name(), Object::Reference(font_id));
    }
    let resources_id = doc.add_object(dictionary! {
        "Font" => fonts,
    });

    let mut kids = Vec::with_capacity(pages.len());
    for page in pages {
        let content = Content {
            operations: page_operations(page),
        };
        let encoded = content
            .encode()
            .map_err(|e| AnalyzerError::PdfExport(format!("content stream: {e}")))?;
        let content_id = doc.add_object(Stream::new(Dictionary::new(), encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(PAGE_WIDTH),
                Object::Integer(PAGE_HEIGHT),
            ],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| AnalyzerError::PdfExport(e.to_string()))?;
    debug!("PDF written: {} page(s), {} bytes", pages.len(), buffer.len());
    Ok(buffer)
}

/// Lay out and serialise in one step.
pub fn export_pdf(sections: &AnalysisSections) -> Result<Vec<u8>, AnalyzerError> {
    write_pdf(&layout(sections))
}

fn page_operations(page: &Page) -> Vec<Operation> {
    let mut ops = Vec::with_capacity(page.runs.len() * 5);
    for run in &page.runs {
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new(
            "Tf",
            vec![
                Object::Name(run.font.resource_name().to_vec()),
                Object::Integer(run.size),
            ],
        ));
        ops.push(Operation::new(
            "Td",
            vec![Object::Integer(run.x), Object::Integer(run.y)],
        ));
        ops.push(Operation::new(
            "Tj",
            vec![Object::String(encode_win_ansi(&run.text), StringFormat::Literal)],
        ));
        ops.push(Operation::new("ET", vec![]));
    }
    ops
}

fn glyph_width(c: char) -> u16 {
    match c {
        ' '..='~' => HELVETICA_WIDTHS[c as usize - 32],
        _ => WIDE_GLYPH,
    }
}

/// Width of `text` set in regular Helvetica, in thousandths of a point per
/// point of font size.
fn text_width(text: &str) -> i64 {
    text.chars().map(|c| i64::from(glyph_width(c))).sum()
}

/// Greedy word wrap against the usable width at `size` points.
/// Words wider than a line are split hard.
/// A blank line yields a single empty entry so vertical spacing is kept.
fn wrap_line(line: &str, size: i64) -> Vec<String> {
    let max_width = USABLE_WIDTH * 1000 / size.max(1);
    let space = i64::from(glyph_width(' '));
    let mut out = Vec::new();
    let mut current = String::new();
    let mut current_width = 0i64;

    for word in line.split_whitespace() {
        let mut word = word.to_string();
        while text_width(&word) > max_width {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
                current_width = 0;
            }
            let mut width = 0i64;
            let cut = word
                .char_indices()
                .find(|&(_, c)| {
                    width += i64::from(glyph_width(c));
                    width > max_width
                })
                .map(|(i, _)| i)
                .unwrap_or(word.len());
            let cut = if cut == 0 {
                word.chars().next().map_or(word.len(), char::len_utf8)
            } else {
                cut
            };
            let rest = word.split_off(cut);
            out.push(word);
            word = rest;
        }
        if word.is_empty() {
            continue;
        }
        let width = text_width(&word);
        let needed = if current.is_empty() { width } else { current_width + space + width };
        if needed > max_width && !current.is_empty() {
            out.push(std::mem::take(&mut current));
            current_width = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_width += space;
        }
        current.push_str(&word);
        current_width += width;
    }

    if !current.is_empty() || out.is_empty() {
        out.push(current);
    }
    out
}

/// Encode text for a standard Type1 font with `WinAnsiEncoding`.
/// Characters outside the code page become `?`.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\t' => b' ',
            ' '..='~' => c as u8,
            '\u{A0}'..='\u{FF}' => c as u32 as u8,
            '€' => 0x80,
            '‚' => 0x82,
            '„' => 0x84,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '™' => 0x99,
            _ => b'?',
        })
        .collect()
}
