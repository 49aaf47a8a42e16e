//! Structured rendering of a section's text.
//!
//! Lines shaped like `label: value` are shown with the label emphasised;
//! everything else is shown as-is. This is a formatting transform, not a
//! parser: it accepts any text and never rejects a line.
//!
//! ```text
//! "- **Start Date:** 1 Jan 2030"  →  Labeled { "Start Date", "1 Jan 2030" }
//! "The lease renews yearly."      →  Plain("The lease renews yearly.")
//! ""                              →  (skipped)
//! ```

use serde::Serialize;

/// One display unit of a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SectionEntry {
    /// `label: value` line. The label has `*` and `-` removed.
    Labeled { label: String, value: String },
    /// Any other non-empty line, trimmed.
    Plain { text: String },
}

impl SectionEntry {
    /// Parse a single line; `None` for blank lines.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        Some(match line.split_once(':') {
            Some((label, value)) => SectionEntry::Labeled {
                label: label.replace(['*', '-'], "").trim().to_string(),
                value: value.trim().to_string(),
            },
            None => SectionEntry::Plain {
                text: line.to_string(),
            },
        })
    }
}

/// Parse every line of a section into display entries, skipping blanks.
pub fn parse_entries(section_text: &str) -> Vec<SectionEntry> {
    section_text.lines().filter_map(SectionEntry::parse).collect()
}

/// Render as Markdown: labels in bold, one entry per paragraph line.
pub fn to_markdown(section_text: &str) -> String {
    let mut out = String::new();
    for entry in parse_entries(section_text) {
        match entry {
            SectionEntry::Labeled { label, value } => {
                out.push_str(&format!("**{label}:** {value}\n"));
            }
            SectionEntry::Plain { text } => {
                out.push_str(&text);
                out.push('\n');
            }
        }
    }
    out
}

/// Render as an HTML fragment with highlighted labels.
///
/// All text is escaped; the model's output is never trusted as markup.
pub fn to_html(section_text: &str) -> String {
    let mut out = String::new();
    for entry in parse_entries(section_text) {
        match entry {
            SectionEntry::Labeled { label, value } => {
                out.push_str(&format!(
                    "<div class=\"entry\"><span class=\"entry-label\">{}:</span> \
                     <span class=\"entry-value\">{}</span></div>\n",
                    escape_html(&label),
                    escape_html(&value)
                ));
            }
            SectionEntry::Plain { text } => {
                out.push_str(&format!("<div>{}</div>\n", escape_html(&text)));
            }
        }
    }
    out
}

/// Render as plain text with `label: value` normalised.
pub fn to_plain(section_text: &str) -> String {
    let mut out = String::new();
    for entry in parse_entries(section_text) {
        match entry {
            SectionEntry::Labeled { label, value } => {
                out.push_str(&format!("{label}: {value}\n"));
            }
            SectionEntry::Plain { text } => {
                out.push_str(&text);
                out.push('\n');
            }
        }
    }
    out
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
