//! Cleanup of the raw model answer before it is split into sections.
//!
//! Models sometimes wrap the whole answer in a ```` ``` ```` fence despite
//! the prompt, answer with Windows line endings, or sprinkle zero-width
//! characters that make a heading line fail to match. These rules fix
//! exactly those quirks and nothing else: no content line is removed,
//! merged or reordered, so section boundaries are decided by the text the
//! model actually wrote.
//!
//! Rules (applied in order):
//! 1. Strip an outer code fence pair (` ``` ` or ` ```text `/` ```markdown `)
//! 2. Normalise line endings (CRLF/CR → LF)
//! 3. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens, joiners)
//! 4. Trim trailing whitespace per line

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply every cleanup rule to a model answer.
pub fn normalize_response(input: &str) -> String {
    let s = strip_outer_fence(input);
    let s = normalise_line_endings(&s);
    let s = remove_invisible_chars(&s);
    trim_trailing_whitespace(&s)
}

// ── Rule 1: Strip outer fence ────────────────────────────────────────────────

static RE_OUTER_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```[A-Za-z]*\r?\n(.*?)\r?\n```\s*$").expect("static regex is valid")
});

fn strip_outer_fence(input: &str) -> String {
    match RE_OUTER_FENCE.captures(input.trim()) {
        Some(caps) => caps[1].to_string(),
        None => input.to_string(),
    }
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 4: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for line in input.lines() {
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}
