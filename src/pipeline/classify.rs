//! Section classification: split the model's answer into six buckets.
//!
//! The model is asked for six headings in a fixed order but nothing forces
//! it to comply: headings come back in any case, wrapped in Markdown
//! decoration, out of order, or not at all. Classification therefore never
//! fails. Unrecognised structure just produces empty buckets.
//!
//! ## Algorithm
//!
//! One pass over the lines with a "current section" cursor that starts
//! unset. A line that matches a heading moves the cursor and is consumed.
//! Any other line is appended (plus `\n`) to the current section, or
//! dropped when no heading has been seen yet.
//!
//! ## Matching modes
//!
//! [`HeadingMatcher::Substring`] (default) tests whether the upper-cased
//! line *contains* a marker, checking markers in [`Section::ALL`] order.
//! A content line such as "No risks were identified" therefore starts the
//! RISKS section. That is the known cost of substring matching and is kept
//! so results stay comparable with earlier runs.
//!
//! [`HeadingMatcher::LineAnchored`] only accepts a line that *is* the
//! heading once decoration is removed: leading `#`, `*`, `-` and
//! whitespace, trailing `*` and whitespace, and one trailing `:`. So
//! `## Key Parties:` and `**RISKS**` are headings while
//! `No risks were identified` is content.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the six analysis sections, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Entities,
    Parties,
    Dates,
    Clauses,
    Risks,
    Summary,
}

impl Section {
    /// Every section in heading-priority and output order.
    pub const ALL: [Section; 6] = [
        Section::Entities,
        Section::Parties,
        Section::Dates,
        Section::Clauses,
        Section::Risks,
        Section::Summary,
    ];

    /// Stable lowercase key (`"entities"`, `"parties"`, ...).
    pub fn key(self) -> &'static str {
        match self {
            Section::Entities => "entities",
            Section::Parties => "parties",
            Section::Dates => "dates",
            Section::Clauses => "clauses",
            Section::Risks => "risks",
            Section::Summary => "summary",
        }
    }

    /// Upper-case heading marker the model is asked to emit.
    pub fn marker(self) -> &'static str {
        match self {
            Section::Entities => "ENTITIES",
            Section::Parties => "KEY PARTIES",
            Section::Dates => "IMPORTANT DATES",
            Section::Clauses => "CLAUSES",
            Section::Risks => "RISKS",
            Section::Summary => "SUMMARY",
        }
    }

    /// Title-case label for tabs and headers.
    pub fn label(self) -> &'static str {
        match self {
            Section::Entities => "Entities",
            Section::Parties => "Key Parties",
            Section::Dates => "Important Dates",
            Section::Clauses => "Clauses",
            Section::Risks => "Risks",
            Section::Summary => "Summary",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Section {
    type Err = String;

    /// Accepts the key (`dates`) or the marker in any case (`important dates`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace(['-', '_'], " ");
        Section::ALL
            .into_iter()
            .find(|section| {
                wanted.eq_ignore_ascii_case(section.key())
                    || wanted.eq_ignore_ascii_case(section.marker())
            })
            .ok_or_else(|| {
                format!(
                    "unknown section '{s}' (expected one of: {})",
                    Section::ALL.map(Section::key).join(", ")
                )
            })
    }
}

/// How a line is recognised as a section heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadingMatcher {
    /// Line contains the marker anywhere, case-insensitively. (default)
    #[default]
    Substring,
    /// Line consists solely of the marker, ignoring case and decoration.
    LineAnchored,
}

impl HeadingMatcher {
    /// Return the section this line opens, if it is a heading.
    pub fn match_line(self, line: &str) -> Option<Section> {
        match self {
            HeadingMatcher::Substring => {
                let upper = line.to_uppercase();
                Section::ALL
                    .into_iter()
                    .find(|section| upper.contains(section.marker()))
            }
            HeadingMatcher::LineAnchored => {
                let core = strip_heading_decoration(line);
                Section::ALL
                    .into_iter()
                    .find(|section| core.eq_ignore_ascii_case(section.marker()))
            }
        }
    }
}

fn strip_heading_decoration(line: &str) -> &str {
    let s = line
        .trim()
        .trim_start_matches(|c: char| c == '#' || c == '*' || c == '-' || c.is_whitespace())
        .trim_end_matches(|c: char| c == '*' || c.is_whitespace());
    let s = s.strip_suffix(':').unwrap_or(s);
    s.trim_end_matches(|c: char| c == '*' || c.is_whitespace())
}

/// The six buckets produced by one classification pass.
///
/// Every bucket always exists; an empty string means the model produced
/// nothing under that heading (or never emitted it). Each stored line ends
/// with `\n`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSections {
    pub entities: String,
    pub parties: String,
    pub dates: String,
    pub clauses: String,
    pub risks: String,
    pub summary: String,
}

impl AnalysisSections {
    /// Text accumulated for `section`.
    pub fn get(&self, section: Section) -> &str {
        match section {
            Section::Entities => &self.entities,
            Section::Parties => &self.parties,
            Section::Dates => &self.dates,
            Section::Clauses => &self.clauses,
            Section::Risks => &self.risks,
            Section::Summary => &self.summary,
        }
    }

    fn get_mut(&mut self, section: Section) -> &mut String {
        match section {
            Section::Entities => &mut self.entities,
            Section::Parties => &mut self.parties,
            Section::Dates => &mut self.dates,
            Section::Clauses => &mut self.clauses,
            Section::Risks => &mut self.risks,
            Section::Summary => &mut self.summary,
        }
    }

    /// All sections in output order.
    pub fn iter(&self) -> impl Iterator<Item = (Section, &str)> + '_ {
        Section::ALL.into_iter().map(move |s| (s, self.get(s)))
    }

    /// True when every bucket is blank.
    pub fn is_empty(&self) -> bool {
        self.iter().all(|(_, text)| text.trim().is_empty())
    }
}

/// Split generated text into the six sections.
///
/// Pure function: the result depends only on `text` and `matcher`, so
/// classifying the same answer twice gives identical buckets.
pub fn classify(text: &str, matcher: HeadingMatcher) -> AnalysisSections {
    let mut sections = AnalysisSections::default();
    let mut current: Option<Section> = None;

    for line in text.lines() {
        if let Some(section) = matcher.match_line(line) {
            current = Some(section);
            continue;
        }
        if let Some(section) = current {
            let bucket = sections.get_mut(section);
            bucket.push_str(line);
            bucket.push('\n');
        }
    }

    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str =
        "ENTITIES:\nAcme Corp\nKEY PARTIES:\nAcme Corp, Jane Doe\nSUMMARY:\nThis is a test.\n";

    #[test]
    fn scenario_from_three_headings() {
        let s = classify(SCENARIO, HeadingMatcher::Substring);
        assert_eq!(s.entities, "Acme Corp\n");
        assert_eq!(s.parties, "Acme Corp, Jane Doe\n");
        assert_eq!(s.dates, "");
        assert_eq!(s.clauses, "");
        assert_eq!(s.risks, "");
        assert_eq!(s.summary, "This is a test.\n");
    }

    #[test]
    fn all_headings_any_case_any_order() {
        let text = "summary:\nsum line\n  Risks:  \nrisk a\nrisk b\nclauses\nclause 1\n\
                    Important Dates:\n1 Jan 2030\nkey parties:\nLessor\nEntities\nAcme\n";
        for matcher in [HeadingMatcher::Substring, HeadingMatcher::LineAnchored] {
            let s = classify(text, matcher);
            assert_eq!(s.summary, "sum line\n", "{matcher:?}");
            assert_eq!(s.risks, "risk a\nrisk b\n", "{matcher:?}");
            assert_eq!(s.clauses, "clause 1\n", "{matcher:?}");
            assert_eq!(s.dates, "1 Jan 2030\n", "{matcher:?}");
            assert_eq!(s.parties, "Lessor\n", "{matcher:?}");
            assert_eq!(s.entities, "Acme\n", "{matcher:?}");
        }
    }

    #[test]
    fn no_headings_gives_empty_buckets() {
        let s = classify("Hello there.\nNothing structured here.\n", HeadingMatcher::Substring);
        assert_eq!(s, AnalysisSections::default());
        assert!(s.is_empty());
    }

    #[test]
    fn text_before_first_heading_is_dropped() {
        let s = classify("Sure! Here is the analysis.\n\nRISKS:\nLate fee\n", HeadingMatcher::Substring);
        assert_eq!(s.risks, "Late fee\n");
        assert!(s.iter().all(|(_, t)| !t.contains("Sure!")));
    }

    #[test]
    fn blank_lines_inside_a_section_are_kept() {
        let s = classify("SUMMARY:\npara one\n\n- bullet\n", HeadingMatcher::Substring);
        assert_eq!(s.summary, "para one\n\n- bullet\n");
    }

    #[test]
    fn substring_priority_order() {
        // Contains both CLAUSES and RISKS; CLAUSES is checked first.
        assert_eq!(
            HeadingMatcher::Substring.match_line("Risks arising from clauses"),
            Some(Section::Clauses)
        );
        // "KEY PARTIES" checked before "SUMMARY".
        assert_eq!(
            HeadingMatcher::Substring.match_line("summary of key parties"),
            Some(Section::Parties)
        );
    }

    #[test]
    fn substring_misreads_content_containing_a_marker() {
        let text = "CLAUSES:\nTermination clause\nThe tenant bears all risks of damage.\nRent is due monthly.\n";
        let s = classify(text, HeadingMatcher::Substring);
        // "Termination clause" lacks the plural marker and stays content.
        assert_eq!(s.clauses, "Termination clause\n");
        assert_eq!(s.risks, "Rent is due monthly.\n");
    }

    #[test]
    fn line_anchored_keeps_content_containing_a_marker() {
        let text = "CLAUSES:\nThe tenant bears all risks of damage.\n**RISKS:**\nDeposit loss\n";
        let s = classify(text, HeadingMatcher::LineAnchored);
        assert_eq!(s.clauses, "The tenant bears all risks of damage.\n");
        assert_eq!(s.risks, "Deposit loss\n");
    }

    #[test]
    fn line_anchored_accepts_markdown_decoration() {
        let m = HeadingMatcher::LineAnchored;
        assert_eq!(m.match_line("## Key Parties:"), Some(Section::Parties));
        assert_eq!(m.match_line("**IMPORTANT DATES**"), Some(Section::Dates));
        assert_eq!(m.match_line("**Summary:**"), Some(Section::Summary));
        assert_eq!(m.match_line("  entities  "), Some(Section::Entities));
        assert_eq!(m.match_line("- Risks: none"), None);
        assert_eq!(m.match_line("Summary of obligations"), None);
    }

    #[test]
    fn heading_lines_never_become_content() {
        let text = "ENTITIES:\nA\nENTITIES:\nB\n";
        let s = classify(text, HeadingMatcher::Substring);
        assert_eq!(s.entities, "A\nB\n");
    }

    #[test]
    fn classification_is_idempotent() {
        let a = classify(SCENARIO, HeadingMatcher::Substring);
        let b = classify(SCENARIO, HeadingMatcher::Substring);
        assert_eq!(a, b);
    }

    #[test]
    fn crlf_input_is_split_cleanly() {
        let s = classify("RISKS:\r\nPenalty\r\n", HeadingMatcher::Substring);
        assert_eq!(s.risks, "Penalty\n");
    }

    #[test]
    fn content_line_count_never_exceeds_input() {
        let text = "intro\nENTITIES:\na\nb\nRISKS:\nc\n";
        let s = classify(text, HeadingMatcher::Substring);
        let content_lines: usize = s.iter().map(|(_, t)| t.lines().count()).sum();
        assert_eq!(content_lines, 3);
    }

    #[test]
    fn section_from_str() {
        assert_eq!("dates".parse::<Section>(), Ok(Section::Dates));
        assert_eq!("Key Parties".parse::<Section>(), Ok(Section::Parties));
        assert_eq!("important-dates".parse::<Section>(), Ok(Section::Dates));
        assert!("appendix".parse::<Section>().is_err());
    }

    #[test]
    fn sections_serialise_with_fixed_keys() {
        let s = classify(SCENARIO, HeadingMatcher::Substring);
        let json = serde_json::to_value(&s).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        for section in Section::ALL {
            assert!(keys.contains(&section.key()));
        }
    }
}
