//! Result types returned by [`crate::analyze`].

use crate::pipeline::classify::{AnalysisSections, Section};
use crate::pipeline::llm::GenerationReport;
use crate::pipeline::render::{self, SectionEntry};
use crate::pipeline::translate::Language;
use serde::Serialize;

/// Everything one "Analyze" action produces.
///
/// Replaced wholesale by the next analysis; nothing is merged across runs.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutput {
    pub sections: AnalysisSections,
    /// The model answer after normalisation, before classification.
    pub raw_response: String,
    /// Present when a language other than English was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<TranslationOutcome>,
    pub stats: AnalysisStats,
}

impl AnalysisOutput {
    /// Summary in the requested language, falling back to the original when
    /// translation was skipped or failed.
    pub fn display_summary(&self) -> &str {
        match &self.translation {
            Some(TranslationOutcome {
                summary: Some(s), ..
            }) => s,
            _ => &self.sections.summary,
        }
    }

    /// Display entries for one section, using the translated summary if any.
    pub fn entries(&self, section: Section) -> Vec<SectionEntry> {
        match section {
            Section::Summary => render::parse_entries(self.display_summary()),
            other => render::parse_entries(self.sections.get(other)),
        }
    }
}

/// Result of translating the summary.
///
/// A failed translation is a degraded state, not an error: the analysis is
/// still returned and `error` says why the summary is untranslated.
#[derive(Debug, Clone, Serialize)]
pub struct TranslationOutcome {
    pub language: Language,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation: Option<GenerationReport>,
}

impl TranslationOutcome {
    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}

/// Timing and size figures for one analysis.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisStats {
    /// Characters of extracted or pasted text sent to the model.
    pub input_chars: usize,
    pub extraction_ms: u64,
    pub generation: GenerationReport,
    /// Non-blank content lines per section, in display order.
    pub section_lines: Vec<(Section, usize)>,
    pub total_duration_ms: u64,
}

impl AnalysisStats {
    pub(crate) fn count_lines(sections: &AnalysisSections) -> Vec<(Section, usize)> {
        sections
            .iter()
            .map(|(s, text)| (s, text.lines().filter(|l| !l.trim().is_empty()).count()))
            .collect()
    }
}
