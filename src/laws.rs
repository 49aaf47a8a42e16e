//! Law explorer: a static catalog of Indian law categories and issues, and
//! an on-demand plain-language explanation of one entry.

use crate::config::AnalyzerConfig;
use crate::error::AnalyzerError;
use crate::pipeline::llm::{generate_with_retry, GenerationReport, TextGenerator};
use crate::prompts::law_explanation_prompt;
use serde::Serialize;
use tracing::debug;

/// One issue within a law category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LawEntry {
    pub issue: &'static str,
    pub section: &'static str,
    pub punishment: &'static str,
    pub jail: &'static str,
    pub notes: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LawCategory {
    pub name: &'static str,
    pub entries: &'static [LawEntry],
}

pub static CATALOG: &[LawCategory] = &[
    LawCategory {
        name: "Criminal Law",
        entries: &[
            LawEntry {
                issue: "Rape",
                section: "IPC 376 / BNS 63",
                punishment: "10 years to life imprisonment",
                jail: "10 years – Life",
                notes: "Stricter punishment if victim is minor",
            },
            LawEntry {
                issue: "Murder",
                section: "IPC 302",
                punishment: "Life imprisonment or death penalty",
                jail: "Life / Death",
                notes: "Depends on brutality & intent",
            },
        ],
    },
    LawCategory {
        name: "Civil Law",
        entries: &[LawEntry {
            issue: "Recovery of Money",
            section: "CPC 1908",
            punishment: "No jail (civil remedy)",
            jail: "None",
            notes: "Court orders payment",
        }],
    },
    LawCategory {
        name: "Family Law",
        entries: &[LawEntry {
            issue: "Divorce",
            section: "Hindu Marriage Act",
            punishment: "No punishment",
            jail: "None",
            notes: "Mutual or contested",
        }],
    },
    LawCategory {
        name: "Constitutional Law",
        entries: &[LawEntry {
            issue: "Fundamental Rights",
            section: "Articles 12–35",
            punishment: "Writ petition",
            jail: "None",
            notes: "Filed in High Court / Supreme Court",
        }],
    },
    LawCategory {
        name: "Environmental Law",
        entries: &[LawEntry {
            issue: "Pollution",
            section: "Environment Protection Act",
            punishment: "Fine + imprisonment",
            jail: "Up to 5 years",
            notes: "Company directors also liable",
        }],
    },
];

/// Category names in display order.
pub fn categories() -> impl Iterator<Item = &'static str> {
    CATALOG.iter().map(|c| c.name)
}

/// Find a category by case-insensitive name.
pub fn category(name: &str) -> Result<&'static LawCategory, AnalyzerError> {
    CATALOG
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(name.trim()))
        .ok_or_else(|| AnalyzerError::UnknownLaw {
            category: name.to_string(),
            issue: None,
        })
}

/// Find one entry by case-insensitive category and issue names.
pub fn lookup(category_name: &str, issue: &str) -> Result<(&'static LawCategory, &'static LawEntry), AnalyzerError> {
    let cat = category(category_name)?;
    let entry = cat
        .entries
        .iter()
        .find(|e| e.issue.eq_ignore_ascii_case(issue.trim()))
        .ok_or_else(|| AnalyzerError::UnknownLaw {
            category: cat.name.to_string(),
            issue: Some(issue.to_string()),
        })?;
    Ok((cat, entry))
}

#[derive(Debug, Clone, Serialize)]
pub struct LawExplanation {
    pub category: &'static str,
    pub entry: LawEntry,
    pub explanation: String,
    pub generation: GenerationReport,
}

/// Ask the model to explain one catalog entry in simple words.
pub async fn explain_law(
    generator: &dyn TextGenerator,
    category_name: &str,
    issue: &str,
    config: &AnalyzerConfig,
) -> Result<LawExplanation, AnalyzerError> {
    let (cat, entry) = lookup(category_name, issue)?;
    debug!("Explaining {} / {}", cat.name, entry.issue);

    let prompt = law_explanation_prompt(cat.name, entry.issue, entry.section, entry.punishment);
    let report = generate_with_retry(generator, &prompt, "law explanation", config).await?;

    Ok(LawExplanation {
        category: cat.name,
        entry: *entry,
        explanation: report.text.clone(),
        generation: report,
    })
}
