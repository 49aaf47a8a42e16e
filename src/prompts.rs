//! Instruction templates sent to the model.
//!
//! Every prompt lives here so the wording can be reviewed and tested without
//! a network connection. The heading names in [`ANALYSIS_PROMPT`] must stay
//! in sync with [`crate::pipeline::classify::Section::marker`]; the test at
//! the bottom of this file enforces that.
//!
//! Callers can replace the analysis prompt via
//! [`crate::config::AnalyzerConfig::analysis_prompt`]; the translation and
//! explanation prompts are fixed.

/// Placeholder substituted with the document text.
pub const TEXT_PLACEHOLDER: &str = "{text}";

/// Default analysis prompt. `{text}` is replaced with the document.
pub const ANALYSIS_PROMPT: &str = r#"You are a legal assistant.

Read the legal document below and explain it in VERY SIMPLE words.

FORMAT THE RESPONSE STRICTLY LIKE THIS (DO NOT CHANGE ORDER):


ENTITIES:
- Company names
- Client names
- Person names

KEY PARTIES:
- Service Provider
- Client

IMPORTANT DATES:
- Start date
- End date
- Any deadlines

CLAUSES:
- Important clauses explained simply

RISKS:
- Possible risks or penalties

SUMMARY:
- First, write a short paragraph (15–16 lines) explaining the document in simple language.
- Then give 10–12 bullet points highlighting key points.
- Do NOT make everything bullet points.


RULES:
- Simple English only
- Do NOT mix sections
- Do NOT repeat data
- Do NOT add extra headings

DOCUMENT:
{text}
"#;

/// Fill the analysis template (or a custom one) with the document text.
pub fn analysis_prompt(template: Option<&str>, text: &str) -> String {
    template
        .unwrap_or(ANALYSIS_PROMPT)
        .replace(TEXT_PLACEHOLDER, text)
}

/// Build the summary translation prompt.
pub fn translation_prompt(text: &str, target_language: &str) -> String {
    format!(
        "Translate the following legal summary into {target_language}.\n\
         Use very simple and clear language.\n\
         Do NOT add explanations.\n\
         Do NOT change meaning.\n\
         \n\
         TEXT:\n\
         {text}\n"
    )
}

/// Build the plain-language explanation prompt for one law-table entry.
pub fn law_explanation_prompt(category: &str, issue: &str, section: &str, punishment: &str) -> String {
    format!(
        "Explain the following Indian law in very simple words.\n\
         \n\
         Law category: {category}\n\
         Issue: {issue}\n\
         Section: {section}\n\
         Punishment: {punishment}\n\
         \n\
         Explain:\n\
         - What this law means\n\
         - When it applies\n\
         - Punishment in simple words\n"
    )
}
