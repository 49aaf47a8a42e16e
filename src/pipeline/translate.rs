//! Summary translation into one of the supported display languages.

use crate::config::AnalyzerConfig;
use crate::error::AnalyzerError;
use crate::pipeline::llm::{generate_with_retry, GenerationReport, TextGenerator};
use crate::prompts::translation_prompt;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Languages offered by the summary language selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    /// Source language of the analysis; selecting it never calls the model.
    #[default]
    English,
    Hindi,
    Marathi,
    German,
    Japanese,
}

impl Language {
    pub const ALL: [Language; 5] = [
        Language::English,
        Language::Hindi,
        Language::Marathi,
        Language::German,
        Language::Japanese,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Hindi => "Hindi",
            Language::Marathi => "Marathi",
            Language::German => "German",
            Language::Japanese => "Japanese",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|l| l.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "unsupported language '{s}' (expected one of: {})",
                    Language::ALL.map(Language::name).join(", ")
                )
            })
    }
}

/// Translate `text` into `target`.
///
/// English returns the text untouched with `None` for the report, since no
/// call was made. Blank input is returned as-is for the same reason.
pub async fn translate_text(
    generator: &dyn TextGenerator,
    text: &str,
    target: Language,
    config: &AnalyzerConfig,
) -> Result<(String, Option<GenerationReport>), AnalyzerError> {
    if target == Language::English || text.trim().is_empty() {
        debug!("Translation to {} skipped", target);
        return Ok((text.to_string(), None));
    }

    let prompt = translation_prompt(text, target.name());
    let report = generate_with_retry(generator, &prompt, "translation", config).await?;
    let mut translated = report.text.clone();
    if !translated.ends_with('\n') {
        translated.push('\n');
    }
    Ok((translated, Some(report)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::llm::{Generation, GenerationOptions};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Echo {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TextGenerator for Echo {
        async fn generate(
            &self,
            prompt: &str,
            _options: &GenerationOptions,
        ) -> Result<Generation, AnalyzerError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(Generation {
                text: "Zusammenfassung".into(),
                ..Default::default()
            })
        }
    }

    #[test]
    fn parse_language_names() {
        assert_eq!("german".parse::<Language>(), Ok(Language::German));
        assert_eq!(" Japanese ".parse::<Language>(), Ok(Language::Japanese));
        assert!("Klingon".parse::<Language>().is_err());
    }

    #[tokio::test]
    async fn english_is_a_no_op() {
        let gen = Echo::default();
        let (text, report) =
            translate_text(&gen, "Plain summary\n", Language::English, &AnalyzerConfig::default())
                .await
                .unwrap();
        assert_eq!(text, "Plain summary\n");
        assert!(report.is_none());
        assert!(gen.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn other_languages_call_the_model() {
        let gen = Echo::default();
        let (text, report) =
            translate_text(&gen, "Plain summary\n", Language::German, &AnalyzerConfig::default())
                .await
                .unwrap();
        assert_eq!(text, "Zusammenfassung\n");
        assert_eq!(report.map(|r| r.attempts), Some(1));
        let prompts = gen.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("into German"));
        assert!(prompts[0].contains("Plain summary"));
    }

    #[tokio::test]
    async fn blank_summary_is_not_sent() {
        let gen = Echo::default();
        let (text, report) = translate_text(&gen, "  \n", Language::Hindi, &AnalyzerConfig::default())
            .await
            .unwrap();
        assert_eq!(text, "  \n");
        assert!(report.is_none());
    }
}
