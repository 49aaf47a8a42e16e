//! Integration tests for the analysis pipeline.
//!
//! Every test plugs an in-process [`TextGenerator`] into the config, so no
//! network access or API key is needed.

use async_trait::async_trait;
use legal_analyzer::{
    analyze_document, analyze_input, analyze_text, export_to_file, translate_summary,
    AnalysisProgressCallback, AnalysisSections, AnalyzerConfig, AnalyzerError, Generation,
    GenerationOptions, HeadingMatcher, Language, MediaType, Section, SectionEntry, TextGenerator,
    EXPORT_FILE_NAME,
};
use std::collections::VecDeque;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Replays scripted answers in order and records every prompt.
#[derive(Default)]
struct ScriptedGenerator {
    answers: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    fn new(answers: impl IntoIterator<Item = Result<&'static str, &'static str>>) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(
                answers
                    .into_iter()
                    .map(|a| a.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<Generation, AnalyzerError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.answers.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(Generation {
                text,
                prompt_tokens: prompt.len() / 4,
                completion_tokens: 10,
            }),
            Some(Err(message)) => Err(AnalyzerError::LlmApiError { message }),
            None => Err(AnalyzerError::LlmApiError {
                message: "script exhausted".into(),
            }),
        }
    }
}

fn config(gen: Arc<ScriptedGenerator>) -> legal_analyzer::AnalyzerConfigBuilder {
    AnalyzerConfig::builder()
        .generator(gen)
        .max_retries(1)
        .retry_backoff_ms(1)
}

const SCENARIO: &str =
    "ENTITIES:\nAcme Corp\nKEY PARTIES:\nAcme Corp, Jane Doe\nSUMMARY:\nThis is a test.\n";

const FULL_ANSWER: &str = "\
Here is the analysis you asked for.

**ENTITIES:**
- Acme Corp
- Jane Doe

## Key Parties
- Service Provider: Acme Corp
- Client: Jane Doe

IMPORTANT DATES:
- Start Date: 1 Jan 2030
- End Date: 31 Dec 2030

CLAUSES:
- Termination: either side may end the agreement with 30 days notice

RISKS:
- Late payment: 5% monthly penalty

SUMMARY:
Acme Corp provides services to Jane Doe for one year.
- Payment is due monthly
";

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn scenario_answer_is_split_into_sections() {
    let gen = ScriptedGenerator::new([Ok(SCENARIO)]);
    let out = analyze_text("Service agreement text", &config(gen.clone()).build().unwrap())
        .await
        .unwrap();

    assert_eq!(
        out.sections,
        AnalysisSections {
            entities: "Acme Corp\n".into(),
            parties: "Acme Corp, Jane Doe\n".into(),
            dates: String::new(),
            clauses: String::new(),
            risks: String::new(),
            summary: "This is a test.\n".into(),
        }
    );

    let prompts = gen.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Service agreement text"));
    assert!(prompts[0].contains("KEY PARTIES:"));
}

#[tokio::test]
async fn decorated_headings_and_preamble() {
    let gen = ScriptedGenerator::new([Ok(FULL_ANSWER)]);
    let out = analyze_text("contract", &config(gen).build().unwrap())
        .await
        .unwrap();

    // Preamble before the first heading is dropped.
    assert!(!out.sections.iter().any(|(_, t)| t.contains("Here is the analysis")));
    assert_eq!(out.sections.entities, "- Acme Corp\n- Jane Doe\n\n");
    assert_eq!(
        out.entries(Section::Dates),
        vec![
            SectionEntry::Labeled {
                label: "Start Date".into(),
                value: "1 Jan 2030".into()
            },
            SectionEntry::Labeled {
                label: "End Date".into(),
                value: "31 Dec 2030".into()
            },
        ]
    );
    assert!(out.sections.summary.starts_with("Acme Corp provides services"));
}

#[tokio::test]
async fn strict_headings_keep_content_mentioning_markers() {
    let answer = "CLAUSES:\nNo risks were identified in clause 4\nRISKS:\nNone\n";

    let loose = analyze_text(
        "contract",
        &config(ScriptedGenerator::new([Ok(answer)])).build().unwrap(),
    )
    .await
    .unwrap();
    assert_eq!(loose.sections.clauses, "");
    assert_eq!(loose.sections.risks, "None\n");

    let strict = analyze_text(
        "contract",
        &config(ScriptedGenerator::new([Ok(answer)]))
            .heading_matcher(HeadingMatcher::LineAnchored)
            .build()
            .unwrap(),
    )
    .await
    .unwrap();
    assert_eq!(strict.sections.clauses, "No risks were identified in clause 4\n");
    assert_eq!(strict.sections.risks, "None\n");
}

#[tokio::test]
async fn repeated_analysis_is_idempotent() {
    let gen = ScriptedGenerator::new([Ok(SCENARIO), Ok(SCENARIO)]);
    let cfg = config(gen).build().unwrap();
    let first = analyze_text("x", &cfg).await.unwrap();
    let second = analyze_text("x", &cfg).await.unwrap();
    assert_eq!(first.sections, second.sections);
}

#[tokio::test]
async fn transient_failure_is_retried() {
    let gen = ScriptedGenerator::new([Err("503 overloaded"), Ok(SCENARIO)]);
    let out = analyze_text("x", &config(gen.clone()).build().unwrap())
        .await
        .unwrap();
    assert_eq!(out.stats.generation.attempts, 2);
    assert_eq!(gen.prompts().len(), 2);
}

#[tokio::test]
async fn exhausted_retries_surface_an_error() {
    let gen = ScriptedGenerator::new([Err("429 quota"), Err("429 quota")]);
    let err = analyze_text("x", &config(gen).build().unwrap())
        .await
        .unwrap_err();
    match err {
        AnalyzerError::GenerationFailed { attempts, detail } => {
            assert_eq!(attempts, 2);
            assert!(detail.contains("429"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn translation_replaces_displayed_summary() {
    let gen = ScriptedGenerator::new([Ok(SCENARIO), Ok("Dies ist ein Test.")]);
    let out = analyze_text(
        "x",
        &config(gen.clone()).language(Language::German).build().unwrap(),
    )
    .await
    .unwrap();

    let t = out.translation.as_ref().unwrap();
    assert!(!t.is_degraded());
    assert_eq!(out.display_summary(), "Dies ist ein Test.\n");
    // The classified summary itself is untouched.
    assert_eq!(out.sections.summary, "This is a test.\n");
    assert!(gen.prompts()[1].contains("into German"));
}

#[tokio::test]
async fn failed_translation_degrades_to_original() {
    let gen = ScriptedGenerator::new([Ok(SCENARIO), Err("quota"), Err("quota")]);
    let out = analyze_text(
        "x",
        &config(gen).language(Language::Japanese).build().unwrap(),
    )
    .await
    .expect("analysis must survive a failed translation");

    let t = out.translation.as_ref().unwrap();
    assert!(t.is_degraded());
    assert!(t.error.as_deref().unwrap().contains("quota"));
    assert_eq!(out.display_summary(), "This is a test.\n");
}

#[tokio::test]
async fn english_translation_makes_no_call() {
    let gen = ScriptedGenerator::new([]);
    let cfg = config(gen.clone()).build().unwrap();
    let outcome = translate_summary("Summary.\n", Language::English, &cfg).await;
    assert_eq!(outcome.summary.as_deref(), Some("Summary.\n"));
    assert!(outcome.error.is_none());
    assert!(gen.prompts().is_empty());
}

#[tokio::test]
async fn text_file_input_end_to_end() {
    let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
    write!(file, "This Agreement is made between Acme Corp and Jane Doe.").unwrap();

    let gen = ScriptedGenerator::new([Ok(SCENARIO)]);
    let out = analyze_input(
        file.path().to_str().unwrap(),
        None,
        &config(gen.clone()).build().unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(out.sections.entities, "Acme Corp\n");
    assert!(gen.prompts()[0].contains("Acme Corp and Jane Doe"));
    assert_eq!(out.stats.input_chars, 54);
}

#[tokio::test]
async fn empty_document_is_rejected_before_generation() {
    let gen = ScriptedGenerator::new([Ok(SCENARIO)]);
    let err = analyze_document(b"   \n".to_vec(), MediaType::PlainText, &config(gen.clone()).build().unwrap())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Please upload a file or enter text");
    assert!(gen.prompts().is_empty());
}

#[tokio::test]
async fn progress_callback_sees_each_stage() {
    #[derive(Default)]
    struct Stages(Mutex<Vec<String>>, AtomicUsize);

    impl AnalysisProgressCallback for Stages {
        fn on_text_ready(&self, chars: usize) {
            self.1.store(chars, Ordering::SeqCst);
            self.0.lock().unwrap().push("text".into());
        }
        fn on_generation_start(&self, purpose: &str) {
            self.0.lock().unwrap().push(format!("start:{purpose}"));
        }
        fn on_generation_complete(&self, purpose: &str, _len: usize) {
            self.0.lock().unwrap().push(format!("done:{purpose}"));
        }
        fn on_sections_ready(&self, _sections: &AnalysisSections) {
            self.0.lock().unwrap().push("sections".into());
        }
    }

    let stages = Arc::new(Stages::default());
    let gen = ScriptedGenerator::new([Ok(SCENARIO), Ok("Resumen")]);
    let cfg = config(gen)
        .language(Language::Hindi)
        .progress_callback(stages.clone())
        .build()
        .unwrap();
    analyze_text("abc", &cfg).await.unwrap();

    assert_eq!(stages.1.load(Ordering::SeqCst), 3);
    assert_eq!(
        *stages.0.lock().unwrap(),
        vec![
            "text",
            "start:analysis",
            "done:analysis",
            "sections",
            "start:translation",
            "done:translation"
        ]
    );
}

#[tokio::test]
async fn export_of_analysis_reopens_as_pdf() {
    let gen = ScriptedGenerator::new([Ok(FULL_ANSWER)]);
    let out = analyze_text("contract", &config(gen).build().unwrap())
        .await
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(EXPORT_FILE_NAME);
    export_to_file(&out.sections, &path).await.unwrap();

    let doc = lopdf::Document::load(&path).unwrap();
    assert_eq!(doc.get_pages().len(), 1);
}
