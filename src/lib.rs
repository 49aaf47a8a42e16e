//! # legal-analyzer
//!
//! Explain legal documents in plain language with a hosted LLM.
//!
//! A PDF, DOCX or text document is sent to the model with a fixed
//! instruction template. The free-form answer is split into six sections
//! (entities, key parties, important dates, clauses, risks, summary), each
//! renderable with `label: value` lines highlighted. The summary can be
//! translated, and the whole analysis exported as a paginated PDF.
//!
//! ## Pipeline Overview
//!
//! ```text
//! document
//!  │
//!  ├─ 1. Input      local file, stdin or URL
//!  ├─ 2. Extract    PDF / DOCX / text → plain text (spawn_blocking)
//!  ├─ 3. Generate   one model call with timeout + retry/backoff
//!  ├─ 4. Normalize  strip fences, CRLF, invisible characters
//!  ├─ 5. Classify   six fixed sections by heading marker
//!  └─ 6. Output     render / translate summary / export PDF
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use legal_analyzer::{analyze_input, AnalyzerConfig, Section};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from GEMINI_API_KEY / OPENAI_API_KEY / ...
//!     let config = AnalyzerConfig::default();
//!     let output = analyze_input("lease.pdf", None, &config).await?;
//!     for section in Section::ALL {
//!         println!("{}\n{}", section.marker(), output.sections.get(section));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `legalyze` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! legal-analyzer = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod error;
pub mod export;
pub mod laws;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod store;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{
    analyze_document, analyze_input, analyze_sync, analyze_text, export_to_file, translate_summary,
};
pub use config::{AnalyzerConfig, AnalyzerConfigBuilder, DEFAULT_MODEL};
pub use error::AnalyzerError;
pub use export::{export_pdf, EXPORT_FILE_NAME, EXPORT_MEDIA_TYPE};
pub use laws::{explain_law, LawCategory, LawEntry, LawExplanation};
pub use output::{AnalysisOutput, AnalysisStats, TranslationOutcome};
pub use pipeline::classify::{classify, AnalysisSections, HeadingMatcher, Section};
pub use pipeline::extract::{extract_text, MediaType};
pub use pipeline::llm::{Generation, GenerationOptions, GenerationReport, TextGenerator};
pub use pipeline::render::SectionEntry;
pub use pipeline::translate::Language;
pub use progress::{AnalysisProgressCallback, NoopProgressCallback, ProgressCallback};
pub use store::{CredentialStore, UserRecord};
