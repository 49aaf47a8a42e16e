//! Analysis entry points.
//!
//! One "Analyze" action is a straight line:
//!
//! ```text
//! text ─▶ prompt ─▶ generate (retry) ─▶ normalize ─▶ classify ─▶ [translate summary]
//! ```
//!
//! The result is an explicit [`AnalysisOutput`] returned to the caller. No
//! state survives between calls, so two analyses never see each other's
//! sections.

use crate::config::AnalyzerConfig;
use crate::error::AnalyzerError;
use crate::export;
use crate::output::{AnalysisOutput, AnalysisStats, TranslationOutcome};
use crate::pipeline::classify::{classify, AnalysisSections};
use crate::pipeline::extract::{self, MediaType};
use crate::pipeline::input;
use crate::pipeline::llm::{generate_with_retry, resolve_generator, TextGenerator};
use crate::pipeline::normalize::normalize_response;
use crate::pipeline::translate::{translate_text, Language};
use crate::prompts::analysis_prompt;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Analyse pasted text.
///
/// # Errors
/// - [`AnalyzerError::EmptyText`] when `text` is blank; the model is not called.
/// - Generation errors once every retry is exhausted.
pub async fn analyze_text(text: &str, config: &AnalyzerConfig) -> Result<AnalysisOutput, AnalyzerError> {
    run_analysis(text, 0, config).await
}

/// Extract text from an uploaded document and analyse it.
///
/// Unsupported media types extract to an empty string and therefore end in
/// [`AnalyzerError::EmptyText`].
pub async fn analyze_document(
    bytes: Vec<u8>,
    media_type: MediaType,
    config: &AnalyzerConfig,
) -> Result<AnalysisOutput, AnalyzerError> {
    let extract_start = Instant::now();
    let text = tokio::task::spawn_blocking(move || extract::extract_text(&bytes, &media_type))
        .await
        .map_err(|e| AnalyzerError::Internal(format!("extraction task failed: {e}")))??;
    let extraction_ms = extract_start.elapsed().as_millis() as u64;

    run_analysis(&text, extraction_ms, config).await
}

/// Resolve a path, `-` (stdin) or URL and analyse the document behind it.
///
/// `media_type` overrides detection from the extension or `Content-Type`.
pub async fn analyze_input(
    input_str: impl AsRef<str>,
    media_type: Option<MediaType>,
    config: &AnalyzerConfig,
) -> Result<AnalysisOutput, AnalyzerError> {
    let input_str = input_str.as_ref();
    info!("Starting analysis: {}", input_str);

    let doc = input::resolve_input(input_str, media_type, config.download_timeout_secs).await?;
    analyze_document(doc.bytes, doc.media_type, config).await
}

/// Synchronous wrapper around [`analyze_input`].
///
/// Creates a temporary tokio runtime internally.
pub fn analyze_sync(
    input_str: impl AsRef<str>,
    media_type: Option<MediaType>,
    config: &AnalyzerConfig,
) -> Result<AnalysisOutput, AnalyzerError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| AnalyzerError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(analyze_input(input_str, media_type, config))
}

async fn run_analysis(
    text: &str,
    extraction_ms: u64,
    config: &AnalyzerConfig,
) -> Result<AnalysisOutput, AnalyzerError> {
    let total_start = Instant::now();

    if text.trim().is_empty() {
        return Err(AnalyzerError::EmptyText);
    }
    let input_chars = text.chars().count();
    if let Some(cb) = config.progress() {
        cb.on_text_ready(input_chars);
    }

    let generator = resolve_generator(config)?;
    let prompt = analysis_prompt(config.analysis_prompt.as_deref(), text);
    let generation = generate_with_retry(generator.as_ref(), &prompt, "analysis", config).await?;

    let raw_response = normalize_response(&generation.text);
    let sections = classify(&raw_response, config.heading_matcher);
    if sections.is_empty() {
        warn!("No recognised headings in the model answer; every section is empty");
    }
    if let Some(cb) = config.progress() {
        cb.on_sections_ready(&sections);
    }

    let translation = if config.language != Language::English {
        Some(translate_with(generator.as_ref(), &sections.summary, config.language, config).await)
    } else {
        None
    };

    let stats = AnalysisStats {
        input_chars,
        extraction_ms,
        section_lines: AnalysisStats::count_lines(&sections),
        generation,
        total_duration_ms: total_start.elapsed().as_millis() as u64 + extraction_ms,
    };
    info!(
        "Analysis complete: {} input chars, {} attempt(s), {}ms",
        stats.input_chars, stats.generation.attempts, stats.total_duration_ms
    );

    Ok(AnalysisOutput {
        sections,
        raw_response,
        translation,
        stats,
    })
}

/// Translate an existing summary, e.g. when the user changes the language
/// selector after the analysis is done.
///
/// Never fails: a provider or generation error yields a degraded
/// [`TranslationOutcome`] carrying the error message.
pub async fn translate_summary(
    summary: &str,
    language: Language,
    config: &AnalyzerConfig,
) -> TranslationOutcome {
    match resolve_generator(config) {
        Ok(generator) => translate_with(generator.as_ref(), summary, language, config).await,
        Err(e) => degraded(language, e),
    }
}

async fn translate_with(
    generator: &dyn TextGenerator,
    summary: &str,
    language: Language,
    config: &AnalyzerConfig,
) -> TranslationOutcome {
    match translate_text(generator, summary, language, config).await {
        Ok((translated, generation)) => {
            debug!("Summary translated to {}", language);
            TranslationOutcome {
                language,
                summary: Some(translated),
                error: None,
                generation,
            }
        }
        Err(e) => degraded(language, e),
    }
}

fn degraded(language: Language, e: AnalyzerError) -> TranslationOutcome {
    warn!("Translation to {} failed; showing original summary: {}", language, e);
    TranslationOutcome {
        language,
        summary: None,
        error: Some(e.to_string()),
        generation: None,
    }
}

/// Write the PDF export of `sections` to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
/// Returns the number of bytes written.
pub async fn export_to_file(
    sections: &AnalysisSections,
    output_path: impl AsRef<Path>,
) -> Result<usize, AnalyzerError> {
    let path = output_path.as_ref();
    let bytes = export::export_pdf(sections)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AnalyzerError::OutputWriteFailed {
                    path: path.to_path_buf(),
                    source: e,
                })?;
        }
    }

    let tmp_path = path.with_extension("pdf.tmp");
    tokio::fs::write(&tmp_path, &bytes)
        .await
        .map_err(|e| AnalyzerError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| AnalyzerError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    info!("PDF export written to {} ({} bytes)", path.display(), bytes.len());
    Ok(bytes.len())
}
