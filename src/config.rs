//! Configuration types for legal document analysis.
//!
//! All analysis behaviour is controlled through [`AnalyzerConfig`], built via
//! its [`AnalyzerConfigBuilder`]. The same config drives the analysis call,
//! the summary translation and the law-explorer explanation, so one set of
//! model/retry settings applies everywhere.

use crate::error::AnalyzerError;
use crate::pipeline::classify::HeadingMatcher;
use crate::pipeline::llm::TextGenerator;
use crate::pipeline::translate::Language;
use crate::progress::{AnalysisProgressCallback, ProgressCallback};
use std::fmt;
use std::sync::Arc;

/// Model used when nothing else is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Configuration for an analysis run.
///
/// Built via [`AnalyzerConfig::builder()`] or using
/// [`AnalyzerConfig::default()`].
///
/// # Example
/// ```rust
/// use legal_analyzer::{AnalyzerConfig, HeadingMatcher, Language};
///
/// let config = AnalyzerConfig::builder()
///     .model("gemini-2.5-flash")
///     .language(Language::German)
///     .heading_matcher(HeadingMatcher::LineAnchored)
///     .max_retries(2)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct AnalyzerConfig {
    /// LLM model identifier. If None, uses [`DEFAULT_MODEL`].
    pub model: Option<String>,

    /// LLM provider name (e.g. "gemini", "openai", "ollama").
    /// If None along with `generator`, the provider is auto-detected.
    pub provider_name: Option<String>,

    /// Pre-constructed generator. Takes precedence over `provider_name`.
    pub generator: Option<Arc<dyn TextGenerator>>,

    /// Sampling temperature. Default: 0.2.
    ///
    /// Low values keep the model close to the document wording, which is
    /// what a plain-language explanation of a contract needs.
    pub temperature: f32,

    /// Maximum tokens the model may generate per call. Default: 8192.
    ///
    /// The analysis answer carries six sections plus a 15-line summary
    /// paragraph and a dozen bullets; 4 096 tokens truncates long contracts.
    pub max_tokens: usize,

    /// Retries after the first failed generation attempt. Default: 3.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled per retry. Default: 500.
    pub retry_backoff_ms: u64,

    /// Per-attempt generation timeout in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// How section headings are recognised. Default: [`HeadingMatcher::Substring`].
    pub heading_matcher: HeadingMatcher,

    /// Target language of the summary. Default: English (no translation).
    pub language: Language,

    /// Replacement analysis prompt. Must contain `{text}`.
    pub analysis_prompt: Option<String>,

    /// Optional progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            generator: None,
            temperature: 0.2,
            max_tokens: 8192,
            max_retries: 3,
            retry_backoff_ms: 500,
            api_timeout_secs: 120,
            download_timeout_secs: 120,
            heading_matcher: HeadingMatcher::default(),
            language: Language::default(),
            analysis_prompt: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for AnalyzerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyzerConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("generator", &self.generator.as_ref().map(|_| "<dyn TextGenerator>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("heading_matcher", &self.heading_matcher)
            .field("language", &self.language)
            .field("analysis_prompt", &self.analysis_prompt.as_ref().map(|p| p.len()))
            .finish()
    }
}

impl AnalyzerConfig {
    /// Create a new builder for `AnalyzerConfig`.
    pub fn builder() -> AnalyzerConfigBuilder {
        AnalyzerConfigBuilder {
            config: Self::default(),
        }
    }

    /// The model id that will be requested.
    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub(crate) fn progress(&self) -> Option<&dyn AnalysisProgressCallback> {
        self.progress_callback.as_deref()
    }
}

/// Builder for [`AnalyzerConfig`].
pub struct AnalyzerConfigBuilder {
    config: AnalyzerConfig,
}

impl fmt::Debug for AnalyzerConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyzerConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl AnalyzerConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.config.generator = Some(generator);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn heading_matcher(mut self, matcher: HeadingMatcher) -> Self {
        self.config.heading_matcher = matcher;
        self
    }

    pub fn language(mut self, language: Language) -> Self {
        self.config.language = language;
        self
    }

    pub fn analysis_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.analysis_prompt = Some(prompt.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalyzerConfig, AnalyzerError> {
        let c = &self.config;
        if c.max_retries > 10 {
            return Err(AnalyzerError::InvalidConfig(format!(
                "max_retries must be ≤ 10, got {}",
                c.max_retries
            )));
        }
        if c.api_timeout_secs == 0 {
            return Err(AnalyzerError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        if c.max_tokens < 256 {
            return Err(AnalyzerError::InvalidConfig(format!(
                "max_tokens must be ≥ 256, got {}",
                c.max_tokens
            )));
        }
        if let Some(ref prompt) = c.analysis_prompt {
            if !prompt.contains("{text}") {
                return Err(AnalyzerError::InvalidConfig(
                    "custom analysis prompt must contain the {text} placeholder".into(),
                ));
            }
        }
        Ok(self.config)
    }
}
