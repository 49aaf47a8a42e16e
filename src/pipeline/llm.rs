//! The generation call: prompt in, free-form text out.
//!
//! [`TextGenerator`] is the seam between this crate and whatever model
//! answers. Production code uses [`LlmGenerator`], a thin adapter over an
//! `edgequake_llm` provider; tests plug in a canned implementation.
//!
//! ## Retry Strategy
//!
//! Quota (429), overload (503) and timeouts are the usual failures of a
//! hosted model. [`generate_with_retry`] wraps every attempt in a timeout
//! and backs off exponentially (`retry_backoff_ms * 2^(attempt-1)`): with
//! the defaults that is 500 ms → 1 s → 2 s. Errors that cannot heal on
//! their own (provider not configured) are returned immediately.

use crate::config::AnalyzerConfig;
use crate::error::AnalyzerError;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, info, warn};

/// Sampling options forwarded to the generator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_tokens: usize,
}

impl From<&AnalyzerConfig> for GenerationOptions {
    fn from(config: &AnalyzerConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

/// Raw answer from one successful call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
}

/// Something that turns a prompt into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Run one generation attempt. No retries here.
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<Generation, AnalyzerError>;
}

/// [`TextGenerator`] backed by an `edgequake_llm` provider.
pub struct LlmGenerator {
    provider: Arc<dyn LLMProvider>,
}

impl LlmGenerator {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl TextGenerator for LlmGenerator {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<Generation, AnalyzerError> {
        let messages = vec![ChatMessage::user(prompt)];
        let completion = CompletionOptions {
            temperature: Some(options.temperature),
            max_tokens: Some(options.max_tokens),
            ..Default::default()
        };

        let response = self
            .provider
            .chat(&messages, Some(&completion))
            .await
            .map_err(|e| AnalyzerError::LlmApiError {
                message: e.to_string(),
            })?;

        Ok(Generation {
            text: response.content,
            prompt_tokens: response.prompt_tokens,
            completion_tokens: response.completion_tokens,
        })
    }
}

/// A generation plus how long and how many attempts it took.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    #[serde(skip)]
    pub text: String,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    /// Attempts made, including the successful one.
    pub attempts: u32,
    pub duration_ms: u64,
}

/// Call the generator with per-attempt timeout and exponential backoff.
///
/// `purpose` is a short label used in logs and progress events.
/// An answer that is empty or whitespace-only counts as a failed attempt.
pub async fn generate_with_retry(
    generator: &dyn TextGenerator,
    prompt: &str,
    purpose: &str,
    config: &AnalyzerConfig,
) -> Result<GenerationReport, AnalyzerError> {
    let start = Instant::now();
    let options = GenerationOptions::from(config);
    let progress = config.progress();

    if let Some(cb) = progress {
        cb.on_generation_start(purpose);
    }
    info!("Requesting {} ({} prompt chars)", purpose, prompt.chars().count());

    let mut last_err = String::from("Unknown error");

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = config.retry_backoff_ms * 2u64.pow(attempt - 1);
            warn!(
                "{}: retry {}/{} after {}ms",
                purpose, attempt, config.max_retries, backoff
            );
            if let Some(cb) = progress {
                cb.on_generation_retry(attempt, config.max_retries, &last_err);
            }
            sleep(Duration::from_millis(backoff)).await;
        }

        let outcome = timeout(
            Duration::from_secs(config.api_timeout_secs),
            generator.generate(prompt, &options),
        )
        .await
        .unwrap_or_else(|_| {
            Err(AnalyzerError::GenerationTimeout {
                secs: config.api_timeout_secs,
            })
        });

        match outcome {
            Ok(generation) if !generation.text.trim().is_empty() => {
                let duration_ms = start.elapsed().as_millis() as u64;
                debug!(
                    "{}: {} prompt tokens, {} completion tokens, {}ms",
                    purpose, generation.prompt_tokens, generation.completion_tokens, duration_ms
                );
                if let Some(cb) = progress {
                    cb.on_generation_complete(purpose, generation.text.len());
                }
                return Ok(GenerationReport {
                    text: generation.text,
                    prompt_tokens: generation.prompt_tokens,
                    completion_tokens: generation.completion_tokens,
                    attempts: attempt + 1,
                    duration_ms,
                });
            }
            Ok(_) => {
                warn!("{}: attempt {} returned an empty response", purpose, attempt + 1);
                last_err = "empty response".to_string();
            }
            Err(e) if e.is_retryable() => {
                warn!("{}: attempt {} failed: {}", purpose, attempt + 1, e);
                last_err = e.to_string();
            }
            Err(e) => return Err(e),
        }
    }

    Err(AnalyzerError::GenerationFailed {
        attempts: config.max_retries + 1,
        detail: last_err,
    })
}

/// Resolve the generator, from most-specific to least-specific.
///
/// 1. **Pre-built generator** (`config.generator`), used as-is.
/// 2. **Named provider** (`config.provider_name`) with `config.model` or
///    [`crate::config::DEFAULT_MODEL`]; the factory reads the matching API key.
/// 3. **Environment pair** `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`.
/// 4. **Gemini key present** (`GEMINI_API_KEY`): the default Gemini model.
/// 5. **Full auto-detection** via `ProviderFactory::from_env`.
pub fn resolve_generator(config: &AnalyzerConfig) -> Result<Arc<dyn TextGenerator>, AnalyzerError> {
    if let Some(ref generator) = config.generator {
        return Ok(Arc::clone(generator));
    }

    let provider = resolve_provider(config)?;
    Ok(Arc::new(LlmGenerator::new(provider)))
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, AnalyzerError> {
    debug!("Creating provider {} with model {}", provider_name, model);
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        AnalyzerError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

fn resolve_provider(config: &AnalyzerConfig) -> Result<Arc<dyn LLMProvider>, AnalyzerError> {
    if let Some(ref name) = config.provider_name {
        return create_provider(name, config.model_or_default());
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if let Ok(key) = std::env::var("GEMINI_API_KEY") {
        if !key.is_empty() {
            return create_provider("gemini", config.model_or_default());
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| AnalyzerError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set GEMINI_API_KEY, OPENAI_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Fails the first `failures` calls, then answers with `answer`.
    struct Flaky {
        failures: u32,
        calls: AtomicU32,
        answer: &'static str,
        error: fn() -> AnalyzerError,
    }

    #[async_trait]
    impl TextGenerator for Flaky {
        async fn generate(
            &self,
            _prompt: &str,
            _options: &GenerationOptions,
        ) -> Result<Generation, AnalyzerError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err((self.error)())
            } else {
                Ok(Generation {
                    text: self.answer.to_string(),
                    prompt_tokens: 10,
                    completion_tokens: 5,
                })
            }
        }
    }

    struct Stalled;

    #[async_trait]
    impl TextGenerator for Stalled {
        async fn generate(
            &self,
            _prompt: &str,
            _options: &GenerationOptions,
        ) -> Result<Generation, AnalyzerError> {
            sleep(Duration::from_secs(3600)).await;
            Ok(Generation::default())
        }
    }

    fn api_error() -> AnalyzerError {
        AnalyzerError::LlmApiError {
            message: "503 overloaded".into(),
        }
    }

    fn fast_config(retries: u32) -> AnalyzerConfig {
        AnalyzerConfig::builder()
            .max_retries(retries)
            .retry_backoff_ms(1)
            .build()
            .unwrap()
    }

    #[test]
    fn options_from_config() {
        let config = AnalyzerConfig::default();
        let opts = GenerationOptions::from(&config);
        assert_eq!(opts.temperature, 0.2);
        assert_eq!(opts.max_tokens, 8192);
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let gen = Flaky {
            failures: 2,
            calls: AtomicU32::new(0),
            answer: "SUMMARY:\nok\n",
            error: api_error,
        };
        let report = generate_with_retry(&gen, "p", "analysis", &fast_config(3))
            .await
            .unwrap();
        assert_eq!(report.attempts, 3);
        assert_eq!(report.text, "SUMMARY:\nok\n");
        assert_eq!(report.prompt_tokens, 10);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let gen = Flaky {
            failures: u32::MAX,
            calls: AtomicU32::new(0),
            answer: "",
            error: api_error,
        };
        let err = generate_with_retry(&gen, "p", "analysis", &fast_config(2))
            .await
            .unwrap_err();
        match err {
            AnalyzerError::GenerationFailed { attempts, detail } => {
                assert_eq!(attempts, 3);
                assert!(detail.contains("503"), "got: {detail}");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(gen.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn empty_answer_is_retried() {
        let gen = Flaky {
            failures: 0,
            calls: AtomicU32::new(0),
            answer: "   \n",
            error: api_error,
        };
        let err = generate_with_retry(&gen, "p", "analysis", &fast_config(1))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("empty response"));
        assert_eq!(gen.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn non_retryable_error_returns_immediately() {
        let gen = Flaky {
            failures: u32::MAX,
            calls: AtomicU32::new(0),
            answer: "",
            error: || AnalyzerError::ProviderNotConfigured {
                provider: "gemini".into(),
                hint: "set GEMINI_API_KEY".into(),
            },
        };
        let err = generate_with_retry(&gen, "p", "analysis", &fast_config(3))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalyzerError::ProviderNotConfigured { .. }));
        assert_eq!(gen.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_call_times_out() {
        let config = AnalyzerConfig::builder()
            .max_retries(0)
            .api_timeout_secs(5)
            .build()
            .unwrap();
        let err = generate_with_retry(&Stalled, "p", "analysis", &config)
            .await
            .unwrap_err();
        match err {
            AnalyzerError::GenerationFailed { attempts, detail } => {
                assert_eq!(attempts, 1);
                assert!(detail.contains("timed out after 5s"), "got: {detail}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn progress_sees_retries() {
        use crate::progress::AnalysisProgressCallback;

        #[derive(Default)]
        struct Log(Mutex<Vec<String>>);
        impl AnalysisProgressCallback for Log {
            fn on_generation_start(&self, purpose: &str) {
                self.0.lock().unwrap().push(format!("start:{purpose}"));
            }
            fn on_generation_retry(&self, attempt: u32, _max: u32, _error: &str) {
                self.0.lock().unwrap().push(format!("retry:{attempt}"));
            }
            fn on_generation_complete(&self, purpose: &str, _len: usize) {
                self.0.lock().unwrap().push(format!("done:{purpose}"));
            }
        }

        let log = Arc::new(Log::default());
        let config = AnalyzerConfig::builder()
            .retry_backoff_ms(1)
            .progress_callback(log.clone())
            .build()
            .unwrap();
        let gen = Flaky {
            failures: 1,
            calls: AtomicU32::new(0),
            answer: "text",
            error: api_error,
        };
        generate_with_retry(&gen, "p", "translation", &config)
            .await
            .unwrap();
        assert_eq!(
            *log.0.lock().unwrap(),
            vec!["start:translation", "retry:1", "done:translation"]
        );
    }

    #[test]
    fn explicit_generator_wins() {
        let gen: Arc<dyn TextGenerator> = Arc::new(Stalled);
        let config = AnalyzerConfig::builder().generator(gen.clone()).build().unwrap();
        let resolved = resolve_generator(&config).unwrap();
        assert!(Arc::ptr_eq(&resolved, &gen));
    }
}
