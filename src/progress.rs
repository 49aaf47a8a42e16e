//! Progress-callback trait for analysis events.
//!
//! Inject an [`Arc<dyn AnalysisProgressCallback>`] via
//! [`crate::config::AnalyzerConfigBuilder::progress_callback`] to be told
//! what the pipeline is doing while it waits on the model. The CLI uses it
//! to drive a spinner; a web front-end would forward the events to the page.
//!
//! # Example
//!
//! ```rust
//! use legal_analyzer::{AnalysisProgressCallback, AnalyzerConfig};
//! use std::sync::{Arc, atomic::{AtomicU32, Ordering}};
//!
//! struct RetryCounter(AtomicU32);
//!
//! impl AnalysisProgressCallback for RetryCounter {
//!     fn on_generation_retry(&self, attempt: u32, max_retries: u32, _error: &str) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("retry {attempt}/{max_retries}");
//!     }
//! }
//!
//! let config = AnalyzerConfig::builder()
//!     .progress_callback(Arc::new(RetryCounter(AtomicU32::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use crate::pipeline::classify::AnalysisSections;
use std::sync::Arc;

/// Called by the analysis pipeline at each stage boundary.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Implementations must be `Send + Sync` because the
/// config that carries them is shared across tasks.
pub trait AnalysisProgressCallback: Send + Sync {
    /// Text has been extracted (or taken from pasted input).
    ///
    /// # Arguments
    /// * `chars`: number of characters handed to the model
    fn on_text_ready(&self, chars: usize) {
        let _ = chars;
    }

    /// A generation request is about to be sent.
    ///
    /// # Arguments
    /// * `purpose`: short label: `"analysis"`, `"translation"` or `"explanation"`
    fn on_generation_start(&self, purpose: &str) {
        let _ = purpose;
    }

    /// An attempt failed and the pipeline is about to back off and retry.
    ///
    /// # Arguments
    /// * `attempt`: 1-based number of the retry about to run
    /// * `max_retries`: configured retry ceiling
    /// * `error`: why the previous attempt failed
    fn on_generation_retry(&self, attempt: u32, max_retries: u32, error: &str) {
        let _ = (attempt, max_retries, error);
    }

    /// The model answered.
    ///
    /// # Arguments
    /// * `purpose`: same label passed to `on_generation_start`
    /// * `response_len`: byte length of the response text
    fn on_generation_complete(&self, purpose: &str, response_len: usize) {
        let _ = (purpose, response_len);
    }

    /// The response has been split into sections.
    fn on_sections_ready(&self, sections: &AnalysisSections) {
        let _ = sections;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl AnalysisProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::AnalyzerConfig`].
pub type ProgressCallback = Arc<dyn AnalysisProgressCallback>;
