//! Error types for the legal-analyzer library.
//!
//! [`AnalyzerError`] covers every failure that stops an action from
//! completing: the document could not be read, the model never answered,
//! the credential store refused a registration, and so on.
//!
//! A failed *translation* is not an error at the top level:
//! [`crate::analyze`] keeps the untranslated summary and records the failure
//! in [`crate::output::TranslationOutcome`] so the rest of the analysis is
//! still shown.
//!
//! The `Display` strings double as the messages shown to the user, so they
//! are phrased for a person, not for a log file.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the legal-analyzer library.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Document not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// Extraction (or pasted input) produced no usable text.
    #[error("Please upload a file or enter text")]
    EmptyText,

    // ── Extraction errors ─────────────────────────────────────────────────
    /// The declared format was recognised but the content could not be read.
    #[error("Could not read {format} document: {detail}")]
    ExtractionFailed { format: &'static str, detail: String },

    // ── Generation errors ─────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// A single generation attempt exceeded the per-call timeout.
    #[error("Generation call timed out after {secs}s")]
    GenerationTimeout { secs: u64 },

    /// The provider returned an error for a single attempt.
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    /// Every attempt failed; the last error is kept in `detail`.
    #[error("The AI service did not respond after {attempts} attempt(s): {detail}\nPlease try again in a moment.")]
    GenerationFailed { attempts: u32, detail: String },

    // ── Credential errors ─────────────────────────────────────────────────
    /// Registration failed; duplicates and every other insert failure land here.
    #[error("Username already exists")]
    UsernameExists,

    /// Login failed. Unknown user and wrong password are indistinguishable.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Username or password was blank.
    #[error("Username and password must not be empty")]
    EmptyCredentials,

    /// The credential database could not be opened or queried.
    #[error("Credential store error: {0}")]
    CredentialStore(#[from] rusqlite::Error),

    /// Argon2 rejected the hashing parameters.
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    // ── Law explorer errors ───────────────────────────────────────────────
    /// Category or issue is not in the static law table.
    #[error("No law entry for category '{category}'{}", .issue.as_ref().map(|i| format!(", issue '{i}'")).unwrap_or_default())]
    UnknownLaw {
        category: String,
        issue: Option<String>,
    },

    // ── Export errors ─────────────────────────────────────────────────────
    /// lopdf failed to serialise the document.
    #[error("PDF export failed: {0}")]
    PdfExport(String),

    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AnalyzerError {
    /// Whether a generation attempt that failed this way is worth retrying.
    ///
    /// Configuration problems never heal on their own; everything coming back
    /// from the wire might.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AnalyzerError::GenerationTimeout { .. } | AnalyzerError::LlmApiError { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_facing_messages() {
        assert_eq!(
            AnalyzerError::EmptyText.to_string(),
            "Please upload a file or enter text"
        );
        assert_eq!(AnalyzerError::UsernameExists.to_string(), "Username already exists");
        assert_eq!(AnalyzerError::InvalidCredentials.to_string(), "Invalid credentials");
    }

    #[test]
    fn generation_failed_display() {
        let e = AnalyzerError::GenerationFailed {
            attempts: 4,
            detail: "quota exceeded".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("4 attempt"), "got: {msg}");
        assert!(msg.contains("quota exceeded"));
    }

    #[test]
    fn unknown_law_display() {
        let cat_only = AnalyzerError::UnknownLaw {
            category: "Maritime Law".into(),
            issue: None,
        };
        assert_eq!(cat_only.to_string(), "No law entry for category 'Maritime Law'");

        let with_issue = AnalyzerError::UnknownLaw {
            category: "Civil Law".into(),
            issue: Some("Theft".into()),
        };
        assert!(with_issue.to_string().ends_with(", issue 'Theft'"));
    }

    #[test]
    fn retryable_classification() {
        assert!(AnalyzerError::GenerationTimeout { secs: 5 }.is_retryable());
        assert!(AnalyzerError::LlmApiError { message: "503".into() }.is_retryable());
        assert!(!AnalyzerError::ProviderNotConfigured {
            provider: "gemini".into(),
            hint: String::new(),
        }
        .is_retryable());
        assert!(!AnalyzerError::EmptyText.is_retryable());
    }
}
