//! Input resolution: a local path, `-` for stdin, or an HTTP(S) URL → bytes
//! plus the media type that decides how they are read.
//!
//! The media type comes from, in order: the caller's explicit choice, the
//! `Content-Type` response header (URLs only), the file extension. Stdin
//! without an explicit type is treated as plain text.

use crate::error::AnalyzerError;
use crate::pipeline::extract::MediaType;
use std::path::PathBuf;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

/// An uploaded document, ready for text extraction.
#[derive(Debug, Clone)]
pub struct ResolvedDocument {
    pub bytes: Vec<u8>,
    pub media_type: MediaType,
    /// Where the bytes came from, for logs and output headers.
    pub source: String,
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve `input` into document bytes.
pub async fn resolve_input(
    input: &str,
    declared: Option<MediaType>,
    timeout_secs: u64,
) -> Result<ResolvedDocument, AnalyzerError> {
    if input == "-" {
        read_stdin(declared).await
    } else if is_url(input) {
        download_url(input, declared, timeout_secs).await
    } else {
        read_local(input, declared).await
    }
}

async fn read_stdin(declared: Option<MediaType>) -> Result<ResolvedDocument, AnalyzerError> {
    let mut bytes = Vec::new();
    tokio::io::stdin()
        .read_to_end(&mut bytes)
        .await
        .map_err(|e| AnalyzerError::Internal(format!("Failed to read stdin: {e}")))?;
    debug!("Read {} bytes from stdin", bytes.len());
    Ok(ResolvedDocument {
        bytes,
        media_type: declared.unwrap_or(MediaType::PlainText),
        source: "<stdin>".into(),
    })
}

async fn read_local(
    path_str: &str,
    declared: Option<MediaType>,
) -> Result<ResolvedDocument, AnalyzerError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(AnalyzerError::FileNotFound { path });
    }

    let bytes = match tokio::fs::read(&path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(AnalyzerError::PermissionDenied { path });
        }
        Err(_) => return Err(AnalyzerError::FileNotFound { path }),
    };

    let media_type = declared.unwrap_or_else(|| MediaType::from_path(&path));
    debug!(
        "Resolved local document: {} ({}, {} bytes)",
        path.display(),
        media_type,
        bytes.len()
    );
    Ok(ResolvedDocument {
        bytes,
        media_type,
        source: path.display().to_string(),
    })
}

async fn download_url(
    url: &str,
    declared: Option<MediaType>,
    timeout_secs: u64,
) -> Result<ResolvedDocument, AnalyzerError> {
    info!("Downloading document from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| AnalyzerError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            AnalyzerError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            AnalyzerError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(AnalyzerError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let header_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let bytes = response
        .bytes()
        .await
        .map_err(|e| AnalyzerError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?
        .to_vec();

    let media_type = declared.unwrap_or_else(|| media_type_for_url(url, header_type.as_deref()));
    info!("Downloaded {} bytes ({})", bytes.len(), media_type);

    Ok(ResolvedDocument {
        bytes,
        media_type,
        source: url.to_string(),
    })
}

/// Pick a media type for a download: a recognised `Content-Type` wins,
/// otherwise fall back to the extension of the URL's last path segment.
fn media_type_for_url(url: &str, content_type: Option<&str>) -> MediaType {
    if let Some(ct) = content_type {
        let from_header = MediaType::from_mime(ct);
        if !matches!(from_header, MediaType::Unsupported(_)) {
            return from_header;
        }
    }

    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .map(MediaType::from_path)
        .unwrap_or_else(|| MediaType::Unsupported(content_type.unwrap_or_default().to_string()))
}
