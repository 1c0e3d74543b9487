//! Input resolution: turn a path, URL or upload into PDF bytes in memory.
//!
//! `lopdf` parses from a byte slice, so every input ends up as a
//! [`PdfInput`] regardless of where it came from. The `%PDF` magic is checked
//! here so callers get `NotAPdf` instead of a parser error deep inside
//! extraction.

use crate::error::AnalysisError;
use std::path::PathBuf;
use tracing::{debug, info};

/// A PDF held in memory together with a display name.
#[derive(Debug, Clone)]
pub struct PdfInput {
    /// File name or URL tail, used in logs and the dashboard header.
    pub name: String,
    /// Raw PDF bytes.
    pub bytes: Vec<u8>,
}

impl PdfInput {
    /// Wrap uploaded bytes, validating the PDF header.
    pub fn from_upload(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, AnalysisError> {
        check_pdf_magic(&bytes)?;
        Ok(Self {
            name: name.into(),
            bytes,
        })
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Reject buffers that do not start with `%PDF`.
pub fn check_pdf_magic(bytes: &[u8]) -> Result<(), AnalysisError> {
    if bytes.starts_with(b"%PDF") {
        Ok(())
    } else {
        Err(AnalysisError::NotAPdf {
            magic: bytes.iter().take(4).copied().collect(),
        })
    }
}

/// Resolve the input string to PDF bytes.
///
/// URLs are downloaded; anything else is treated as a local path.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<PdfInput, AnalysisError> {
    if input.trim().is_empty() {
        return Err(AnalysisError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        read_local(input).await
    }
}

/// Read a local file, validating existence and PDF magic bytes.
async fn read_local(path_str: &str) -> Result<PdfInput, AnalysisError> {
    let path = PathBuf::from(path_str);

    let bytes = match tokio::fs::read(&path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(AnalysisError::PermissionDenied { path });
        }
        Err(_) => return Err(AnalysisError::FileNotFound { path }),
    };

    check_pdf_magic(&bytes)?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path_str.to_string());

    debug!("Read local PDF: {} ({} bytes)", path.display(), bytes.len());
    Ok(PdfInput { name, bytes })
}

/// Download a URL into memory.
async fn download_url(url: &str, timeout_secs: u64) -> Result<PdfInput, AnalysisError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| AnalysisError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            AnalysisError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            AnalysisError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(AnalysisError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| AnalysisError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?
        .to_vec();

    check_pdf_magic(&bytes)?;

    info!("Downloaded {} bytes", bytes.len());
    Ok(PdfInput {
        name: filename_from_url(url),
        bytes,
    })
}

/// Last path segment of a URL if it looks like a file name.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded.pdf".to_string()
}
