//! Error types for the finreport-insights library.
//!
//! Every pipeline stage (extract → prompt → model call → normalise →
//! validate) returns [`AnalysisError`]. There is no partial-result path: one
//! failure anywhere discards the whole request.
//!
//! Callers that need to branch on the failure category (the HTTP layer picks a
//! status code, the dashboard decides whether to show the raw model reply)
//! use [`AnalysisError::kind`] instead of matching message strings.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the finreport-insights library.
#[derive(Debug, Error)]
pub enum AnalysisError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// The bytes do not start with the `%PDF` header.
    #[error("Upload is not a valid PDF (first bytes: {magic:?})")]
    NotAPdf { magic: Vec<u8> },

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF is corrupt or unsupported: {detail}")]
    CorruptPdf { detail: String },

    /// The document opened but one page's content stream could not be read.
    #[error("Text extraction failed for page {page}: {detail}")]
    PageExtractionFailed { page: u32, detail: String },

    /// Every page was blank or whitespace-only.
    #[error("Could not extract text from PDF ({total_pages} pages, none with text)")]
    NoExtractableText { total_pages: usize },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// No API key configured for the model provider.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The model API returned an error or could not be reached.
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    /// Model API returned HTTP 429.
    #[error("Rate limit exceeded for provider '{provider}'")]
    RateLimitExceeded {
        provider: String,
        retry_after_secs: Option<u64>,
    },

    /// Model API call exceeded the configured timeout.
    #[error("API call timed out after {elapsed_ms}ms")]
    ApiTimeout { elapsed_ms: u64 },

    /// Model API rejected the credentials (401/403, or 400 `API_KEY_INVALID`).
    #[error("Authentication error from provider '{provider}': {detail}")]
    AuthError { provider: String, detail: String },

    // ── Response errors ───────────────────────────────────────────────────
    /// Neither the fence-stripped text nor the brace-delimited slice parsed as JSON.
    #[error("Could not parse model response as JSON")]
    Unparseable { raw: String },

    /// The reply parsed but lacks required top-level sections.
    #[error("Missing required sections in analysis: {}", missing.join(", "))]
    MissingSections { missing: Vec<String>, raw: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure category of an [`AnalysisError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad path, URL or download.
    Input,
    /// Unreadable PDF or no text on any page.
    Extraction,
    /// The external model call failed.
    LlmCall,
    /// The model reply was not recoverable as JSON.
    Parse,
    /// The reply parsed but is missing required keys.
    Validation,
    /// Configuration or internal failure.
    Internal,
}

impl AnalysisError {
    /// Classify this error into its pipeline stage.
    pub fn kind(&self) -> ErrorKind {
        use AnalysisError::*;
        match self {
            FileNotFound { .. }
            | PermissionDenied { .. }
            | InvalidInput { .. }
            | DownloadFailed { .. }
            | DownloadTimeout { .. } => ErrorKind::Input,
            NotAPdf { .. }
            | CorruptPdf { .. }
            | PageExtractionFailed { .. }
            | NoExtractableText { .. } => ErrorKind::Extraction,
            ProviderNotConfigured { .. }
            | LlmApiError { .. }
            | RateLimitExceeded { .. }
            | ApiTimeout { .. }
            | AuthError { .. } => ErrorKind::LlmCall,
            Unparseable { .. } => ErrorKind::Parse,
            MissingSections { .. } => ErrorKind::Validation,
            InvalidConfig(_) | Internal(_) => ErrorKind::Internal,
        }
    }

    /// The model's raw reply, when the failure happened after the call returned.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            AnalysisError::Unparseable { raw } | AnalysisError::MissingSections { raw, .. } => {
                Some(raw)
            }
            _ => None,
        }
    }
}
