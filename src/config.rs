//! Configuration types for financial report analysis.
//!
//! All analysis behaviour is controlled through [`AnalyzerConfig`], built via
//! its [`AnalyzerConfigBuilder`] or read from the environment with
//! [`AnalyzerConfig::from_env`]. Every knob lives in one struct so the server,
//! the CLI and tests configure the pipeline the same way.

use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default Gemini model identifier.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Default Generative Language API base URL.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Default minimum gap between two model calls.
pub const DEFAULT_MIN_CALL_INTERVAL: Duration = Duration::from_secs(10);

/// Configuration for the analysis pipeline.
///
/// # Example
/// ```rust
/// use finreport_insights::AnalyzerConfig;
/// use std::time::Duration;
///
/// let config = AnalyzerConfig::builder()
///     .api_key("test-key")
///     .model("gemini-1.5-pro")
///     .min_call_interval(Duration::from_secs(2))
///     .build()
///     .unwrap();
/// assert!(config.has_api_key());
/// ```
#[derive(Clone)]
pub struct AnalyzerConfig {
    /// Gemini API key. `None` means the model client is not configured and
    /// every analysis fails with `ProviderNotConfigured`.
    pub api_key: Option<String>,

    /// Model identifier, e.g. "gemini-1.5-flash". Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// API base URL without trailing slash. Default: [`DEFAULT_API_BASE`].
    pub api_base: String,

    /// Minimum wall-clock gap between consecutive model calls. Default: 10 s.
    ///
    /// The free Gemini tier allows only a handful of requests per minute;
    /// spacing calls avoids 429 responses on back-to-back uploads.
    pub min_call_interval: Duration,

    /// Sampling temperature for the quarterly template. Default: 0.2.
    ///
    /// The consolidated template always uses 0.1.
    pub temperature: f32,

    /// Maximum tokens the model may generate for the quarterly template. Default: 8192.
    pub max_output_tokens: u32,

    /// Per-call timeout in seconds. Default: none (wait until the API answers).
    pub api_timeout_secs: Option<u64>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            min_call_interval: DEFAULT_MIN_CALL_INTERVAL,
            temperature: 0.2,
            max_output_tokens: 8192,
            api_timeout_secs: None,
            download_timeout_secs: 120,
        }
    }
}

impl fmt::Debug for AnalyzerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyzerConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("min_call_interval", &self.min_call_interval)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("download_timeout_secs", &self.download_timeout_secs)
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

    /// Build a configuration from environment variables.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `GEMINI_API_KEY` | `api_key` |
    /// | `GEMINI_MODEL` | `model` |
    /// | `GEMINI_API_BASE` | `api_base` |
    /// | `FINREPORT_MIN_INTERVAL_SECS` | `min_call_interval` |
    ///
    /// Unset or empty variables keep their defaults.
    pub fn from_env() -> Result<Self, AnalysisError> {
        let mut builder = Self::builder();
        if let Some(key) = non_empty_env("GEMINI_API_KEY") {
            builder = builder.api_key(key);
        }
        if let Some(model) = non_empty_env("GEMINI_MODEL") {
            builder = builder.model(model);
        }
        if let Some(base) = non_empty_env("GEMINI_API_BASE") {
            builder = builder.api_base(base);
        }
        if let Some(secs) = non_empty_env("FINREPORT_MIN_INTERVAL_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                AnalysisError::InvalidConfig(format!(
                    "FINREPORT_MIN_INTERVAL_SECS must be a whole number of seconds, got '{secs}'"
                ))
            })?;
            builder = builder.min_call_interval(Duration::from_secs(secs));
        }
        builder.build()
    }

    /// Whether an API key is configured.
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Builder for [`AnalyzerConfig`].
#[derive(Debug)]
pub struct AnalyzerConfigBuilder {
    config: AnalyzerConfig,
}

impl AnalyzerConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.config.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn min_call_interval(mut self, interval: Duration) -> Self {
        self.config.min_call_interval = interval;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_output_tokens(mut self, n: u32) -> Self {
        self.config.max_output_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = Some(secs);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalyzerConfig, AnalysisError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(AnalysisError::InvalidConfig("Model must not be empty".into()));
        }
        if !(c.api_base.starts_with("http://") || c.api_base.starts_with("https://")) {
            return Err(AnalysisError::InvalidConfig(format!(
                "API base must be an HTTP/HTTPS URL, got '{}'",
                c.api_base
            )));
        }
        if c.max_output_tokens == 0 {
            return Err(AnalysisError::InvalidConfig(
                "max_output_tokens must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == Some(0) {
            return Err(AnalysisError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Which extraction prompt, model input and required sections to use.
///
/// | Template | Model input | Required keys |
/// |----------|-------------|---------------|
/// | `Quarterly` | marked page text | `financialHighlights`, `keyMetrics`, `futureOutlook` |
/// | `Consolidated` | raw PDF bytes | none; sections are rendered when present |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportTemplate {
    /// Highlights, key metrics and outlook with page references. (default)
    #[default]
    Quarterly,
    /// Consolidated results table: core financials, per-share metrics, balance sheet.
    Consolidated,
}

impl ReportTemplate {
    /// Top-level keys a reply must contain for this template.
    pub fn required_keys(self) -> &'static [&'static str] {
        match self {
            ReportTemplate::Quarterly => &["financialHighlights", "keyMetrics", "futureOutlook"],
            ReportTemplate::Consolidated => &[],
        }
    }
}
