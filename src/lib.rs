//! # finreport-insights
//!
//! Extract structured financial metrics from PDF reports with Google Gemini.
//!
//! ## Why this crate?
//!
//! Quarterly and annual reports bury the handful of numbers an analyst wants
//! (revenue, profit, EPS, guidance) across dozens of pages. This crate pulls
//! the text layer out of the PDF, asks a language model for a fixed JSON
//! shape, recovers the JSON from whatever the model actually replied, and
//! rejects replies that lack the required sections.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     upload bytes, local file or URL
//!  ├─ 2. Extract   per-page text via lopdf (CPU-bound, spawn_blocking)
//!  ├─ 3. Encode    [PAGE n] markers, or the whole PDF as base64
//!  ├─ 4. Model     throttled Gemini generateContent call
//!  ├─ 5. Normalise strip fences, fall back to the {…} slice
//!  ├─ 6. Validate  required top-level keys
//!  └─ 7. Present   JSON (REST/CLI) or dashboard tiles (HTML/text)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use finreport_insights::{Analyzer, AnalyzerConfig, ReportTemplate, Analysis};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads GEMINI_API_KEY, GEMINI_MODEL, ...
//!     let analyzer = Analyzer::new(AnalyzerConfig::from_env()?)?;
//!     if let Analysis::Report(report) = analyzer.analyze("q3.pdf", ReportTemplate::Quarterly).await? {
//!         println!("{}", serde_json::to_string_pretty(&report.insights)?);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`    | on | The `finreport` binary (clap + anyhow + indicatif + tracing-subscriber) |
//! | `server` | on | The [`server`] module and `finreport-server` binary (axum + tower-http) |
//!
//! Library-only users can turn both off:
//! ```toml
//! finreport-insights = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod prompts;
#[cfg(feature = "server")]
pub mod server;
pub mod throttle;

#[cfg(test)]
mod test_pdf;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{Analysis, Analyzer};
pub use config::{AnalyzerConfig, AnalyzerConfigBuilder, ReportTemplate};
pub use dashboard::{DashboardSection, DashboardView, MetricTile};
pub use error::{AnalysisError, ErrorKind};
pub use output::{
    AnalyzeResponse, DashboardAnalysis, ExtractedDocument, MetricEntry, MetricValue, PageRecord,
    ReportAnalysis,
};
pub use pipeline::input::PdfInput;
pub use pipeline::llm::{GeminiClient, GenerationRequest, GenerativeModel, RequestPart};
pub use pipeline::postprocess::ParseOutcome;
pub use throttle::CallThrottle;
