//! Analysis entry points: one upload in, one validated result out.
//!
//! [`Analyzer`] owns the configuration, the model client and the call
//! throttle. The server shares one instance behind an `Arc`, so the throttle
//! spaces calls across every concurrent request; the CLI builds one per run.
//!
//! There is no partial-result path. Any stage failure discards the request
//! and is returned as an [`AnalysisError`].

use crate::config::{AnalyzerConfig, ReportTemplate};
use crate::error::AnalysisError;
use crate::output::{DashboardAnalysis, ExtractedDocument, ReportAnalysis};
use crate::pipeline::input::{self, PdfInput};
use crate::pipeline::llm::{GeminiClient, GenerationRequest, GenerativeModel, RequestPart};
use crate::pipeline::{encode, extract, postprocess, validate};
use crate::prompts;
use crate::throttle::CallThrottle;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Sampling temperature of the consolidated template.
pub const CONSOLIDATED_TEMPERATURE: f32 = 0.1;

/// Output token cap of the consolidated template.
pub const CONSOLIDATED_MAX_OUTPUT_TOKENS: u32 = 2000;

/// Result of [`Analyzer::analyze`], one variant per template.
#[derive(Debug, Clone)]
pub enum Analysis {
    Report(ReportAnalysis),
    Dashboard(DashboardAnalysis),
}

impl Analysis {
    /// Reply text as returned by the model.
    pub fn raw_response(&self) -> &str {
        match self {
            Analysis::Report(r) => &r.raw_response,
            Analysis::Dashboard(d) => &d.raw_response,
        }
    }

    /// Page count of the analysed PDF.
    pub fn total_pages(&self) -> usize {
        match self {
            Analysis::Report(r) => r.total_pages,
            Analysis::Dashboard(d) => d.total_pages,
        }
    }
}

/// Runs the extraction → model → validation pipeline.
pub struct Analyzer {
    config: AnalyzerConfig,
    model: Arc<dyn GenerativeModel>,
    throttle: CallThrottle,
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("config", &self.config)
            .field("provider", &self.model.provider())
            .field("throttle", &self.throttle)
            .finish()
    }
}

impl Analyzer {
    /// Create an analyzer backed by [`GeminiClient`].
    pub fn new(config: AnalyzerConfig) -> Result<Self, AnalysisError> {
        let client = GeminiClient::new(&config)?;
        Ok(Self::with_model(config, Arc::new(client)))
    }

    /// Create an analyzer backed by any [`GenerativeModel`].
    pub fn with_model(config: AnalyzerConfig, model: Arc<dyn GenerativeModel>) -> Self {
        let throttle = CallThrottle::new(config.min_call_interval);
        Self {
            config,
            model,
            throttle,
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Name of the model provider.
    pub fn provider(&self) -> &str {
        self.model.provider()
    }

    /// Quarterly template: marked page text in, highlights/metrics/outlook out.
    ///
    /// # Errors
    /// - extraction errors, including `NoExtractableText` when every page is blank
    /// - model call errors
    /// - `Unparseable` / `MissingSections` for unusable replies
    pub async fn analyze_report(&self, pdf: &PdfInput) -> Result<ReportAnalysis, AnalysisError> {
        let start = Instant::now();
        info!("Analyzing '{}' ({} bytes)", pdf.name, pdf.bytes.len());

        let document = extract::extract_pages(&pdf.bytes).await?;
        if !document.has_text() {
            return Err(AnalysisError::NoExtractableText {
                total_pages: document.total_pages,
            });
        }
        info!(
            "Extracted {} of {} pages ({} chars)",
            document.pages.len(),
            document.total_pages,
            document.char_count()
        );

        let request = GenerationRequest {
            instruction: prompts::quarterly_instruction(document.total_pages),
            document: RequestPart::Text(encode::mark_pages(&document.pages)),
            temperature: self.config.temperature,
            max_output_tokens: self.config.max_output_tokens,
        };

        let raw = self.generate(&request).await?;
        let value = postprocess::parse_response(&raw)?;
        let insights =
            validate::validate_structure(value, ReportTemplate::Quarterly.required_keys(), &raw)?;

        info!(
            "Analysis of '{}' complete in {:?}",
            pdf.name,
            start.elapsed()
        );
        Ok(ReportAnalysis {
            insights,
            total_pages: document.total_pages,
            raw_response: raw,
        })
    }

    /// Consolidated template: the PDF itself goes to the model.
    ///
    /// Text is still extracted to count pages and to reject unreadable
    /// files before spending a model call, but blank pages are not an error.
    pub async fn analyze_consolidated(
        &self,
        pdf: &PdfInput,
    ) -> Result<DashboardAnalysis, AnalysisError> {
        let start = Instant::now();
        info!("Analyzing '{}' for dashboard ({} bytes)", pdf.name, pdf.bytes.len());

        let document = extract::extract_pages(&pdf.bytes).await?;
        debug!(
            "{} pages, {} with text",
            document.total_pages,
            document.pages.len()
        );

        let request = GenerationRequest {
            instruction: prompts::instruction_for(
                ReportTemplate::Consolidated,
                document.total_pages,
            ),
            document: RequestPart::Inline(encode::encode_pdf(&pdf.bytes)),
            temperature: CONSOLIDATED_TEMPERATURE,
            max_output_tokens: CONSOLIDATED_MAX_OUTPUT_TOKENS,
        };

        let raw = self.generate(&request).await?;
        let value = postprocess::parse_response(&raw)?;
        let data = validate::validate_structure(
            value,
            ReportTemplate::Consolidated.required_keys(),
            &raw,
        )?;

        info!(
            "Dashboard analysis of '{}' complete in {:?}",
            pdf.name,
            start.elapsed()
        );
        Ok(DashboardAnalysis {
            data,
            total_pages: document.total_pages,
            raw_response: raw,
        })
    }

    /// Resolve a path or URL and run `template` over it.
    pub async fn analyze(
        &self,
        input_str: impl AsRef<str>,
        template: ReportTemplate,
    ) -> Result<Analysis, AnalysisError> {
        let pdf = input::resolve_input(input_str.as_ref(), self.config.download_timeout_secs).await?;
        match template {
            ReportTemplate::Quarterly => self.analyze_report(&pdf).await.map(Analysis::Report),
            ReportTemplate::Consolidated => {
                self.analyze_consolidated(&pdf).await.map(Analysis::Dashboard)
            }
        }
    }

    /// Extract text without calling the model.
    pub async fn inspect(&self, input_str: impl AsRef<str>) -> Result<ExtractedDocument, AnalysisError> {
        let pdf = input::resolve_input(input_str.as_ref(), self.config.download_timeout_secs).await?;
        extract::extract_pages(&pdf.bytes).await
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, AnalysisError> {
        self.throttle.wait_turn().await;
        let start = Instant::now();
        let raw = self.model.generate(request).await?;
        info!(
            "{} replied with {} chars in {:?}",
            self.model.provider(),
            raw.len(),
            start.elapsed()
        );
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_pdf::build_pdf;
    use futures::future::BoxFuture;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Replays canned replies and records every request.
    struct ScriptedModel {
        replies: Mutex<Vec<Result<String, AnalysisError>>>,
        seen: Mutex<Vec<GenerationRequest>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<Result<String, AnalysisError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    impl GenerativeModel for ScriptedModel {
        fn provider(&self) -> &str {
            "scripted"
        }

        fn generate<'a>(
            &'a self,
            request: &'a GenerationRequest,
        ) -> BoxFuture<'a, Result<String, AnalysisError>> {
            self.seen.lock().unwrap().push(request.clone());
            let reply = self.replies.lock().unwrap().remove(0);
            Box::pin(async move { reply })
        }
    }

    fn pdf(texts: &[Option<&str>]) -> PdfInput {
        PdfInput::from_upload("q3.pdf", build_pdf(texts)).unwrap()
    }

    fn config() -> AnalyzerConfig {
        AnalyzerConfig::builder()
            .min_call_interval(Duration::ZERO)
            .build()
            .unwrap()
    }

    const GOOD_REPLY: &str = "```json\n{\"financialHighlights\": [], \"keyMetrics\": [{\"title\": \"Revenue\", \"value\": \"120 Cr\", \"page\": 1, \"keyword\": \"Revenue\"}], \"futureOutlook\": []}\n```";

    #[tokio::test]
    async fn report_marks_pages_and_validates() {
        let model = ScriptedModel::new(vec![Ok(GOOD_REPLY.to_string())]);
        let analyzer = Analyzer::with_model(config(), model.clone());

        let result = analyzer
            .analyze_report(&pdf(&[Some("Revenue 120 Cr"), None, Some("Outlook stable")]))
            .await
            .unwrap();

        assert_eq!(result.total_pages, 3);
        assert_eq!(result.entries("keyMetrics")[0].title, "Revenue");
        assert_eq!(result.raw_response, GOOD_REPLY);

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].instruction.ends_with("Total pages in document: 3"));
        match &seen[0].document {
            RequestPart::Text(text) => {
                assert!(text.contains("[PAGE 1]"));
                assert!(text.contains("[PAGE 3]"));
                assert!(!text.contains("[PAGE 2]"));
            }
            other => panic!("expected text document, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn blank_report_never_calls_model() {
        let model = ScriptedModel::new(vec![]);
        let analyzer = Analyzer::with_model(config(), model.clone());

        let err = analyzer.analyze_report(&pdf(&[None, None])).await.unwrap_err();
        assert!(matches!(err, AnalysisError::NoExtractableText { total_pages: 2 }));
        assert!(model.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_sections_keep_raw_reply() {
        let reply = r#"{"keyMetrics": []}"#;
        let analyzer = Analyzer::with_model(config(), ScriptedModel::new(vec![Ok(reply.into())]));
        let err = analyzer
            .analyze_report(&pdf(&[Some("Revenue 10")]))
            .await
            .unwrap_err();
        match err {
            AnalysisError::MissingSections { missing, raw } => {
                assert_eq!(missing, vec!["financialHighlights", "futureOutlook"]);
                assert_eq!(raw, reply);
            }
            other => panic!("expected MissingSections, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn model_errors_pass_through() {
        let analyzer = Analyzer::with_model(
            config(),
            ScriptedModel::new(vec![Err(AnalysisError::RateLimitExceeded {
                provider: "scripted".into(),
                retry_after_secs: None,
            })]),
        );
        let err = analyzer
            .analyze_report(&pdf(&[Some("Revenue 10")]))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::RateLimitExceeded { .. }));
    }

    #[tokio::test]
    async fn consolidated_sends_pdf_inline() {
        let reply = r#"Sure! {"core_financials": {"revenue_from_operations": {"value": 1500, "unit": "Cr"}}}"#;
        let model = ScriptedModel::new(vec![Ok(reply.into())]);
        let analyzer = Analyzer::with_model(config(), model.clone());
        let input = pdf(&[None, Some("Consolidated results")]);

        let result = analyzer.analyze_consolidated(&input).await.unwrap();
        assert_eq!(result.total_pages, 2);
        assert!(result.data.contains_key("core_financials"));

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen[0].temperature, CONSOLIDATED_TEMPERATURE);
        assert_eq!(seen[0].max_output_tokens, CONSOLIDATED_MAX_OUTPUT_TOKENS);
        match &seen[0].document {
            RequestPart::Inline(inline) => assert_eq!(inline.mime_type, "application/pdf"),
            other => panic!("expected inline PDF, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn consecutive_analyses_are_throttled() {
        let gap = Duration::from_millis(200);
        let config = AnalyzerConfig::builder()
            .min_call_interval(gap)
            .build()
            .unwrap();
        let model = ScriptedModel::new(vec![Ok(GOOD_REPLY.into()), Ok(GOOD_REPLY.into())]);
        let analyzer = Analyzer::with_model(config, model);
        let input = pdf(&[Some("Revenue 1")]);

        let t0 = std::time::Instant::now();
        analyzer.analyze_report(&input).await.unwrap();
        analyzer.analyze_report(&input).await.unwrap();
        assert!(t0.elapsed() + Duration::from_millis(20) >= gap);
    }
}
