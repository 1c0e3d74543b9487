//! Model interaction: build the generation request and call the provider.
//!
//! The pipeline talks to the model through [`GenerativeModel`], so tests
//! and alternative providers can be plugged in without touching prompt or
//! validation logic. [`GeminiClient`] is the production implementation and
//! speaks the Generative Language REST API directly over `reqwest`.
//!
//! ## Request layout
//!
//! One user turn with two parts, in order:
//! 1. the instruction text for the chosen template
//! 2. the document, either `[PAGE n]`-marked text or the PDF as inline data
//!
//! No retries happen here. A 429 surfaces as `RateLimitExceeded`; spacing
//! calls is the job of [`crate::throttle::CallThrottle`].

use crate::config::AnalyzerConfig;
use crate::error::AnalysisError;
use crate::pipeline::encode::InlineData;
use futures::future::BoxFuture;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Document part of a generation request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestPart {
    /// Plain text, e.g. the marked page text.
    Text(String),
    /// Binary content sent inline, e.g. the original PDF.
    Inline(InlineData),
}

/// Everything one model call needs.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub instruction: String,
    pub document: RequestPart,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

/// A text-generating model.
///
/// Implementations return the reply text exactly as produced; fence
/// stripping and JSON recovery happen in `postprocess`.
pub trait GenerativeModel: Send + Sync {
    /// Provider name used in errors and logs.
    fn provider(&self) -> &str;

    /// Send one request and return the reply text.
    fn generate<'a>(
        &'a self,
        request: &'a GenerationRequest,
    ) -> BoxFuture<'a, Result<String, AnalysisError>>;
}

// ── Gemini ───────────────────────────────────────────────────────────────────

const PROVIDER: &str = "gemini";

/// Gemini client over the `generateContent` REST endpoint.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    api_key: Option<String>,
    model: String,
    api_base: String,
}

impl GeminiClient {
    /// Create a client from the analyzer configuration.
    ///
    /// A missing API key is not an error here; every call then fails with
    /// `ProviderNotConfigured`, which lets the server start and report
    /// `gemini: false` on `/health`.
    pub fn new(config: &AnalyzerConfig) -> Result<Self, AnalysisError> {
        let mut builder = Client::builder();
        if let Some(secs) = config.api_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| AnalysisError::Internal(format!("HTTP client init failed: {}", e)))?;

        Ok(Self {
            http,
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            model: config.model.clone(),
            api_base: config.api_base.clone(),
        })
    }

    /// Whether an API key is present.
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base, self.model
        )
    }

    async fn call(&self, request: &GenerationRequest) -> Result<String, AnalysisError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AnalysisError::ProviderNotConfigured {
                provider: PROVIDER.to_string(),
                hint: "Set GEMINI_API_KEY or pass --api-key.".to_string(),
            })?;

        let body = build_body(request);
        let start = Instant::now();
        debug!("Calling {} ({})", self.model, self.endpoint());

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e, start))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok());
            let detail = response.text().await.unwrap_or_default();
            warn!("Gemini returned HTTP {}", status);
            return Err(map_status(status, detail, retry_after_secs));
        }

        let reply: GenerateContentResponse = response.json().await.map_err(|e| {
            AnalysisError::LlmApiError {
                message: format!("Failed to decode response: {}", e),
            }
        })?;

        let text = reply.text().ok_or_else(|| AnalysisError::LlmApiError {
            message: "Response contained no text candidates".to_string(),
        })?;

        debug!(
            "Gemini replied with {} chars in {:?}",
            text.len(),
            start.elapsed()
        );
        Ok(text)
    }

    fn map_transport_error(&self, e: reqwest::Error, start: Instant) -> AnalysisError {
        if e.is_timeout() {
            AnalysisError::ApiTimeout {
                elapsed_ms: start.elapsed().as_millis() as u64,
            }
        } else {
            AnalysisError::LlmApiError {
                message: format!("Request failed: {}", e),
            }
        }
    }
}

impl GenerativeModel for GeminiClient {
    fn provider(&self) -> &str {
        PROVIDER
    }

    fn generate<'a>(
        &'a self,
        request: &'a GenerationRequest,
    ) -> BoxFuture<'a, Result<String, AnalysisError>> {
        Box::pin(self.call(request))
    }
}

fn map_status(status: StatusCode, detail: String, retry_after_secs: Option<u64>) -> AnalysisError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => AnalysisError::RateLimitExceeded {
            provider: PROVIDER.to_string(),
            retry_after_secs,
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AnalysisError::AuthError {
            provider: PROVIDER.to_string(),
            detail,
        },
        // Gemini reports a bad key as 400 INVALID_ARGUMENT.
        StatusCode::BAD_REQUEST if detail.contains("API_KEY_INVALID") => AnalysisError::AuthError {
            provider: PROVIDER.to_string(),
            detail,
        },
        _ => AnalysisError::LlmApiError {
            message: format!("HTTP {}: {}", status, detail),
        },
    }
}

// ── Wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<Blob>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Blob {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

fn build_body(request: &GenerationRequest) -> GenerateContentRequest {
    let document = match &request.document {
        RequestPart::Text(text) => Part {
            text: Some(text.clone()),
            inline_data: None,
        },
        RequestPart::Inline(inline) => Part {
            text: None,
            inline_data: Some(Blob {
                mime_type: inline.mime_type.clone(),
                data: inline.data.clone(),
            }),
        },
    };

    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts: vec![
                Part {
                    text: Some(request.instruction.clone()),
                    inline_data: None,
                },
                document,
            ],
        }],
        generation_config: GenerationConfig {
            temperature: request.temperature,
            max_output_tokens: request.max_output_tokens,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::encode::encode_pdf;
    use axum::http::{header, HeaderMap, Uri};
    use axum::response::{IntoResponse, Response};
    use axum::{Json, Router};
    use serde_json::{json, Value};

    fn text_request() -> GenerationRequest {
        GenerationRequest {
            instruction: "Extract metrics".into(),
            document: RequestPart::Text("[PAGE 1]\nRevenue 120".into()),
            temperature: 0.2,
            max_output_tokens: 8192,
        }
    }

    #[test]
    fn body_with_text_document() {
        let v = serde_json::to_value(build_body(&text_request())).unwrap();
        assert_eq!(v["contents"][0]["role"], "user");
        assert_eq!(v["contents"][0]["parts"][0]["text"], "Extract metrics");
        assert_eq!(v["contents"][0]["parts"][1]["text"], "[PAGE 1]\nRevenue 120");
        assert!(v["contents"][0]["parts"][1].get("inline_data").is_none());
        assert_eq!(v["generationConfig"]["maxOutputTokens"], 8192);
    }

    #[test]
    fn body_with_inline_pdf() {
        let req = GenerationRequest {
            document: RequestPart::Inline(encode_pdf(b"%PDF-1.7")),
            temperature: 0.1,
            max_output_tokens: 2000,
            ..text_request()
        };
        let v = serde_json::to_value(build_body(&req)).unwrap();
        let part = &v["contents"][0]["parts"][1];
        assert_eq!(part["inline_data"]["mime_type"], "application/pdf");
        assert!(part.get("text").is_none());
        assert_eq!(v["generationConfig"]["maxOutputTokens"], 2000);
    }

    #[test]
    fn reply_text_concatenates_parts() {
        let reply: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "```json\n{"}, {"text": "}\n```"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 10}
        }))
        .unwrap();
        assert_eq!(reply.text().as_deref(), Some("```json\n{}\n```"));
    }

    #[test]
    fn reply_without_candidates_has_no_text() {
        let reply: GenerateContentResponse =
            serde_json::from_value(json!({"promptFeedback": {"blockReason": "SAFETY"}})).unwrap();
        assert!(reply.text().is_none());
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(
            map_status(StatusCode::TOO_MANY_REQUESTS, String::new(), Some(30)),
            AnalysisError::RateLimitExceeded { retry_after_secs: Some(30), .. }
        ));
        assert!(matches!(
            map_status(StatusCode::FORBIDDEN, "bad key".into(), None),
            AnalysisError::AuthError { .. }
        ));
        assert!(matches!(
            map_status(StatusCode::INTERNAL_SERVER_ERROR, "boom".into(), None),
            AnalysisError::LlmApiError { .. }
        ));
        assert!(matches!(
            map_status(StatusCode::BAD_REQUEST, "bad schema".into(), None),
            AnalysisError::LlmApiError { .. }
        ));
    }

    // ── Against a local Generative Language stand-in ─────────────────────────

    async fn mock_gemini(uri: Uri, headers: HeaderMap, Json(body): Json<Value>) -> Response {
        let key = headers
            .get("x-goog-api-key")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        match key.as_str() {
            "limited" => (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, "17")],
                "quota exhausted",
            )
                .into_response(),
            "invalid" => (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": {
                    "code": 400,
                    "message": "API key not valid. Please pass a valid API key.",
                    "status": "INVALID_ARGUMENT",
                    "details": [{"reason": "API_KEY_INVALID"}]
                }})),
            )
                .into_response(),
            "slow" => {
                tokio::time::sleep(Duration::from_secs(3)).await;
                Json(json!({"candidates": []})).into_response()
            }
            _ => Json(json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [
                        {"text": format!("path={} ", uri.path())},
                        {"text": format!("key={} ", key)},
                        {"text": format!("max={}", body["generationConfig"]["maxOutputTokens"])}
                    ]},
                    "finishReason": "STOP"
                }]
            }))
            .into_response(),
        }
    }

    async fn client_for(key: &str, timeout_secs: Option<u64>) -> GeminiClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, Router::new().fallback(mock_gemini))
                .await
                .unwrap();
        });

        let mut builder = AnalyzerConfig::builder()
            .api_key(key)
            .api_base(format!("http://{addr}"))
            .model("gemini-test");
        if let Some(secs) = timeout_secs {
            builder = builder.api_timeout_secs(secs);
        }
        GeminiClient::new(&builder.build().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn call_sends_key_to_model_endpoint() {
        let client = client_for("good", None).await;
        let text = client.generate(&text_request()).await.unwrap();
        assert_eq!(
            text,
            "path=/v1beta/models/gemini-test:generateContent key=good max=8192"
        );
    }

    #[tokio::test]
    async fn call_reports_retry_after_on_429() {
        let client = client_for("limited", None).await;
        let err = client.generate(&text_request()).await.unwrap_err();
        assert!(
            matches!(err, AnalysisError::RateLimitExceeded { retry_after_secs: Some(17), .. }),
            "got {err:?}"
        );
    }

    #[tokio::test]
    async fn call_maps_invalid_key_to_auth_error() {
        let client = client_for("invalid", None).await;
        let err = client.generate(&text_request()).await.unwrap_err();
        assert!(matches!(err, AnalysisError::AuthError { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn call_times_out_when_configured() {
        let client = client_for("slow", Some(1)).await;
        let err = client.generate(&text_request()).await.unwrap_err();
        match err {
            AnalysisError::ApiTimeout { elapsed_ms } => assert!(elapsed_ms >= 900),
            other => panic!("expected ApiTimeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_key_is_not_configured() {
        let config = AnalyzerConfig::default();
        let client = GeminiClient::new(&config).unwrap();
        assert!(!client.is_configured());
        let err = client.generate(&text_request()).await.unwrap_err();
        assert!(matches!(err, AnalysisError::ProviderNotConfigured { .. }));
    }

    #[test]
    fn endpoint_includes_model() {
        let config = AnalyzerConfig::builder()
            .api_key("k")
            .api_base("http://localhost:9999/")
            .model("gemini-1.5-pro")
            .build()
            .unwrap();
        let client = GeminiClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint(),
            "http://localhost:9999/v1beta/models/gemini-1.5-pro:generateContent"
        );
    }
}
