use crate::dashboard::{self, DashboardView};
use crate::output::AnalyzeResponse;
use crate::server::error::ApiError;
use crate::server::state::AppState;
use crate::server::upload::read_pdf_field;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Whether a Gemini API key is configured.
    pub gemini: bool,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        gemini: state.analyzer.config().has_api_key(),
    })
}

/// `POST /analyze-pdf`: quarterly template, JSON in and out.
pub async fn analyze_pdf(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let pdf = upload_from(multipart).await.inspect_err(log_failure)?;
    info!("POST /analyze-pdf: '{}'", pdf.name);

    let analysis = state
        .analyzer
        .analyze_report(&pdf)
        .await
        .map_err(ApiError::from)
        .inspect_err(log_failure)?;

    Ok(Json(AnalyzeResponse::from(analysis)))
}

/// `GET /`: upload form.
pub async fn index() -> Html<String> {
    Html(dashboard::render_upload_form())
}

/// `POST /dashboard`: consolidated template rendered as HTML.
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let result = async {
        let pdf = upload_from(multipart).await?;
        info!("POST /dashboard: '{}'", pdf.name);
        let analysis = state.analyzer.analyze_consolidated(&pdf).await?;
        Ok::<_, ApiError>(DashboardView::from_analysis(pdf.name, &analysis))
    }
    .await;

    match result {
        Ok(view) => Html(dashboard::render_html(&view)).into_response(),
        Err(e) => {
            log_failure(&e);
            let message = format!("{}: {}", e.headline(), e.details());
            (
                e.status(),
                Html(dashboard::render_error_html(&message, e.raw_response())),
            )
                .into_response()
        }
    }
}

async fn upload_from(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<crate::pipeline::input::PdfInput, ApiError> {
    match multipart {
        Ok(m) => read_pdf_field(m).await,
        Err(rejection) => Err(ApiError::NoFile {
            detail: rejection.body_text(),
        }),
    }
}

fn log_failure(e: &ApiError) {
    if e.status().is_server_error() {
        error!("Error processing PDF: {}", e);
    } else {
        error!("Rejected upload: {} ({})", e.headline(), e.details());
    }
}
