//! HTTP front end: JSON API plus the HTML dashboard.
//!
//! | Route | Method | Response |
//! |-------|--------|----------|
//! | `/health` | GET | `{status, version, gemini}` |
//! | `/analyze-pdf` | POST | quarterly analysis as JSON |
//! | `/` | GET | upload form |
//! | `/dashboard` | POST | consolidated analysis as HTML |
//!
//! Uploads are multipart with the PDF in the `file` field. Bodies over the
//! upload limit are answered with 413 in the route's own error format.

pub mod error;
pub mod handlers;
pub mod state;
pub mod upload;

pub use error::ApiError;
pub use state::AppState;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let max_upload_bytes = state.max_upload_bytes;

    Router::new()
        .route("/health", get(handlers::health))
        .route("/analyze-pdf", post(handlers::analyze_pdf))
        .route("/", get(handlers::index))
        .route("/dashboard", post(handlers::dashboard))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}
