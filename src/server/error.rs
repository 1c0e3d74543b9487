//! HTTP error responses.
//!
//! Every failure becomes `{"error": <headline>, "details": <message>}` with a
//! 400 for problems with the upload itself, a 413 for a body over the upload
//! limit, and a 500 for everything after extraction succeeded.

use crate::error::{AnalysisError, ErrorKind};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Errors returned by the HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request has no `file` field, or is not multipart at all.
    #[error("No file provided")]
    NoFile { detail: String },

    /// The `file` field has no filename or no content.
    #[error("No file selected")]
    NoFileSelected,

    /// The request body is larger than the configured upload limit.
    #[error("Upload too large")]
    UploadTooLarge { detail: String },

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub details: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NoFile { .. } | ApiError::NoFileSelected => StatusCode::BAD_REQUEST,
            ApiError::UploadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Analysis(e) => match e.kind() {
                ErrorKind::Input | ErrorKind::Extraction => StatusCode::BAD_REQUEST,
                ErrorKind::LlmCall
                | ErrorKind::Parse
                | ErrorKind::Validation
                | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Short user-facing message.
    pub fn headline(&self) -> &'static str {
        match self {
            ApiError::NoFile { .. } => "No file provided",
            ApiError::NoFileSelected => "No file selected",
            ApiError::UploadTooLarge { .. } => "Upload too large",
            ApiError::Analysis(e) => match e.kind() {
                ErrorKind::Input => "Invalid input",
                ErrorKind::Extraction => "Could not extract text from PDF",
                _ => "Analysis failed",
            },
        }
    }

    pub fn details(&self) -> String {
        match self {
            ApiError::NoFile { detail } | ApiError::UploadTooLarge { detail } => detail.clone(),
            ApiError::NoFileSelected => "The uploaded file has no name or is empty".to_string(),
            ApiError::Analysis(e) => e.to_string(),
        }
    }

    /// The model reply, if the failure happened after the model answered.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            ApiError::Analysis(e) => e.raw_response(),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.headline().to_string(),
            details: self.details(),
        };
        (self.status(), Json(body)).into_response()
    }
}
