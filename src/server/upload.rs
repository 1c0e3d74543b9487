use crate::pipeline::input::PdfInput;
use crate::server::error::ApiError;
use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use axum::http::StatusCode;
use tracing::debug;

/// Multipart field carrying the PDF.
pub const FILE_FIELD: &str = "file";

/// Pull the `file` field out of a multipart upload.
///
/// Other fields are drained and ignored. The PDF header is not checked here;
/// extraction reports a non-PDF upload like any other unreadable file.
/// A body over the router's upload limit fails with
/// [`ApiError::UploadTooLarge`].
pub async fn read_pdf_field(mut multipart: Multipart) -> Result<PdfInput, ApiError> {
    let mut file: Option<PdfInput> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, "Failed to read form field"))?
    {
        let name = field.name().unwrap_or("").to_string();
        let filename = field.file_name().unwrap_or("").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, "Failed to read file data"))?;

        if name == FILE_FIELD {
            debug!("Received upload '{}' ({} bytes)", filename, data.len());
            file = Some(PdfInput {
                name: filename,
                bytes: data.to_vec(),
            });
        } else {
            debug!("Ignoring form field '{}'", name);
        }
    }

    let file = file.ok_or_else(|| ApiError::NoFile {
        detail: format!("Multipart field '{}' is required", FILE_FIELD),
    })?;

    if file.name.trim().is_empty() || file.bytes.is_empty() {
        return Err(ApiError::NoFileSelected);
    }
    Ok(file)
}

fn multipart_error(e: MultipartError, context: &str) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::UploadTooLarge {
            detail: e.body_text(),
        }
    } else {
        ApiError::NoFile {
            detail: format!("{}: {}", context, e),
        }
    }
}
