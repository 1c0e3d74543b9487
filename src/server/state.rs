use crate::analyze::Analyzer;
use std::sync::Arc;

/// Shared state of the HTTP server.
///
/// One [`Analyzer`] serves every request, so its call throttle spaces model
/// calls across concurrent uploads.
#[derive(Debug, Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
    /// Largest accepted request body in bytes.
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(analyzer: Analyzer, max_upload_bytes: usize) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
            max_upload_bytes,
        }
    }
}
