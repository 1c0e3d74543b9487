//! HTTP server binary for finreport-insights.
//!
//! Serves the JSON API (`/health`, `/analyze-pdf`) and the HTML dashboard
//! (`/`, `/dashboard`) from one shared `Analyzer`.

use anyhow::{Context, Result};
use clap::Parser;
use finreport_insights::server::{router, AppState};
use finreport_insights::{Analyzer, AnalyzerConfig};
use std::io;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Serve the financial report analyzer over HTTP.
#[derive(Parser, Debug)]
#[command(name = "finreport-server", version)]
struct Cli {
    /// Address to bind.
    #[arg(long, env = "FINREPORT_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on.
    #[arg(short, long, env = "PORT", default_value_t = 5001)]
    port: u16,

    /// Largest accepted upload in megabytes.
    #[arg(long, env = "FINREPORT_MAX_UPLOAD_MB", default_value_t = 50)]
    max_upload_mb: usize,

    /// Gemini model ID.
    #[arg(long, env = "GEMINI_MODEL")]
    model: Option<String>,

    /// Gemini API key.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Generative Language API base URL.
    #[arg(long, env = "GEMINI_API_BASE")]
    api_base: Option<String>,

    /// Minimum seconds between two model calls, across all requests.
    #[arg(long, env = "FINREPORT_MIN_INTERVAL_SECS", default_value_t = 10)]
    min_interval_secs: u64,

    /// Model call timeout in seconds (default: wait indefinitely).
    #[arg(long, env = "FINREPORT_API_TIMEOUT")]
    api_timeout: Option<u64>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "FINREPORT_VERBOSE")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else {
        "info,tower_http=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let mut builder =
        AnalyzerConfig::builder().min_call_interval(Duration::from_secs(cli.min_interval_secs));
    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key.clone());
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref base) = cli.api_base {
        builder = builder.api_base(base.clone());
    }
    if let Some(secs) = cli.api_timeout {
        builder = builder.api_timeout_secs(secs);
    }
    let config = builder.build().context("Invalid configuration")?;

    if !config.has_api_key() {
        warn!("GEMINI_API_KEY is not set; analysis requests will fail until it is configured");
    }
    info!(
        "Model {} with at least {:?} between calls",
        config.model, config.min_call_interval
    );

    let analyzer = Analyzer::new(config).context("Failed to create analyzer")?;
    let app = router(AppState::new(analyzer, cli.max_upload_mb * 1024 * 1024));

    let listener = bind(&cli.host, cli.port).await?;
    let addr = listener.local_addr().context("Listener has no local address")?;
    info!("Listening on http://{addr}");
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Bind `host:port`; `host` may be an IP address or a name such as `localhost`.
async fn bind(host: &str, port: u16) -> Result<TcpListener> {
    TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", host, port))
}
