//! CLI binary for finreport-insights.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `AnalyzerConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use finreport_insights::{
    Analysis, Analyzer, AnalyzerConfig, DashboardView, ExtractedDocument, ReportAnalysis,
    ReportTemplate,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Highlights, key metrics and outlook with page references
  finreport q3-results.pdf

  # Consolidated results table as dashboard text
  finreport --template consolidated q3-results.pdf

  # Machine-readable output
  finreport --json q3-results.pdf > insights.json

  # From a URL
  finreport https://example.com/investors/q3-2024.pdf

  # Page count and text per page (no API key needed)
  finreport --inspect-only q3-results.pdf

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY               Google Gemini API key
  GEMINI_MODEL                 Model ID (default: gemini-1.5-flash)
  GEMINI_API_BASE              API base URL
  FINREPORT_MIN_INTERVAL_SECS  Minimum gap between model calls (default: 10)

  A .env file in the working directory is loaded on startup.
"#;

/// Extract structured financial metrics from PDF reports with Gemini.
#[derive(Parser, Debug)]
#[command(
    name = "finreport",
    version,
    about = "Extract structured financial metrics from PDF reports with Gemini",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Which extraction to run.
    #[arg(short, long, env = "FINREPORT_TEMPLATE", value_enum, default_value = "quarterly")]
    template: TemplateArg,

    /// Gemini model ID.
    #[arg(long, env = "GEMINI_MODEL")]
    model: Option<String>,

    /// Gemini API key.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Generative Language API base URL.
    #[arg(long, env = "GEMINI_API_BASE")]
    api_base: Option<String>,

    /// Minimum seconds between two model calls.
    #[arg(long, env = "FINREPORT_MIN_INTERVAL_SECS", default_value_t = 10)]
    min_interval_secs: u64,

    /// Model call timeout in seconds (default: wait indefinitely).
    #[arg(long, env = "FINREPORT_API_TIMEOUT")]
    api_timeout: Option<u64>,

    /// HTTP download timeout in seconds for URL inputs.
    #[arg(long, env = "FINREPORT_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Sampling temperature for the quarterly template (0.0–2.0).
    #[arg(long, env = "FINREPORT_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Max output tokens for the quarterly template.
    #[arg(long, env = "FINREPORT_MAX_OUTPUT_TOKENS", default_value_t = 8192)]
    max_output_tokens: u32,

    /// Print JSON instead of a readable summary.
    #[arg(long)]
    json: bool,

    /// Extract text and print page statistics only; no model call.
    #[arg(long)]
    inspect_only: bool,

    /// Disable the spinner.
    #[arg(long, env = "FINREPORT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "FINREPORT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "FINREPORT_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum TemplateArg {
    Quarterly,
    Consolidated,
}

impl From<TemplateArg> for ReportTemplate {
    fn from(v: TemplateArg) -> Self {
        match v {
            TemplateArg::Quarterly => ReportTemplate::Quarterly,
            TemplateArg::Consolidated => ReportTemplate::Consolidated,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner covers progress feedback, so library INFO logs are only
    // shown when it is off.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli)?;
    let analyzer = Analyzer::new(config).context("Failed to create analyzer")?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let doc = analyzer
            .inspect(&cli.input)
            .await
            .context("Failed to inspect PDF")?;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&doc).context("Failed to serialize pages")?
            );
        } else {
            print_inspection(&cli.input, &doc);
        }
        return Ok(());
    }

    // ── Run analysis ─────────────────────────────────────────────────────
    let spinner = show_progress.then(new_spinner);
    let result = analyzer.analyze(&cli.input, cli.template.into()).await;
    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }
    let analysis = result.context("Analysis failed")?;

    match &analysis {
        Analysis::Report(report) if cli.json => {
            let body = finreport_insights::AnalyzeResponse::from(report.clone());
            println!(
                "{}",
                serde_json::to_string_pretty(&body).context("Failed to serialise output")?
            );
        }
        Analysis::Report(report) => print_report(report)?,
        Analysis::Dashboard(dash) if cli.json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&dash.data).context("Failed to serialise output")?
            );
        }
        Analysis::Dashboard(dash) => {
            let view = DashboardView::from_analysis(document_name(&cli.input), dash);
            print!("{}", finreport_insights::dashboard::render_text(&view));
        }
    }

    if !cli.quiet && !cli.json {
        eprintln!(
            "{} analysed {} pages with {}",
            green("✔"),
            analysis.total_pages(),
            analyzer.config().model
        );
    }

    Ok(())
}

/// Map CLI args to `AnalyzerConfig`.
fn build_config(cli: &Cli) -> Result<AnalyzerConfig> {
    let mut builder = AnalyzerConfig::builder()
        .min_call_interval(Duration::from_secs(cli.min_interval_secs))
        .temperature(cli.temperature)
        .max_output_tokens(cli.max_output_tokens)
        .download_timeout_secs(cli.download_timeout);

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

    builder.build().context("Invalid configuration")
}

fn new_spinner() -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_prefix("Analyzing");
    bar.set_message("waiting for the model…");
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

fn document_name(input: &str) -> String {
    input
        .rsplit(['/', '\\'])
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(input)
        .to_string()
}

fn print_inspection(input: &str, doc: &ExtractedDocument) {
    println!("File:         {}", input);
    println!("Pages:        {}", doc.total_pages);
    println!("With text:    {}", doc.pages.len());
    println!("Characters:   {}", doc.char_count());
    for page in &doc.pages {
        println!(
            "  page {:>3}  {}",
            page.page,
            dim(&format!("{:>6} chars", page.text.chars().count()))
        );
    }
}

fn print_report(report: &ReportAnalysis) -> Result<()> {
    for section in ReportTemplate::Quarterly.required_keys() {
        println!("{}", bold(&section_heading(section)));
        let entries = report.entries(section);
        if entries.is_empty() {
            // Not the documented entry shape; show it as the model returned it.
            let raw = report.insights.get(*section).cloned().unwrap_or_default();
            println!(
                "  {}",
                serde_json::to_string_pretty(&raw).context("Failed to serialise section")?
            );
        }
        for entry in entries {
            let page = entry
                .page
                .map(|p| dim(&format!("  (p. {p})")))
                .unwrap_or_default();
            println!("  {}: {}{}", entry.title, entry.value, page);
        }
        println!();
    }
    Ok(())
}

/// `"financialHighlights"` → `"Financial Highlights"`.
fn section_heading(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for (i, c) in key.chars().enumerate() {
        if i == 0 {
            out.extend(c.to_uppercase());
        } else if c.is_uppercase() {
            out.push(' ');
            out.push(c);
        } else {
            out.push(c);
        }
    }
    out
}
