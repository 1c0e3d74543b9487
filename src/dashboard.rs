//! Dashboard presentation of consolidated results.
//!
//! The consolidated reply is a JSON object with up to three sections, each
//! mapping metric keys to `{value, unit}` objects (or bare scalars). This
//! module flattens them into label/value tiles, then renders the tiles as an
//! HTML page for the web dashboard or as plain text for the CLI.

use crate::output::{DashboardAnalysis, MetricValue};
use serde::Deserialize;
use serde_json::{Map, Value};

const LAYOUT_HTML: &str = include_str!("../templates/layout.html");
const INDEX_HTML: &str = include_str!("../templates/index.html");

/// Shown for a metric whose value is `null` or absent.
pub const PLACEHOLDER: &str = "-";

/// Dashboard sections in display order: (JSON key, heading).
pub const SECTIONS: [(&str, &str); 3] = [
    ("core_financials", "Core Financial Performance"),
    ("per_share_metrics", "Per Share Metrics"),
    ("balance_sheet", "Balance Sheet Highlights"),
];

/// One label/value pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricTile {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSection {
    pub title: String,
    pub metrics: Vec<MetricTile>,
}

/// Everything the dashboard shows for one upload.
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub document_name: String,
    pub total_pages: usize,
    pub sections: Vec<DashboardSection>,
    pub raw_response: String,
}

impl DashboardView {
    /// Build the view from a consolidated analysis.
    ///
    /// Sections that are absent or not JSON objects are left out.
    pub fn from_analysis(document_name: impl Into<String>, analysis: &DashboardAnalysis) -> Self {
        Self {
            document_name: document_name.into(),
            total_pages: analysis.total_pages,
            sections: build_sections(&analysis.data),
            raw_response: analysis.raw_response.clone(),
        }
    }
}

/// Flatten the known sections of `data` into tiles.
pub fn build_sections(data: &Map<String, Value>) -> Vec<DashboardSection> {
    SECTIONS
        .iter()
        .filter_map(|(key, title)| {
            let section = data.get(*key)?.as_object()?;
            Some(DashboardSection {
                title: title.to_string(),
                metrics: section
                    .iter()
                    .map(|(k, v)| MetricTile {
                        label: metric_label(k),
                        value: format_metric_value(v),
                    })
                    .collect(),
            })
        })
        .collect()
}

/// `"revenue_from_operations"` → `"Revenue From Operations"`.
///
/// Underscores become spaces; a letter is upper-cased when it follows a
/// non-letter and lower-cased otherwise.
pub fn metric_label(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut prev_is_letter = false;
    for c in key.chars() {
        let c = if c == '_' { ' ' } else { c };
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }
    out
}

/// Display string for one metric value.
///
/// `{value, unit}` objects render as `"<value> <unit>"` (no suffix when the
/// unit is missing or empty). `null` and missing values render as `-`.
pub fn format_metric_value(v: &Value) -> String {
    match v {
        Value::Object(_) => match MetricValue::deserialize(v) {
            Ok(metric) => format_metric(&metric),
            Err(_) => v.to_string(),
        },
        other => scalar_text(other),
    }
}

fn format_metric(metric: &MetricValue) -> String {
    let value = scalar_text(&metric.value);
    match metric.unit.as_deref().map(str::trim) {
        Some(unit) if !unit.is_empty() => format!("{} {}", value, unit),
        _ => value,
    }
}

fn scalar_text(v: &Value) -> String {
    match v {
        Value::Null => PLACEHOLDER.to_string(),
        Value::String(s) if s.trim().is_empty() => PLACEHOLDER.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ── HTML ─────────────────────────────────────────────────────────────────────

fn page(title: &str, body: &str) -> String {
    LAYOUT_HTML
        .replace("{{ title }}", &html_escape::encode_text(title))
        .replace("{{ body }}", body)
}

/// The upload form served at `/`.
pub fn render_upload_form() -> String {
    page("Financial Report Analyzer", INDEX_HTML)
}

/// Full dashboard page for a successful analysis.
pub fn render_html(view: &DashboardView) -> String {
    let mut body = String::new();
    body.push_str(&format!(
        "<p>Analyzed <strong>{}</strong> ({} pages) · <a href=\"/\">Clear document</a></p>\n",
        html_escape::encode_text(&view.document_name),
        view.total_pages
    ));

    if view.sections.is_empty() {
        body.push_str("<p>No consolidated metrics were found in this document.</p>\n");
    }

    for section in &view.sections {
        body.push_str(&format!(
            "<div class=\"section\">\n<h2>{}</h2>\n<div class=\"tiles\">\n",
            html_escape::encode_text(&section.title)
        ));
        for tile in &section.metrics {
            body.push_str(&format!(
                "<div class=\"metric-card\"><div class=\"metric-label\">{}</div><div class=\"metric-value\">{}</div></div>\n",
                html_escape::encode_text(&tile.label),
                html_escape::encode_text(&tile.value)
            ));
        }
        body.push_str("</div>\n</div>\n");
    }

    body.push_str(&raw_panel(&view.raw_response));
    page(&format!("{} · Dashboard", view.document_name), &body)
}

/// Error page; includes the model reply when one was received.
pub fn render_error_html(message: &str, raw_response: Option<&str>) -> String {
    let mut body = format!(
        "<div class=\"error\"><strong>Error processing PDF:</strong> {}</div>\n",
        html_escape::encode_text(message)
    );
    if let Some(raw) = raw_response {
        body.push_str(&raw_panel(raw));
    }
    body.push_str("<p><a href=\"/\">Try another document</a></p>\n");
    page("Error", &body)
}

fn raw_panel(raw: &str) -> String {
    format!(
        "<details>\n<summary>Debug: raw response</summary>\n<pre>{}</pre>\n</details>\n",
        html_escape::encode_text(raw)
    )
}

// ── Plain text ───────────────────────────────────────────────────────────────

/// Plain-text rendering for the terminal.
pub fn render_text(view: &DashboardView) -> String {
    let mut out = format!("{} ({} pages)\n", view.document_name, view.total_pages);
    if view.sections.is_empty() {
        out.push_str("\nNo consolidated metrics found.\n");
        return out;
    }

    for section in &view.sections {
        out.push_str(&format!("\n{}\n{}\n", section.title, "-".repeat(section.title.len())));
        let width = section
            .metrics
            .iter()
            .map(|t| t.label.chars().count())
            .max()
            .unwrap_or(0);
        for tile in &section.metrics {
            out.push_str(&format!("  {:<width$}  {}\n", tile.label, tile.value, width = width));
        }
    }
    out
}
