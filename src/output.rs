//! Data produced by the pipeline.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Text of one non-blank PDF page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    /// 1-based page number in the source document.
    pub page: usize,
    /// Raw extracted text, untrimmed.
    pub text: String,
}

/// Result of text extraction for one upload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedDocument {
    /// Records for pages with text, in page order.
    pub pages: Vec<PageRecord>,
    /// Page count of the PDF, blank pages included.
    pub total_pages: usize,
}

impl ExtractedDocument {
    /// Whether at least one page carried text.
    pub fn has_text(&self) -> bool {
        !self.pages.is_empty()
    }

    /// Total characters across all records.
    pub fn char_count(&self) -> usize {
        self.pages.iter().map(|p| p.text.chars().count()).sum()
    }
}

/// Validated output of the quarterly template.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportAnalysis {
    /// The model's JSON object; contains every required section.
    pub insights: Map<String, Value>,
    /// Page count of the analysed PDF.
    pub total_pages: usize,
    /// Reply text as returned by the model.
    #[serde(skip)]
    pub raw_response: String,
}

impl ReportAnalysis {
    /// Entries of one section that deserialize as [`MetricEntry`].
    ///
    /// Entries with another shape are skipped; the section itself is only
    /// checked for presence during validation.
    pub fn entries(&self, section: &str) -> Vec<MetricEntry> {
        self.insights
            .get(section)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| serde_json::from_value(v.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Output of the consolidated template.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardAnalysis {
    /// The model's JSON object.
    pub data: Map<String, Value>,
    /// Page count of the analysed PDF.
    pub total_pages: usize,
    /// Reply text, shown in the debug panel.
    pub raw_response: String,
}

/// One metric in the quarterly template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricEntry {
    pub title: String,
    #[serde(deserialize_with = "string_or_number")]
    pub value: String,
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub keyword: Option<String>,
}

/// One metric in the consolidated template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricValue {
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub unit: Option<String>,
}

/// Body of a successful `POST /analyze-pdf`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub success: bool,
    pub insights: Map<String, Value>,
    pub total_pages: usize,
}

impl From<ReportAnalysis> for AnalyzeResponse {
    fn from(a: ReportAnalysis) -> Self {
        Self {
            success: true,
            insights: a.insights,
            total_pages: a.total_pages,
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Null => Ok(String::new()),
        other => Ok(other.to_string()),
    }
}
