//! Instruction templates sent to the model.
//!
//! Both templates are compile-time constants; nothing here is configurable at
//! runtime. Keeping them in one module lets unit tests inspect the exact text
//! that shapes the reply without calling a model.

use crate::config::ReportTemplate;

/// Instruction for the quarterly-report template.
///
/// `{total_pages}` is replaced by [`quarterly_instruction`]. The marked page
/// text is sent as a second part of the same user turn.
pub const QUARTERLY_REPORT_PROMPT: &str = r#"Analyze this quarterly financial report and extract key information in exactly this JSON format:
{
    "financialHighlights": [
        {"title": "<metric name>", "value": "<actual value>", "page": <page number>, "keyword": "<search term>"}
    ],
    "keyMetrics": [
        {"title": "<metric name>", "value": "<actual value>", "page": <page number>, "keyword": "<search term>"}
    ],
    "futureOutlook": [
        {"title": "<point>", "value": "<description>", "page": <page number>, "keyword": "<search term>"}
    ]
}

Rules:
1. Extract 3-4 most important items per category
2. Use exact numbers and values from the text
3. Ensure page numbers are accurate based on [PAGE X] markers
4. Keep keyword short but specific for highlighting
5. Include the most significant metrics only

Total pages in document: {total_pages}"#;

/// Instruction for the consolidated-results template.
///
/// Sent together with the raw PDF bytes.
pub const CONSOLIDATED_RESULTS_PROMPT: &str = r#"Analyze this quarterly result PDF and extract the consolidated financial metrics from the section titled "STATEMENT OF CONSOLIDATED UNAUDITED FINANCIAL RESULTS FOR THE QUARTER" or a similar consolidated results table.

Use the CONSOLIDATED table only (not standalone) and extract:
1. Core Financial Performance: Total Revenue/Income from Operations, Total Income (including other income), Total Expenses, EBITDA, EBIT, Profit Before Tax, Tax Expenses, Net Profit (Profit After Tax)
2. Per Share Metrics: Basic EPS, Diluted EPS, Operating Profit Margin (%), Net Profit Margin (%)
3. Balance Sheet Highlights: Total Assets, Total Liabilities, Net Worth, Debt

Return the result as a JSON object with the keys "core_financials", "per_share_metrics" and "balance_sheet". Each key maps to an object whose keys are snake_case metric names and whose values are objects of the form {"value": <number or null>, "unit": "<unit such as INR Crore or %>"}. Leave out metrics that are not available."#;

/// The quarterly instruction with the page count filled in.
pub fn quarterly_instruction(total_pages: usize) -> String {
    QUARTERLY_REPORT_PROMPT.replace("{total_pages}", &total_pages.to_string())
}

/// The instruction text for `template`.
pub fn instruction_for(template: ReportTemplate, total_pages: usize) -> String {
    match template {
        ReportTemplate::Quarterly => quarterly_instruction(total_pages),
        ReportTemplate::Consolidated => CONSOLIDATED_RESULTS_PROMPT.to_string(),
    }
}
