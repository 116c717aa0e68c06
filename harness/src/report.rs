use crate::error::HarnessResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use uuid::Uuid;

/// Output format for the final summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Per-check lines while running, totals at the end
    #[default]
    Text,
    /// One JSON document with every record, nothing else on stdout
    Json,
}

/// Outcome of one check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRecord {
    pub name: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub elapsed_ms: u64,
}

impl TestRecord {
    pub fn pass(name: impl Into<String>, elapsed_ms: u64) -> Self {
        Self {
            name: name.into(),
            passed: true,
            message: None,
            elapsed_ms,
        }
    }

    pub fn fail(name: impl Into<String>, message: impl Into<String>, elapsed_ms: u64) -> Self {
        Self {
            name: name.into(),
            passed: false,
            message: Some(message.into()),
            elapsed_ms,
        }
    }

    /// The line printed after the check ran.
    pub fn status_line(&self) -> String {
        if self.passed {
            format!("✅ {} passed", self.name)
        } else {
            format!(
                "❌ {} failed: {}",
                self.name,
                self.message.as_deref().unwrap_or("unknown error")
            )
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub base_url: String,
    pub started_at: DateTime<Utc>,
    pub records: Vec<TestRecord>,
}

impl RunSummary {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            base_url: base_url.into(),
            started_at: Utc::now(),
            records: Vec::new(),
        }
    }

    pub fn push(&mut self, record: TestRecord) {
        self.records.push(record);
    }

    pub fn total(&self) -> usize {
        self.records.len()
    }

    pub fn success(&self) -> usize {
        self.records.iter().filter(|r| r.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.records.iter().filter(|r| !r.passed).count()
    }

    pub fn all_passed(&self) -> bool {
        self.records.iter().all(|r| r.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &TestRecord> {
        self.records.iter().filter(|r| !r.passed)
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "\n=== Test Results ===");
        let _ = writeln!(out, "Total: {}", self.total());
        let _ = writeln!(out, "Success: {}", self.success());
        let _ = write!(out, "Failed: {}", self.failed());
        out
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn render(&self, format: ReportFormat) -> HarnessResult<String> {
        match format {
            ReportFormat::Text => Ok(self.render_text()),
            ReportFormat::Json => Ok(self.to_json()?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RunSummary {
        let mut summary = RunSummary::new("http://localhost:8080");
        summary.push(TestRecord::pass("test_get", 3));
        summary.push(TestRecord::fail(
            "test_put",
            "PUT /uploaded.txt: expected status 201, got 500",
            7,
        ));
        summary.push(TestRecord::pass("test_delete", 1));
        summary
    }

    #[test]
    fn test_counts_add_up() {
        let summary = sample();
        assert_eq!(summary.total(), 3);
        assert_eq!(summary.success(), 2);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.total(), summary.success() + summary.failed());
        assert!(!summary.all_passed());
        assert_eq!(
            summary.failures().map(|r| r.name.as_str()).collect::<Vec<_>>(),
            vec!["test_put"]
        );
    }

    #[test]
    fn test_empty_summary_passes() {
        let summary = RunSummary::new("http://localhost:8080");
        assert_eq!(summary.total(), 0);
        assert!(summary.all_passed());
    }

    #[test]
    fn test_status_lines() {
        assert_eq!(TestRecord::pass("test_get", 0).status_line(), "✅ test_get passed");
        assert_eq!(
            TestRecord::fail("test_head", "HEAD /test.txt: missing header 'Content-Type'", 0)
                .status_line(),
            "❌ test_head failed: HEAD /test.txt: missing header 'Content-Type'"
        );
    }

    #[test]
    fn test_render_text() {
        let text = sample().render(ReportFormat::Text).unwrap();
        assert_eq!(text, "\n=== Test Results ===\nTotal: 3\nSuccess: 2\nFailed: 1");
    }

    #[test]
    fn test_render_json() {
        let summary = sample();
        let json = summary.render(ReportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["base_url"], "http://localhost:8080");
        assert_eq!(value["run_id"], summary.run_id.to_string());
        assert_eq!(value["records"].as_array().unwrap().len(), 3);
        assert_eq!(value["records"][0]["passed"], true);
        assert!(value["records"][0].get("message").is_none());
        assert_eq!(
            value["records"][1]["message"],
            "PUT /uploaded.txt: expected status 201, got 500"
        );
    }

    #[test]
    fn test_report_format_serialization() {
        assert_eq!(
            serde_json::to_string(&ReportFormat::Json).unwrap(),
            "\"json\""
        );
        let format: ReportFormat = serde_json::from_str("\"text\"").unwrap();
        assert_eq!(format, ReportFormat::Text);
    }
}
