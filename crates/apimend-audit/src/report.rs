//! Audit report model
//!
//! Deserialized from the external tool's JSON report: a 0-100 score plus an
//! ordered list of findings. Unknown report fields are ignored so tool
//! upgrades don't break the boundary.

use serde::{Deserialize, Serialize};

/// A single reported security issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Short issue name
    #[serde(default)]
    pub title: String,
    /// Longer explanation
    #[serde(default)]
    pub description: String,
    /// Severity, higher is worse (tool emits small integers)
    #[serde(default)]
    pub severity: u8,
    /// Pointer into the document the issue was observed at, when the tool
    /// provides one
    #[serde(default)]
    pub pointer: Option<String>,
}

impl Finding {
    /// Convenience constructor for fixtures and fakes
    #[must_use]
    pub fn new(title: impl Into<String>, severity: u8) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            severity,
            pointer: None,
        }
    }

    /// Attach a description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Attach a location pointer
    #[must_use]
    pub fn with_pointer(mut self, pointer: impl Into<String>) -> Self {
        self.pointer = Some(pointer.into());
        self
    }
}

/// Score and findings for one audit of one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    /// 0-100 security score
    #[serde(default)]
    pub score: u8,
    /// Findings in the tool's reported order
    #[serde(default)]
    pub findings: Vec<Finding>,
}

impl AuditReport {
    /// Report with a clamped score and findings
    #[must_use]
    pub fn new(score: u8, findings: Vec<Finding>) -> Self {
        Self {
            score: score.min(100),
            findings,
        }
    }

    /// Parse the tool's JSON report text
    ///
    /// # Errors
    /// Returns the underlying decode error for malformed reports.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let mut report: Self = serde_json::from_str(text)?;
        report.score = report.score.min(100);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tool_report() {
        let report = AuditReport::from_json(
            r#"{
                "score": 65,
                "findings": [
                    {"title": "Missing security schemes",
                     "description": "API does not define any security schemes",
                     "severity": 5,
                     "pointer": "/security"},
                    {"title": "Missing parameter validation", "severity": 4}
                ],
                "engine": "v4"
            }"#,
        )
        .unwrap();

        assert_eq!(report.score, 65);
        assert_eq!(report.findings.len(), 2);
        assert_eq!(report.findings[0].pointer.as_deref(), Some("/security"));
        assert_eq!(report.findings[1].description, "");
        assert!(report.findings[1].pointer.is_none());
    }

    #[test]
    fn missing_fields_default() {
        let report = AuditReport::from_json("{}").unwrap();
        assert_eq!(report.score, 0);
        assert!(report.findings.is_empty());
    }

    #[test]
    fn malformed_report_fails() {
        assert!(AuditReport::from_json("not json at all").is_err());
        assert!(AuditReport::from_json(r#"{"score": "high"}"#).is_err());
    }

    #[test]
    fn score_clamped_to_100() {
        let report = AuditReport::new(250, vec![]);
        assert_eq!(report.score, 100);
    }
}
