//! Auditor capability
//!
//! [`Auditor`] is the seam the convergence loop calls through, so tests can
//! drive the loop with deterministic fakes. [`CommandAuditor`] is the real
//! implementation: it hands the serialized document to an external audit
//! command on stdin and reads the JSON report from stdout.

use crate::error::AuditError;
use crate::report::AuditReport;
use apimend_document::Document;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Maps a document to a score and an ordered list of findings
#[async_trait]
pub trait Auditor: Send + Sync {
    /// Audit one document
    ///
    /// # Errors
    /// Any failure of the external call (spawn, exit status, timeout,
    /// malformed report) is an error for this call, never a finding.
    async fn audit(&self, document: &Document) -> Result<AuditReport, AuditError>;
}

#[async_trait]
impl<A: Auditor + ?Sized> Auditor for std::sync::Arc<A> {
    async fn audit(&self, document: &Document) -> Result<AuditReport, AuditError> {
        (**self).audit(document).await
    }
}

/// Auditor backed by an external command
///
/// The command receives the document text on stdin and must print a JSON
/// report (`{"score": .., "findings": [..]}`) on stdout. The original
/// pipeline drives `42c-audit --output json -` this way; a docker invocation
/// is just a longer command line.
#[derive(Debug, Clone)]
pub struct CommandAuditor {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandAuditor {
    /// Default timeout for one audit call
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

    /// Build from a program and its arguments
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Build from a whitespace-split command line
    ///
    /// Returns `None` for an empty command line.
    #[must_use]
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }

    /// Override the call timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run(&self, input: String) -> Result<AuditReport, AuditError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AuditError::Spawn {
                program: self.program.clone(),
                source: e,
            })?;

        // Feed the document and close stdin so the tool sees EOF
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(input.as_bytes()).await?;
            stdin.shutdown().await?;
        }

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| AuditError::Timeout {
                secs: self.timeout.as_secs(),
            })??;

        if !output.status.success() {
            return Err(AuditError::NonZeroExit {
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let report = AuditReport::from_json(&stdout).map_err(|e| AuditError::MalformedReport {
            message: e.to_string(),
        })?;

        tracing::info!(
            score = report.score,
            findings = report.findings.len(),
            "audit completed"
        );
        Ok(report)
    }
}

#[async_trait]
impl Auditor for CommandAuditor {
    async fn audit(&self, document: &Document) -> Result<AuditReport, AuditError> {
        let text = document
            .serialize()
            .map_err(|e| AuditError::MalformedReport {
                message: format!("document could not be serialized for audit: {e}"),
            })?;
        tracing::debug!(program = %self.program, "running external audit");
        self.run(text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apimend_document::DocFormat;

    fn sample_doc() -> Document {
        Document::parse("openapi: 3.0.0\n", DocFormat::Yaml).unwrap()
    }

    #[test]
    fn command_line_parsing() {
        let auditor = CommandAuditor::from_command_line("42c-audit --output json -").unwrap();
        assert_eq!(auditor.program, "42c-audit");
        assert_eq!(auditor.args, vec!["--output", "json", "-"]);

        assert!(CommandAuditor::from_command_line("   ").is_none());
    }

    #[tokio::test]
    async fn echo_report_round_trip() {
        // `cat` reflects stdin, so feeding a report-shaped document text back
        // is a full subprocess round-trip without the real tool
        let report_doc = Document::parse(
            r#"{"score": 72, "findings": [{"title": "t", "severity": 3}]}"#,
            DocFormat::Json,
        )
        .unwrap();

        let auditor = CommandAuditor::new("cat", vec![]);
        let report = auditor.audit(&report_doc).await.unwrap();
        assert_eq!(report.score, 72);
        assert_eq!(report.findings.len(), 1);
    }

    #[tokio::test]
    async fn missing_program_is_spawn_error() {
        let auditor = CommandAuditor::new("definitely-not-a-real-audit-tool", vec![]);
        let result = auditor.audit(&sample_doc()).await;
        assert!(matches!(result, Err(AuditError::Spawn { .. })));
    }

    #[tokio::test]
    async fn non_zero_exit_is_error() {
        let auditor = CommandAuditor::new("false", vec![]);
        let result = auditor.audit(&sample_doc()).await;
        assert!(matches!(result, Err(AuditError::NonZeroExit { .. })));
    }

    #[tokio::test]
    async fn garbage_stdout_is_malformed_report() {
        let auditor = CommandAuditor::new("echo", vec!["not json".to_string()]);
        let result = auditor.audit(&sample_doc()).await;
        assert!(matches!(result, Err(AuditError::MalformedReport { .. })));
    }

    #[tokio::test]
    async fn slow_command_times_out() {
        let auditor = CommandAuditor::new("sleep", vec!["5".to_string()])
            .with_timeout(Duration::from_millis(50));
        let result = auditor.audit(&sample_doc()).await;
        assert!(matches!(result, Err(AuditError::Timeout { .. })));
    }
}
