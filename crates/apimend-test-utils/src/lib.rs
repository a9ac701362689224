//! Scripted collaborators and fixtures for exercising the convergence loop
//! without subprocesses or network calls.

#![warn(unreachable_pub)]
#![allow(missing_docs)]
// fakes panic loudly on misuse instead of propagating errors
#![allow(clippy::missing_panics_doc)]

use apimend_audit::{AuditError, AuditReport, Auditor, Finding};
use apimend_document::Document;
use apimend_patch::EditOperation;
use apimend_propose::{PatchProposer, ProposeError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// One scripted audit response
#[derive(Debug, Clone)]
enum AuditStep {
    Report(AuditReport),
    /// Fails as a malformed report (retryable)
    Fail(String),
}

/// Auditor that replays a fixed script of reports and failures
///
/// Records every document it is shown, serialized, so tests can assert the
/// loop re-audits the patched document rather than the original. When the
/// script runs out the last scripted report repeats, so a converging script
/// does not need trailing padding.
#[derive(Debug, Default)]
pub struct ScriptedAuditor {
    steps: Mutex<VecDeque<AuditStep>>,
    fallback: Mutex<Option<AuditReport>>,
    seen: Mutex<Vec<String>>,
}

impl ScriptedAuditor {
    /// Auditor with an empty script; panics when audited
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Auditor that always returns the same report
    #[must_use]
    pub fn repeating(report: AuditReport) -> Self {
        let auditor = Self::new();
        *auditor.fallback.lock().unwrap() = Some(report);
        auditor
    }

    /// Queue a successful report
    #[must_use]
    pub fn then_report(self, report: AuditReport) -> Self {
        self.steps
            .lock()
            .unwrap()
            .push_back(AuditStep::Report(report.clone()));
        *self.fallback.lock().unwrap() = Some(report);
        self
    }

    /// Queue a scripted failure (surfaces as a malformed report)
    #[must_use]
    pub fn then_fail(self, message: impl Into<String>) -> Self {
        self.steps
            .lock()
            .unwrap()
            .push_back(AuditStep::Fail(message.into()));
        self
    }

    /// Number of audit calls made so far
    #[must_use]
    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    /// Serialized form of every document audited, in call order
    #[must_use]
    pub fn seen_documents(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Auditor for ScriptedAuditor {
    async fn audit(&self, document: &Document) -> Result<AuditReport, AuditError> {
        let text = document.serialize().map_err(|e| AuditError::MalformedReport {
            message: e.to_string(),
        })?;
        self.seen.lock().unwrap().push(text);

        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(AuditStep::Report(report)) => Ok(report),
            Some(AuditStep::Fail(message)) => Err(AuditError::MalformedReport { message }),
            None => {
                let fallback = self.fallback.lock().unwrap().clone();
                Ok(fallback.expect("ScriptedAuditor exhausted with no fallback report"))
            }
        }
    }
}

/// Proposer that replays queued operation batches
///
/// An exhausted script yields empty batches, which the loop treats as no
/// forward progress. Findings handed in are recorded by title for
/// assertions on selection.
#[derive(Debug, Default)]
pub struct ScriptedProposer {
    batches: Mutex<VecDeque<Vec<EditOperation>>>,
    seen_findings: Mutex<Vec<Vec<String>>>,
}

impl ScriptedProposer {
    /// Proposer with no batches; always proposes nothing
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a batch of operations for the next call
    #[must_use]
    pub fn then_propose(self, operations: Vec<EditOperation>) -> Self {
        self.batches.lock().unwrap().push_back(operations);
        self
    }

    /// Number of proposal calls made so far
    #[must_use]
    pub fn calls(&self) -> usize {
        self.seen_findings.lock().unwrap().len()
    }

    /// Titles of the findings passed to each call, in call order
    #[must_use]
    pub fn seen_finding_titles(&self) -> Vec<Vec<String>> {
        self.seen_findings.lock().unwrap().clone()
    }
}

#[async_trait]
impl PatchProposer for ScriptedProposer {
    async fn propose(
        &self,
        _document: &Document,
        findings: &[Finding],
    ) -> Result<Vec<EditOperation>, ProposeError> {
        self.seen_findings
            .lock()
            .unwrap()
            .push(findings.iter().map(|f| f.title.clone()).collect());
        Ok(self
            .batches
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }
}

/// The report the mock audit mode produces: score 65 with three findings in
/// descending severity
#[must_use]
pub fn mock_audit_report() -> AuditReport {
    AuditReport::new(
        65,
        vec![
            Finding::new("Missing security schemes", 5)
                .with_description("API does not define any security schemes")
                .with_pointer("/security"),
            Finding::new("Missing parameter validation", 4)
                .with_description("Path parameters lack schema constraints")
                .with_pointer("/paths"),
            Finding::new("Insufficient error responses", 3)
                .with_description("Operations only document success responses")
                .with_pointer("/paths"),
        ],
    )
}

/// A small but realistic OpenAPI document for fixtures
#[must_use]
pub fn petstore_document() -> Document {
    Document::parse_detect(PETSTORE_YAML).expect("fixture parses")
}

const PETSTORE_YAML: &str = r#"openapi: 3.0.0
info:
  title: Petstore
  version: 1.0.0
paths:
  /pets:
    get:
      summary: List all pets
      responses:
        '200':
          description: A list of pets
    post:
      summary: Create a pet
      responses:
        '201':
          description: Pet created
  /pets/{petId}:
    get:
      summary: Get a pet by id
      responses:
        '200':
          description: A single pet
"#;
