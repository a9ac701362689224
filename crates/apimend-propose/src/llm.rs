//! LLM-backed patch proposer
//!
//! Talks to an OpenAI-compatible chat-completions endpoint (the original
//! pipeline uses Groq, which is one). The model is asked for a bare RFC 6902
//! array; [`crate::extract::extract_operations`] cleans up whatever it
//! actually returns.

use crate::error::ProposeError;
use crate::extract::extract_operations;
use crate::proposer::PatchProposer;
use apimend_audit::Finding;
use apimend_document::Document;
use apimend_patch::EditOperation;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const SYSTEM_PROMPT: &str = "You are an OpenAPI security expert. \
    Return only valid JSON Patch operations, no explanations.";

/// Connection and sampling settings for the hosted model
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Chat-completions endpoint, e.g. `https://api.groq.com/openai/v1/chat/completions`
    pub base_url: String,
    /// Model identifier
    pub model: String,
    /// Bearer token
    pub api_key: String,
    /// Sampling temperature (low: patches should be boring)
    pub temperature: f32,
    /// Response token budget
    pub max_tokens: u32,
    /// Per-request deadline
    pub timeout: Duration,
}

impl LlmConfig {
    /// Settings matching the original pipeline's Groq call
    #[must_use]
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            api_key: api_key.into(),
            temperature: 0.1,
            max_tokens: 2000,
            timeout: Duration::from_secs(60),
        }
    }

    /// Override the request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Proposer that asks a hosted model for fixes
#[derive(Debug, Clone)]
pub struct LlmProposer {
    client: reqwest::Client,
    config: LlmConfig,
}

impl LlmProposer {
    /// Build with a fresh HTTP client
    ///
    /// # Errors
    /// Returns [`ProposeError::Request`] when the client cannot be built.
    pub fn new(config: LlmConfig) -> Result<Self, ProposeError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// Render the user prompt from the document and the capped findings
    ///
    /// # Errors
    /// Returns an error when the document cannot be serialized.
    pub fn build_prompt(
        document: &Document,
        findings: &[Finding],
    ) -> Result<String, ProposeError> {
        let spec_text = document.serialize()?;
        let issues = serde_json::to_string_pretty(findings)
            .map_err(|e| ProposeError::InvalidResponse {
                message: format!("findings not serializable: {e}"),
            })?;

        Ok(format!(
            "Fix the security issues in this OpenAPI specification.\n\
             \n\
             CURRENT OPENAPI SPEC:\n\
             ```yaml\n{spec_text}```\n\
             \n\
             SECURITY ISSUES TO FIX:\n{issues}\n\
             \n\
             Generate a JSON Patch (RFC 6902) to fix these security issues. \
             Common fixes include:\n\
             - Adding security schemes (Bearer tokens, API keys)\n\
             - Adding parameter validation (type, format, maxLength, etc.)\n\
             - Adding proper response schemas\n\
             - Fixing missing error responses\n\
             \n\
             Return ONLY a valid JSON Patch array, no explanations:\n\
             [\n\
               {{\"op\": \"add\", \"path\": \"/security\", \"value\": [{{\"bearerAuth\": []}}]}}\n\
             ]"
        ))
    }

    async fn complete(&self, prompt: &str) -> Result<String, ProposeError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let response = self
            .client
            .post(&self.config.base_url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProposeError::Timeout {
                        secs: self.config.timeout.as_secs(),
                    }
                } else {
                    ProposeError::Request(e)
                }
            })?
            .error_for_status()?;

        let body: ChatResponse = response.json().await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProposeError::InvalidResponse {
                message: "response carried no message content".to_string(),
            })
    }
}

#[async_trait]
impl PatchProposer for LlmProposer {
    async fn propose(
        &self,
        document: &Document,
        findings: &[Finding],
    ) -> Result<Vec<EditOperation>, ProposeError> {
        let prompt = Self::build_prompt(document, findings)?;
        tracing::debug!(
            model = %self.config.model,
            findings = findings.len(),
            "requesting patch proposal"
        );

        let content = self.complete(&prompt).await?;
        let operations = extract_operations(&content)?;
        tracing::info!(operations = operations.len(), "proposal received");
        Ok(operations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apimend_document::DocFormat;

    #[test]
    fn prompt_contains_spec_and_findings() {
        let doc = Document::parse("info:\n  title: Petstore\n", DocFormat::Yaml).unwrap();
        let findings = vec![
            Finding::new("Missing security schemes", 5).with_pointer("/security"),
        ];

        let prompt = LlmProposer::build_prompt(&doc, &findings).unwrap();
        assert!(prompt.contains("title: Petstore"));
        assert!(prompt.contains("Missing security schemes"));
        assert!(prompt.contains("JSON Patch"));
    }

    #[test]
    fn chat_request_wire_shape() {
        let request = ChatRequest {
            model: "llama-3.1-8b-instant",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            temperature: 0.1,
            max_tokens: 2000,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "llama-3.1-8b-instant");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["max_tokens"], 2000);
    }

    #[test]
    fn chat_response_parses() {
        let body: ChatResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": "[]"}}]}"#,
        )
        .unwrap();
        assert_eq!(body.choices[0].message.content.as_deref(), Some("[]"));
    }
}
