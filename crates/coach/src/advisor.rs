//! Language-model advisor: explains a flagged move.
//!
//! The advisor never fails outward. Transport problems and unreadable answers are
//! reported through [`Advice`] so that the walk can keep going and the problem stays
//! visible in the stored record.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::CoachConfig;
use crate::error::CoachError;
use crate::prompt::{AdviceRequest, PromptTemplate};

pub const DEFAULT_MOTIF: &str = "Uncategorized";
pub const DEFAULT_SEVERITY: &str = "Unknown";
pub const DEFAULT_EXPLANATION: &str = "No explanation provided.";
pub const ERROR_LABEL: &str = "Error";

/// Outcome of one advisor call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advice {
    /// The model answered with the expected structure
    Parsed {
        motif: String,
        severity: String,
        explanation: String,
    },
    /// The model answered, but not with a JSON object; carries the raw text
    Degraded(String),
    /// No usable answer (timeout, connection failure, bad status)
    Failed(String),
}

impl Advice {
    /// (motif, severity, explanation) as stored and shown in comments.
    pub fn into_parts(self) -> (String, String, String) {
        match self {
            Advice::Parsed {
                motif,
                severity,
                explanation,
            } => (motif, severity, explanation),
            Advice::Degraded(raw) => (DEFAULT_MOTIF.to_string(), ERROR_LABEL.to_string(), raw),
            Advice::Failed(reason) => (
                ERROR_LABEL.to_string(),
                ERROR_LABEL.to_string(),
                format!("Error getting analysis from advisor: {reason}"),
            ),
        }
    }
}

#[async_trait]
pub trait Advisor: Send + Sync {
    async fn advise(&self, request: &AdviceRequest) -> Advice;
}

#[derive(Debug, Deserialize)]
struct AdviceFields {
    motif: Option<String>,
    severity: Option<String>,
    explanation: Option<String>,
}

/// Remove a surrounding markdown code fence (with or without a language tag).
pub fn strip_code_fences(content: &str) -> String {
    let trimmed = content.trim();
    let Some(start) = trimmed.find("```") else {
        return trimmed.to_string();
    };

    let after = &trimmed[start + 3..];
    let body = match after.find('\n') {
        Some(nl) if after[..nl].trim().chars().all(|c| c.is_ascii_alphanumeric()) => {
            &after[nl + 1..]
        }
        _ => after,
    };
    let body = match body.find("```") {
        Some(end) => &body[..end],
        None => body,
    };
    body.trim().to_string()
}

/// Interpret the model's answer.
pub fn parse_advice(content: &str) -> Advice {
    let stripped = strip_code_fences(content);

    let fields = match serde_json::from_str::<Value>(&stripped) {
        Ok(value @ Value::Object(_)) => serde_json::from_value::<AdviceFields>(value).ok(),
        _ => None,
    };

    match fields {
        Some(f) => Advice::Parsed {
            motif: f.motif.unwrap_or_else(|| DEFAULT_MOTIF.to_string()),
            severity: f.severity.unwrap_or_else(|| DEFAULT_SEVERITY.to_string()),
            explanation: f.explanation.unwrap_or_else(|| DEFAULT_EXPLANATION.to_string()),
        },
        None => Advice::Degraded(stripped),
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// Advisor backed by an Ollama server's chat endpoint.
pub struct OllamaAdvisor {
    client: Client,
    endpoint: String,
    model: String,
    temperature: f32,
    template: PromptTemplate,
}

impl OllamaAdvisor {
    pub fn new(
        base_url: &str,
        model: impl Into<String>,
        temperature: f32,
        timeout: Duration,
        template: PromptTemplate,
    ) -> Result<Self, CoachError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoachError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/api/chat", base_url.trim_end_matches('/')),
            model: model.into(),
            temperature,
            template,
        })
    }

    pub fn from_config(config: &CoachConfig) -> Result<Self, CoachError> {
        let template = PromptTemplate::from_optional_path(config.prompt_template_path.as_deref())?;
        Self::new(
            &config.ollama_url,
            config.model.clone(),
            config.temperature,
            config.advisor_timeout(),
            template,
        )
    }

    async fn chat(&self, request: &AdviceRequest) -> Result<String, String> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": self.template.system() },
                { "role": "user", "content": self.template.context(request) },
            ],
            "stream": false,
            "options": { "temperature": self.temperature },
        });

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("Request error: {e}"))?;

        if !resp.status().is_success() {
            return Err(format!("HTTP {}", resp.status()));
        }

        let chat: ChatResponse = resp
            .json()
            .await
            .map_err(|e| format!("Unreadable response body: {e}"))?;
        Ok(chat.message.content)
    }
}

#[async_trait]
impl Advisor for OllamaAdvisor {
    async fn advise(&self, request: &AdviceRequest) -> Advice {
        match self.chat(request).await {
            Ok(content) => {
                debug!(model = %self.model, len = content.len(), "Advisor answered");
                parse_advice(&content)
            }
            Err(reason) => {
                warn!(model = %self.model, %reason, "Advisor call failed");
                Advice::Failed(reason)
            }
        }
    }
}
