//! The reviewer capability: a generative service behind a fixed
//! request/response contract.
//!
//! [`ReviewCapability`] is the seam the pipeline talks to. [`GeminiCapability`]
//! is the HTTP implementation; [`ReplayCapability`] returns a saved payload.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::{Result, ReviewError};
use crate::prompt::ReviewRequest;

/// A service that turns a review request into a raw text payload.
#[async_trait]
pub trait ReviewCapability: Send + Sync {
    /// Human-readable name for logs.
    fn name(&self) -> &str;

    /// Submit `request` and return the unvalidated payload text.
    async fn review(&self, request: &ReviewRequest) -> Result<String>;
}

/// Google Gemini `generateContent` with a structured response schema.
pub struct GeminiCapability {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    temperature: Option<f32>,
}

impl GeminiCapability {
    pub fn new(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text parts of the first candidate.
    fn text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        (!text.is_empty()).then_some(text)
    }
}

#[async_trait]
impl ReviewCapability for GeminiCapability {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn review(&self, request: &ReviewRequest) -> Result<String> {
        let mut generation_config = json!({
            "responseMimeType": "application/json",
            "responseSchema": request.output_schema,
        });
        if let Some(t) = self.temperature {
            generation_config["temperature"] = json!(t);
        }
        let payload = json!({
            "contents": [{ "parts": [{ "text": request.instruction_document }] }],
            "generationConfig": generation_config,
        });

        let url = format!("{}/models/{}:generateContent", self.endpoint, request.model);
        debug!(%url, model = %request.model, "calling reviewer");

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ReviewError::CapabilityFailure(format!("reviewer request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ReviewError::CapabilityFailure(format!(
                "reviewer returned {status}: {body}"
            )));
        }

        let body: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| {
                ReviewError::CapabilityFailure(format!("unreadable reviewer reply: {e}"))
            })?;

        body.text()
            .ok_or_else(|| ReviewError::CapabilityFailure("reviewer returned no text".to_string()))
    }
}

/// Returns a fixed payload, e.g. one saved from an earlier run.
pub struct ReplayCapability {
    payload: String,
}

impl ReplayCapability {
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
        }
    }
}

#[async_trait]
impl ReviewCapability for ReplayCapability {
    fn name(&self) -> &str {
        "replay"
    }

    async fn review(&self, _request: &ReviewRequest) -> Result<String> {
        Ok(self.payload.clone())
    }
}
