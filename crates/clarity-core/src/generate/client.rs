//! Inference endpoint clients.
//!
//! [`InferenceClient`] is the seam between the generator and the outside
//! world: one prompt string in, one completion string out, no streaming and
//! no conversation state. [`GeminiClient`] is the production implementation;
//! tests swap in a local mock.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::GenerationError;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Single-turn completion against an inference endpoint.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Send one prompt, return one textual reply.
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError>;
}

#[async_trait]
impl<T: InferenceClient + ?Sized> InferenceClient for std::sync::Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        (**self).complete(prompt).await
    }
}

/// Client for the Gemini `generateContent` API.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the client at a different endpoint. Used by tests.
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl InferenceClient for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }]
        });

        debug!(model = %self.model, prompt_len = prompt.len(), "calling inference endpoint");

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(GenerationError::Network(format!(
                "inference endpoint returned {status}: {detail}"
            )));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        let text: String = parsed
            .candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(GenerationError::Empty);
        }
        Ok(text)
    }
}
