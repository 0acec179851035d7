//! Hosted model client
//!
//! Talks to text-to-text inference endpoints that follow the Hugging Face
//! inference API shape: `{"inputs": ..., "parameters": {...}}` in, a JSON
//! array of `{"summary_text"}` / `{"generated_text"}` objects out.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::config::ModelConfig;

/// Maximum characters sent to the summary model
pub const MAX_SUMMARY_INPUT_CHARS: usize = 4000;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("No model endpoint configured")]
    NotConfigured,
    #[error("Model request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Model returned status {0}")]
    Status(u16),
    #[error("Model returned no text")]
    EmptyResponse,
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct InferenceOutput {
    #[serde(alias = "generated_text")]
    summary_text: Option<String>,
}

/// Client for the optional summary and question-generation models
#[derive(Clone)]
pub struct ModelClient {
    http: reqwest::Client,
    summary_url: Option<String>,
    generation_url: Option<String>,
    api_token: Option<String>,
}

impl ModelClient {
    pub fn new(config: &ModelConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build model HTTP client ({}), using defaults", e);
                reqwest::Client::new()
            });

        Self {
            http,
            summary_url: config.summary_url.clone(),
            generation_url: config.generation_url.clone(),
            api_token: config.api_token.clone(),
        }
    }

    /// A client with no endpoints; every call falls back
    pub fn disabled() -> Self {
        Self::new(&ModelConfig::default())
    }

    pub fn has_summary_model(&self) -> bool {
        self.summary_url.is_some()
    }

    pub fn has_generation_model(&self) -> bool {
        self.generation_url.is_some()
    }

    /// Abstractive summary of `text`
    pub async fn summarize(&self, text: &str) -> Result<String, ModelError> {
        let url = self.summary_url.as_deref().ok_or(ModelError::NotConfigured)?;
        let input = truncate_chars(text, MAX_SUMMARY_INPUT_CHARS);
        self.infer(
            url,
            input,
            json!({ "max_length": 150, "min_length": 30, "do_sample": false }),
        )
        .await
    }

    /// Generate a question about `sentence`
    pub async fn generate_question(&self, sentence: &str) -> Result<String, ModelError> {
        let url = self.generation_url.as_deref().ok_or(ModelError::NotConfigured)?;
        let prompt = format!("generate question: {}", sentence);
        self.infer(url, &prompt, json!({ "max_length": 64 })).await
    }

    async fn infer(
        &self,
        url: &str,
        inputs: &str,
        parameters: serde_json::Value,
    ) -> Result<String, ModelError> {
        let mut request = self.http.post(url).json(&InferenceRequest { inputs, parameters });
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(ModelError::Status(response.status().as_u16()));
        }

        let outputs: Vec<InferenceOutput> = response.json().await?;
        outputs
            .into_iter()
            .find_map(|o| o.summary_text)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(ModelError::EmptyResponse)
    }
}

/// Truncate on a char boundary
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
