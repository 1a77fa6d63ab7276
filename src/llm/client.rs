use log::debug;
use reqwest::Client;

use crate::error::{CorepError, Result};
use crate::generation::{GenerationRequest, TextGenerator};
use crate::llm::types::*;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: GEMINI_BASE_URL.to_string(),
        }
    }

    /// Build a client from the `GEMINI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(API_KEY_VAR)
            .map_err(|_| CorepError::Config(format!("{} must be set", API_KEY_VAR)))?;
        Ok(Self::new(api_key))
    }

    /// Point at a different endpoint, e.g. a local proxy.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub(crate) fn build_payload(request: &GenerationRequest) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content::user(request.prompt.clone())],
            generation_config: GenerationConfig {
                response_mime_type: request
                    .json_mode
                    .then(|| "application/json".to_string()),
            },
        }
    }

    pub async fn generate_content(&self, request: &GenerationRequest) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, request.model, self.api_key
        );

        let payload = Self::build_payload(request);
        debug!(
            "Sending {} prompt chars to {}",
            request.prompt.chars().count(),
            request.model
        );

        let res = self.client.post(&url).json(&payload).send().await?;
        let status = res.status();

        if !status.is_success() {
            let body = res.text().await?;
            return Err(CorepError::GenerationStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body: GenerateContentResponse = res.json().await?;

        body.text().ok_or_else(|| {
            CorepError::Generation("Gemini returned no candidate content".to_string())
        })
    }
}

impl TextGenerator for GeminiClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.generate_content(request).await
    }
}
