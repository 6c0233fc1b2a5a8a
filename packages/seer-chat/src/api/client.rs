//! Text-generation HTTP client

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use seer_core::{TextGenerator, SYSTEM_INSTRUCTION};

use super::types::*;

/// Default `generateContent` endpoint.
pub const DEFAULT_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

/// Header carrying the API key.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// HTTP client for the generation service
#[derive(Debug, Clone)]
pub struct GeminiClient {
    endpoint: String,
    api_key: Option<String>,
    client: Client,
}

impl GeminiClient {
    /// Create a new client for `endpoint`
    pub fn new(endpoint: &str, api_key: Option<String>) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            api_key,
            client: Client::new(),
        }
    }

    /// Get the endpoint URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Make a POST request
    async fn post<T: DeserializeOwned, B: Serialize>(&self, body: &B) -> Result<T> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("No API key configured"))?;

        let response = self
            .client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, api_key)
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Request failed: {} {}",
                response.status(),
                response.text().await.unwrap_or_default()
            ));
        }

        Ok(response.json().await?)
    }

    /// Send one prompt with the oracle's system instruction
    pub async fn generate_content(&self, prompt: &str) -> Result<GenerateContentResponse> {
        let request = GenerateContentRequest::new(SYSTEM_INSTRUCTION, prompt);
        self.post(&request).await
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> seer_core::Result<String> {
        let response = self.generate_content(prompt).await.map_err(into_core_error)?;

        response
            .first_text()
            .map(str::to_string)
            .ok_or_else(|| seer_core::Error::MalformedResponse("no candidate text".to_string()))
    }
}

fn into_core_error(err: anyhow::Error) -> seer_core::Error {
    match err.downcast_ref::<reqwest::Error>() {
        Some(e) if e.is_decode() => seer_core::Error::MalformedResponse(e.to_string()),
        _ => seer_core::Error::Generation(err.to_string()),
    }
}
