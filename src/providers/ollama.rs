//! Ollama provider adapter.
//!
//! Talks to a local Ollama instance: `POST /api/embeddings` for vectors
//! and `POST /api/generate` (non-streaming) for answers. No retry here;
//! a local backend that refuses connections is down, and the CLI checks
//! [`OllamaProvider::health_check`] before doing real work.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{CompletionProvider, EmbeddingProvider, ProviderError};
use crate::config::Config;
use crate::prompt::Prompt;

/// Default Ollama API endpoint
pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Provider backed by a local Ollama instance.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    embedding_model: String,
    dimension: usize,
    completion_model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OllamaProvider {
    /// Build the adapter from configuration.
    pub fn from_config(config: &Config) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http.timeout_secs))
            .build()
            .map_err(ProviderError::from_reqwest)?;

        Ok(Self {
            client,
            base_url: config
                .provider
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
            embedding_model: config.embedding.model.clone(),
            dimension: config.embedding.dimension,
            completion_model: config.completion.model.clone(),
            max_tokens: config.completion.max_tokens,
            temperature: config.completion.temperature,
        })
    }

    /// Check if Ollama is reachable.
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/api/version", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response, ProviderError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(ProviderError::from_reqwest)?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::http(format!(
                "Ollama API error {}: {}",
                status, body_text
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaProvider {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let request = OllamaEmbeddingRequest {
            model: &self.embedding_model,
            prompt: text,
        };

        let response = self.post_json("/api/embeddings", &request).await?;
        let parsed: OllamaEmbeddingResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::invalid_response(e.to_string()))?;

        if parsed.embedding.len() != self.dimension {
            return Err(ProviderError::invalid_response(format!(
                "embedding has {} dimensions (expected {})",
                parsed.embedding.len(),
                self.dimension
            )));
        }

        Ok(parsed.embedding)
    }
}

#[async_trait]
impl CompletionProvider for OllamaProvider {
    async fn complete(&self, prompt: &Prompt) -> Result<String, ProviderError> {
        let request = OllamaGenerateRequest {
            model: &self.completion_model,
            prompt: &prompt.user,
            system: &prompt.system,
            stream: false,
            options: OllamaOptions {
                temperature: self.temperature,
                num_predict: self.max_tokens,
            },
        };

        let response = self.post_json("/api/generate", &request).await?;
        let parsed: OllamaGenerateResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::invalid_response(e.to_string()))?;

        Ok(parsed.response.trim().to_string())
    }
}

/// Embeddings request body
#[derive(Debug, Serialize)]
struct OllamaEmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

/// Embeddings response body
#[derive(Debug, Deserialize)]
struct OllamaEmbeddingResponse {
    embedding: Vec<f32>,
}

/// Generate request body
#[derive(Debug, Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
    options: OllamaOptions,
}

/// Sampling options forwarded to Ollama
#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

/// Generate response body
#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}
