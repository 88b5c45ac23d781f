//! OpenAI provider adapter.
//!
//! Serves both capabilities: `POST /v1/embeddings` for vectors and
//! `POST /v1/chat/completions` for answers. Requires `OPENAI_API_KEY`
//! in the environment.
//!
//! Retry strategy (adapter policy, invisible to the engine):
//! - HTTP 429 and 5xx -> retry with exponential backoff (1s, 2s, 4s, ...)
//! - other 4xx -> fail immediately
//! - network errors and timeouts -> retry

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{CompletionProvider, EmbeddingProvider, ProviderError};
use crate::config::Config;
use crate::prompt::Prompt;

/// Default OpenAI API endpoint
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";

/// Provider backed by the OpenAI HTTP API.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    client: Client,
    base_url: String,
    api_key: String,
    embedding_model: String,
    dimension: usize,
    completion_model: String,
    max_tokens: u32,
    temperature: f32,
    max_retries: u32,
}

impl OpenAiProvider {
    /// Build the adapter from configuration.
    ///
    /// Fails if `OPENAI_API_KEY` is not set; the request deadline comes
    /// from `[http] timeout_secs`.
    pub fn from_config(config: &Config) -> Result<Self, ProviderError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ProviderError::config("OPENAI_API_KEY environment variable not set"))?;

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
                .unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string()),
            api_key,
            embedding_model: config.embedding.model.clone(),
            dimension: config.embedding.dimension,
            completion_model: config.completion.model.clone(),
            max_tokens: config.completion.max_tokens,
            temperature: config.completion.temperature,
            max_retries: config.http.max_retries,
        })
    }

    async fn post_with_retry<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response, ProviderError> {
        let url = format!("{}{}", self.base_url, path);
        let mut last_err: Option<ProviderError> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s, ... capped at 32s.
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let sent = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(body)
                .send()
                .await;

            match sent {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    let err =
                        ProviderError::http(format!("OpenAI API error {}: {}", status, body_text));

                    // Rate limited or server error: retry.
                    if status.as_u16() == 429 || status.is_server_error() {
                        last_err = Some(err);
                        continue;
                    }

                    // Other client errors will not get better by retrying.
                    return Err(err);
                }
                Err(e) => {
                    last_err = Some(ProviderError::from_reqwest(e));
                    continue;
                }
            }
        }

        Err(last_err
            .unwrap_or_else(|| ProviderError::http("OpenAI request failed after retries")))
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiProvider {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let request = EmbeddingRequest {
            model: &self.embedding_model,
            input: text,
        };

        let response = self.post_with_retry("/v1/embeddings", &request).await?;
        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::invalid_response(e.to_string()))?;

        let embedding = parsed
            .data
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::invalid_response("empty embedding response"))?
            .embedding;

        if embedding.len() != self.dimension {
            return Err(ProviderError::invalid_response(format!(
                "embedding has {} dimensions (expected {})",
                embedding.len(),
                self.dimension
            )));
        }

        Ok(embedding)
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(&self, prompt: &Prompt) -> Result<String, ProviderError> {
        let request = ChatRequest {
            model: &self.completion_model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self.post_with_retry("/v1/chat/completions", &request).await?;
        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::invalid_response(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::invalid_response("completion returned no choices"))?
            .message
            .content;

        Ok(content.trim().to_string())
    }
}

/// Embeddings request body
#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

/// Embeddings response body
#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Chat completions request body
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Chat completions response body
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_embedding_response() {
        let json = r#"{"data": [{"embedding": [0.1, -0.2, 0.3], "index": 0}]}"#;
        let parsed: EmbeddingResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.data[0].embedding, vec![0.1, -0.2, 0.3]);
    }

    #[test]
    fn test_parse_chat_response() {
        let json = r#"{
            "choices": [
                {"message": {"role": "assistant", "content": "3"}, "finish_reason": "stop"}
            ]
        }"#;
        let parsed: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.choices[0].message.content, "3");
    }

    #[test]
    fn test_chat_request_shape() {
        let request = ChatRequest {
            model: "gpt-4",
            messages: vec![ChatMessage {
                role: "system",
                content: "be terse",
            }],
            max_tokens: 10,
            temperature: 0.0,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4");
        assert_eq!(json["max_tokens"], 10);
        assert_eq!(json["messages"][0]["role"], "system");
    }
}
