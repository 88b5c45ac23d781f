//! Provider capabilities consumed by the engine.
//!
//! The engine never talks to a vendor SDK directly. It depends on two
//! narrow async traits:
//! - [`EmbeddingProvider`]: text -> fixed-dimension vector
//! - [`CompletionProvider`]: structured prompt -> free-text completion
//!
//! Concrete adapters live in this module ([`OpenAiProvider`],
//! [`OllamaProvider`]); tests supply deterministic stubs. Retry and
//! backoff are adapter policy, never engine policy.

use async_trait::async_trait;
use thiserror::Error;

use crate::prompt::Prompt;

pub mod ollama;
pub mod openai;

pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

/// Classification of a provider failure.
///
/// `Timeout` is kept distinct so callers can tell a dead backend from a
/// misbehaving one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// The request deadline elapsed before a response arrived.
    Timeout,
    /// Network failure or non-success HTTP status.
    Http,
    /// The backend answered, but not in the shape we expect.
    InvalidResponse,
    /// The adapter could not be constructed (missing key, bad settings).
    Config,
}

impl std::fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ProviderErrorKind::Timeout => "timeout",
            ProviderErrorKind::Http => "http",
            ProviderErrorKind::InvalidResponse => "invalid response",
            ProviderErrorKind::Config => "config",
        };
        f.write_str(name)
    }
}

/// Failure raised by an embedding or completion backend.
#[derive(Debug, Clone, Error)]
#[error("{kind} error: {message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Timeout,
            message: message.into(),
        }
    }

    pub fn http(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Http,
            message: message.into(),
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::InvalidResponse,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Config,
            message: message.into(),
        }
    }

    /// Classify a transport error, keeping timeouts distinct.
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout(err.to_string())
        } else {
            Self::http(err.to_string())
        }
    }
}

/// Maps a text string to a fixed-dimension numeric vector.
///
/// Distances are only meaningful between vectors produced by the same
/// provider, so the corpus and every query must go through one instance.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Vector dimensionality this provider produces (e.g. 1536).
    fn dimension(&self) -> usize;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError>;
}

/// Produces a free-text completion for a structured prompt.
///
/// Output length bound and temperature are adapter parameters supplied
/// at construction, not arguments of this call.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Complete the prompt and return the raw model text.
    async fn complete(&self, prompt: &Prompt) -> Result<String, ProviderError>;
}
