//! Error types for the examsage engine.
//!
//! Every failure the engine can return to a caller is one of these
//! variants; nothing is silently swallowed. Provider failures arrive
//! wrapped in [`EngineError::EmbeddingFailed`] or
//! [`EngineError::CompletionFailed`] and are never retried here (retry
//! policy belongs to the provider adapter).

use thiserror::Error;

use crate::providers::ProviderError;

/// Main error type for the examsage engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// Query arrived before any corpus was successfully ingested
    #[error("no corpus loaded")]
    NoData,

    /// Search on an index that is empty or not yet built
    #[error("vector index is empty or not yet built")]
    NotReady,

    /// The embedding backend failed
    #[error("embedding failed: {source}")]
    EmbeddingFailed {
        #[source]
        source: ProviderError,
    },

    /// The completion backend failed
    #[error("completion failed: {source}")]
    CompletionFailed {
        #[source]
        source: ProviderError,
    },

    /// Internal alignment violation: a search result pointed outside the
    /// corpus. Well-formed external input must never cause this.
    #[error("position {position} out of range for corpus of {len} records")]
    OutOfRange { position: usize, len: usize },

    /// Malformed caller input (k == 0, empty query text, mismatched
    /// dimensions, empty ingestion batch)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Persisted snapshot is missing or does not pass validation
    #[error("snapshot store error: {0}")]
    Snapshot(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
