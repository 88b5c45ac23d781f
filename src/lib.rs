//! examsage - Retrieval-augmented answering for multiple-choice exams
//!
//! Answers a question by retrieving the most similar previously-solved
//! questions from an ingested corpus and using them as few-shot context
//! for a completion model.
//!
//! # Architecture
//!
//! - **Providers**: embedding and completion capabilities as swappable traits
//! - **Index + Corpus**: an immutable snapshot pair, swapped atomically on rebuild
//! - **Engine**: embed -> search -> join -> prompt -> complete -> extract

pub mod cli;
pub mod config;
pub mod corpus;
pub mod engine;
pub mod errors;
pub mod extract;
pub mod index;
pub mod prompt;
pub mod providers;
pub mod snapshot_store;

// Re-export commonly used types
pub use corpus::{CorpusStore, QaRecord};
pub use engine::{ExtractionKind, IngestReport, QaEngine, QueryResult, RetrievedContext};
pub use errors::{EngineError, Result};
