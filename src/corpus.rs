//! QA corpus store: the ordered record half of a snapshot.
//!
//! Records are identified by their dense zero-based position, which is
//! also their row number in the vector index built from the same batch.
//! The store is append-only during construction and immutable afterward.

use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, Result};

/// One previously-solved question and its correct answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaRecord {
    pub question: String,
    pub answer: String,
}

impl QaRecord {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Ordered, immutable collection of [`QaRecord`]s.
///
/// Positions here are load-bearing: record `i` corresponds to embedding
/// row `i` of the index built from the same ingestion batch.
#[derive(Debug, Clone)]
pub struct CorpusStore {
    records: Vec<QaRecord>,
}

impl CorpusStore {
    pub fn from_records(records: Vec<QaRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Fetch the record at `position`.
    ///
    /// An out-of-range position is an internal invariant violation, not
    /// something well-formed external input can cause.
    pub fn get(&self, position: usize) -> Result<&QaRecord> {
        self.records.get(position).ok_or(EngineError::OutOfRange {
            position,
            len: self.records.len(),
        })
    }

    pub fn records(&self) -> &[QaRecord] {
        &self.records
    }
}
