//! Retrieval-augmented query engine.
//!
//! Owns the `(CorpusStore, VectorIndex)` snapshot and orchestrates the
//! query flow: embed -> search -> join -> prompt -> complete -> extract.
//!
//! The snapshot is an immutable pair built from a single ingestion batch
//! and published behind an indirection cell. Readers clone the `Arc` and
//! run lock-free; a rebuild swaps the whole pair at once, so a query in
//! flight can never observe a store whose length disagrees with the
//! index row count.

use std::sync::{Arc, RwLock};

use futures_util::{stream, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};

use crate::corpus::{CorpusStore, QaRecord};
use crate::errors::{EngineError, Result};
use crate::extract::{AnswerExtractor, Extraction};
use crate::index::VectorIndex;
use crate::prompt::{PromptBuilder, DEFAULT_LABELS};
use crate::providers::{CompletionProvider, EmbeddingProvider};

/// Reference behavior hardcodes the confidence score; deriving one from
/// the distance distribution would change the external contract.
const FIXED_CONFIDENCE: f32 = 0.95;

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Closed label set the model must answer from
    pub labels: Vec<String>,
    /// Concurrent embedding requests during ingestion
    pub ingest_concurrency: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            labels: DEFAULT_LABELS.iter().map(|l| l.to_string()).collect(),
            ingest_concurrency: num_cpus::get(),
        }
    }
}

/// One retrieved exemplar: a corpus record paired with its distance to
/// the query embedding. Serialized with the wire field name `text` for
/// the question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedContext {
    #[serde(rename = "text")]
    pub question: String,
    pub answer: String,
    pub distance: f32,
}

/// How the predicted answer was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionKind {
    /// A standalone label from the closed set was parsed out.
    Label,
    /// No label found; `predicted_answer` is the raw trimmed completion.
    Fallback,
}

/// Result of one query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub predicted_answer: String,
    pub confidence: f32,
    pub extraction: ExtractionKind,
    pub supporting_questions: Vec<RetrievedContext>,
}

/// Summary of a completed ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub records: usize,
    pub dimension: usize,
}

/// Immutable `(CorpusStore, VectorIndex)` pair.
///
/// Both halves come from the same batch, so alignment between record
/// positions and index rows holds by construction.
pub struct Snapshot {
    store: CorpusStore,
    index: VectorIndex,
}

impl Snapshot {
    /// Build a snapshot from records zipped with their embeddings.
    pub fn from_batch(records: Vec<QaRecord>, embeddings: Vec<Vec<f32>>) -> Result<Self> {
        if records.is_empty() {
            return Err(EngineError::InvalidArgument(
                "cannot build a snapshot from an empty corpus".to_string(),
            ));
        }
        if records.len() != embeddings.len() {
            return Err(EngineError::InvalidArgument(format!(
                "{} records but {} embeddings",
                records.len(),
                embeddings.len()
            )));
        }

        let dimension = embeddings[0].len();
        let index = VectorIndex::build(dimension, embeddings)?;
        let store = CorpusStore::from_records(records);

        Ok(Self { store, index })
    }

    pub fn store(&self) -> &CorpusStore {
        &self.store
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }
}

/// The coordinating engine: ingestion plus the retrieval pipeline.
///
/// State machine: `Uninitialized -> Ready` on the first successful
/// ingestion; queries and re-ingestions stay `Ready`. Per-call failures
/// never change engine state.
pub struct QaEngine {
    snapshot: RwLock<Option<Arc<Snapshot>>>,
    prompt_builder: PromptBuilder,
    extractor: AnswerExtractor,
    ingest_concurrency: usize,
}

impl QaEngine {
    /// Create an engine with the default configuration.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create an engine with a custom configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            snapshot: RwLock::new(None),
            prompt_builder: PromptBuilder::with_labels(config.labels.clone()),
            extractor: AnswerExtractor::new(config.labels),
            ingest_concurrency: config.ingest_concurrency.max(1),
        }
    }

    /// Whether a corpus has been successfully ingested.
    pub fn is_ready(&self) -> bool {
        self.snapshot.read().unwrap().is_some()
    }

    /// The currently published snapshot.
    pub fn snapshot(&self) -> Result<Arc<Snapshot>> {
        self.snapshot
            .read()
            .unwrap()
            .as_ref()
            .cloned()
            .ok_or(EngineError::NoData)
    }

    /// Ingest a corpus: embed every question, build the index, and
    /// publish the new snapshot atomically.
    ///
    /// Embedding runs concurrently but the matrix is assembled in corpus
    /// order, since position alignment is load-bearing. Any failure
    /// leaves the previously published snapshot (or the uninitialized
    /// state) untouched.
    pub async fn ingest(
        &self,
        records: Vec<QaRecord>,
        embedder: &dyn EmbeddingProvider,
    ) -> Result<IngestReport> {
        if records.is_empty() {
            return Err(EngineError::InvalidArgument(
                "cannot ingest an empty corpus".to_string(),
            ));
        }

        let embeddings = self.embed_corpus(&records, embedder).await?;
        let snapshot = Snapshot::from_batch(records, embeddings)?;
        Ok(self.publish(snapshot))
    }

    /// Publish a snapshot from pre-computed embeddings (e.g. reloaded
    /// from disk) without calling the embedding provider.
    pub fn restore(
        &self,
        records: Vec<QaRecord>,
        embeddings: Vec<Vec<f32>>,
    ) -> Result<IngestReport> {
        let snapshot = Snapshot::from_batch(records, embeddings)?;
        Ok(self.publish(snapshot))
    }

    /// Answer a question using the k most similar corpus records as
    /// few-shot context.
    ///
    /// `k` is clamped to the corpus size; asking for more references
    /// than exist returns everything rather than failing.
    pub async fn answer(
        &self,
        question: &str,
        k: usize,
        embedder: &dyn EmbeddingProvider,
        completer: &dyn CompletionProvider,
    ) -> Result<QueryResult> {
        if question.trim().is_empty() {
            return Err(EngineError::InvalidArgument(
                "question text is empty".to_string(),
            ));
        }
        if k == 0 {
            return Err(EngineError::InvalidArgument(
                "k must be at least 1".to_string(),
            ));
        }

        // Fail fast before any provider call when no corpus is loaded.
        let snapshot = self.snapshot()?;

        // Distances across embedding spaces are meaningless; refuse a
        // provider that cannot have built this corpus.
        let expected = snapshot.index().dimension();
        if embedder.dimension() != expected {
            return Err(EngineError::InvalidArgument(format!(
                "embedding provider produces {} dimensions but the corpus was built with {}",
                embedder.dimension(),
                expected
            )));
        }

        let query_embedding = embedder
            .embed(question)
            .await
            .map_err(|source| EngineError::EmbeddingFailed { source })?;

        let k = k.min(snapshot.store().len());
        let hits = snapshot.index().search(&query_embedding, k)?;

        let mut supporting = Vec::with_capacity(hits.len());
        for (distance, position) in hits {
            let record = snapshot.store().get(position)?;
            supporting.push(RetrievedContext {
                question: record.question.clone(),
                answer: record.answer.clone(),
                distance,
            });
        }

        let prompt = self.prompt_builder.build(question, &supporting);
        let raw = completer
            .complete(&prompt)
            .await
            .map_err(|source| EngineError::CompletionFailed { source })?;

        let (predicted_answer, extraction) = match self.extractor.extract(&raw) {
            Extraction::Label(label) => (label, ExtractionKind::Label),
            Extraction::Fallback(text) => (text, ExtractionKind::Fallback),
        };

        Ok(QueryResult {
            predicted_answer,
            confidence: FIXED_CONFIDENCE,
            extraction,
            supporting_questions: supporting,
        })
    }

    /// Embed all record questions, bounded concurrency, corpus order.
    async fn embed_corpus(
        &self,
        records: &[QaRecord],
        embedder: &dyn EmbeddingProvider,
    ) -> Result<Vec<Vec<f32>>> {
        // `buffered` preserves input order regardless of completion order.
        stream::iter(records.iter().map(|record| embedder.embed(&record.question)))
            .buffered(self.ingest_concurrency)
            .try_collect()
            .await
            .map_err(|source| EngineError::EmbeddingFailed { source })
    }

    fn publish(&self, snapshot: Snapshot) -> IngestReport {
        let report = IngestReport {
            records: snapshot.store().len(),
            dimension: snapshot.index().dimension(),
        };
        let mut slot = self.snapshot.write().unwrap();
        *slot = Some(Arc::new(snapshot));
        report
    }
}

impl Default for QaEngine {
    fn default() -> Self {
        Self::new()
    }
}
