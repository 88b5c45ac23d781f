//! Integration tests for the examsage engine.
//!
//! Drives the public API end to end with deterministic stub providers
//! (fixed embeddings, scripted completions) so no network is needed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use examsage::engine::ExtractionKind;
use examsage::prompt::Prompt;
use examsage::providers::{CompletionProvider, EmbeddingProvider, ProviderError};
use examsage::{snapshot_store, EngineError, QaEngine, QaRecord};

/// Embedder with one fixed vector per known text; errors on anything else.
struct PlannedEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    calls: AtomicUsize,
}

impl PlannedEmbedder {
    fn new(entries: &[(&str, [f32; 2])]) -> Self {
        Self {
            vectors: entries
                .iter()
                .map(|(text, vector)| (text.to_string(), vector.to_vec()))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for PlannedEmbedder {
    fn dimension(&self) -> usize {
        2
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.vectors
            .get(text)
            .cloned()
            .ok_or_else(|| ProviderError::invalid_response(format!("no planned vector for {:?}", text)))
    }
}

/// Completer that always replies with a fixed string and records the
/// prompt it was handed.
struct ScriptedCompleter {
    reply: String,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<Prompt>>,
}

impl ScriptedCompleter {
    fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_prompt(&self) -> Option<Prompt> {
        self.last_prompt.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedCompleter {
    async fn complete(&self, prompt: &Prompt) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(prompt.clone());
        Ok(self.reply.clone())
    }
}

struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    fn dimension(&self) -> usize {
        2
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>, ProviderError> {
        Err(ProviderError::timeout("request deadline elapsed"))
    }
}

struct FailingCompleter;

#[async_trait]
impl CompletionProvider for FailingCompleter {
    async fn complete(&self, _prompt: &Prompt) -> Result<String, ProviderError> {
        Err(ProviderError::http("backend unavailable"))
    }
}

fn corpus() -> Vec<QaRecord> {
    vec![
        QaRecord::new("alpha question", "1"),
        QaRecord::new("beta question", "2"),
        QaRecord::new("gamma question", "3"),
    ]
}

/// Planned layout: query at [1, 0], so alpha (distance 1) is nearest,
/// then beta (4), then gamma (81).
fn planned_embedder() -> PlannedEmbedder {
    PlannedEmbedder::new(&[
        ("alpha question", [0.0, 0.0]),
        ("beta question", [3.0, 0.0]),
        ("gamma question", [10.0, 0.0]),
        ("target question", [1.0, 0.0]),
    ])
}

#[tokio::test]
async fn test_query_before_ingestion_is_no_data_and_touches_no_provider() {
    let engine = QaEngine::new();
    let embedder = planned_embedder();
    let completer = ScriptedCompleter::new("1");

    let result = engine
        .answer("target question", 3, &embedder, &completer)
        .await;

    assert!(matches!(result, Err(EngineError::NoData)));
    assert_eq!(embedder.calls(), 0);
    assert_eq!(completer.calls(), 0);
}

#[tokio::test]
async fn test_k_larger_than_corpus_is_clamped() {
    let engine = QaEngine::new();
    let embedder = planned_embedder();
    let completer = ScriptedCompleter::new("2");

    engine.ingest(corpus(), &embedder).await.unwrap();
    let result = engine
        .answer("target question", 5, &embedder, &completer)
        .await
        .unwrap();

    assert_eq!(result.supporting_questions.len(), 3);
}

#[tokio::test]
async fn test_supporting_questions_most_similar_first() {
    let engine = QaEngine::new();
    let embedder = planned_embedder();
    let completer = ScriptedCompleter::new("2");

    engine.ingest(corpus(), &embedder).await.unwrap();
    let result = engine
        .answer("target question", 3, &embedder, &completer)
        .await
        .unwrap();

    let questions: Vec<&str> = result
        .supporting_questions
        .iter()
        .map(|s| s.question.as_str())
        .collect();
    assert_eq!(
        questions,
        vec!["alpha question", "beta question", "gamma question"]
    );

    for pair in result.supporting_questions.windows(2) {
        assert!(pair[0].distance <= pair[1].distance);
    }
    assert_eq!(result.supporting_questions[0].distance, 1.0);
}

#[tokio::test]
async fn test_prompt_exemplars_follow_retrieval_order() {
    let engine = QaEngine::new();
    let embedder = planned_embedder();
    let completer = ScriptedCompleter::new("2");

    engine.ingest(corpus(), &embedder).await.unwrap();
    engine
        .answer("target question", 3, &embedder, &completer)
        .await
        .unwrap();

    let prompt = completer.last_prompt().unwrap();
    let alpha = prompt.user.find("alpha question").unwrap();
    let beta = prompt.user.find("beta question").unwrap();
    let gamma = prompt.user.find("gamma question").unwrap();
    assert!(alpha < beta && beta < gamma);

    // The target question comes after every exemplar.
    let target = prompt.user.rfind("target question").unwrap();
    assert!(target > gamma);
}

#[tokio::test]
async fn test_label_answer_is_parsed_out() {
    let engine = QaEngine::new();
    let embedder = planned_embedder();
    let completer = ScriptedCompleter::new("The answer is (3).");

    engine.ingest(corpus(), &embedder).await.unwrap();
    let result = engine
        .answer("target question", 2, &embedder, &completer)
        .await
        .unwrap();

    assert_eq!(result.predicted_answer, "3");
    assert_eq!(result.extraction, ExtractionKind::Label);
    assert_eq!(result.confidence, 0.95);
}

#[tokio::test]
async fn test_fallback_answer_is_distinguishable() {
    let engine = QaEngine::new();
    let embedder = planned_embedder();
    let completer = ScriptedCompleter::new("no clear option");

    engine.ingest(corpus(), &embedder).await.unwrap();
    let result = engine
        .answer("target question", 1, &embedder, &completer)
        .await
        .unwrap();

    assert_eq!(result.predicted_answer, "no clear option");
    assert_eq!(result.extraction, ExtractionKind::Fallback);
}

#[tokio::test]
async fn test_label_never_matches_inside_larger_token() {
    let engine = QaEngine::new();
    let embedder = planned_embedder();
    let completer = ScriptedCompleter::new("Ans: 10");

    engine.ingest(corpus(), &embedder).await.unwrap();
    let result = engine
        .answer("target question", 1, &embedder, &completer)
        .await
        .unwrap();

    assert_eq!(result.extraction, ExtractionKind::Fallback);
    assert_eq!(result.predicted_answer, "Ans: 10");
}

#[tokio::test]
async fn test_reingestion_leaves_no_stale_positions() {
    let engine = QaEngine::new();
    let embedder = planned_embedder();
    let completer = ScriptedCompleter::new("1");

    engine.ingest(corpus(), &embedder).await.unwrap();

    // Replace the corpus with a smaller one.
    let replacement = vec![
        QaRecord::new("alpha question", "1"),
        QaRecord::new("beta question", "2"),
    ];
    engine.ingest(replacement, &embedder).await.unwrap();

    let result = engine
        .answer("target question", 5, &embedder, &completer)
        .await
        .unwrap();

    assert_eq!(result.supporting_questions.len(), 2);
    for item in &result.supporting_questions {
        assert_ne!(item.question, "gamma question");
    }
}

#[tokio::test]
async fn test_ingestion_is_deterministic() {
    let embedder = planned_embedder();
    let completer = ScriptedCompleter::new("1");

    let mut orderings = Vec::new();
    for _ in 0..2 {
        let engine = QaEngine::new();
        engine.ingest(corpus(), &embedder).await.unwrap();
        let result = engine
            .answer("target question", 3, &embedder, &completer)
            .await
            .unwrap();
        orderings.push(
            result
                .supporting_questions
                .iter()
                .map(|s| s.question.clone())
                .collect::<Vec<_>>(),
        );
    }

    assert_eq!(orderings[0], orderings[1]);
}

#[tokio::test]
async fn test_invalid_arguments_rejected_before_providers() {
    let engine = QaEngine::new();
    let embedder = planned_embedder();
    let completer = ScriptedCompleter::new("1");
    engine.ingest(corpus(), &embedder).await.unwrap();
    let calls_after_ingest = embedder.calls();

    let zero_k = engine
        .answer("target question", 0, &embedder, &completer)
        .await;
    assert!(matches!(zero_k, Err(EngineError::InvalidArgument(_))));

    let blank = engine.answer("   ", 3, &embedder, &completer).await;
    assert!(matches!(blank, Err(EngineError::InvalidArgument(_))));

    assert_eq!(embedder.calls(), calls_after_ingest);
    assert_eq!(completer.calls(), 0);
}

#[tokio::test]
async fn test_embedding_failure_surfaces_and_skips_completion() {
    let engine = QaEngine::new();
    let embedder = planned_embedder();
    let completer = ScriptedCompleter::new("1");
    engine.ingest(corpus(), &embedder).await.unwrap();

    let result = engine
        .answer("target question", 2, &FailingEmbedder, &completer)
        .await;

    assert!(matches!(result, Err(EngineError::EmbeddingFailed { .. })));
    assert_eq!(completer.calls(), 0);
}

#[tokio::test]
async fn test_completion_failure_surfaces() {
    let engine = QaEngine::new();
    let embedder = planned_embedder();
    engine.ingest(corpus(), &embedder).await.unwrap();

    let result = engine
        .answer("target question", 2, &embedder, &FailingCompleter)
        .await;

    assert!(matches!(result, Err(EngineError::CompletionFailed { .. })));
}

#[tokio::test]
async fn test_failed_first_ingestion_leaves_engine_uninitialized() {
    let engine = QaEngine::new();

    let result = engine.ingest(corpus(), &FailingEmbedder).await;
    assert!(matches!(result, Err(EngineError::EmbeddingFailed { .. })));
    assert!(!engine.is_ready());

    let embedder = planned_embedder();
    let completer = ScriptedCompleter::new("1");
    let query = engine
        .answer("target question", 1, &embedder, &completer)
        .await;
    assert!(matches!(query, Err(EngineError::NoData)));
}

#[tokio::test]
async fn test_failed_reingestion_keeps_previous_corpus() {
    let engine = QaEngine::new();
    let embedder = planned_embedder();
    let completer = ScriptedCompleter::new("1");
    engine.ingest(corpus(), &embedder).await.unwrap();

    let result = engine.ingest(corpus(), &FailingEmbedder).await;
    assert!(matches!(result, Err(EngineError::EmbeddingFailed { .. })));

    // The previously published snapshot still serves queries.
    let answer = engine
        .answer("target question", 3, &embedder, &completer)
        .await
        .unwrap();
    assert_eq!(answer.supporting_questions.len(), 3);
}

#[tokio::test]
async fn test_persisted_snapshot_round_trips_through_restore() {
    let dir = tempfile::TempDir::new().unwrap();
    let embedder = planned_embedder();
    let completer = ScriptedCompleter::new("2");

    let engine = QaEngine::new();
    engine.ingest(corpus(), &embedder).await.unwrap();
    snapshot_store::save(dir.path(), &engine.snapshot().unwrap()).unwrap();

    // A fresh engine restores the snapshot without re-embedding.
    let restored = QaEngine::new();
    let loaded = snapshot_store::load(dir.path()).unwrap();
    let report = restored.restore(loaded.records, loaded.embeddings).unwrap();
    assert_eq!(report.records, 3);

    let calls_before = embedder.calls();
    let result = restored
        .answer("target question", 3, &embedder, &completer)
        .await
        .unwrap();
    // Only the query itself needed an embedding.
    assert_eq!(embedder.calls(), calls_before + 1);

    let questions: Vec<&str> = result
        .supporting_questions
        .iter()
        .map(|s| s.question.as_str())
        .collect();
    assert_eq!(
        questions,
        vec!["alpha question", "beta question", "gamma question"]
    );
}
