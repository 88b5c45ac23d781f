//! examsage - Main CLI Entry Point

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use examsage::cli::{Args, Commands};
use examsage::config::{Backend, Config};
use examsage::engine::ExtractionKind;
use examsage::providers::{
    CompletionProvider, EmbeddingProvider, OllamaProvider, OpenAiProvider,
};
use examsage::snapshot_store;
use examsage::{QaEngine, QaRecord};

#[tokio::main]
async fn main() {
    let args = Args::parse();
    if let Err(e) = run(args).await {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let config = Config::load(args.config.as_deref())?;
    let data_dir = match &args.data_dir {
        Some(dir) => dir.clone(),
        None => Config::default_data_dir()?,
    };

    match args.command {
        Commands::Ingest { input } => cmd_ingest(&config, &data_dir, &input).await,
        Commands::Ask { question, k } => {
            let k = k.unwrap_or(config.retrieval.default_k);
            cmd_ask(&config, &data_dir, &question, k).await
        }
        Commands::Status => cmd_status(&data_dir),
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

/// One backend serves both capabilities; which one is config-driven.
async fn build_providers(
    config: &Config,
) -> Result<(Arc<dyn EmbeddingProvider>, Arc<dyn CompletionProvider>)> {
    match config.provider.backend {
        Backend::OpenAi => {
            let provider = Arc::new(OpenAiProvider::from_config(config)?);
            let embedder: Arc<dyn EmbeddingProvider> = provider.clone();
            let completer: Arc<dyn CompletionProvider> = provider;
            Ok((embedder, completer))
        }
        Backend::Ollama => {
            let provider = Arc::new(OllamaProvider::from_config(config)?);
            if !provider.health_check().await {
                anyhow::bail!(
                    "Ollama is not reachable at {}. Start it with: ollama serve",
                    provider.base_url()
                );
            }
            let embedder: Arc<dyn EmbeddingProvider> = provider.clone();
            let completer: Arc<dyn CompletionProvider> = provider;
            Ok((embedder, completer))
        }
    }
}

async fn cmd_ingest(config: &Config, data_dir: &Path, input: &PathBuf) -> Result<()> {
    let contents = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let records: Vec<QaRecord> = serde_json::from_str(&contents).with_context(|| {
        format!(
            "{} is not a JSON array of question/answer records",
            input.display()
        )
    })?;
    if records.is_empty() {
        anyhow::bail!("{} contains no records", input.display());
    }

    let (embedder, _) = build_providers(config).await?;
    let engine = QaEngine::with_config(config.engine_config());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(format!("Embedding {} questions...", records.len()));

    let report = engine.ingest(records, embedder.as_ref()).await?;
    pb.finish_and_clear();

    let snapshot = engine.snapshot()?;
    snapshot_store::save(data_dir, &snapshot)?;

    println!(
        "{} Indexed {} questions (dimension {}) into {}",
        "✓".green().bold(),
        report.records,
        report.dimension,
        data_dir.display()
    );
    Ok(())
}

async fn cmd_ask(config: &Config, data_dir: &Path, question: &str, k: usize) -> Result<()> {
    let loaded = snapshot_store::load(data_dir)
        .context("no corpus loaded; run `examsage ingest <FILE>` first")?;

    let engine = QaEngine::with_config(config.engine_config());
    engine.restore(loaded.records, loaded.embeddings)?;

    let (embedder, completer) = build_providers(config).await?;
    let result = engine
        .answer(question, k, embedder.as_ref(), completer.as_ref())
        .await?;

    println!(
        "{} {}",
        "Predicted answer:".bold(),
        result.predicted_answer.green().bold()
    );
    if result.extraction == ExtractionKind::Fallback {
        println!(
            "{}",
            "(no option label found; showing the raw model output)".yellow()
        );
    }
    println!("{} {:.0}%", "Confidence:".bold(), result.confidence * 100.0);
    println!();
    println!("{}", "Reference questions:".bold());
    for (i, item) in result.supporting_questions.iter().enumerate() {
        println!("  {}. (distance {:.4}) {}", i + 1, item.distance, item.question);
        println!("     {} {}", "Answer:".dimmed(), item.answer);
    }

    Ok(())
}

fn cmd_status(data_dir: &Path) -> Result<()> {
    if !snapshot_store::exists(data_dir) {
        println!(
            "{} no corpus ingested yet (looked in {})",
            "•".yellow(),
            data_dir.display()
        );
        return Ok(());
    }

    let loaded = snapshot_store::load(data_dir)?;
    println!(
        "{} {} records, dimension {}, saved {}",
        "✓".green().bold(),
        loaded.records.len(),
        loaded.dimension,
        loaded.saved_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("  data dir: {}", data_dir.display());
    Ok(())
}
