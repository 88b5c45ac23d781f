//! Command-line argument parsing for examsage.
//!
//! The CLI is a thin consumer of the engine: it reads already-segmented
//! question/answer records from JSON, persists the built snapshot, and
//! maps engine failures to nonzero exit.

use clap::{crate_version, Parser, Subcommand};
use std::path::PathBuf;

/// examsage - answer multiple-choice exam questions with retrieval-augmented few-shot prompting
#[derive(Parser, Debug)]
#[command(name = "examsage")]
#[command(version = crate_version!())]
#[command(
    about = "Answer multiple-choice exam questions with retrieval-augmented few-shot prompting",
    long_about = None
)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory holding the persisted corpus snapshot
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the corpus index from a JSON file of question/answer records
    Ingest {
        /// JSON file: an array of {"question", "answer"} objects
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Answer a question using the ingested corpus
    Ask {
        /// The question text
        #[arg(value_name = "QUESTION")]
        question: String,

        /// Number of reference questions to retrieve
        #[arg(short = 'k', long = "references")]
        k: Option<usize>,
    },

    /// Show the persisted snapshot, if any
    Status,

    /// Display current configuration
    Config,
}
