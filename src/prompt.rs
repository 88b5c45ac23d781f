//! Prompt construction for the completion model.
//!
//! Turns retrieved context plus the target question into a two-part
//! instruction: a system-level behavioral constraint and a user-level
//! payload of question/answer exemplars. Pure transformation, no
//! provider calls, so it is independently testable.

use serde::{Deserialize, Serialize};

use crate::engine::RetrievedContext;

/// Default closed label set: the four option numbers of a standard
/// multiple-choice paper.
pub const DEFAULT_LABELS: [&str; 4] = ["1", "2", "3", "4"];

/// Structured instruction for a completion provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    /// Behavioral constraint: calculate, then emit exactly one label.
    pub system: String,
    /// Exemplars followed by the target question and final instruction.
    pub user: String,
}

/// Builds grounded prompts from retrieved exemplars.
pub struct PromptBuilder {
    labels: Vec<String>,
}

impl PromptBuilder {
    /// Create a builder with the default label set.
    pub fn new() -> Self {
        Self::with_labels(DEFAULT_LABELS.iter().map(|l| l.to_string()).collect())
    }

    /// Create a builder with a custom closed label set.
    pub fn with_labels(labels: Vec<String>) -> Self {
        Self { labels }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Assemble the prompt.
    ///
    /// Exemplars appear in the exact order of `context` (most similar
    /// first); completion models weight order, so retrieval order must
    /// survive into the prompt.
    pub fn build(&self, query: &str, context: &[RetrievedContext]) -> Prompt {
        let options = self.options_phrase();

        let system = format!(
            "You are a helpful assistant who performs detailed calculations and \
             returns only the final answer option ({}) without any extra text.",
            options
        );

        let mut user =
            String::from("Based on the following reference questions and their correct answers:\n");
        for item in context {
            user.push_str(&format!(
                "Question: {}\nAnswer: {}\n\n",
                item.question, item.answer
            ));
        }
        user.push_str(&format!(
            "Now, answer the following question by performing all necessary \
             calculations and provide only the correct answer option ({}) as your \
             final output:\nQuestion: {}\nAnswer option:",
            options, query
        ));

        Prompt { system, user }
    }

    /// Human-readable enumeration of the label set, e.g. "1, 2, 3, or 4".
    fn options_phrase(&self) -> String {
        match self.labels.len() {
            0 => String::new(),
            1 => self.labels[0].clone(),
            _ => {
                let head = &self.labels[..self.labels.len() - 1];
                format!(
                    "{}, or {}",
                    head.join(", "),
                    self.labels[self.labels.len() - 1]
                )
            }
        }
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}
