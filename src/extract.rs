//! Constrained answer extraction from free-text completions.
//!
//! The model is instructed to emit exactly one label, but free-text
//! models add words, punctuation, or explanation anyway. The extractor
//! scans for the first standalone label occurrence; when none is found
//! it returns the trimmed raw text as an explicit [`Extraction::Fallback`]
//! so callers can tell a parsed answer from a degraded one.

/// Outcome of parsing a completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// A label from the closed set was found as a standalone token.
    Label(String),
    /// No label found; carries the trimmed raw completion. Callers must
    /// treat this as a low-confidence, ambiguous result.
    Fallback(String),
}

impl Extraction {
    pub fn is_label(&self) -> bool {
        matches!(self, Extraction::Label(_))
    }

    /// The answer text, whichever variant it came from.
    pub fn value(&self) -> &str {
        match self {
            Extraction::Label(label) => label,
            Extraction::Fallback(text) => text,
        }
    }
}

/// Parser for a documented closed label set.
pub struct AnswerExtractor {
    labels: Vec<String>,
}

impl AnswerExtractor {
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }

    /// Scan `raw` left to right for the first standalone label.
    ///
    /// Tokens are maximal alphanumeric runs, so a label is never matched
    /// as a substring of a larger token ("1" does not match inside "10").
    pub fn extract(&self, raw: &str) -> Extraction {
        for token in raw
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            if self.labels.iter().any(|label| label == token) {
                return Extraction::Label(token.to_string());
            }
        }

        Extraction::Fallback(raw.trim().to_string())
    }
}
