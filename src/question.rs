//! Lowercased question text with the two kinds of matching the rule tables use.

use regex::Regex;

use crate::error::{MedBotError, Result};

/// A user question, lowercased once on construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    raw: String,
    text: String,
}

impl Question {
    pub fn new(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            text: raw.trim().to_lowercase(),
        }
    }

    /// The question as typed.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The lowercased question.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Plain substring match.
    pub fn contains(&self, phrase: &str) -> bool {
        self.text.contains(phrase)
    }

    pub fn contains_any(&self, phrases: &[&str]) -> bool {
        phrases.iter().any(|phrase| self.contains(phrase))
    }

    /// Numeric capture groups of the first match of `pattern`, if any. Digit
    /// runs too long for an integer still parse, as very large floats.
    pub fn numbers(&self, pattern: &Regex) -> Result<Option<Vec<f64>>> {
        let Some(captures) = pattern.captures(&self.text) else {
            return Ok(None);
        };
        captures
            .iter()
            .skip(1)
            .flatten()
            .map(|group| {
                group.as_str().parse::<f64>().map_err(|_| MedBotError::InvalidNumber {
                    text: group.as_str().to_string(),
                })
            })
            .collect::<Result<Vec<f64>>>()
            .map(Some)
    }
}

/// `\b<term>\b` with the term escaped.
pub fn word_pattern(term: &str) -> std::result::Result<Regex, regex::Error> {
    Regex::new(&format!(r"\b{}\b", regex::escape(term)))
}
