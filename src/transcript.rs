//! Append-only conversation transcript.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::answer::Answer;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

#[derive(Debug, Clone)]
pub struct Entry {
    pub role: Role,
    pub message: String,
    /// Set on bot entries only.
    pub answer: Option<Answer>,
}

/// User and bot messages in the order they happened. Entries can only be
/// appended.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<Entry>,
}

#[derive(Serialize)]
struct TranscriptRow<'a> {
    role: Role,
    message: &'a str,
    chart: &'a str,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one exchange: the question, then the answer.
    pub fn record(&mut self, question: &str, answer: Answer) {
        self.entries.push(Entry {
            role: Role::User,
            message: question.to_string(),
            answer: None,
        });
        self.entries.push(Entry {
            role: Role::Bot,
            message: answer.text.clone(),
            answer: Some(answer),
        });
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write `role,message,chart` rows.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        for entry in &self.entries {
            let chart = entry
                .answer
                .as_ref()
                .and_then(|answer| answer.chart.as_ref())
                .map(|chart| chart.kind())
                .unwrap_or("");
            csv.serialize(TranscriptRow {
                role: entry.role,
                message: &entry.message,
                chart,
            })?;
        }
        csv.flush()?;
        Ok(())
    }

    pub fn save_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.write_csv(File::create(path)?)
    }
}
