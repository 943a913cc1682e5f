//! Stage outcomes and the answer shape handed to the presentation layer.

use polars::prelude::DataFrame;

use crate::chart::ChartSpec;

pub const OUT_OF_DOMAIN_MESSAGE: &str =
    "Sorry, I can only answer questions related to heart health and medical data.";
pub const NO_DATA_MESSAGE: &str = "No data found for your query.";

/// Rows shown when an answer carries a table preview.
pub const PREVIEW_ROWS: usize = 5;

/// What one question produced. Built fresh per question and never changed
/// after it is returned.
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub chart: Option<ChartSpec>,
    pub preview: Option<DataFrame>,
}

impl Answer {
    /// Text only, no chart or table.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            chart: None,
            preview: None,
        }
    }

    pub fn with_chart(mut self, chart: Option<ChartSpec>) -> Self {
        self.chart = chart;
        self
    }

    pub fn with_preview(mut self, preview: DataFrame) -> Self {
        self.preview = Some(preview);
        self
    }
}

/// Tagged result of the pipeline stages, collapsed into an [`Answer`] only at
/// the pipeline boundary.
#[derive(Debug, Clone)]
pub enum Outcome {
    Answered(Answer),
    OutOfDomain,
    EmptyResult,
    Fault { message: String },
}

impl Outcome {
    pub fn kind(&self) -> &'static str {
        match self {
            Outcome::Answered(_) => "answered",
            Outcome::OutOfDomain => "out_of_domain",
            Outcome::EmptyResult => "empty_result",
            Outcome::Fault { .. } => "fault",
        }
    }
}

impl From<Outcome> for Answer {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Answered(answer) => answer,
            Outcome::OutOfDomain => Answer::text(OUT_OF_DOMAIN_MESSAGE),
            Outcome::EmptyResult => Answer::text(NO_DATA_MESSAGE),
            Outcome::Fault { message } => Answer::text(format!("Error: {}", message)),
        }
    }
}
