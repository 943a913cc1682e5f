//! Error types for MedBot.

use std::path::PathBuf;

use polars::prelude::PolarsError;
use thiserror::Error;

/// Everything that can go wrong while loading the dataset or answering a question.
///
/// None of these ever reach the presentation layer directly: the question
/// pipeline turns them into an `Error: ...` answer.
#[derive(Error, Debug)]
pub enum MedBotError {
    #[error("{0}")]
    Polars(#[from] PolarsError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid number {text:?} in question")]
    InvalidNumber { text: String },

    #[error("missing column {0:?}")]
    MissingColumn(String),

    #[error("invalid input format {path:?}")]
    InputFormat { path: PathBuf },

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Result type alias for MedBot operations.
pub type Result<T> = std::result::Result<T, MedBotError>;
