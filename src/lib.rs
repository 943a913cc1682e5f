//! MedBot: answers plain-language questions about the cardiac patient dataset.
//!
//! A question goes through four stages: the metric it asks about is detected
//! from trigger words, filter phrases narrow the rows, a grouping column is
//! picked, and the mean is computed and formatted with a chart. See
//! [`pipeline::QuestionPipeline`].

pub mod aggregate;
pub mod answer;
pub mod chart;
pub mod columns;
pub mod dataset;
pub mod detector;
pub mod error;
pub mod filters;
pub mod grouping;
pub mod pipeline;
pub mod question;
pub mod records;
pub mod render;
pub mod transcript;

pub use answer::{Answer, Outcome};
pub use columns::{GroupKey, Metric};
pub use dataset::{DatasetProvider, FileDataset, RowSet};
pub use error::{MedBotError, Result};
pub use pipeline::QuestionPipeline;
