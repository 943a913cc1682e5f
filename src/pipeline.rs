//! The question pipeline: detect, filter, group, aggregate.
//!
//! Every question ends in an [`Answer`]. Out-of-domain questions, empty
//! filter results and faults (including panics inside the stages) are turned
//! into fixed or `Error: ...` answers here and never reach the caller as
//! errors.

use std::panic::{self, AssertUnwindSafe};

use log::{debug, warn};

use crate::aggregate::generate_answer;
use crate::answer::{Answer, Outcome, PREVIEW_ROWS};
use crate::dataset::DatasetProvider;
use crate::detector::detect_metric;
use crate::error::Result;
use crate::filters::derive_predicates;
use crate::grouping::plan_for;
use crate::question::Question;

pub struct QuestionPipeline<P> {
    provider: P,
}

impl<P: DatasetProvider> QuestionPipeline<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Answer one question.
    pub fn answer(&self, question: &str) -> Answer {
        self.run(question).into()
    }

    /// Run the stages and report how the question ended.
    pub fn run(&self, question: &str) -> Outcome {
        let question = Question::new(question);
        let attempt = panic::catch_unwind(AssertUnwindSafe(|| self.try_run(&question)));
        let outcome = match attempt {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(err)) => {
                warn!("question {:?} failed: {}", question.raw(), err);
                Outcome::Fault {
                    message: err.to_string(),
                }
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!("question {:?} panicked: {}", question.raw(), message);
                Outcome::Fault { message }
            }
        };
        debug!("question {:?} -> {}", question.raw(), outcome.kind());
        outcome
    }

    fn try_run(&self, question: &Question) -> Result<Outcome> {
        let full = self.provider.load_full_row_set()?;

        let Some(metric) = detect_metric(question) else {
            return Ok(Outcome::OutOfDomain);
        };

        let predicates = derive_predicates(question, &full)?;
        let filtered = predicates.apply(&full)?;
        debug!(
            "{} predicates kept {} of {} rows",
            predicates.predicates().len(),
            filtered.height(),
            full.height()
        );

        let plan = plan_for(question, metric);
        debug!("plan {:?}", plan);

        Ok(match generate_answer(plan.metric, &filtered, plan.group)? {
            Outcome::Answered(answer) => {
                Outcome::Answered(answer.with_preview(filtered.head(PREVIEW_ROWS)))
            }
            other => other,
        })
    }
}

/// Send panic reports to the logger instead of stderr. A panic inside the
/// stages already becomes a `Fault` answer and a `warn!` line; the default
/// hook would also print a backtrace hint in the middle of the session.
pub fn log_panics() {
    panic::set_hook(Box::new(|info| debug!("{}", info)));
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "internal error".to_string()
    }
}
