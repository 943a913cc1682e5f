//! Row filter engine.
//!
//! Each rule in [`FILTER_RULES`] looks at the question on its own and may
//! contribute one predicate. The predicates are ANDed. Thresholds that depend
//! on the data (the heart-rate percentile) are resolved against the full row
//! set when the predicates are derived, so a [`PredicateSet`] is a plain value
//! that can be applied to any row set, any number of times.

use std::fmt;

use lazy_static::lazy_static;
use log::debug;
use polars::prelude::*;
use regex::Regex;

use crate::dataset::RowSet;
use crate::error::Result;
use crate::question::Question;
use crate::records::{AGE, CHOLESTEROL, FASTING_BLOOD_SUGAR, MAX_HEART_RATE, TARGET};

/// Quantile of max heart rate that counts as "very high".
pub const HIGH_HEART_RATE_QUANTILE: f64 = 0.9;

lazy_static! {
    static ref CHOL_ABOVE: Regex = Regex::new(r"cholesterol\s*>\s*(\d+)").expect("valid regex");
    static ref CHOL_BELOW: Regex = Regex::new(r"cholesterol\s*<\s*(\d+)").expect("valid regex");
    static ref AGE_RANGE: Regex = Regex::new(r"(\d+)[-–](\d+)").expect("valid regex");
    static ref AGE_UNDER: Regex = Regex::new(r"under\s*(\d+)").expect("valid regex");
    static ref AGE_OVER: Regex = Regex::new(r"over\s*(\d+)").expect("valid regex");
}

/// A single row condition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Predicate {
    HeartDisease(bool),
    Diabetes(bool),
    CholesterolAbove(f64),
    CholesterolBelow(f64),
    /// Inclusive on both ends.
    AgeBetween(f64, f64),
    AgeUnder(f64),
    AgeOver(f64),
    MaxHeartRateAtLeast(f64),
}

impl Predicate {
    pub fn to_expr(&self) -> Expr {
        match *self {
            Predicate::HeartDisease(present) => col(TARGET).eq(lit(i64::from(present))),
            Predicate::Diabetes(present) => col(FASTING_BLOOD_SUGAR).eq(lit(i64::from(present))),
            Predicate::CholesterolAbove(n) => col(CHOLESTEROL).gt(lit(n)),
            Predicate::CholesterolBelow(n) => col(CHOLESTEROL).lt(lit(n)),
            Predicate::AgeBetween(low, high) => col(AGE)
                .gt_eq(lit(low))
                .and(col(AGE).lt_eq(lit(high))),
            Predicate::AgeUnder(n) => col(AGE).lt(lit(n)),
            Predicate::AgeOver(n) => col(AGE).gt(lit(n)),
            Predicate::MaxHeartRateAtLeast(threshold) => col(MAX_HEART_RATE).gt_eq(lit(threshold)),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::HeartDisease(present) => write!(f, "{} == {}", TARGET, i64::from(*present)),
            Predicate::Diabetes(present) => {
                write!(f, "{} == {}", FASTING_BLOOD_SUGAR, i64::from(*present))
            }
            Predicate::CholesterolAbove(n) => write!(f, "{} > {}", CHOLESTEROL, n),
            Predicate::CholesterolBelow(n) => write!(f, "{} < {}", CHOLESTEROL, n),
            Predicate::AgeBetween(low, high) => write!(f, "{} <= {} <= {}", low, AGE, high),
            Predicate::AgeUnder(n) => write!(f, "{} < {}", AGE, n),
            Predicate::AgeOver(n) => write!(f, "{} > {}", AGE, n),
            Predicate::MaxHeartRateAtLeast(t) => write!(f, "{} >= {}", MAX_HEART_RATE, t),
        }
    }
}

/// ANDed predicates derived from one question.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredicateSet {
    predicates: Vec<Predicate>,
}

impl PredicateSet {
    pub fn new(predicates: Vec<Predicate>) -> Self {
        Self { predicates }
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Keep the rows of `rows` satisfying every predicate. Rows whose compared
    /// value is missing are dropped.
    pub fn apply(&self, rows: &RowSet) -> Result<RowSet> {
        let combined = self
            .predicates
            .iter()
            .map(Predicate::to_expr)
            .reduce(|acc, expr| acc.and(expr));
        match combined {
            Some(expr) => rows.filter(expr),
            None => Ok(rows.clone()),
        }
    }
}

/// One entry of the filter rule table.
pub struct FilterRule {
    pub name: &'static str,
    pub derive: fn(&Question, &RowSet) -> Result<Option<Predicate>>,
}

/// Filter rules, all evaluated independently.
pub const FILTER_RULES: &[FilterRule] = &[
    FilterRule {
        name: "heart_disease",
        derive: heart_disease_rule,
    },
    FilterRule {
        name: "diabetes",
        derive: diabetes_rule,
    },
    FilterRule {
        name: "cholesterol_above",
        derive: cholesterol_above_rule,
    },
    FilterRule {
        name: "cholesterol_below",
        derive: cholesterol_below_rule,
    },
    FilterRule {
        name: "age",
        derive: age_rule,
    },
    FilterRule {
        name: "high_heart_rate",
        derive: high_heart_rate_rule,
    },
];

/// Derive the predicates a question asks for. `full` is the unfiltered row
/// set; data-dependent thresholds are computed on it.
pub fn derive_predicates(question: &Question, full: &RowSet) -> Result<PredicateSet> {
    let mut predicates = Vec::new();
    for rule in FILTER_RULES {
        if let Some(predicate) = (rule.derive)(question, full)? {
            debug!("filter rule {} -> {}", rule.name, predicate);
            predicates.push(predicate);
        }
    }
    Ok(PredicateSet::new(predicates))
}

/// Derive and apply in one step.
pub fn apply_filters(full: &RowSet, question: &Question) -> Result<RowSet> {
    derive_predicates(question, full)?.apply(full)
}

fn heart_disease_rule(question: &Question, _full: &RowSet) -> Result<Option<Predicate>> {
    if question.contains_any(&["with heart disease", "have heart disease"]) {
        Ok(Some(Predicate::HeartDisease(true)))
    } else if question.contains_any(&["without heart disease", "no heart disease"]) {
        Ok(Some(Predicate::HeartDisease(false)))
    } else {
        Ok(None)
    }
}

fn diabetes_rule(question: &Question, _full: &RowSet) -> Result<Option<Predicate>> {
    if question.contains_any(&["with diabetes", "have diabetes"]) {
        Ok(Some(Predicate::Diabetes(true)))
    } else if question.contains_any(&["without diabetes", "no diabetes"]) {
        Ok(Some(Predicate::Diabetes(false)))
    } else {
        Ok(None)
    }
}

fn cholesterol_above_rule(question: &Question, _full: &RowSet) -> Result<Option<Predicate>> {
    Ok(first_number(question, &CHOL_ABOVE)?.map(Predicate::CholesterolAbove))
}

fn cholesterol_below_rule(question: &Question, _full: &RowSet) -> Result<Option<Predicate>> {
    Ok(first_number(question, &CHOL_BELOW)?.map(Predicate::CholesterolBelow))
}

/// A range beats "under", which beats "over".
fn age_rule(question: &Question, _full: &RowSet) -> Result<Option<Predicate>> {
    if let Some(bounds) = question.numbers(&AGE_RANGE)? {
        if let [low, high] = bounds[..] {
            return Ok(Some(Predicate::AgeBetween(low, high)));
        }
    }
    if let Some(n) = first_number(question, &AGE_UNDER)? {
        return Ok(Some(Predicate::AgeUnder(n)));
    }
    Ok(first_number(question, &AGE_OVER)?.map(Predicate::AgeOver))
}

fn high_heart_rate_rule(question: &Question, full: &RowSet) -> Result<Option<Predicate>> {
    if !question.contains_any(&["very high heart rate", "highest heart rate"]) {
        return Ok(None);
    }
    // No heart rates at all means nothing can qualify.
    let threshold = full
        .quantile(MAX_HEART_RATE, HIGH_HEART_RATE_QUANTILE)?
        .unwrap_or(f64::INFINITY);
    Ok(Some(Predicate::MaxHeartRateAtLeast(threshold)))
}

fn first_number(question: &Question, pattern: &Regex) -> Result<Option<f64>> {
    Ok(question
        .numbers(pattern)?
        .and_then(|values| values.first().copied()))
}
