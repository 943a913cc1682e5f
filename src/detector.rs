//! Lexical metric detection.
//!
//! The trigger table is scanned in declaration order and the last metric with
//! a matching trigger wins, so later rows override earlier ones. Two forced
//! overrides run after the scan: cholesterol for anything containing "chol",
//! then max heart rate for "heart rate" / "thalach".

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::columns::Metric;
use crate::question::{word_pattern, Question};

/// Metric triggers, in precedence order (later wins).
pub const METRIC_TRIGGERS: &[(Metric, &[&str])] = &[
    (Metric::Age, &["age", "years", "old"]),
    (Metric::Cholesterol, &["cholesterol", "chol"]),
    (Metric::RestingBloodPressure, &["blood pressure", "bp", "trestbps"]),
    (
        Metric::MaxHeartRate,
        &["heart rate", "thalach", "max heart rate", "max hr"],
    ),
    (Metric::StDepression, &["st depression", "oldpeak"]),
    (
        Metric::HeartDiseaseRate,
        &["heart disease", "disease rate", "risk", "target"],
    ),
    (Metric::Sex, &["sex", "gender", "men", "women"]),
    (Metric::ChestPain, &["chest pain", "cp", "angina"]),
    (Metric::Thalassemia, &["thalassemia", "thal"]),
    (Metric::Vessels, &["vessels", "ca", "blocked vessels"]),
    (
        Metric::FastingBloodSugar,
        &["fasting blood sugar", "fbs", "diabetes"],
    ),
];

/// Forced overrides, checked in order after the scan; the first hit wins.
const FORCED_METRICS: &[(Metric, &[&str])] = &[
    (Metric::Cholesterol, &["chol"]),
    (Metric::MaxHeartRate, &["heart rate", "thalach"]),
];

lazy_static! {
    static ref TRIGGER_PATTERNS: Vec<(Metric, Vec<Regex>)> = METRIC_TRIGGERS
        .iter()
        .map(|(metric, triggers)| {
            let patterns = triggers
                .iter()
                .map(|trigger| word_pattern(trigger).expect("escaped trigger is a valid regex"))
                .collect();
            (*metric, patterns)
        })
        .collect();
}

/// Map a question to the metric it asks about, or `None` when it is out of domain.
pub fn detect_metric(question: &Question) -> Option<Metric> {
    let scanned = TRIGGER_PATTERNS
        .iter()
        .filter(|(_, patterns)| patterns.iter().any(|p| p.is_match(question.text())))
        .map(|(metric, _)| *metric)
        .last();

    let forced = FORCED_METRICS
        .iter()
        .find(|(_, phrases)| question.contains_any(phrases))
        .map(|(metric, _)| *metric);

    let metric = forced.or(scanned);
    debug!(
        "metric for {:?}: scanned {:?}, forced {:?}",
        question.text(),
        scanned,
        forced
    );
    metric
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(text: &str) -> Option<Metric> {
        detect_metric(&Question::new(text))
    }

    #[test]
    fn test_out_of_domain() {
        assert_eq!(detect("weather today"), None);
        assert_eq!(detect("tell me a joke"), None);
        assert_eq!(detect(""), None);
    }

    #[test]
    fn test_single_triggers() {
        assert_eq!(detect("average age"), Some(Metric::Age));
        assert_eq!(detect("what is the mean bp"), Some(Metric::RestingBloodPressure));
        assert_eq!(detect("oldpeak by age group"), Some(Metric::StDepression));
        assert_eq!(detect("how many blocked vessels"), Some(Metric::Vessels));
        assert_eq!(detect("fasting blood sugar rate"), Some(Metric::FastingBloodSugar));
    }

    #[test]
    fn test_last_declared_match_wins() {
        // heart disease is declared before sex
        assert_eq!(detect("heart disease rate by sex"), Some(Metric::Sex));
        // age is declared first, so anything else overrides it
        assert_eq!(detect("blood pressure by age"), Some(Metric::RestingBloodPressure));
        assert_eq!(detect("diabetes in men"), Some(Metric::FastingBloodSugar));
    }

    #[test]
    fn test_word_boundaries() {
        // "cardiac" must not trigger the vessels column
        assert_eq!(detect("cardiac output"), None);
        assert_eq!(detect("women"), Some(Metric::Sex));
    }

    #[test]
    fn test_chol_is_forced() {
        assert_eq!(
            detect("average cholesterol for patients with heart disease"),
            Some(Metric::Cholesterol)
        );
        assert_eq!(detect("cholesterol of women"), Some(Metric::Cholesterol));
        // substring match, not word bounded
        assert_eq!(detect("hypercholesterolemia"), Some(Metric::Cholesterol));
    }

    #[test]
    fn test_heart_rate_is_forced() {
        assert_eq!(detect("heart rate of men"), Some(Metric::MaxHeartRate));
        assert_eq!(
            detect("patients under 40 with very high heart rate"),
            Some(Metric::MaxHeartRate)
        );
        // chol beats heart rate
        assert_eq!(detect("chol and heart rate"), Some(Metric::Cholesterol));
    }
}
