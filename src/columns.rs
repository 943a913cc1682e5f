//! Metrics, grouping keys and the display tables that go with them.
//!
//! All of this is fixed at compile time. The label maps only ever produce
//! display strings; the coded columns in a [`RowSet`](crate::dataset::RowSet)
//! are never rewritten with them.

use std::collections::HashMap;
use std::fmt;

use lazy_static::lazy_static;
use serde::Serialize;

use crate::dataset::AgeBucket;
use crate::records::{
    AGE, AGE_BIN, CHEST_PAIN, CHOLESTEROL, FASTING_BLOOD_SUGAR, MAX_HEART_RATE, RESTING_BP, SEX,
    ST_DEPRESSION, TARGET, THALASSEMIA, VESSELS,
};

lazy_static! {
    pub static ref SEX_LABELS: HashMap<i64, &'static str> =
        HashMap::from([(0, "Women"), (1, "Men")]);
    pub static ref THAL_LABELS: HashMap<i64, &'static str> = HashMap::from([
        (1, "Normal"),
        (2, "Fixed defect"),
        (3, "Reversible defect"),
    ]);
    pub static ref CHEST_PAIN_LABELS: HashMap<i64, &'static str> = HashMap::from([
        (1, "Typical angina"),
        (2, "Atypical angina"),
        (3, "Non-anginal"),
        (4, "Asymptomatic"),
    ]);
    pub static ref VESSEL_LABELS: HashMap<i64, &'static str> = HashMap::from([
        (0, "0 vessels"),
        (1, "1 vessel"),
        (2, "2 vessels"),
        (3, "3 vessels"),
    ]);
}

/// The column a question asks to aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Age,
    Cholesterol,
    RestingBloodPressure,
    MaxHeartRate,
    StDepression,
    HeartDiseaseRate,
    Sex,
    ChestPain,
    Thalassemia,
    Vessels,
    FastingBloodSugar,
}

impl Metric {
    pub fn column(self) -> &'static str {
        match self {
            Metric::Age => AGE,
            Metric::Cholesterol => CHOLESTEROL,
            Metric::RestingBloodPressure => RESTING_BP,
            Metric::MaxHeartRate => MAX_HEART_RATE,
            Metric::StDepression => ST_DEPRESSION,
            Metric::HeartDiseaseRate => TARGET,
            Metric::Sex => SEX,
            Metric::ChestPain => CHEST_PAIN,
            Metric::Thalassemia => THALASSEMIA,
            Metric::Vessels => VESSELS,
            Metric::FastingBloodSugar => FASTING_BLOOD_SUGAR,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Metric::Age => "age",
            Metric::Cholesterol => "cholesterol",
            Metric::RestingBloodPressure => "resting_blood_pressure",
            Metric::MaxHeartRate => "max_heart_rate",
            Metric::StDepression => "st_depression",
            Metric::HeartDiseaseRate => "heart_disease_rate",
            Metric::Sex => "sex",
            Metric::ChestPain => "chest_pain",
            Metric::Thalassemia => "thalassemia",
            Metric::Vessels => "vessels",
            Metric::FastingBloodSugar => "fasting_blood_sugar",
        }
    }

    pub fn display_name(self) -> String {
        human_case(self.name())
    }

    pub fn unit(self) -> Unit {
        match self {
            Metric::Age => Unit::Years,
            Metric::Cholesterol => Unit::MgPerDl,
            Metric::RestingBloodPressure => Unit::MmHg,
            Metric::MaxHeartRate => Unit::Bpm,
            Metric::HeartDiseaseRate | Metric::FastingBloodSugar => Unit::Percent,
            Metric::StDepression
            | Metric::Sex
            | Metric::ChestPain
            | Metric::Thalassemia
            | Metric::Vessels => Unit::Unitless,
        }
    }

    /// Measured quantities: averaged as "Average ...", drawn as bars or a histogram.
    pub fn is_continuous(self) -> bool {
        matches!(
            self,
            Metric::Age
                | Metric::Cholesterol
                | Metric::RestingBloodPressure
                | Metric::MaxHeartRate
                | Metric::StDepression
        )
    }

    /// 0/1 flags whose mean reads as a rate.
    pub fn is_percentage(self) -> bool {
        self.unit() == Unit::Percent
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Display unit of a metric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Years,
    MgPerDl,
    MmHg,
    Bpm,
    Percent,
    Unitless,
}

impl Unit {
    /// Render an already rounded value with this unit.
    pub fn render(self, value: &str) -> String {
        match self {
            Unit::Years => format!("{} years", value),
            Unit::MgPerDl => format!("{} mg/dL", value),
            Unit::MmHg => format!("{} mmHg", value),
            Unit::Bpm => format!("{} bpm", value),
            Unit::Percent => format!("{}%", value),
            Unit::Unitless => value.to_string(),
        }
    }
}

/// Categorical column an aggregation can be split by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKey {
    AgeBin,
    Sex,
    ChestPain,
    Thalassemia,
    Vessels,
}

impl GroupKey {
    pub fn column(self) -> &'static str {
        match self {
            GroupKey::AgeBin => AGE_BIN,
            GroupKey::Sex => SEX,
            GroupKey::ChestPain => CHEST_PAIN,
            GroupKey::Thalassemia => THALASSEMIA,
            GroupKey::Vessels => VESSELS,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            GroupKey::AgeBin => "age_bin",
            GroupKey::Sex => "sex",
            GroupKey::ChestPain => "chest_pain",
            GroupKey::Thalassemia => "thalassemia",
            GroupKey::Vessels => "vessels",
        }
    }

    pub fn display_name(self) -> String {
        human_case(self.name())
    }

    fn labels(self) -> Option<&'static HashMap<i64, &'static str>> {
        match self {
            GroupKey::AgeBin => None,
            GroupKey::Sex => Some(&*SEX_LABELS),
            GroupKey::ChestPain => Some(&*CHEST_PAIN_LABELS),
            GroupKey::Thalassemia => Some(&*THAL_LABELS),
            GroupKey::Vessels => Some(&*VESSEL_LABELS),
        }
    }

    /// Display label of one group value. Unknown codes show as the code.
    pub fn label(self, value: &GroupValue) -> String {
        match value {
            GroupValue::Bucket(bucket) => bucket.label().to_string(),
            GroupValue::Code(code) => self
                .labels()
                .and_then(|labels| labels.get(code))
                .map(|label| label.to_string())
                .unwrap_or_else(|| code.to_string()),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One distinct value of a grouping column. Orders age buckets by age and
/// codes numerically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupValue {
    Bucket(AgeBucket),
    Code(i64),
}

/// `max_heart_rate` -> `Max Heart Rate`.
pub fn human_case(name: &str) -> String {
    name.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
