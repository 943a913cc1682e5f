use polars::prelude::{DataType, Field, Schema};
use serde::{Deserialize, Serialize};

pub const AGE: &str = "age";
pub const SEX: &str = "sex";
pub const CHEST_PAIN: &str = "cp";
pub const RESTING_BP: &str = "trestbps";
pub const CHOLESTEROL: &str = "chol";
pub const FASTING_BLOOD_SUGAR: &str = "fbs";
pub const RESTING_ECG: &str = "restecg";
pub const MAX_HEART_RATE: &str = "thalach";
pub const EXERCISE_ANGINA: &str = "exang";
pub const ST_DEPRESSION: &str = "oldpeak";
pub const SLOPE: &str = "slope";
pub const VESSELS: &str = "ca";
pub const THALASSEMIA: &str = "thal";
pub const TARGET: &str = "target";
pub const AGE_BIN: &str = "age_bin";

/// Measured columns, stored as Float64.
pub const CONTINUOUS_COLUMNS: [&str; 5] = [AGE, RESTING_BP, CHOLESTEROL, MAX_HEART_RATE, ST_DEPRESSION];

/// Coded columns, stored as Int64.
pub const CODED_COLUMNS: [&str; 9] = [
    SEX,
    CHEST_PAIN,
    FASTING_BLOOD_SUGAR,
    RESTING_ECG,
    EXERCISE_ANGINA,
    SLOPE,
    VESSELS,
    THALASSEMIA,
    TARGET,
];

/// One patient row of the heart dataset, in file column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub age: Option<f64>,
    pub sex: Option<i64>,
    pub cp: Option<i64>,
    pub trestbps: Option<f64>,
    pub chol: Option<f64>,
    pub fbs: Option<i64>,
    pub restecg: Option<i64>,
    pub thalach: Option<f64>,
    pub exang: Option<i64>,
    pub oldpeak: Option<f64>,
    pub slope: Option<i64>,
    pub ca: Option<i64>,
    pub thal: Option<i64>,
    pub target: Option<i64>,
}

impl PatientRecord {
    /// Schema used when reading the raw CSV. Everything is read as a float so
    /// empty and `NaN` cells parse; coded columns are narrowed afterwards.
    pub fn raw_schema() -> Schema {
        Schema::from_iter(
            CONTINUOUS_COLUMNS
                .iter()
                .chain(CODED_COLUMNS.iter())
                .map(|name| Field::new(name, DataType::Float64)),
        )
    }
}
