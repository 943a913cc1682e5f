//! The heart dataset as a row set, and the providers that load it.
//!
//! A [`RowSet`] is always normalized: measured columns are Float64 with `NaN`
//! turned into nulls, coded columns are Int64, and the derived `age_bin`
//! column is attached exactly once when the set is built. Filtering hands out
//! new row sets and never touches the source frame.

use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info};
use polars::prelude::*;
use polars_io::parquet::ParquetWriter;

use crate::error::{MedBotError, Result};
use crate::records::{
    PatientRecord, AGE, AGE_BIN, CHEST_PAIN, CHOLESTEROL, CODED_COLUMNS, CONTINUOUS_COLUMNS,
    EXERCISE_ANGINA, FASTING_BLOOD_SUGAR, MAX_HEART_RATE, RESTING_BP, RESTING_ECG, SEX, SLOPE,
    ST_DEPRESSION, TARGET, THALASSEMIA, VESSELS,
};

/// Columns the question pipeline reads. `restecg`, `exang` and `slope` are
/// carried when present but never required.
const REQUIRED_COLUMNS: [&str; 11] = [
    AGE,
    SEX,
    CHEST_PAIN,
    RESTING_BP,
    CHOLESTEROL,
    FASTING_BLOOD_SUGAR,
    MAX_HEART_RATE,
    ST_DEPRESSION,
    VESSELS,
    THALASSEMIA,
    TARGET,
];

/// Derived age partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AgeBucket {
    Under40,
    Forties,
    Fifties,
    SixtyPlus,
}

impl AgeBucket {
    pub const ALL: [AgeBucket; 4] = [
        AgeBucket::Under40,
        AgeBucket::Forties,
        AgeBucket::Fifties,
        AgeBucket::SixtyPlus,
    ];

    /// Right-closed bins: (.., 39], (39, 49], (49, 59], (59, ..).
    pub fn from_age(age: f64) -> Option<Self> {
        if age.is_nan() {
            None
        } else if age <= 39.0 {
            Some(AgeBucket::Under40)
        } else if age <= 49.0 {
            Some(AgeBucket::Forties)
        } else if age <= 59.0 {
            Some(AgeBucket::Fifties)
        } else {
            Some(AgeBucket::SixtyPlus)
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AgeBucket::Under40 => "<40",
            AgeBucket::Forties => "40-49",
            AgeBucket::Fifties => "50-59",
            AgeBucket::SixtyPlus => "60+",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|bucket| bucket.label() == label)
    }
}

impl fmt::Display for AgeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The full or filtered collection of patient records.
#[derive(Debug, Clone)]
pub struct RowSet {
    frame: DataFrame,
}

impl RowSet {
    /// Validate and normalize a raw frame, attaching `age_bin` if it is absent.
    pub fn new(frame: DataFrame) -> Result<Self> {
        let frame = normalize(frame)?;
        Ok(Self { frame })
    }

    /// Build a row set from typed records.
    pub fn from_records(records: &[PatientRecord]) -> Result<Self> {
        let frame = DataFrame::new(vec![
            Series::new(AGE, records.iter().map(|r| r.age).collect::<Vec<_>>()),
            Series::new(SEX, records.iter().map(|r| r.sex).collect::<Vec<_>>()),
            Series::new(CHEST_PAIN, records.iter().map(|r| r.cp).collect::<Vec<_>>()),
            Series::new(RESTING_BP, records.iter().map(|r| r.trestbps).collect::<Vec<_>>()),
            Series::new(CHOLESTEROL, records.iter().map(|r| r.chol).collect::<Vec<_>>()),
            Series::new(FASTING_BLOOD_SUGAR, records.iter().map(|r| r.fbs).collect::<Vec<_>>()),
            Series::new(RESTING_ECG, records.iter().map(|r| r.restecg).collect::<Vec<_>>()),
            Series::new(MAX_HEART_RATE, records.iter().map(|r| r.thalach).collect::<Vec<_>>()),
            Series::new(EXERCISE_ANGINA, records.iter().map(|r| r.exang).collect::<Vec<_>>()),
            Series::new(ST_DEPRESSION, records.iter().map(|r| r.oldpeak).collect::<Vec<_>>()),
            Series::new(SLOPE, records.iter().map(|r| r.slope).collect::<Vec<_>>()),
            Series::new(VESSELS, records.iter().map(|r| r.ca).collect::<Vec<_>>()),
            Series::new(THALASSEMIA, records.iter().map(|r| r.thal).collect::<Vec<_>>()),
            Series::new(TARGET, records.iter().map(|r| r.target).collect::<Vec<_>>()),
        ])?;
        Self::new(frame)
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// First `n` rows, for table previews.
    pub fn head(&self, n: usize) -> DataFrame {
        self.frame.head(Some(n))
    }

    /// Keep the rows matching `predicate`. The result shares the schema and
    /// never has more rows than `self`.
    pub fn filter(&self, predicate: Expr) -> Result<RowSet> {
        let frame = self.frame.clone().lazy().filter(predicate).collect()?;
        Ok(RowSet { frame })
    }

    /// Values of a numeric column as floats, nulls preserved.
    pub fn values(&self, column: &str) -> Result<Vec<Option<f64>>> {
        let series = self.frame.column(column)?.cast(&DataType::Float64)?;
        Ok(series.f64()?.into_iter().collect())
    }

    /// Mean of a numeric column, skipping missing values.
    pub fn mean(&self, column: &str) -> Result<Option<f64>> {
        Ok(self.frame.column(column)?.mean())
    }

    /// Linear-interpolated quantile of a numeric column, skipping missing values.
    pub fn quantile(&self, column: &str, quantile: f64) -> Result<Option<f64>> {
        let series = self.frame.column(column)?.cast(&DataType::Float64)?;
        Ok(series
            .f64()?
            .quantile(quantile, QuantileInterpolOptions::Linear)?)
    }

    /// Write the normalized rows, `age_bin` included, as Parquet.
    pub fn write_parquet<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut frame = self.frame.clone();
        ParquetWriter::new(file).finish(&mut frame)?;
        Ok(())
    }
}

/// Source of the full, age-bucketed row set.
pub trait DatasetProvider {
    fn load_full_row_set(&self) -> Result<RowSet>;
}

/// An already loaded row set serves itself; cloning a frame is cheap.
impl DatasetProvider for RowSet {
    fn load_full_row_set(&self) -> Result<RowSet> {
        Ok(self.clone())
    }
}

/// On-disk dataset formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    Csv,
    Parquet,
}

impl DatasetFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "csv" => Some(DatasetFormat::Csv),
            "parquet" | "pq" => Some(DatasetFormat::Parquet),
            _ => None,
        }
    }
}

/// Reads the dataset from a CSV or Parquet file on every load.
#[derive(Debug, Clone)]
pub struct FileDataset {
    path: PathBuf,
}

impl FileDataset {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DatasetProvider for FileDataset {
    fn load_full_row_set(&self) -> Result<RowSet> {
        let frame = match DatasetFormat::from_path(&self.path) {
            Some(DatasetFormat::Csv) => read_csv(&self.path)?,
            Some(DatasetFormat::Parquet) => read_parquet(&self.path)?,
            None => {
                return Err(MedBotError::InputFormat {
                    path: self.path.clone(),
                })
            }
        };
        let rows = RowSet::new(frame)?;
        info!("loaded {} patient rows from {:?}", rows.height(), self.path);
        Ok(rows)
    }
}

pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
    let file = File::open(path)?;

    Ok(CsvReader::new(file)
        .has_header(true)
        .with_dtypes(Option::from(Arc::new(PatientRecord::raw_schema())))
        .finish()?)
}

pub fn read_parquet<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
    let file = File::open(path)?;

    Ok(ParquetReader::new(file).finish()?)
}

fn normalize(frame: DataFrame) -> Result<DataFrame> {
    let present: Vec<String> = frame
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    let has = |name: &str| present.iter().any(|p| p == name);

    if let Some(missing) = REQUIRED_COLUMNS.into_iter().find(|name| !has(*name)) {
        return Err(MedBotError::MissingColumn(missing.to_string()));
    }

    let mut columns = Vec::new();
    for name in CONTINUOUS_COLUMNS.into_iter().filter(|name| has(*name)) {
        columns.push(
            col(name)
                .cast(DataType::Float64)
                .apply(nan_to_null, GetOutput::from_type(DataType::Float64))
                .alias(name),
        );
    }
    for name in CODED_COLUMNS.into_iter().filter(|name| has(*name)) {
        columns.push(
            col(name)
                .cast(DataType::Float64)
                .apply(nan_to_null, GetOutput::from_type(DataType::Float64))
                .cast(DataType::Int64)
                .alias(name),
        );
    }

    let bucketed = if has(AGE_BIN) {
        debug!("age_bin already attached, keeping it");
        col(AGE_BIN).cast(DataType::Utf8)
    } else {
        col(AGE)
            .apply(age_bins, GetOutput::from_type(DataType::Utf8))
            .alias(AGE_BIN)
    };

    Ok(frame
        .lazy()
        .with_columns(columns)
        .with_column(bucketed)
        .collect()?)
}

fn nan_to_null(column: Series) -> std::result::Result<Option<Series>, PolarsError> {
    let values: Float64Chunked = column
        .f64()?
        .into_iter()
        .map(|value| value.filter(|v| !v.is_nan()))
        .collect();
    let mut series = values.into_series();
    series.rename(column.name());
    Ok(Some(series))
}

fn age_bins(column: Series) -> std::result::Result<Option<Series>, PolarsError> {
    let labels: Utf8Chunked = column
        .f64()?
        .into_iter()
        .map(|age| age.and_then(AgeBucket::from_age).map(AgeBucket::label))
        .collect();
    let mut series = labels.into_series();
    series.rename(AGE_BIN);
    Ok(Some(series))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn patient(age: f64, chol: f64) -> PatientRecord {
        PatientRecord {
            age: Some(age),
            sex: Some(1),
            cp: Some(1),
            trestbps: Some(130.0),
            chol: Some(chol),
            fbs: Some(0),
            thalach: Some(150.0),
            oldpeak: Some(1.0),
            ca: Some(0),
            thal: Some(2),
            target: Some(1),
            ..Default::default()
        }
    }

    #[test]
    fn test_age_bucket_boundaries() {
        assert_eq!(AgeBucket::from_age(29.0), Some(AgeBucket::Under40));
        assert_eq!(AgeBucket::from_age(39.0), Some(AgeBucket::Under40));
        assert_eq!(AgeBucket::from_age(39.5), Some(AgeBucket::Forties));
        assert_eq!(AgeBucket::from_age(49.0), Some(AgeBucket::Forties));
        assert_eq!(AgeBucket::from_age(50.0), Some(AgeBucket::Fifties));
        assert_eq!(AgeBucket::from_age(59.0), Some(AgeBucket::Fifties));
        assert_eq!(AgeBucket::from_age(60.0), Some(AgeBucket::SixtyPlus));
        assert_eq!(AgeBucket::from_age(f64::NAN), None);
    }

    #[test]
    fn test_age_bucket_labels_round_trip() {
        for bucket in AgeBucket::ALL {
            assert_eq!(AgeBucket::from_label(bucket.label()), Some(bucket));
        }
        assert_eq!(AgeBucket::from_label("70+"), None);
    }

    #[test]
    fn test_from_records_attaches_age_bin() {
        let rows = RowSet::from_records(&[patient(35.0, 200.0), patient(63.0, 280.0)]).unwrap();
        let bins: Vec<Option<&str>> = rows
            .frame()
            .column(AGE_BIN)
            .unwrap()
            .utf8()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(bins, vec![Some("<40"), Some("60+")]);
        assert_eq!(rows.frame().column(SEX).unwrap().dtype(), &DataType::Int64);
        assert_eq!(rows.frame().column(CHOLESTEROL).unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn test_mean_skips_missing_values() {
        let mut missing = patient(50.0, 0.0);
        missing.chol = None;
        let rows = RowSet::from_records(&[patient(40.0, 200.0), missing, patient(60.0, 300.0)]).unwrap();
        assert_eq!(rows.mean(CHOLESTEROL).unwrap(), Some(250.0));
    }

    #[test]
    fn test_nan_becomes_null() {
        let rows = RowSet::from_records(&[patient(40.0, f64::NAN), patient(60.0, 300.0)]).unwrap();
        assert_eq!(rows.values(CHOLESTEROL).unwrap(), vec![None, Some(300.0)]);
        assert_eq!(rows.mean(CHOLESTEROL).unwrap(), Some(300.0));
    }

    #[test]
    fn test_parquet_export_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("heart.parquet");
        let rows = RowSet::from_records(&[patient(35.0, 200.0), patient(63.0, 280.0)]).unwrap();
        rows.write_parquet(&path).unwrap();

        let reloaded = FileDataset::new(&path).load_full_row_set().unwrap();
        assert!(reloaded.frame().frame_equal_missing(rows.frame()));
    }

    #[test]
    fn test_quantile_interpolates() {
        let records: Vec<PatientRecord> = (1..=11)
            .map(|i| {
                let mut p = patient(50.0, 200.0);
                p.thalach = Some(f64::from(i) * 10.0);
                p
            })
            .collect();
        let rows = RowSet::from_records(&records).unwrap();
        assert_eq!(rows.quantile(MAX_HEART_RATE, 0.9).unwrap(), Some(100.0));
    }

    #[test]
    fn test_missing_required_column() {
        let frame = df!(AGE => &[50.0, 60.0]).unwrap();
        let err = RowSet::new(frame).unwrap_err();
        assert!(matches!(err, MedBotError::MissingColumn(_)));
    }

    #[test]
    fn test_filter_does_not_touch_source() {
        let rows = RowSet::from_records(&[patient(35.0, 200.0), patient(63.0, 280.0)]).unwrap();
        let filtered = rows.filter(col(AGE).gt(lit(50.0))).unwrap();
        assert_eq!(filtered.height(), 1);
        assert_eq!(rows.height(), 2);
    }

    #[test]
    fn test_dataset_format_from_path() {
        assert_eq!(
            DatasetFormat::from_path(Path::new("data/heart.csv")),
            Some(DatasetFormat::Csv)
        );
        assert_eq!(
            DatasetFormat::from_path(Path::new("heart.PARQUET")),
            Some(DatasetFormat::Parquet)
        );
        assert_eq!(DatasetFormat::from_path(Path::new("heart.xlsx")), None);
        assert_eq!(DatasetFormat::from_path(Path::new("heart")), None);
    }

    #[test]
    fn test_file_dataset_reads_csv() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(
            file,
            "age,sex,cp,trestbps,chol,fbs,restecg,thalach,exang,oldpeak,slope,ca,thal,target"
        )
        .unwrap();
        writeln!(file, "63,1,3,145,233,1,0,150,0,2.3,0,0,1,1").unwrap();
        writeln!(file, "37,1,2,130,250,0,1,187,0,3.5,0,0,2,1").unwrap();
        writeln!(file, "41,0,1,130,,0,0,172,0,1.4,2,0,2,0").unwrap();

        let rows = FileDataset::new(file.path()).load_full_row_set().unwrap();
        assert_eq!(rows.height(), 3);
        assert_eq!(rows.mean(CHOLESTEROL).unwrap(), Some(241.5));
        assert_eq!(rows.frame().column(TARGET).unwrap().dtype(), &DataType::Int64);
    }

    #[test]
    fn test_file_dataset_rejects_unknown_format() {
        let err = FileDataset::new("heart.json").load_full_row_set().unwrap_err();
        assert!(matches!(err, MedBotError::InputFormat { .. }));
    }
}
