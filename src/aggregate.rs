//! Aggregation and answer formatting.
//!
//! Grouped answers get one line per group in key order, a bar chart for
//! measured metrics and a pie chart for everything else. Ungrouped answers
//! are a single sentence, with a histogram for measured metrics.

use log::debug;
use polars::prelude::*;

use crate::answer::{Answer, Outcome};
use crate::chart::{BarChart, ChartPoint, ChartSpec, Histogram, PieChart};
use crate::columns::{GroupKey, GroupValue, Metric};
use crate::dataset::{AgeBucket, RowSet};
use crate::error::Result;

const MEAN: &str = "mean";
const ROWS: &str = "rows";

/// Aggregate of one group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    pub value: GroupValue,
    pub label: String,
    /// `None` when every metric value in the group is missing.
    pub mean: Option<f64>,
    pub rows: usize,
}

/// Per-group mean of `metric`, sorted by group value. Rows with no key are
/// left out, every other row lands in exactly one group.
pub fn group_means(rows: &RowSet, metric: Metric, key: GroupKey) -> Result<Vec<GroupSummary>> {
    let grouped = rows
        .frame()
        .clone()
        .lazy()
        .filter(col(key.column()).is_not_null())
        .groupby([col(key.column())])
        .agg([
            col(metric.column())
                .cast(DataType::Float64)
                .mean()
                .alias(MEAN),
            col(key.column()).count().alias(ROWS),
        ])
        .collect()?;

    let values: Vec<Option<GroupValue>> = match key {
        GroupKey::AgeBin => grouped
            .column(key.column())?
            .utf8()?
            .into_iter()
            .map(|label| label.and_then(AgeBucket::from_label).map(GroupValue::Bucket))
            .collect(),
        _ => grouped
            .column(key.column())?
            .i64()?
            .into_iter()
            .map(|code| code.map(GroupValue::Code))
            .collect(),
    };
    let means: Vec<Option<f64>> = grouped
        .column(MEAN)?
        .cast(&DataType::Float64)?
        .f64()?
        .into_iter()
        .collect();
    let counts: Vec<Option<u64>> = grouped
        .column(ROWS)?
        .cast(&DataType::UInt64)?
        .u64()?
        .into_iter()
        .collect();

    let mut summaries: Vec<GroupSummary> = values
        .into_iter()
        .zip(means)
        .zip(counts)
        .filter_map(|((value, mean), count)| {
            let value = value?;
            Some(GroupSummary {
                label: key.label(&value),
                value,
                mean,
                rows: count.unwrap_or(0) as usize,
            })
        })
        .collect();
    summaries.sort_by_key(|summary| summary.value);
    Ok(summaries)
}

/// Build the answer for `metric` over `rows`, split by `group` when given.
pub fn generate_answer(metric: Metric, rows: &RowSet, group: Option<GroupKey>) -> Result<Outcome> {
    if rows.is_empty() {
        return Ok(Outcome::EmptyResult);
    }
    match group {
        Some(key) => grouped_answer(metric, rows, key),
        None => overall_answer(metric, rows),
    }
}

fn grouped_answer(metric: Metric, rows: &RowSet, key: GroupKey) -> Result<Outcome> {
    let summaries = group_means(rows, metric, key)?;
    if summaries.is_empty() {
        return Ok(Outcome::EmptyResult);
    }
    debug!("{} groups of {} by {}", summaries.len(), metric, key);

    let mut lines = Vec::with_capacity(summaries.len());
    let mut points = Vec::with_capacity(summaries.len());
    for summary in &summaries {
        match summary.mean.map(|mean| display_value(metric, mean)) {
            Some(value) => {
                lines.push(format!(
                    "{}: {}",
                    summary.label,
                    metric.unit().render(&format_value(value))
                ));
                points.push(ChartPoint {
                    label: summary.label.clone(),
                    value,
                });
            }
            None => lines.push(format!("{}: n/a", summary.label)),
        }
    }

    let title = format!("{} by {}", metric.display_name(), key.display_name());
    let chart = if metric.is_continuous() {
        ChartSpec::Bar(BarChart {
            title,
            x_label: key.display_name(),
            y_label: metric.display_name(),
            bars: points,
        })
    } else {
        ChartSpec::Pie(PieChart {
            title,
            slices: points,
        })
    };

    Ok(Outcome::Answered(
        Answer::text(lines.join("\n")).with_chart(Some(chart)),
    ))
}

fn overall_answer(metric: Metric, rows: &RowSet) -> Result<Outcome> {
    let Some(mean) = rows.mean(metric.column())? else {
        return Ok(Outcome::EmptyResult);
    };
    let name = metric.display_name();
    let value = metric.unit().render(&format_value(display_value(metric, mean)));

    if !metric.is_continuous() {
        return Ok(Outcome::Answered(Answer::text(format!(
            "Overall {}: {}",
            name, value
        ))));
    }

    let values: Vec<f64> = rows
        .values(metric.column())?
        .into_iter()
        .flatten()
        .collect();
    let histogram = Histogram::new(format!("Distribution of {}", name), name.clone(), &values);
    Ok(Outcome::Answered(
        Answer::text(format!("Average {}: {}", name, value))
            .with_chart(Some(ChartSpec::Histogram(histogram))),
    ))
}

/// The number shown for a mean: rates become percentages within [0, 100],
/// everything is rounded to two decimals.
pub fn display_value(metric: Metric, mean: f64) -> f64 {
    if metric.is_percentage() {
        round2(mean * 100.0).clamp(0.0, 100.0)
    } else {
        round2(mean)
    }
}

/// Two decimals at most, one at least: `131.0`, `246.26`.
pub fn format_value(value: f64) -> String {
    let rounded = round2(value);
    if rounded.fract() == 0.0 {
        format!("{:.1}", rounded)
    } else {
        format!("{}", rounded)
    }
}

/// Halves go to the even neighbour: 54.125 -> 54.12, 0.375 -> 0.38.
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::PatientRecord;

    fn patient(age: f64, sex: i64, chol: f64, target: i64) -> PatientRecord {
        PatientRecord {
            age: Some(age),
            sex: Some(sex),
            cp: Some(1 + (age as i64 % 4)),
            trestbps: Some(120.0),
            chol: Some(chol),
            fbs: Some(0),
            thalach: Some(150.0),
            oldpeak: Some(1.2),
            ca: Some(0),
            thal: Some(2),
            target: Some(target),
            ..Default::default()
        }
    }

    fn sample() -> RowSet {
        RowSet::from_records(&[
            patient(63.0, 1, 233.0, 1),
            patient(37.0, 1, 250.0, 1),
            patient(41.0, 0, 204.0, 1),
            patient(56.0, 1, 236.0, 0),
            patient(57.0, 0, 354.0, 0),
            patient(44.0, 1, 263.0, 1),
            patient(52.0, 1, 199.0, 0),
            patient(35.0, 0, 183.0, 1),
        ])
        .unwrap()
    }

    fn answered(outcome: Outcome) -> Answer {
        match outcome {
            Outcome::Answered(answer) => answer,
            other => panic!("expected an answer, got {}", other.kind()),
        }
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(131.0), "131.0");
        assert_eq!(format_value(246.264), "246.26");
        assert_eq!(format_value(54.4554), "54.46");
        assert_eq!(format_value(0.5), "0.5");
    }

    #[test]
    fn test_halves_round_to_even() {
        assert_eq!(format_value(54.125), "54.12");
        assert_eq!(format_value(0.375), "0.38");
        assert_eq!(display_value(Metric::Age, 54.125), 54.12);
        assert_eq!(display_value(Metric::Cholesterol, 240.625), 240.62);
    }

    #[test]
    fn test_display_value_percent_range() {
        assert_eq!(display_value(Metric::HeartDiseaseRate, 0.5446), 54.46);
        assert_eq!(display_value(Metric::HeartDiseaseRate, 1.0), 100.0);
        assert_eq!(display_value(Metric::FastingBloodSugar, 0.0), 0.0);
        assert_eq!(display_value(Metric::Cholesterol, 246.264), 246.26);
    }

    #[test]
    fn test_empty_rows_short_circuit() {
        let rows = sample();
        let empty = rows.filter(col("age").gt(lit(200.0))).unwrap();
        let outcome = generate_answer(Metric::Cholesterol, &empty, None).unwrap();
        assert!(matches!(outcome, Outcome::EmptyResult));
        let outcome = generate_answer(Metric::Cholesterol, &empty, Some(GroupKey::Sex)).unwrap();
        assert!(matches!(outcome, Outcome::EmptyResult));
    }

    #[test]
    fn test_group_means_partition_rows() {
        let rows = sample();
        for key in [GroupKey::AgeBin, GroupKey::Sex, GroupKey::ChestPain] {
            let summaries = group_means(&rows, Metric::Cholesterol, key).unwrap();
            let total: usize = summaries.iter().map(|s| s.rows).sum();
            assert_eq!(total, rows.height());
        }
    }

    #[test]
    fn test_age_groups_in_bucket_order() {
        let summaries = group_means(&sample(), Metric::Cholesterol, GroupKey::AgeBin).unwrap();
        let labels: Vec<&str> = summaries.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["<40", "40-49", "50-59", "60+"]);
        assert_eq!(summaries[0].mean, Some(216.5));
        assert_eq!(summaries[0].rows, 2);
    }

    #[test]
    fn test_grouped_disease_rate_by_sex() {
        let answer = answered(
            generate_answer(Metric::HeartDiseaseRate, &sample(), Some(GroupKey::Sex)).unwrap(),
        );
        assert_eq!(answer.text, "Women: 66.67%\nMen: 60.0%");
        match answer.chart {
            Some(ChartSpec::Pie(pie)) => {
                assert_eq!(pie.title, "Heart Disease Rate by Sex");
                assert_eq!(pie.slices.len(), 2);
                assert_eq!(pie.slices[1].label, "Men");
                assert_eq!(pie.slices[1].value, 60.0);
            }
            other => panic!("expected a pie chart, got {:?}", other),
        }
    }

    #[test]
    fn test_grouped_continuous_metric_is_a_bar_chart() {
        let answer = answered(
            generate_answer(Metric::Cholesterol, &sample(), Some(GroupKey::Sex)).unwrap(),
        );
        assert_eq!(answer.text, "Women: 247.0 mg/dL\nMen: 236.2 mg/dL");
        match answer.chart {
            Some(ChartSpec::Bar(bar)) => {
                assert_eq!(bar.title, "Cholesterol by Sex");
                assert_eq!(bar.x_label, "Sex");
                assert_eq!(bar.y_label, "Cholesterol");
                assert_eq!(bar.bars.len(), 2);
            }
            other => panic!("expected a bar chart, got {:?}", other),
        }
    }

    #[test]
    fn test_group_labels_do_not_change_source_codes() {
        let rows = sample();
        generate_answer(Metric::HeartDiseaseRate, &rows, Some(GroupKey::Sex)).unwrap();
        assert_eq!(rows.frame().column("sex").unwrap().dtype(), &DataType::Int64);
        assert_eq!(rows.values("sex").unwrap()[0], Some(1.0));
    }

    #[test]
    fn test_overall_continuous_metric() {
        let answer = answered(generate_answer(Metric::Cholesterol, &sample(), None).unwrap());
        assert_eq!(answer.text, "Average Cholesterol: 240.25 mg/dL");
        match answer.chart {
            Some(ChartSpec::Histogram(histogram)) => {
                assert_eq!(histogram.title, "Distribution of Cholesterol");
                assert_eq!(histogram.bins.len(), 20);
                assert_eq!(histogram.total(), 8);
            }
            other => panic!("expected a histogram, got {:?}", other),
        }
    }

    #[test]
    fn test_overall_st_depression_has_no_unit() {
        let answer = answered(generate_answer(Metric::StDepression, &sample(), None).unwrap());
        assert_eq!(answer.text, "Average St Depression: 1.2");
    }

    #[test]
    fn test_overall_rate_has_no_chart() {
        let answer = answered(generate_answer(Metric::HeartDiseaseRate, &sample(), None).unwrap());
        assert_eq!(answer.text, "Overall Heart Disease Rate: 62.5%");
        assert!(answer.chart.is_none());
    }

    #[test]
    fn test_all_missing_metric_is_no_data() {
        let mut a = patient(50.0, 1, 0.0, 1);
        a.chol = None;
        let rows = RowSet::from_records(&[a]).unwrap();
        let outcome = generate_answer(Metric::Cholesterol, &rows, None).unwrap();
        assert!(matches!(outcome, Outcome::EmptyResult));
    }

    #[test]
    fn test_group_with_only_missing_values() {
        let mut a = patient(50.0, 0, 0.0, 1);
        a.chol = None;
        let rows = RowSet::from_records(&[a, patient(52.0, 1, 210.0, 0)]).unwrap();
        let answer = answered(
            generate_answer(Metric::Cholesterol, &rows, Some(GroupKey::Sex)).unwrap(),
        );
        assert_eq!(answer.text, "Women: n/a\nMen: 210.0 mg/dL");
    }
}
