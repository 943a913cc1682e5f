//! Chart specifications handed to the presentation layer.
//!
//! A chart is data only: the renderer decides how to draw it.

use serde::Serialize;

/// Number of bins in distribution charts.
pub const HISTOGRAM_BINS: usize = 20;

/// Fill color of distribution charts.
pub const HISTOGRAM_COLOR: &str = "#636EFA";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartSpec {
    /// One bar per group, each group in its own color.
    Bar(BarChart),
    /// One slice per group, sized by value.
    Pie(PieChart),
    /// Distribution of a single metric.
    Histogram(Histogram),
}

impl ChartSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            ChartSpec::Bar(_) => "bar",
            ChartSpec::Pie(_) => "pie",
            ChartSpec::Histogram(_) => "histogram",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub bars: Vec<ChartPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieChart {
    pub title: String,
    pub slices: Vec<ChartPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub title: String,
    pub x_label: String,
    pub color: String,
    pub bins: Vec<HistogramBin>,
}

/// `[start, end)`, except the last bin which also holds `end`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

impl Histogram {
    pub fn new(title: String, x_label: String, values: &[f64]) -> Self {
        Self {
            title,
            x_label,
            color: HISTOGRAM_COLOR.to_string(),
            bins: histogram_bins(values, HISTOGRAM_BINS),
        }
    }

    pub fn total(&self) -> usize {
        self.bins.iter().map(|bin| bin.count).sum()
    }
}

/// Equal-width bins spanning the observed range. A constant series gets a
/// unit-wide range centred on its value.
pub fn histogram_bins(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || bins == 0 {
        return Vec::new();
    }

    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (low, high) = if max > min {
        (min, max)
    } else {
        (min - 0.5, max + 0.5)
    };
    let width = (high - low) / bins as f64;

    let mut counts = vec![0usize; bins];
    for value in &finite {
        let index = (((value - low) / width).floor() as usize).min(bins - 1);
        counts[index] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            start: low + width * i as f64,
            end: if i + 1 == bins {
                high
            } else {
                low + width * (i + 1) as f64
            },
            count,
        })
        .collect()
}
