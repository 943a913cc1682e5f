//! Terminal presentation of answers.

use serde::Serialize;

use crate::answer::{Answer, PREVIEW_ROWS};
use crate::chart::{ChartPoint, ChartSpec, Histogram};

const BAR_WIDTH: usize = 40;

/// Prose, then the chart if there is one, else the table preview.
pub fn render_answer(answer: &Answer) -> String {
    let mut out = answer.text.clone();
    if let Some(chart) = &answer.chart {
        out.push_str("\n\n");
        out.push_str(&render_chart(chart));
    } else if let Some(preview) = answer.preview.as_ref().filter(|df| df.height() > 0) {
        out.push_str("\n\n");
        out.push_str(&preview.head(Some(PREVIEW_ROWS)).to_string());
    }
    out
}

pub fn render_chart(chart: &ChartSpec) -> String {
    match chart {
        ChartSpec::Bar(bar) => {
            let mut out = format!("{} ({} vs {})\n", bar.title, bar.y_label, bar.x_label);
            out.push_str(&render_bars(&bar.bars));
            out
        }
        ChartSpec::Pie(pie) => {
            let total: f64 = pie.slices.iter().map(|slice| slice.value).sum();
            let mut out = format!("{}\n", pie.title);
            let width = label_width(pie.slices.iter().map(|s| s.label.as_str()));
            for slice in &pie.slices {
                let share = if total > 0.0 {
                    slice.value / total * 100.0
                } else {
                    0.0
                };
                out.push_str(&format!(
                    "  {:<width$}  {:>5.1}% of chart\n",
                    slice.label,
                    share,
                    width = width
                ));
            }
            out
        }
        ChartSpec::Histogram(histogram) => render_histogram(histogram),
    }
}

fn render_bars(points: &[ChartPoint]) -> String {
    let max = points.iter().map(|p| p.value).fold(0.0_f64, f64::max);
    let width = label_width(points.iter().map(|p| p.label.as_str()));
    let mut out = String::new();
    for point in points {
        out.push_str(&format!(
            "  {:<width$}  {} {}\n",
            point.label,
            bar(point.value, max),
            point.value,
            width = width
        ));
    }
    out
}

fn render_histogram(histogram: &Histogram) -> String {
    let max = histogram.bins.iter().map(|b| b.count).max().unwrap_or(0) as f64;
    let mut out = format!("{}\n", histogram.title);
    for bin in &histogram.bins {
        out.push_str(&format!(
            "  {:>8.1} - {:<8.1} {} {}\n",
            bin.start,
            bin.end,
            bar(bin.count as f64, max),
            bin.count
        ));
    }
    out
}

fn bar(value: f64, max: f64) -> String {
    let len = if max > 0.0 {
        ((value / max) * BAR_WIDTH as f64).round() as usize
    } else {
        0
    };
    "#".repeat(len.min(BAR_WIDTH))
}

fn label_width<'a>(labels: impl Iterator<Item = &'a str>) -> usize {
    labels.map(|label| label.chars().count()).max().unwrap_or(0)
}

/// JSON shape of one answered question.
#[derive(Debug, Serialize)]
pub struct AnswerView<'a> {
    pub question: &'a str,
    pub text: &'a str,
    pub chart: Option<&'a ChartSpec>,
}

impl<'a> AnswerView<'a> {
    pub fn new(question: &'a str, answer: &'a Answer) -> Self {
        Self {
            question,
            text: &answer.text,
            chart: answer.chart.as_ref(),
        }
    }
}
