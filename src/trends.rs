//! Per-metric trend statistics over the history log
//!
//! A z-score of the latest value against the athlete's own history is the
//! same normalization the prediction service applies to HRV before feature
//! extraction, so a large negative HRV z-score is an early warning sign even
//! when the absolute value is inside the validated range.

use serde::Serialize;
use statrs::statistics::Statistics;

use crate::history::HistoryLog;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricTrend {
    pub metric: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation, 0 with fewer than two samples
    pub std_dev: f64,
    pub latest: f64,
    /// Latest value in standard deviations from the mean
    pub z_score: f64,
}

/// Summarize one metric, `None` when it was never recorded
pub fn metric_trend(history: &HistoryLog, metric: &str) -> Option<MetricTrend> {
    let values: Vec<f64> = history.for_metric(metric).map(|e| e.value).collect();
    let latest = *values.first()?;

    let mean = values.iter().mean();
    let std_dev = if values.len() < 2 {
        0.0
    } else {
        values.iter().std_dev()
    };
    let z_score = if std_dev > 0.0 {
        (latest - mean) / std_dev
    } else {
        0.0
    };

    Some(MetricTrend {
        metric: metric.to_string(),
        count: values.len(),
        mean,
        std_dev,
        latest,
        z_score,
    })
}

/// Trends for every metric present in the log, in first-seen order
pub fn all_trends(history: &HistoryLog) -> Vec<MetricTrend> {
    let mut seen: Vec<&str> = Vec::new();
    for entry in history.entries() {
        if !seen.contains(&entry.metric.as_str()) {
            seen.push(&entry.metric);
        }
    }
    seen.into_iter()
        .filter_map(|metric| metric_trend(history, metric))
        .collect()
}
