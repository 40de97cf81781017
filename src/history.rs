//! Bounded submission history
//!
//! Every successful submission appends one entry per recorded metric. The
//! log keeps the most recent entries only, newest first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Default number of entries retained
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Form a history entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricCategory {
    Training,
    Recovery,
    Sleep,
    Workload,
    Injury,
    Cns,
    Risk,
}

impl fmt::Display for MetricCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetricCategory::Training => "training",
            MetricCategory::Recovery => "recovery",
            MetricCategory::Sleep => "sleep",
            MetricCategory::Workload => "workload",
            MetricCategory::Injury => "injury",
            MetricCategory::Cns => "cns",
            MetricCategory::Risk => "risk",
        };
        f.write_str(name)
    }
}

/// A single recorded metric value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub metric: String,
    pub value: f64,
    pub category: MetricCategory,
}

impl HistoryEntry {
    pub fn new(metric: impl Into<String>, value: f64, category: MetricCategory) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            metric: metric.into(),
            value,
            category,
        }
    }
}

/// Newest-first log capped at a fixed number of entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryLog {
    entries: Vec<HistoryEntry>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn from_entries(mut entries: Vec<HistoryEntry>, capacity: usize) -> Self {
        entries.truncate(capacity);
        Self { entries }
    }

    /// Insert at the front and drop the oldest entries beyond `capacity`
    pub fn append(&mut self, entry: HistoryEntry, capacity: usize) {
        self.entries.insert(0, entry);
        self.entries.truncate(capacity);
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries for one metric, newest first
    pub fn for_metric<'a>(&'a self, metric: &'a str) -> impl Iterator<Item = &'a HistoryEntry> + 'a {
        self.entries.iter().filter(move |e| e.metric == metric)
    }
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::new()
    }
}
