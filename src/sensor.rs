//! Serial sensor feed classification
//!
//! The wearable firmware prints one status line per reading and emits the
//! keyword `DANGER` when its own impact threshold trips. Only the text is
//! inspected here; raw signal processing happens on the device.

use serde::Serialize;
use std::io::{self, BufRead};

/// Keyword that marks an alert line
pub const DANGER_KEYWORD: &str = "DANGER";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SensorReading {
    pub line: String,
    pub alert: bool,
}

/// Classify one line of sensor output
pub fn classify_line(line: &str) -> SensorReading {
    let line = line.trim_end_matches(&['\r', '\n'][..]);
    SensorReading {
        line: line.to_string(),
        alert: line.contains(DANGER_KEYWORD),
    }
}

/// Iterator over classified readings from a line source
///
/// Blank lines are skipped.
pub struct SensorFeed<R: BufRead> {
    reader: R,
    buf: String,
}

impl<R: BufRead> SensorFeed<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: String::new(),
        }
    }
}

impl<R: BufRead> Iterator for SensorFeed<R> {
    type Item = io::Result<SensorReading>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {
                    if self.buf.trim().is_empty() {
                        continue;
                    }
                    let reading = classify_line(&self.buf);
                    if reading.alert {
                        tracing::warn!(line = %reading.line, "Sensor alert");
                    }
                    return Some(Ok(reading));
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Counts gathered while draining a feed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FeedSummary {
    pub readings: usize,
    pub alerts: usize,
}

impl FeedSummary {
    pub fn record(&mut self, reading: &SensorReading) {
        self.readings += 1;
        if reading.alert {
            self.alerts += 1;
        }
    }
}
