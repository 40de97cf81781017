use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ExportError;
use crate::risk::PartialSnapshot;

pub mod csv;
pub mod json;

/// Athlete identifier used when none is configured
pub const DEFAULT_ATHLETE_ID: u32 = 701;

/// Export format types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn from_str(s: &str) -> Result<Self, ExportError> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Fixed-shape record sent to the prediction service
///
/// Field order is part of the wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub athlete_id: u32,
    #[serde(with = "system_date")]
    pub system_date: NaiveDate,
    pub daily_load: f64,
    pub resting_hr: f64,
    pub hrv: f64,
    pub sleep_quantity: f64,
    pub past_injury: u8,
    pub days_since_injury: f64,
}

/// Build an export record for `today`; absent values become 0
pub fn build_export(
    snapshot: Option<&PartialSnapshot>,
    athlete_id: u32,
    today: NaiveDate,
) -> ExportRecord {
    let snapshot = snapshot.copied().unwrap_or_default();

    ExportRecord {
        athlete_id,
        system_date: today,
        daily_load: snapshot.daily_load.unwrap_or(0.0),
        resting_hr: snapshot.resting_hr.unwrap_or(0.0),
        hrv: snapshot.hrv.unwrap_or(0.0),
        sleep_quantity: snapshot.sleep_score.unwrap_or(0.0),
        past_injury: u8::from(snapshot.past_injury.unwrap_or(false)),
        days_since_injury: snapshot.days_since_injury.unwrap_or(0.0),
    }
}

/// Build an export record dated with the local calendar day
pub fn build_export_today(snapshot: Option<&PartialSnapshot>, athlete_id: u32) -> ExportRecord {
    build_export(snapshot, athlete_id, Local::now().date_naive())
}

mod system_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_without_snapshot_is_zeroed() {
        let record = build_export_today(None, DEFAULT_ATHLETE_ID);

        assert_eq!(record.athlete_id, 701);
        assert_eq!(record.system_date, Local::now().date_naive());
        assert_eq!(record.daily_load, 0.0);
        assert_eq!(record.resting_hr, 0.0);
        assert_eq!(record.hrv, 0.0);
        assert_eq!(record.sleep_quantity, 0.0);
        assert_eq!(record.past_injury, 0);
        assert_eq!(record.days_since_injury, 0.0);
    }

    #[test]
    fn test_partial_snapshot_fills_known_fields() {
        let snapshot = PartialSnapshot {
            hrv: Some(58.0),
            sleep_score: Some(84.0),
            past_injury: Some(true),
            ..Default::default()
        };
        let today = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let record = build_export(Some(&snapshot), 42, today);

        assert_eq!(record.athlete_id, 42);
        assert_eq!(record.hrv, 58.0);
        assert_eq!(record.sleep_quantity, 84.0);
        assert_eq!(record.past_injury, 1);
        assert_eq!(record.daily_load, 0.0);
    }

    #[test]
    fn test_wire_key_order_and_date_format() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let record = build_export(None, DEFAULT_ATHLETE_ID, today);
        let json = serde_json::to_string(&record).unwrap();

        let keys = [
            "athlete_id",
            "system_date",
            "daily_load",
            "resting_hr",
            "hrv",
            "sleep_quantity",
            "past_injury",
            "days_since_injury",
        ];
        let positions: Vec<usize> = keys
            .iter()
            .map(|k| json.find(&format!("\"{}\"", k)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(json.contains("\"system_date\":\"2024-03-09\""));
        assert!(json.contains("\"past_injury\":0"));
    }

    #[test]
    fn test_export_format_parsing() {
        assert_eq!(ExportFormat::from_str("JSON").unwrap(), ExportFormat::Json);
        assert!(matches!(
            ExportFormat::from_str("pdf"),
            Err(ExportError::UnsupportedFormat(_))
        ));
    }
}
