use chrono::NaiveDate;
use riskradar::export::{csv as csv_export, json as json_export};
use riskradar::{AthleteProfile, AthleteType, MetricCategory, RiskLevel, SqliteStore, Tracker};
use tempfile::tempdir;

/// Integration tests that drive the tracker against an on-disk store

#[cfg(test)]
mod integration_tests {
    use super::*;

    fn fill_reference_day<S: riskradar::KeyValueStore>(tracker: &mut Tracker<S>) -> Option<u8> {
        tracker.submit_training(60.0, 2.5).unwrap();
        tracker.submit_recovery(55.0, 65.0).unwrap();
        tracker.submit_sleep(8.0, 0.6).unwrap();
        tracker.submit_acwr(1.1).unwrap();
        tracker.submit_injury(false, 0.0).unwrap().overall_risk
    }

    /// Complete daily workflow persisted across tracker instances
    #[test]
    fn test_state_survives_reopen() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("data").join("riskradar.db");

        {
            let mut tracker = Tracker::new(SqliteStore::open(&db_path).unwrap(), 100);
            assert_eq!(fill_reference_day(&mut tracker), Some(18));
            tracker
                .set_profile(&AthleteProfile {
                    name: "Sam".to_string(),
                    age: 27,
                    athlete_type: AthleteType::Runner,
                })
                .unwrap();
        }

        let tracker = Tracker::new(SqliteStore::open(&db_path).unwrap(), 100);
        let status = tracker.status();
        assert_eq!(status.overall_risk, Some(18));
        assert_eq!(status.interpretation.unwrap().level, RiskLevel::Low);
        assert!(status.missing_fields.is_empty());
        assert_eq!(tracker.history().len(), 11);
        assert_eq!(tracker.profile().unwrap().name, "Sam");
    }

    #[test]
    fn test_export_file_matches_wire_shape() {
        let dir = tempdir().unwrap();
        let mut tracker = Tracker::new(SqliteStore::in_memory().unwrap(), 100);
        fill_reference_day(&mut tracker);

        let today = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let record = tracker.export(701, today);
        let path = dir.path().join("export.json");
        json_export::export_record(&record, &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["athlete_id"], 701);
        assert_eq!(value["system_date"], "2024-03-09");
        assert_eq!(value["daily_load"], 150.0);
        assert_eq!(value["sleep_quantity"], 84.0);
        assert_eq!(value["past_injury"], 0);
    }

    #[test]
    fn test_history_csv_export() {
        let dir = tempdir().unwrap();
        let mut tracker = Tracker::new(SqliteStore::in_memory().unwrap(), 100);
        tracker.submit_acwr(1.6).unwrap();
        tracker.record_cns(45).unwrap();

        let path = dir.path().join("history.csv");
        csv_export::export_history(&tracker.history(), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "id,timestamp,metric,value,category");
        assert_eq!(lines.len(), 4);
        assert!(lines[1].contains("cns_score"));
        assert!(lines[3].contains("acwr"));
    }

    #[test]
    fn test_invalid_submission_keeps_disk_state() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("riskradar.db");
        let mut tracker = Tracker::new(SqliteStore::open(&db_path).unwrap(), 100);
        tracker.submit_sleep(7.0, 0.7).unwrap();

        assert!(tracker.submit_sleep(25.0, 0.7).is_err());
        assert!(tracker.submit_recovery(20.0, 60.0).is_err());

        let reopened = Tracker::new(SqliteStore::open(&db_path).unwrap(), 100);
        assert_eq!(reopened.history().len(), 3);
        assert_eq!(reopened.snapshot().resting_hr, None);
        assert!(reopened.snapshot().sleep_score.is_some());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut tracker = Tracker::new(SqliteStore::in_memory().unwrap(), 100);
        fill_reference_day(&mut tracker);
        tracker.reset().unwrap();

        assert!(tracker.history().is_empty());
        assert_eq!(tracker.overall_risk(), None);
        assert!(tracker.profile().is_none());

        let record = tracker.export(9, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(record.daily_load, 0.0);
        assert_eq!(record.athlete_id, 9);
    }

    #[test]
    fn test_high_risk_day() {
        let mut tracker = Tracker::new(SqliteStore::in_memory().unwrap(), 100);
        tracker.submit_training(180.0, 10.0).unwrap();
        tracker.submit_recovery(80.0, 20.0).unwrap();
        tracker.submit_sleep(4.0, 0.0).unwrap();
        tracker.submit_acwr(2.0).unwrap();
        let risk = tracker.submit_injury(true, 0.0).unwrap().overall_risk.unwrap();

        assert!(risk >= 70);
        let categories: Vec<MetricCategory> =
            tracker.history().entries().iter().map(|e| e.category).collect();
        assert_eq!(categories.first(), Some(&MetricCategory::Injury));
        assert_eq!(categories.last(), Some(&MetricCategory::Training));
    }
}
