//! Form-style submissions against the persisted athlete state
//!
//! Each submission validates all of its fields first, then merges the new
//! values into the stored snapshot, appends history entries and saves. A
//! rejected submission leaves the store untouched. The overall risk is
//! recomputed from the merged snapshot after every accepted submission.

use chrono::NaiveDate;
use serde::Serialize;

use crate::cns::{score_cns, CnsResult};
use crate::error::{Result, RiskRadarError};
use crate::export::{build_export, ExportRecord};
use crate::history::{HistoryEntry, HistoryLog, MetricCategory};
use crate::models::AthleteProfile;
use crate::risk::{interpret, risk_factor_analysis, session_load, PartialSnapshot, RiskInterpretation};
use crate::sleep::score_sleep;
use crate::store::{KeyValueStore, WellnessStore};
use crate::validation::{validate, MetricKey};

/// Outcome of an accepted submission
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Submission {
    /// Snapshot after the merge
    pub snapshot: PartialSnapshot,
    /// Overall risk, present once the snapshot is complete
    pub overall_risk: Option<u8>,
}

/// Current state for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Status {
    pub snapshot: PartialSnapshot,
    pub overall_risk: Option<u8>,
    pub interpretation: Option<RiskInterpretation>,
    pub missing_fields: Vec<&'static str>,
}

/// Owns the store; `&mut self` on every write keeps appends single-writer
pub struct Tracker<S: KeyValueStore> {
    store: WellnessStore<S>,
    history_capacity: usize,
}

impl<S: KeyValueStore> Tracker<S> {
    pub fn new(backend: S, history_capacity: usize) -> Self {
        Self {
            store: WellnessStore::new(backend),
            history_capacity,
        }
    }

    fn check(fields: &[(MetricKey, f64)]) -> Result<()> {
        for (key, value) in fields {
            let result = validate(*key, *value);
            if !result.is_valid {
                let message = result.message.unwrap_or_default();
                tracing::debug!(field = %key, value, %message, "Submission rejected");
                return Err(RiskRadarError::validation(key.as_str(), message));
            }
        }
        Ok(())
    }

    /// Merge, record history and persist
    ///
    /// History is written first. If the snapshot write then fails, the
    /// previous history is written back so neither slot changes.
    fn apply(
        &mut self,
        update: PartialSnapshot,
        entries: Vec<(&str, f64)>,
        category: MetricCategory,
    ) -> Result<Submission> {
        let snapshot = self.store.load_snapshot().merge(&update);
        let previous = self.store.load_history(self.history_capacity);
        self.record(entries, category)?;

        if let Err(e) = self.store.save_snapshot(&snapshot) {
            if let Err(restore) = self.store.save_history(&previous) {
                tracing::warn!(error = %restore, "Failed to roll back history after snapshot write error");
            }
            return Err(e.into());
        }

        let overall_risk = snapshot.overall_risk();
        tracing::info!(%category, risk = ?overall_risk, "Submission accepted");
        Ok(Submission {
            snapshot,
            overall_risk,
        })
    }

    fn record(&mut self, entries: Vec<(&str, f64)>, category: MetricCategory) -> Result<()> {
        let mut history = self.store.load_history(self.history_capacity);
        for (metric, value) in entries {
            history.append(HistoryEntry::new(metric, value, category), self.history_capacity);
        }
        self.store.save_history(&history)?;
        Ok(())
    }

    /// Training session: duration in minutes and RPE
    pub fn submit_training(&mut self, duration: f64, rpe: f64) -> Result<Submission> {
        Self::check(&[(MetricKey::Duration, duration), (MetricKey::Rpe, rpe)])?;

        let daily_load = session_load(duration, rpe);
        let update = PartialSnapshot {
            daily_load: Some(daily_load),
            ..Default::default()
        };
        self.apply(
            update,
            vec![("duration", duration), ("rpe", rpe), ("daily_load", daily_load)],
            MetricCategory::Training,
        )
    }

    /// Morning resting heart rate and HRV
    pub fn submit_recovery(&mut self, resting_hr: f64, hrv: f64) -> Result<Submission> {
        Self::check(&[(MetricKey::RestingHr, resting_hr), (MetricKey::Hrv, hrv)])?;

        let update = PartialSnapshot {
            resting_hr: Some(resting_hr),
            hrv: Some(hrv),
            ..Default::default()
        };
        self.apply(
            update,
            vec![("resting_hr", resting_hr), ("hrv", hrv)],
            MetricCategory::Recovery,
        )
    }

    /// Sleep duration and quality; stores the derived sleep score
    pub fn submit_sleep(&mut self, hours: f64, quality: f64) -> Result<Submission> {
        Self::check(&[(MetricKey::SleepHours, hours), (MetricKey::SleepQuality, quality)])?;

        let sleep_score = f64::from(score_sleep(hours, quality));
        let update = PartialSnapshot {
            sleep_score: Some(sleep_score),
            ..Default::default()
        };
        self.apply(
            update,
            vec![
                ("sleep_hours", hours),
                ("sleep_quality", quality),
                ("sleep_score", sleep_score),
            ],
            MetricCategory::Sleep,
        )
    }

    pub fn submit_acwr(&mut self, acwr: f64) -> Result<Submission> {
        Self::check(&[(MetricKey::Acwr, acwr)])?;

        let update = PartialSnapshot {
            acwr: Some(acwr),
            ..Default::default()
        };
        self.apply(update, vec![("acwr", acwr)], MetricCategory::Workload)
    }

    pub fn submit_injury(&mut self, past_injury: bool, days_since_injury: f64) -> Result<Submission> {
        Self::check(&[(MetricKey::DaysSinceInjury, days_since_injury)])?;

        let update = PartialSnapshot {
            past_injury: Some(past_injury),
            days_since_injury: Some(days_since_injury),
            ..Default::default()
        };
        self.apply(
            update,
            vec![
                ("past_injury", if past_injury { 1.0 } else { 0.0 }),
                ("days_since_injury", days_since_injury),
            ],
            MetricCategory::Injury,
        )
    }

    /// Score a finished tap test and log it; the snapshot is not affected
    pub fn record_cns(&mut self, tap_count: u32) -> Result<CnsResult> {
        let result = score_cns(tap_count);
        self.record(
            vec![("tap_count", f64::from(tap_count)), ("cns_score", f64::from(result.score))],
            MetricCategory::Cns,
        )?;
        tracing::info!(tap_count, score = result.score, level = %result.fatigue_level, "CNS test recorded");
        Ok(result)
    }

    /// Advisory sentence for a manually entered risk factor
    pub fn analyze_risk_factor(&mut self, risk_factor: f64) -> Result<&'static str> {
        Self::check(&[(MetricKey::RiskFactor, risk_factor)])?;
        self.record(vec![("risk_factor", risk_factor)], MetricCategory::Risk)?;
        Ok(risk_factor_analysis(risk_factor))
    }

    pub fn snapshot(&self) -> PartialSnapshot {
        self.store.load_snapshot()
    }

    pub fn overall_risk(&self) -> Option<u8> {
        self.snapshot().overall_risk()
    }

    pub fn status(&self) -> Status {
        let snapshot = self.snapshot();
        let overall_risk = snapshot.overall_risk();
        Status {
            snapshot,
            overall_risk,
            interpretation: overall_risk.map(interpret),
            missing_fields: snapshot.missing_fields(),
        }
    }

    pub fn history(&self) -> HistoryLog {
        self.store.load_history(self.history_capacity)
    }

    pub fn profile(&self) -> Option<AthleteProfile> {
        self.store.load_profile()
    }

    pub fn set_profile(&mut self, profile: &AthleteProfile) -> Result<()> {
        self.store.save_profile(profile)?;
        Ok(())
    }

    pub fn export(&self, athlete_id: u32, today: NaiveDate) -> ExportRecord {
        build_export(Some(&self.snapshot()), athlete_id, today)
    }

    /// Clear snapshot, history and profile
    pub fn reset(&mut self) -> Result<()> {
        self.store.reset()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::store::{MemoryStore, Slot};

    fn tracker() -> Tracker<MemoryStore> {
        Tracker::new(MemoryStore::new(), 100)
    }

    /// Memory backend whose writes to one slot always fail
    struct FailingSlot {
        inner: MemoryStore,
        failing: Slot,
    }

    impl KeyValueStore for FailingSlot {
        fn get(&self, slot: Slot) -> std::result::Result<Option<String>, StoreError> {
            self.inner.get(slot)
        }

        fn set(&mut self, slot: Slot, value: &str) -> std::result::Result<(), StoreError> {
            if slot == self.failing {
                return Err(StoreError::Serialization {
                    slot: slot.key().to_string(),
                    reason: "disk full".to_string(),
                });
            }
            self.inner.set(slot, value)
        }

        fn remove(&mut self, slot: Slot) -> std::result::Result<(), StoreError> {
            self.inner.remove(slot)
        }
    }

    fn failing_tracker(failing: Slot) -> Tracker<FailingSlot> {
        Tracker::new(
            FailingSlot {
                inner: MemoryStore::new(),
                failing,
            },
            100,
        )
    }

    #[test]
    fn test_risk_absent_until_complete() {
        let mut t = tracker();

        assert_eq!(t.submit_training(60.0, 2.5).unwrap().overall_risk, None);
        assert_eq!(t.submit_recovery(55.0, 65.0).unwrap().overall_risk, None);
        assert_eq!(t.submit_sleep(8.0, 0.6).unwrap().overall_risk, None);
        assert_eq!(t.submit_acwr(1.1).unwrap().overall_risk, None);

        let done = t.submit_injury(false, 0.0).unwrap();
        assert_eq!(done.snapshot.daily_load, Some(150.0));
        assert_eq!(done.snapshot.sleep_score, Some(84.0));
        assert_eq!(done.overall_risk, Some(18));

        // Any later change recomputes
        let worse = t.submit_recovery(80.0, 30.0).unwrap();
        assert!(worse.overall_risk.unwrap() > 18);
    }

    #[test]
    fn test_rejected_submission_changes_nothing() {
        let mut t = tracker();
        t.submit_acwr(1.0).unwrap();

        let err = t.submit_training(60.0, 11.0).unwrap_err();
        match err {
            RiskRadarError::Validation { field, message } => {
                assert_eq!(field, "rpe");
                assert_eq!(message, "RPE must be between 1 and 10");
            }
            other => panic!("unexpected error: {:?}", other),
        }

        assert_eq!(t.snapshot().daily_load, None);
        assert_eq!(t.history().len(), 1);
    }

    #[test]
    fn test_failed_snapshot_write_leaves_history_unchanged() {
        let mut t = failing_tracker(Slot::Snapshot);
        let err = t.submit_acwr(1.2).unwrap_err();

        assert!(matches!(err, RiskRadarError::Store(_)));
        assert!(t.history().is_empty());
        assert_eq!(t.snapshot(), PartialSnapshot::default());
    }

    #[test]
    fn test_failed_history_write_leaves_snapshot_unchanged() {
        let mut t = failing_tracker(Slot::History);
        assert!(t.submit_recovery(50.0, 70.0).is_err());
        assert_eq!(t.snapshot(), PartialSnapshot::default());
    }

    #[test]
    fn test_nan_is_rejected_with_generic_message() {
        let mut t = tracker();
        let err = t.submit_recovery(f64::NAN, 60.0).unwrap_err();
        assert_eq!(err.user_message(), "Please enter a valid number");
    }

    #[test]
    fn test_history_records_every_submission() {
        let mut t = tracker();
        t.submit_training(45.0, 6.0).unwrap();
        t.record_cns(50).unwrap();

        let history = t.history();
        let metrics: Vec<&str> = history.entries().iter().map(|e| e.metric.as_str()).collect();
        assert_eq!(metrics, vec!["cns_score", "tap_count", "daily_load", "rpe", "duration"]);
        assert_eq!(history.entries()[0].category, MetricCategory::Cns);
    }

    #[test]
    fn test_history_capacity_is_enforced() {
        let mut t = Tracker::new(MemoryStore::new(), 100);
        for _ in 0..60 {
            t.submit_recovery(50.0, 70.0).unwrap();
        }
        let history = t.history();
        assert_eq!(history.len(), 100);
        assert_eq!(history.entries()[0].metric, "hrv");
    }

    #[test]
    fn test_cns_does_not_touch_snapshot() {
        let mut t = tracker();
        let result = t.record_cns(10).unwrap();
        assert_eq!(result.score, 1);
        assert_eq!(t.snapshot(), PartialSnapshot::default());
    }

    #[test]
    fn test_risk_factor_analysis() {
        let mut t = tracker();
        assert!(t.analyze_risk_factor(80.0).unwrap().starts_with("High"));
        assert!(t.analyze_risk_factor(101.0).is_err());
        assert_eq!(t.history().len(), 1);

        assert!(t.analyze_risk_factor(34.6).unwrap().starts_with("Low"));
        assert!(t.analyze_risk_factor(69.5).unwrap().starts_with("Moderate"));
    }

    #[test]
    fn test_export_and_reset() {
        let mut t = tracker();
        t.submit_sleep(8.0, 0.8).unwrap();
        t.submit_injury(true, 30.0).unwrap();

        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let record = t.export(701, today);
        assert_eq!(record.sleep_quantity, 92.0);
        assert_eq!(record.past_injury, 1);
        assert_eq!(record.days_since_injury, 30.0);
        assert_eq!(record.hrv, 0.0);

        t.reset().unwrap();
        assert_eq!(t.snapshot(), PartialSnapshot::default());
        assert!(t.history().is_empty());
        assert_eq!(t.export(701, today).sleep_quantity, 0.0);
    }

    #[test]
    fn test_status_reports_missing_fields() {
        let mut t = tracker();
        t.submit_acwr(1.4).unwrap();

        let status = t.status();
        assert_eq!(status.overall_risk, None);
        assert!(status.interpretation.is_none());
        assert_eq!(status.missing_fields.len(), 6);
        assert!(!status.missing_fields.contains(&"acwr"));
    }
}
