//! Composite injury-risk model
//!
//! Seven athlete metrics are normalized to 0-100 "risk units" (higher is
//! worse) and combined with fixed weights into a single overall risk score.
//!
//! # Weighting
//!
//! | factor            | weight |
//! |-------------------|--------|
//! | training load     | 0.20   |
//! | sleep             | 0.20   |
//! | HRV               | 0.15   |
//! | ACWR deviation    | 0.15   |
//! | resting HR        | 0.10   |
//! | injury history    | 0.10   |
//! | injury recency    | 0.10   |
//!
//! ACWR is scored by its distance from 1.0, so both under- and over-training
//! raise risk. Inputs are expected to have passed [`crate::validation`]; the
//! model does not re-check ranges and only the load and ACWR factors are
//! capped before weighting.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Session load (duration x RPE) that maps to 100 load risk
pub const MAX_DAILY_LOAD: f64 = 1800.0;

pub const LOAD_WEIGHT: f64 = 0.20;
pub const HR_WEIGHT: f64 = 0.10;
pub const HRV_WEIGHT: f64 = 0.15;
pub const SLEEP_WEIGHT: f64 = 0.20;
pub const ACWR_WEIGHT: f64 = 0.15;
pub const INJURY_WEIGHT: f64 = 0.10;
pub const RECENCY_WEIGHT: f64 = 0.10;

/// Risk below this value is low
pub const MODERATE_THRESHOLD: u8 = 35;
/// Risk at or above this value is high
pub const HIGH_THRESHOLD: u8 = 70;

/// Round half-way values toward positive infinity
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Session-RPE training load for one session
pub fn session_load(duration_minutes: f64, rpe: f64) -> f64 {
    duration_minutes * rpe
}

/// Complete set of inputs for the risk model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AthleteMetricSnapshot {
    /// Session load (duration x RPE)
    pub daily_load: f64,

    /// Resting heart rate in bpm
    pub resting_hr: f64,

    /// Heart rate variability in ms
    pub hrv: f64,

    /// Sleep score 0-100 from [`crate::sleep::score_sleep`]
    pub sleep_score: f64,

    /// Acute:chronic workload ratio
    pub acwr: f64,

    /// Whether the athlete has a past injury
    pub past_injury: bool,

    /// Days since the last injury
    pub days_since_injury: f64,
}

/// Snapshot as it is accumulated from independent submissions
///
/// Each form sets one or two fields. The overall risk is only defined once
/// all seven are present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_load: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resting_hr: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hrv: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acwr: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub past_injury: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_since_injury: Option<f64>,
}

impl PartialSnapshot {
    /// Return a new snapshot with every field present in `update` applied
    pub fn merge(&self, update: &PartialSnapshot) -> PartialSnapshot {
        PartialSnapshot {
            daily_load: update.daily_load.or(self.daily_load),
            resting_hr: update.resting_hr.or(self.resting_hr),
            hrv: update.hrv.or(self.hrv),
            sleep_score: update.sleep_score.or(self.sleep_score),
            acwr: update.acwr.or(self.acwr),
            past_injury: update.past_injury.or(self.past_injury),
            days_since_injury: update.days_since_injury.or(self.days_since_injury),
        }
    }

    /// The full snapshot, if every field has been set
    pub fn complete(&self) -> Option<AthleteMetricSnapshot> {
        Some(AthleteMetricSnapshot {
            daily_load: self.daily_load?,
            resting_hr: self.resting_hr?,
            hrv: self.hrv?,
            sleep_score: self.sleep_score?,
            acwr: self.acwr?,
            past_injury: self.past_injury?,
            days_since_injury: self.days_since_injury?,
        })
    }

    /// Names of the fields that are still missing
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.daily_load.is_none() {
            missing.push("daily_load");
        }
        if self.resting_hr.is_none() {
            missing.push("resting_hr");
        }
        if self.hrv.is_none() {
            missing.push("hrv");
        }
        if self.sleep_score.is_none() {
            missing.push("sleep_score");
        }
        if self.acwr.is_none() {
            missing.push("acwr");
        }
        if self.past_injury.is_none() {
            missing.push("past_injury");
        }
        if self.days_since_injury.is_none() {
            missing.push("days_since_injury");
        }
        missing
    }

    /// Overall risk, absent until the snapshot is complete
    pub fn overall_risk(&self) -> Option<u8> {
        self.complete().map(|snapshot| compute_risk(&snapshot))
    }
}

impl From<AthleteMetricSnapshot> for PartialSnapshot {
    fn from(snapshot: AthleteMetricSnapshot) -> Self {
        PartialSnapshot {
            daily_load: Some(snapshot.daily_load),
            resting_hr: Some(snapshot.resting_hr),
            hrv: Some(snapshot.hrv),
            sleep_score: Some(snapshot.sleep_score),
            acwr: Some(snapshot.acwr),
            past_injury: Some(snapshot.past_injury),
            days_since_injury: Some(snapshot.days_since_injury),
        }
    }
}

/// Per-factor risks before weighting
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskBreakdown {
    pub load: f64,
    pub resting_hr: f64,
    pub hrv: f64,
    pub sleep: f64,
    pub acwr: f64,
    pub injury: f64,
    pub recency: f64,
    /// Weighted sum before clamping and rounding
    pub weighted_total: f64,
}

/// Normalize each input to risk units and weight them
pub fn risk_breakdown(snapshot: &AthleteMetricSnapshot) -> RiskBreakdown {
    let load = (snapshot.daily_load / MAX_DAILY_LOAD * 100.0).min(100.0);
    let resting_hr = (snapshot.resting_hr - 35.0) / 55.0 * 100.0;
    let hrv = 100.0 - (snapshot.hrv - 20.0) / 110.0 * 100.0;
    let sleep = 100.0 - snapshot.sleep_score;
    let acwr = ((snapshot.acwr - 1.0).abs() * 50.0).min(100.0);

    let (injury, recency) = if snapshot.past_injury {
        (30.0, (30.0 - snapshot.days_since_injury / 12.0).max(0.0))
    } else {
        (0.0, 0.0)
    };

    let weighted_total = load * LOAD_WEIGHT
        + resting_hr * HR_WEIGHT
        + hrv * HRV_WEIGHT
        + sleep * SLEEP_WEIGHT
        + acwr * ACWR_WEIGHT
        + injury * INJURY_WEIGHT
        + recency * RECENCY_WEIGHT;

    RiskBreakdown {
        load,
        resting_hr,
        hrv,
        sleep,
        acwr,
        injury,
        recency,
        weighted_total,
    }
}

/// Overall 0-100 injury risk for a complete snapshot
pub fn compute_risk(snapshot: &AthleteMetricSnapshot) -> u8 {
    let breakdown = risk_breakdown(snapshot);
    round_half_up(breakdown.weighted_total.clamp(0.0, 100.0)) as u8
}

/// Discrete risk band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    pub fn from_risk(risk: u8) -> Self {
        Self::from_value(f64::from(risk))
    }

    /// Band an unrounded 0-100 value
    pub fn from_value(value: f64) -> Self {
        if value < f64::from(MODERATE_THRESHOLD) {
            RiskLevel::Low
        } else if value < f64::from(HIGH_THRESHOLD) {
            RiskLevel::Moderate
        } else {
            RiskLevel::High
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Moderate => write!(f, "moderate"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}

/// Human-facing reading of an overall risk score
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskInterpretation {
    pub level: RiskLevel,
    pub label: &'static str,
    pub color_tag: &'static str,
}

pub fn interpret(risk: u8) -> RiskInterpretation {
    match RiskLevel::from_risk(risk) {
        RiskLevel::Low => RiskInterpretation {
            level: RiskLevel::Low,
            label: "Low Risk",
            color_tag: "green",
        },
        RiskLevel::Moderate => RiskInterpretation {
            level: RiskLevel::Moderate,
            label: "Moderate Risk",
            color_tag: "yellow",
        },
        RiskLevel::High => RiskInterpretation {
            level: RiskLevel::High,
            label: "High Risk",
            color_tag: "red",
        },
    }
}

/// Advisory sentence for a manually entered risk factor
///
/// Uses the same bands as [`interpret`] but its own wording.
pub fn risk_factor_analysis(risk_factor: f64) -> &'static str {
    match RiskLevel::from_value(risk_factor) {
        RiskLevel::Low => {
            "Low injury risk. Current training and recovery balance looks sustainable."
        }
        RiskLevel::Moderate => {
            "Moderate injury risk. Monitor fatigue closely and consider reducing intensity."
        }
        RiskLevel::High => {
            "High injury risk. Prioritize recovery and consult your coach or medical staff before hard sessions."
        }
    }
}
