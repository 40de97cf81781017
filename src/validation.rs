/// Range validation for athlete metric inputs
///
/// Every metric a user can submit has a fixed inclusive range and a fixed
/// advisory message. The rule table is static data; validation is a pure
/// lookup plus comparison and never raises.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Message returned for NaN or infinite input
pub const INVALID_NUMBER_MESSAGE: &str = "Please enter a valid number";

/// Metric keys that carry a validation rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricKey {
    Duration,
    Rpe,
    RestingHr,
    Hrv,
    SleepHours,
    SleepQuality,
    Acwr,
    DaysSinceInjury,
    RiskFactor,
}

impl MetricKey {
    pub const ALL: [MetricKey; 9] = [
        MetricKey::Duration,
        MetricKey::Rpe,
        MetricKey::RestingHr,
        MetricKey::Hrv,
        MetricKey::SleepHours,
        MetricKey::SleepQuality,
        MetricKey::Acwr,
        MetricKey::DaysSinceInjury,
        MetricKey::RiskFactor,
    ];

    /// Canonical field name used in messages and history entries
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKey::Duration => "duration",
            MetricKey::Rpe => "rpe",
            MetricKey::RestingHr => "restingHr",
            MetricKey::Hrv => "hrv",
            MetricKey::SleepHours => "sleepHours",
            MetricKey::SleepQuality => "sleepQuality",
            MetricKey::Acwr => "acwr",
            MetricKey::DaysSinceInjury => "daysSinceInjury",
            MetricKey::RiskFactor => "riskFactor",
        }
    }

    /// Rule registered for this key
    pub fn rule(&self) -> &'static MetricRule {
        match self {
            MetricKey::Duration => &DURATION_RULE,
            MetricKey::Rpe => &RPE_RULE,
            MetricKey::RestingHr => &RESTING_HR_RULE,
            MetricKey::Hrv => &HRV_RULE,
            MetricKey::SleepHours => &SLEEP_HOURS_RULE,
            MetricKey::SleepQuality => &SLEEP_QUALITY_RULE,
            MetricKey::Acwr => &ACWR_RULE,
            MetricKey::DaysSinceInjury => &DAYS_SINCE_INJURY_RULE,
            MetricKey::RiskFactor => &RISK_FACTOR_RULE,
        }
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "duration" => Ok(MetricKey::Duration),
            "rpe" => Ok(MetricKey::Rpe),
            "restingHr" | "resting_hr" => Ok(MetricKey::RestingHr),
            "hrv" => Ok(MetricKey::Hrv),
            "sleepHours" | "sleep_hours" => Ok(MetricKey::SleepHours),
            "sleepQuality" | "sleep_quality" => Ok(MetricKey::SleepQuality),
            "acwr" => Ok(MetricKey::Acwr),
            "daysSinceInjury" | "days_since_injury" => Ok(MetricKey::DaysSinceInjury),
            "riskFactor" | "risk_factor" => Ok(MetricKey::RiskFactor),
            _ => Err(format!("Unknown metric: {}", s)),
        }
    }
}

/// Inclusive range rule for a single metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricRule {
    /// Minimum acceptable value (inclusive)
    pub min: f64,

    /// Maximum acceptable value (inclusive)
    pub max: f64,

    /// Advisory message shown when the value falls outside the range
    pub message: &'static str,
}

impl MetricRule {
    /// Check if value is within this rule's range
    pub fn is_valid(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

const DURATION_RULE: MetricRule = MetricRule {
    min: 20.0,
    max: 180.0,
    message: "Session duration must be between 20 and 180 minutes",
};

const RPE_RULE: MetricRule = MetricRule {
    min: 1.0,
    max: 10.0,
    message: "RPE must be between 1 and 10",
};

const RESTING_HR_RULE: MetricRule = MetricRule {
    min: 35.0,
    max: 90.0,
    message: "Resting heart rate must be between 35 and 90 bpm",
};

const HRV_RULE: MetricRule = MetricRule {
    min: 20.0,
    max: 130.0,
    message: "HRV must be between 20 and 130 ms",
};

const SLEEP_HOURS_RULE: MetricRule = MetricRule {
    min: 0.0,
    max: 24.0,
    message: "Sleep hours must be between 0 and 24",
};

const SLEEP_QUALITY_RULE: MetricRule = MetricRule {
    min: 0.0,
    max: 1.0,
    message: "Sleep quality must be between 0 and 1",
};

const ACWR_RULE: MetricRule = MetricRule {
    min: 0.3,
    max: 3.0,
    message: "ACWR must be between 0.3 and 3.0",
};

const DAYS_SINCE_INJURY_RULE: MetricRule = MetricRule {
    min: 0.0,
    max: 365.0,
    message: "Days since injury must be between 0 and 365",
};

const RISK_FACTOR_RULE: MetricRule = MetricRule {
    min: 0.0,
    max: 100.0,
    message: "Risk factor must be between 0 and 100",
};

/// Outcome of a single validation call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub message: Option<String>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            message: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            message: Some(message.into()),
        }
    }
}

/// Validate a value against the rule for `key`
pub fn validate(key: MetricKey, value: f64) -> ValidationResult {
    if !value.is_finite() {
        return ValidationResult::invalid(INVALID_NUMBER_MESSAGE);
    }

    let rule = key.rule();
    if rule.is_valid(value) {
        ValidationResult::valid()
    } else {
        ValidationResult::invalid(rule.message)
    }
}

/// Validate by field name. Names without a registered rule always pass.
pub fn validate_named(field: &str, value: f64) -> ValidationResult {
    match field.parse::<MetricKey>() {
        Ok(key) => validate(key, value),
        Err(_) => ValidationResult::valid(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpe_bounds() {
        assert!(validate(MetricKey::Rpe, 1.0).is_valid);
        assert!(validate(MetricKey::Rpe, 10.0).is_valid);
        assert!(validate(MetricKey::Rpe, 5.5).is_valid);

        for value in [0.0, 11.0] {
            let result = validate(MetricKey::Rpe, value);
            assert!(!result.is_valid);
            assert_eq!(result.message.as_deref(), Some("RPE must be between 1 and 10"));
        }
    }

    #[test]
    fn test_inclusive_bounds_for_every_rule() {
        for key in MetricKey::ALL {
            let rule = key.rule();
            assert!(validate(key, rule.min).is_valid, "{} min", key);
            assert!(validate(key, rule.max).is_valid, "{} max", key);
            assert!(!validate(key, rule.max + 0.01).is_valid, "{} above max", key);
            assert!(!validate(key, rule.min - 0.01).is_valid, "{} below min", key);
        }
    }

    #[test]
    fn test_acwr_fractional_bounds() {
        assert!(validate(MetricKey::Acwr, 0.3).is_valid);
        assert!(!validate(MetricKey::Acwr, 0.29).is_valid);
        assert!(validate(MetricKey::Acwr, 3.0).is_valid);
    }

    #[test]
    fn test_nan_is_rejected() {
        let result = validate(MetricKey::Hrv, f64::NAN);
        assert!(!result.is_valid);
        assert_eq!(result.message.as_deref(), Some(INVALID_NUMBER_MESSAGE));

        assert!(!validate(MetricKey::Duration, f64::INFINITY).is_valid);
    }

    #[test]
    fn test_unknown_field_always_valid() {
        assert_eq!(validate_named("bodyWeight", -5000.0), ValidationResult::valid());
        assert!(!validate_named("restingHr", 20.0).is_valid);
        assert!(!validate_named("resting_hr", 20.0).is_valid);
    }
}
