//! Sleep scoring
//!
//! Combines nightly sleep duration with a subjective quality coefficient
//! into a single 0-100 score that feeds the overall risk model.
//!
//! # Sports Science Background
//!
//! Duration is scored with a piecewise table rather than a linear ramp:
//! 7-9 hours is the recommended band for athletes, slightly long sleep is
//! penalized less than short sleep, and anything under 5 hours falls off
//! steeply. Duration contributes 60% of the score and quality 40%.

use crate::risk::round_half_up;

/// Weight of the duration component
pub const HOURS_WEIGHT: f64 = 0.6;

/// Weight of the quality component
pub const QUALITY_WEIGHT: f64 = 0.4;

/// Score sleep duration on the 0-100 piecewise scale
///
/// | hours        | score        |
/// |--------------|--------------|
/// | 7 to 9       | 100          |
/// | 6 to <7      | 80           |
/// | >9 to 10     | 90           |
/// | 5 to <6      | 60           |
/// | >10          | 70           |
/// | <5           | hours * 10, floored at 0 |
pub fn hours_component(hours: f64) -> f64 {
    if (7.0..=9.0).contains(&hours) {
        100.0
    } else if (6.0..7.0).contains(&hours) {
        80.0
    } else if hours > 9.0 && hours <= 10.0 {
        90.0
    } else if (5.0..6.0).contains(&hours) {
        60.0
    } else if hours > 10.0 {
        70.0
    } else {
        (hours * 10.0).max(0.0)
    }
}

/// Compute the 0-100 sleep score
///
/// # Arguments
///
/// * `hours` - Sleep duration in hours
/// * `quality` - Subjective quality coefficient, already validated to [0, 1]
pub fn score_sleep(hours: f64, quality: f64) -> u8 {
    let quality_component = quality * 100.0;
    let weighted = hours_component(hours) * HOURS_WEIGHT + quality_component * QUALITY_WEIGHT;
    round_half_up(weighted).clamp(0.0, 100.0) as u8
}
