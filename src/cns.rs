//! CNS fatigue tap test
//!
//! The tap test counts how many times an athlete can tap in a fixed
//! 10-second window. Motor speed drops when the central nervous system is
//! fatigued, so the count is mapped linearly onto a 1-10 readiness score.
//! A healthy athlete is expected to land in the 40-60 taps range.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

use crate::risk::round_half_up;

/// Length of a tap test window
pub const TAP_TEST_DURATION: Duration = Duration::from_secs(10);

/// Qualitative fatigue level derived from the CNS score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FatigueLevel {
    High,
    Moderate,
    Low,
}

impl fmt::Display for FatigueLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FatigueLevel::High => write!(f, "high"),
            FatigueLevel::Moderate => write!(f, "moderate"),
            FatigueLevel::Low => write!(f, "low"),
        }
    }
}

/// Result of a completed tap test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CnsResult {
    /// Readiness score (1-10, higher is fresher)
    pub score: u8,

    /// Training recommendation for this score
    pub interpretation: String,

    /// Qualitative fatigue level
    pub fatigue_level: FatigueLevel,
}

/// Score a tap count
///
/// `raw = round((taps - 20) / 60 * 10)`, clamped to 1..=10.
pub fn score_cns(tap_count: u32) -> CnsResult {
    let raw = round_half_up((tap_count as f64 - 20.0) / 60.0 * 10.0);
    let score = raw.clamp(1.0, 10.0) as u8;

    let (fatigue_level, interpretation) = match score {
        0..=3 => (FatigueLevel::High, "High Fatigue - Consider rest day"),
        4..=6 => (
            FatigueLevel::Moderate,
            "Moderate Fatigue - Light training recommended",
        ),
        _ => (FatigueLevel::Low, "Low Fatigue - Good to train"),
    };

    CnsResult {
        score,
        interpretation: interpretation.to_string(),
        fatigue_level,
    }
}

/// A running tap test
///
/// The window opens at construction. Taps are recorded with the instant
/// they happened so the session can be driven by a real clock or by tests.
#[derive(Debug, Clone)]
pub struct TapSession {
    started_at: Instant,
    window: Duration,
    taps: u32,
}

impl TapSession {
    /// Start a standard 10-second session
    pub fn start() -> Self {
        Self::starting_at(Instant::now(), TAP_TEST_DURATION)
    }

    /// Start a session at a known instant with a custom window
    pub fn starting_at(started_at: Instant, window: Duration) -> Self {
        Self {
            started_at,
            window,
            taps: 0,
        }
    }

    /// Instant at which the window closes
    pub fn deadline(&self) -> Instant {
        self.started_at + self.window
    }

    /// Record a tap. Returns false when the tap landed after the deadline.
    pub fn record_tap(&mut self, at: Instant) -> bool {
        if at > self.deadline() {
            return false;
        }
        self.taps += 1;
        true
    }

    pub fn taps(&self) -> u32 {
        self.taps
    }

    /// Time left in the window, zero once it has closed
    pub fn remaining(&self, now: Instant) -> Duration {
        self.deadline().saturating_duration_since(now)
    }

    /// Close the session and score it
    pub fn finish(self) -> CnsResult {
        tracing::debug!(taps = self.taps, "Tap test finished");
        score_cns(self.taps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_healthy_range_is_moderate_to_low() {
        let result = score_cns(50);
        assert_eq!(result.score, 5);
        assert_eq!(result.fatigue_level, FatigueLevel::Moderate);
        assert_eq!(
            result.interpretation,
            "Moderate Fatigue - Light training recommended"
        );

        assert_eq!(score_cns(62).score, 7);
        assert_eq!(score_cns(62).fatigue_level, FatigueLevel::Low);
    }

    #[test]
    fn test_low_tap_count_clamps_to_one() {
        let result = score_cns(10);
        assert_eq!(result.score, 1);
        assert_eq!(result.fatigue_level, FatigueLevel::High);
        assert_eq!(result.interpretation, "High Fatigue - Consider rest day");

        assert_eq!(score_cns(0).score, 1);
    }

    #[test]
    fn test_high_tap_count_clamps_to_ten() {
        let result = score_cns(100);
        assert_eq!(result.score, 10);
        assert_eq!(result.fatigue_level, FatigueLevel::Low);
        assert_eq!(result.interpretation, "Low Fatigue - Good to train");
    }

    #[test]
    fn test_level_boundaries() {
        // 38 taps -> 3, 44 taps -> 4
        assert_eq!(score_cns(38).fatigue_level, FatigueLevel::High);
        assert_eq!(score_cns(44).fatigue_level, FatigueLevel::Moderate);
        // 56 taps -> 6, 62 taps -> 7
        assert_eq!(score_cns(56).fatigue_level, FatigueLevel::Moderate);
        assert_eq!(score_cns(62).fatigue_level, FatigueLevel::Low);
    }

    #[test]
    fn test_tap_session_ignores_late_taps() {
        let start = Instant::now();
        let mut session = TapSession::starting_at(start, Duration::from_secs(10));

        for i in 0..50 {
            assert!(session.record_tap(start + Duration::from_millis(i * 100)));
        }
        assert!(!session.record_tap(start + Duration::from_secs(11)));
        assert_eq!(session.taps(), 50);
        assert_eq!(session.remaining(start + Duration::from_secs(12)), Duration::ZERO);

        assert_eq!(session.finish().score, 5);
    }
}
