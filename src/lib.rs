// Library interface for RiskRadar modules
// This allows integration tests to access the core functionality

pub mod cns;
pub mod config;
pub mod error;
pub mod export;
pub mod history;
pub mod logging;
pub mod models;
pub mod predictor;
pub mod risk;
pub mod sensor;
pub mod sleep;
pub mod store;
pub mod tracker;
pub mod trends;
pub mod validation;

// Re-export commonly used types for convenience
pub use cns::{score_cns, CnsResult, FatigueLevel, TapSession};
pub use config::AppConfig;
pub use error::{Result, RiskRadarError};
pub use export::{build_export, ExportRecord, DEFAULT_ATHLETE_ID};
pub use history::{HistoryEntry, HistoryLog, MetricCategory};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use models::{AthleteProfile, AthleteType};
pub use predictor::{HttpPredictor, Prediction, RiskPredictor};
pub use risk::{
    compute_risk, interpret, risk_factor_analysis, AthleteMetricSnapshot, PartialSnapshot,
    RiskInterpretation, RiskLevel,
};
pub use sleep::score_sleep;
pub use store::{KeyValueStore, MemoryStore, SqliteStore, WellnessStore};
pub use tracker::Tracker;
pub use validation::{validate, validate_named, MetricKey, ValidationResult};
