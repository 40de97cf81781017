//! Unified error hierarchy for RiskRadar
//!
//! Field-level validation failures, persistence problems, remote prediction
//! failures and export errors all surface through [`RiskRadarError`]. None of
//! them are fatal: every variant describes a local, recoverable condition.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all RiskRadar operations
#[derive(Debug, Error)]
pub enum RiskRadarError {
    /// A submitted metric failed its range check
    #[error("Validation error in {field}: {message}")]
    Validation { field: String, message: String },

    /// Key-value store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Remote prediction service errors
    #[error("Prediction error: {0}")]
    Prediction(#[from] PredictionError),

    /// Export errors
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Persistence errors raised by a key-value store backend
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite backend failure
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A slot value could not be encoded or decoded
    #[error("Serialization error in slot {slot}: {reason}")]
    Serialization { slot: String, reason: String },

    /// Backend could not be opened
    #[error("Store unavailable at {path}: {reason}")]
    Unavailable { path: PathBuf, reason: String },
}

/// Failures talking to the remote risk-prediction service
#[derive(Debug, Error)]
pub enum PredictionError {
    /// Connection, timeout or other transport failure
    #[error("Transport failure: {0}")]
    Transport(String),

    /// Service answered with a non-success status
    #[error("Service returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body did not have the expected shape
    #[error("Malformed response: {0}")]
    Parse(String),

    /// Prediction is switched off in configuration
    #[error("Remote prediction is disabled")]
    Disabled,
}

/// Export errors
#[derive(Debug, Error)]
pub enum ExportError {
    /// Unsupported output format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Serialization failure
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Writing the output failed
    #[error("Export failed to {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },
}

/// Result type alias for RiskRadar operations
pub type Result<T> = std::result::Result<T, RiskRadarError>;

impl RiskRadarError {
    /// Build a validation error from a field name and its advisory message
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        RiskRadarError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Check if the operation may succeed when repeated by the caller
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RiskRadarError::Prediction(PredictionError::Transport(_)) | RiskRadarError::Io(_)
        )
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            RiskRadarError::Validation { .. } => ErrorSeverity::Warning,
            RiskRadarError::Prediction(PredictionError::Disabled) => ErrorSeverity::Info,
            RiskRadarError::Prediction(_) => ErrorSeverity::Warning,
            RiskRadarError::Store(_) => ErrorSeverity::Error,
            RiskRadarError::Configuration(_) => ErrorSeverity::Error,
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            RiskRadarError::Validation { message, .. } => message.clone(),
            RiskRadarError::Prediction(PredictionError::Disabled) => {
                "Remote prediction is disabled in the configuration.".to_string()
            }
            RiskRadarError::Prediction(_) => {
                "Could not get a prediction from the risk service. Your export was saved locally."
                    .to_string()
            }
            RiskRadarError::Store(StoreError::Unavailable { path, .. }) => {
                format!("Unable to open data store at {}", path.display())
            }
            _ => self.to_string(),
        }
    }

    /// Log at the level matching [`severity`](Self::severity)
    pub fn log(&self, context: &str) {
        let retryable = self.is_retryable();
        match self.severity() {
            ErrorSeverity::Error => tracing::error!(error = %self, retryable, "{}", context),
            ErrorSeverity::Warning => tracing::warn!(error = %self, retryable, "{}", context),
            ErrorSeverity::Info => tracing::info!(error = %self, "{}", context),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Error that prevents the operation but the tool can continue
    Error,
    /// Warning that doesn't prevent other operations
    Warning,
    /// Informational message
    Info,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_severity() {
        let err = RiskRadarError::validation("rpe", "RPE must be between 1 and 10");
        assert_eq!(err.severity(), ErrorSeverity::Warning);

        let err = RiskRadarError::Prediction(PredictionError::Disabled);
        assert_eq!(err.severity(), ErrorSeverity::Info);
    }

    #[test]
    fn test_error_retryable() {
        let err = RiskRadarError::Prediction(PredictionError::Transport("timeout".to_string()));
        assert!(err.is_retryable());

        let err = RiskRadarError::validation("hrv", "out of range");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_user_messages() {
        let err = RiskRadarError::validation("rpe", "RPE must be between 1 and 10");
        assert_eq!(err.user_message(), "RPE must be between 1 and 10");

        let err = RiskRadarError::Prediction(PredictionError::Status {
            status: 500,
            body: "boom".to_string(),
        });
        assert!(err.user_message().contains("saved locally"));
    }
}
