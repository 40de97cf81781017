//! Remote risk-prediction boundary
//!
//! The prediction model runs as a separate HTTP service. The client posts an
//! [`ExportRecord`] and expects a seven-day risk label plus confidence back.
//! There is no retry: failures are returned to the caller, and anything
//! already written locally stays written.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::PredictorSettings;
use crate::error::PredictionError;
use crate::export::ExportRecord;

/// Response from the prediction service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub next_7_days_predicted_risk: String,
    pub confidence: f64,
    #[serde(default)]
    pub athlete_id: Option<u32>,
    #[serde(default)]
    pub status: Option<String>,
}

#[async_trait]
pub trait RiskPredictor: Send + Sync {
    async fn predict(&self, record: &ExportRecord) -> Result<Prediction, PredictionError>;
}

/// reqwest-backed client for the prediction service
pub struct HttpPredictor {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpPredictor {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, PredictionError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PredictionError::Transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_settings(settings: &PredictorSettings) -> Result<Self, PredictionError> {
        if !settings.enabled {
            return Err(PredictionError::Disabled);
        }
        Self::new(settings.endpoint.clone(), Duration::from_secs(settings.timeout_secs))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RiskPredictor for HttpPredictor {
    async fn predict(&self, record: &ExportRecord) -> Result<Prediction, PredictionError> {
        tracing::info!(endpoint = %self.endpoint, athlete_id = record.athlete_id, "Requesting risk prediction");

        let response = self
            .client
            .post(&self.endpoint)
            .json(record)
            .send()
            .await
            .map_err(|e| PredictionError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Prediction service rejected request");
            return Err(PredictionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| PredictionError::Transport(e.to_string()))?;
        let prediction: Prediction =
            serde_json::from_str(&body).map_err(|e| PredictionError::Parse(e.to_string()))?;

        tracing::info!(
            risk = %prediction.next_7_days_predicted_risk,
            confidence = prediction.confidence,
            "Prediction received"
        );
        Ok(prediction)
    }
}
