use thiserror::Error;

use crate::inference::InferenceError;
use crate::services::{ImageryError, SeismicError, WeatherError};

/// Failure of a risk assessment, by cause
#[derive(Debug, Error)]
pub enum RiskError {
    #[error("Latitude and longitude are required (missing: {})", .0.join(", "))]
    MissingCoordinates(Vec<String>),

    #[error("No imagery available for this location")]
    NoImagery,

    #[error("Weather provider failed: {0}")]
    Weather(#[from] WeatherError),

    #[error("Seismic provider failed: {0}")]
    Seismic(#[from] SeismicError),

    #[error("Imagery provider failed: {0}")]
    Imagery(#[from] ImageryError),

    #[error("Model inference failed: {0}")]
    Inference(#[from] InferenceError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RiskError {
    /// Whether the failure originates in a third-party service
    pub fn is_upstream(&self) -> bool {
        matches!(self, RiskError::Weather(_) | RiskError::Seismic(_) | RiskError::Imagery(_))
    }
}

impl From<tokio::task::JoinError> for RiskError {
    fn from(err: tokio::task::JoinError) -> Self {
        RiskError::Internal(format!("blocking task failed: {}", err))
    }
}
