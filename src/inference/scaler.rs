use serde::Deserialize;

use crate::inference::{FeatureScaler, InferenceError};

/// Feature transform fitted at training time
///
/// Mirrors scikit-learn's `StandardScaler` (`(x - mean_) / scale_`) and
/// `MinMaxScaler` (`x * scale_ + min_`).
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scaler {
    Standard { mean: Vec<f64>, scale: Vec<f64> },
    MinMax { min: Vec<f64>, scale: Vec<f64> },
}

impl Scaler {
    pub fn from_json(json: &str) -> Result<Self, InferenceError> {
        let scaler: Self = serde_json::from_str(json)?;
        let (offsets, scale) = match &scaler {
            Scaler::Standard { mean, scale } => (mean, scale),
            Scaler::MinMax { min, scale } => (min, scale),
        };

        if offsets.len() != scale.len() {
            return Err(InferenceError::InvalidModel(format!(
                "scaler has {} offsets but {} scale factors",
                offsets.len(),
                scale.len()
            )));
        }
        if let Scaler::Standard { scale, .. } = &scaler {
            if scale.iter().any(|s| *s == 0.0) {
                return Err(InferenceError::InvalidModel("standard scaler has a zero scale".into()));
            }
        }

        Ok(scaler)
    }

    pub fn num_features(&self) -> usize {
        match self {
            Scaler::Standard { scale, .. } | Scaler::MinMax { scale, .. } => scale.len(),
        }
    }
}

impl FeatureScaler for Scaler {
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, InferenceError> {
        if features.len() != self.num_features() {
            return Err(InferenceError::Shape {
                expected: self.num_features(),
                actual: features.len(),
            });
        }

        let scaled = match self {
            Scaler::Standard { mean, scale } => features
                .iter()
                .zip(mean.iter().zip(scale))
                .map(|(x, (m, s))| (x - m) / s)
                .collect(),
            Scaler::MinMax { min, scale } => features
                .iter()
                .zip(min.iter().zip(scale))
                .map(|(x, (m, s))| x * s + m)
                .collect(),
        };
        Ok(scaled)
    }
}
