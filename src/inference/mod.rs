// Inference exports
pub mod boosted;
pub mod network;
pub mod scaler;

pub use boosted::BoostedTrees;
pub use network::{Activation, DenseLayer, PooledImageClassifier, Sequential};
pub use scaler::Scaler;

use crate::config::ModelSettings;
use crate::core::imaging::ImageTensor;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while loading or running a model
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Failed to read model artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse model artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("Unsupported model: {0}")]
    Unsupported(String),

    #[error("Input shape mismatch: expected {expected} features, got {actual}")]
    Shape { expected: usize, actual: usize },
}

/// Scores a normalized image, returning a probability
pub trait ImageClassifier: Send + Sync {
    fn predict(&self, image: &ImageTensor) -> Result<f64, InferenceError>;
}

/// Scores a feature vector, returning the positive-class probability
pub trait TabularClassifier: Send + Sync {
    fn predict_proba(&self, features: &[f64]) -> Result<f64, InferenceError>;
}

/// Maps raw features onto the distribution a classifier was trained on
pub trait FeatureScaler: Send + Sync {
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, InferenceError>;
}

/// Every model the service needs, loaded once and shared read-only
#[derive(Clone)]
pub struct ModelSet {
    pub fire_image: Arc<dyn ImageClassifier>,
    pub fire_weather: Arc<dyn TabularClassifier>,
    pub landslide: Arc<dyn TabularClassifier>,
    pub landslide_scaler: Arc<dyn FeatureScaler>,
}

impl ModelSet {
    /// Load all artifacts named in the settings
    pub fn load(settings: &ModelSettings) -> Result<Self, InferenceError> {
        let fire_image = PooledImageClassifier::from_json(&read(&settings.fire_image)?)?;
        tracing::info!("Loaded fire image classifier from {}", settings.fire_image.display());

        let fire_weather = BoostedTrees::from_json(&read(&settings.fire_weather)?)?;
        tracing::info!(
            "Loaded fire weather classifier from {} ({} trees)",
            settings.fire_weather.display(),
            fire_weather.num_trees()
        );

        let landslide = Sequential::from_json(&read(&settings.landslide)?)?;
        tracing::info!("Loaded landslide classifier from {}", settings.landslide.display());

        let landslide_scaler = Scaler::from_json(&read(&settings.landslide_scaler)?)?;
        tracing::info!("Loaded landslide scaler from {}", settings.landslide_scaler.display());

        Ok(Self {
            fire_image: Arc::new(fire_image),
            fire_weather: Arc::new(fire_weather),
            landslide: Arc::new(landslide),
            landslide_scaler: Arc::new(landslide_scaler),
        })
    }
}

fn read(path: &Path) -> Result<String, InferenceError> {
    std::fs::read_to_string(path).map_err(|e| {
        InferenceError::Io(std::io::Error::new(e.kind(), format!("{}: {}", path.display(), e)))
    })
}
