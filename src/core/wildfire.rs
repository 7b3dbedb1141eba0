use chrono::NaiveDate;
use std::sync::Arc;

use crate::core::error::RiskError;
use crate::core::imaging::ImageTensor;
use crate::inference::{ImageClassifier, ModelSet, TabularClassifier};
use crate::models::{BoundingBox, FireRisk, Location, WeatherSample, WildfireAssessment};
use crate::services::{ImageryClient, ImageryError, WeatherClient};

/// Weight of the image classifier in the blended probability
pub const IMAGE_WEIGHT: f64 = 0.6;

/// Weight of the weather classifier in the blended probability
pub const WEATHER_WEIGHT: f64 = 0.4;

/// Blended probability above which fire is reported
pub const FIRE_THRESHOLD: f64 = 0.5;

/// Acquisition window the image classifier was calibrated against
pub fn imagery_window() -> (NaiveDate, NaiveDate) {
    let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap_or(NaiveDate::MIN);
    let end = NaiveDate::from_ymd_opt(2024, 3, 24).unwrap_or(NaiveDate::MIN);
    (start, end)
}

/// Fixed-weight combination of the two model scores
#[inline]
pub fn blend(image_score: f64, weather_score: f64) -> f64 {
    IMAGE_WEIGHT * image_score + WEATHER_WEIGHT * weather_score
}

#[inline]
pub fn classify_fire(final_prob: f64) -> FireRisk {
    if final_prob > FIRE_THRESHOLD {
        FireRisk::SignsOfFire
    } else {
        FireRisk::NoSignsOfFire
    }
}

/// Wildfire pipeline: satellite scene + current weather -> blended probability
///
/// # Pipeline Stages
/// 1. Fixed 0.3° bounding box around the point
/// 2. Newest scene in the imagery window, rendered and scored by the image model
/// 3. Current weather scored by the tabular model (runs alongside stage 2)
/// 4. 60/40 blend and threshold
#[derive(Clone)]
pub struct WildfireAssessor {
    imagery: Arc<ImageryClient>,
    weather: Arc<WeatherClient>,
    image_model: Arc<dyn ImageClassifier>,
    weather_model: Arc<dyn TabularClassifier>,
}

impl WildfireAssessor {
    pub fn new(imagery: Arc<ImageryClient>, weather: Arc<WeatherClient>, models: &ModelSet) -> Self {
        Self {
            imagery,
            weather,
            image_model: Arc::clone(&models.fire_image),
            weather_model: Arc::clone(&models.fire_weather),
        }
    }

    pub async fn assess(&self, location: Location) -> Result<WildfireAssessment, RiskError> {
        let bbox = location.bounding_box();

        let (cnn_prediction, sample) =
            tokio::try_join!(self.image_score(&bbox), self.current_weather(location))?;

        let xgb_prediction = self.weather_model.predict_proba(&sample.features())?;
        let final_prob = blend(cnn_prediction, xgb_prediction);
        let risk_level = classify_fire(final_prob);

        tracing::info!(
            "Wildfire assessment: cnn={:.4}, xgb={:.4}, final={:.4}, risk={:?}",
            cnn_prediction,
            xgb_prediction,
            final_prob,
            risk_level
        );

        Ok(WildfireAssessment {
            location: [location.lat, location.lon],
            temperature: sample.temperature,
            humidity: sample.humidity,
            wind_speed: sample.wind_speed,
            rainfall: sample.rainfall,
            cnn_prediction,
            xgb_prediction,
            final_prob,
            risk_level,
        })
    }

    async fn image_score(&self, bbox: &BoundingBox) -> Result<f64, RiskError> {
        let (start, end) = imagery_window();
        let scene = self
            .imagery
            .latest_scene(bbox, start, end)
            .await?
            .ok_or(RiskError::NoImagery)?;

        tracing::debug!("Using scene {} acquired {:?}", scene.id, scene.datetime);

        let url = self.imagery.render_url(&scene, bbox)?;
        let bytes = self.imagery.fetch_image(&url).await?;

        // Decode, resample and the forward pass are CPU bound
        let model = Arc::clone(&self.image_model);
        tokio::task::spawn_blocking(move || -> Result<f64, RiskError> {
            let tensor = ImageTensor::from_encoded(&bytes).map_err(ImageryError::from)?;
            Ok(model.predict(&tensor)?)
        })
        .await?
    }

    async fn current_weather(&self, location: Location) -> Result<WeatherSample, RiskError> {
        Ok(self.weather.current(location).await?)
    }
}
