use chrono::{Duration, Utc};
use std::sync::Arc;

use crate::core::error::RiskError;
use crate::inference::{FeatureScaler, ModelSet, TabularClassifier};
use crate::models::{LandslideAssessment, LandslideRisk, Location, SeismicEvent};
use crate::services::{SeismicClient, WeatherClient};

/// Rainfall in mm at which the soil is treated as saturated
pub const SATURATION_RAINFALL_MM: f64 = 100.0;

/// Terrain slope fed to the classifier; no elevation source is consulted
pub const SLOPE_ANGLE_DEG: f64 = 30.0;

/// Smallest earthquake that counts as seismic activity
pub const MIN_MAGNITUDE: f64 = 4.0;

/// How far back seismic events are considered
pub const SEISMIC_LOOKBACK_HOURS: i64 = 24;

/// Place-name fragment an event must mention to count
pub const WATCHED_PLACE: &str = "erode";

/// Classifier output above which risk is reported as high
pub const LANDSLIDE_THRESHOLD: f64 = 0.6;

/// Linear saturation estimate, capped at 1
#[inline]
pub fn soil_saturation(rainfall_mm: f64) -> f64 {
    (rainfall_mm / SATURATION_RAINFALL_MM).min(1.0)
}

/// Whether any event mentions the watched place
pub fn earthquake_activity(events: &[SeismicEvent]) -> bool {
    events.iter().any(|event| event.is_near(WATCHED_PLACE))
}

#[inline]
pub fn classify_landslide(output: f64) -> LandslideRisk {
    if output > LANDSLIDE_THRESHOLD {
        LandslideRisk::High
    } else {
        LandslideRisk::Low
    }
}

/// Raw features in training order: rainfall, slope, saturation, seismic flag
pub fn landslide_features(rainfall_mm: f64, saturation: f64, seismic: bool) -> [f64; 4] {
    [rainfall_mm, SLOPE_ANGLE_DEG, saturation, if seismic { 1.0 } else { 0.0 }]
}

/// Landslide pipeline: rainfall + seismic signal -> scaled features -> classifier
#[derive(Clone)]
pub struct LandslideAssessor {
    weather: Arc<WeatherClient>,
    seismic: Arc<SeismicClient>,
    model: Arc<dyn TabularClassifier>,
    scaler: Arc<dyn FeatureScaler>,
}

impl LandslideAssessor {
    pub fn new(weather: Arc<WeatherClient>, seismic: Arc<SeismicClient>, models: &ModelSet) -> Self {
        Self {
            weather,
            seismic,
            model: Arc::clone(&models.landslide),
            scaler: Arc::clone(&models.landslide_scaler),
        }
    }

    pub async fn assess(&self, location: Location) -> Result<LandslideAssessment, RiskError> {
        let since = Utc::now() - Duration::hours(SEISMIC_LOOKBACK_HOURS);

        let (rainfall, events) = tokio::try_join!(
            async { Ok::<_, RiskError>(self.weather.rainfall(location).await?) },
            async { Ok::<_, RiskError>(self.seismic.recent_events(MIN_MAGNITUDE, since).await?) },
        )?;

        let saturation = soil_saturation(rainfall);
        let seismic = earthquake_activity(&events);

        let scaled = self.scaler.transform(&landslide_features(rainfall, saturation, seismic))?;
        let output = self.model.predict_proba(&scaled)?;
        let risk = classify_landslide(output);

        tracing::info!(
            "Landslide assessment: risk={:?}, rainfall={}, saturation={}, earthquake_activity={}, output={:.4}",
            risk,
            rainfall,
            saturation,
            seismic,
            output
        );

        Ok(LandslideAssessment {
            rainfall,
            soil_saturation: saturation,
            slope_angle: SLOPE_ANGLE_DEG,
            earthquake_activity: u8::from(seismic),
            risk,
        })
    }
}
