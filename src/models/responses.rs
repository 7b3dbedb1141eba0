use serde::{Deserialize, Serialize};

/// Wildfire label derived from the blended probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FireRisk {
    #[serde(rename = "signs of fire")]
    SignsOfFire,
    #[serde(rename = "No signs of fire")]
    NoSignsOfFire,
}

/// Landslide label derived from the classifier output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LandslideRisk {
    #[serde(rename = "High Risk")]
    High,
    #[serde(rename = "Low Risk")]
    Low,
}

/// Response for the wildfire endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WildfireAssessment {
    /// `[lat, lon]`
    pub location: [f64; 2],
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub rainfall: f64,
    pub cnn_prediction: f64,
    pub xgb_prediction: f64,
    pub final_prob: f64,
    pub risk_level: FireRisk,
}

/// Response for the landslide endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandslideAssessment {
    pub rainfall: f64,
    pub soil_saturation: f64,
    pub slope_angle: f64,
    /// 1 when a qualifying earthquake was reported, else 0
    pub earthquake_activity: u8,
    pub risk: LandslideRisk,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
