//! Hazard Risk - wildfire and landslide risk scoring service
//!
//! Each assessment pulls live satellite, weather and seismic data for a
//! coordinate and runs it through pre-trained classifiers loaded at start-up.

pub mod config;
pub mod core;
pub mod inference;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{WildfireAssessor, LandslideAssessor, RiskError};
pub use crate::inference::{ModelSet, ImageClassifier, TabularClassifier, FeatureScaler};
pub use crate::models::{Location, LocationRequest, WildfireAssessment, LandslideAssessment};
