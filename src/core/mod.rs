// Core pipeline exports
pub mod error;
pub mod imaging;
pub mod landslide;
pub mod wildfire;

pub use error::RiskError;
pub use imaging::{ImageTensor, MODEL_INPUT_SIZE};
pub use landslide::{LandslideAssessor, soil_saturation, earthquake_activity, classify_landslide, landslide_features};
pub use wildfire::{WildfireAssessor, blend, classify_fire, imagery_window};
