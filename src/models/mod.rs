// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{Location, BoundingBox, WeatherSample, SeismicEvent, Scene, BOUNDING_BOX_PADDING_DEG};
pub use requests::LocationRequest;
pub use responses::{WildfireAssessment, LandslideAssessment, FireRisk, LandslideRisk, HealthResponse, ErrorResponse};
