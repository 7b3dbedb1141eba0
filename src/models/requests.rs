use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::Location;

/// Body accepted by both prediction endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct LocationRequest {
    #[validate(required)]
    #[serde(default, alias = "latitude")]
    pub lat: Option<f64>,
    #[validate(required)]
    #[serde(default, alias = "longitude")]
    pub lon: Option<f64>,
}

impl LocationRequest {
    /// Names of the required coordinates absent from the request, sorted
    pub fn missing_fields(&self) -> Vec<String> {
        match self.validate() {
            Ok(()) => vec![],
            Err(errors) => {
                let mut fields: Vec<String> = errors
                    .field_errors()
                    .keys()
                    .map(|field| field.to_string())
                    .collect();
                fields.sort();
                fields
            }
        }
    }

    /// Coordinates, or `None` when either one is absent
    pub fn location(&self) -> Option<Location> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(Location::new(lat, lon)),
            _ => None,
        }
    }
}
