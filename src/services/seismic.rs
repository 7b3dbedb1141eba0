use crate::models::SeismicEvent;
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when querying the seismic provider
#[derive(Debug, Error)]
pub enum SeismicError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    properties: Properties,
}

#[derive(Debug, Deserialize)]
struct Properties {
    #[serde(default)]
    place: Option<String>,
    #[serde(default)]
    mag: Option<f64>,
    /// Milliseconds since the epoch
    #[serde(default)]
    time: Option<i64>,
}

impl Feature {
    fn into_event(self) -> SeismicEvent {
        let props = self.properties;
        SeismicEvent {
            place: props.place,
            magnitude: props.mag,
            time: props.time.and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        }
    }
}

/// USGS FDSN event service client
pub struct SeismicClient {
    base_url: String,
    client: Client,
}

impl SeismicClient {
    pub fn new(base_url: String, client: Client) -> Self {
        Self { base_url, client }
    }

    /// Events at or above `min_magnitude` since `since`, anywhere in the world
    pub async fn recent_events(
        &self,
        min_magnitude: f64,
        since: DateTime<Utc>,
    ) -> Result<Vec<SeismicEvent>, SeismicError> {
        let url = format!("{}/fdsnws/event/1/query", self.base_url.trim_end_matches('/'));
        let start = since.to_rfc3339_opts(SecondsFormat::Secs, true);

        tracing::debug!("Querying seismic events >= M{} since {}", min_magnitude, start);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("format", "geojson".to_string()),
                ("minmagnitude", min_magnitude.to_string()),
                ("starttime", start),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SeismicError::ApiError(format!(
                "Failed to query events: {}",
                response.status()
            )));
        }

        let body = response.text().await?;
        let collection: FeatureCollection = serde_json::from_str(&body)
            .map_err(|e| SeismicError::InvalidResponse(format!("Failed to parse events: {}", e)))?;

        let events: Vec<SeismicEvent> = collection.features.into_iter().map(Feature::into_event).collect();

        tracing::debug!("Seismic provider returned {} events", events.len());

        Ok(events)
    }
}
