use crate::models::{Location, WeatherSample};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when talking to the weather provider
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    main: MainBlock,
    wind: WindBlock,
    #[serde(default)]
    rain: Option<RainBlock>,
}

#[derive(Debug, Deserialize)]
struct RainOnly {
    #[serde(default)]
    rain: Option<RainBlock>,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct WindBlock {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct RainBlock {
    #[serde(rename = "1h", default)]
    one_hour: f64,
}

fn last_hour(rain: Option<RainBlock>) -> f64 {
    rain.map(|r| r.one_hour).unwrap_or(0.0)
}

/// OpenWeatherMap current-conditions client
pub struct WeatherClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl WeatherClient {
    pub fn new(base_url: String, api_key: String, client: Client) -> Self {
        Self { base_url, api_key, client }
    }

    /// Temperature, humidity, wind and last-hour rainfall at a point
    pub async fn current(&self, location: Location) -> Result<WeatherSample, WeatherError> {
        let conditions: CurrentConditions = self.fetch(location).await?;

        Ok(WeatherSample {
            temperature: conditions.main.temp,
            humidity: conditions.main.humidity,
            wind_speed: conditions.wind.speed,
            rainfall: last_hour(conditions.rain),
        })
    }

    /// Last-hour rainfall in mm, 0 when the provider reports none
    pub async fn rainfall(&self, location: Location) -> Result<f64, WeatherError> {
        let conditions: RainOnly = self.fetch(location).await?;
        Ok(last_hour(conditions.rain))
    }

    async fn fetch<T: DeserializeOwned>(&self, location: Location) -> Result<T, WeatherError> {
        let url = format!("{}/data/2.5/weather", self.base_url.trim_end_matches('/'));

        tracing::debug!("Fetching weather for ({}, {})", location.lat, location.lon);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", location.lat.to_string()),
                ("lon", location.lon.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Weather request failed: {} - {}", status, body);
            return Err(WeatherError::ApiError(format!("Failed to fetch weather: {}", status)));
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| WeatherError::InvalidResponse(format!("Failed to parse weather: {}", e)))
    }
}
