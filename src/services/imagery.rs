use crate::models::{BoundingBox, Scene};
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

/// Visible-light assets rendered for the classifier, in RGB order
pub const VISIBLE_BANDS: [&str; 3] = ["red", "green", "blue"];

/// Reflectance range stretched onto 0..255
pub const RESCALE_RANGE: (u32, u32) = (0, 3000);

/// Ground resolution of the rendered thumbnail
pub const RENDER_SCALE_M: f64 = 50.0;

/// Errors that can occur when searching or rendering imagery
#[derive(Debug, Error)]
pub enum ImageryError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Failed to decode image: {0}")]
    DecodeError(#[from] image::ImageError),
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    features: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    id: String,
    #[serde(default)]
    collection: Option<String>,
    #[serde(default)]
    properties: ItemProperties,
    #[serde(default)]
    links: Vec<Link>,
}

#[derive(Debug, Default, Deserialize)]
struct ItemProperties {
    #[serde(default)]
    datetime: Option<DateTime<Utc>>,
    #[serde(rename = "eo:cloud_cover", default)]
    cloud_cover: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Link {
    rel: String,
    href: String,
}

/// STAC scene search plus a tiler that renders scenes to PNG
pub struct ImageryClient {
    search_url: String,
    render_url: String,
    collection: String,
    max_cloud_cover: Option<f64>,
    client: Client,
}

impl ImageryClient {
    pub fn new(
        search_url: String,
        render_url: String,
        collection: String,
        max_cloud_cover: Option<f64>,
        client: Client,
    ) -> Self {
        Self {
            search_url,
            render_url,
            collection,
            max_cloud_cover,
            client,
        }
    }

    /// Most recent scene intersecting `bbox` between `start` and `end`, if any
    pub async fn latest_scene(
        &self,
        bbox: &BoundingBox,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<Scene>, ImageryError> {
        let url = format!("{}/search", self.search_url.trim_end_matches('/'));

        let mut body = json!({
            "collections": [self.collection],
            "bbox": bbox.as_array(),
            "datetime": format!("{}T00:00:00Z/{}T00:00:00Z", start, end),
            "sortby": [{"field": "properties.datetime", "direction": "desc"}],
            "limit": 1,
        });
        if let (Some(max), Some(obj)) = (self.max_cloud_cover, body.as_object_mut()) {
            obj.insert("query".to_string(), json!({"eo:cloud_cover": {"lt": max}}));
        }

        tracing::debug!("Searching {} scenes in {:?}", self.collection, bbox.as_array());

        let response = self.client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Scene search failed: {} - {}", status, text);
            return Err(ImageryError::ApiError(format!("Failed to search scenes: {}", status)));
        }

        let json: Value = response.json().await?;
        let search: SearchResponse = serde_json::from_value(json)
            .map_err(|e| ImageryError::InvalidResponse(format!("Failed to parse search results: {}", e)))?;

        // Servers without sortby support still return a page, so pick the newest ourselves
        let scene = search
            .features
            .into_iter()
            .max_by_key(|item| item.properties.datetime)
            .map(|item| Scene {
                self_href: item.links.iter().find(|l| l.rel == "self").map(|l| l.href.clone()),
                collection: item.collection.unwrap_or_else(|| self.collection.clone()),
                datetime: item.properties.datetime,
                cloud_cover: item.properties.cloud_cover,
                id: item.id,
            });

        Ok(scene)
    }

    /// PNG URL rendering the visible bands of `scene` over `bbox`
    pub fn render_url(&self, scene: &Scene, bbox: &BoundingBox) -> Result<String, ImageryError> {
        let item_href = scene
            .self_href
            .as_deref()
            .ok_or_else(|| ImageryError::InvalidResponse(format!("Scene {} has no self link", scene.id)))?;

        let (width, height) = thumbnail_dimensions(bbox);
        let [west, south, east, north] = bbox.as_array();
        let assets: String = VISIBLE_BANDS.iter().map(|b| format!("&assets={}", b)).collect();

        Ok(format!(
            "{}/stac/bbox/{},{},{},{}/{}x{}.png?url={}{}&rescale={},{}",
            self.render_url.trim_end_matches('/'),
            west,
            south,
            east,
            north,
            width,
            height,
            urlencoding::encode(item_href),
            assets,
            RESCALE_RANGE.0,
            RESCALE_RANGE.1,
        ))
    }

    /// Download a rendered image
    pub async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, ImageryError> {
        tracing::debug!("Downloading rendered scene: {}", url);

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(ImageryError::ApiError(format!(
                "Failed to render scene: {}",
                response.status()
            )));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

/// Pixel size covering `bbox` at the fixed render scale
pub fn thumbnail_dimensions(bbox: &BoundingBox) -> (u32, u32) {
    let (width_m, height_m) = bbox.extent_m();
    let px = |metres: f64| ((metres / RENDER_SCALE_M).round() as u32).max(1);
    (px(width_m), px(height_m))
}
