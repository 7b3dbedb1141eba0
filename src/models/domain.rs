use chrono::{DateTime, Utc};
use geo::{coord, HaversineDistance, Point, Rect};
use serde::{Deserialize, Serialize};

/// Fixed padding in degrees applied on every side of a location
pub const BOUNDING_BOX_PADDING_DEG: f64 = 0.3;

/// Point of interest for a risk assessment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Bounding box padded by a fixed 0.3° around the point
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::around(self, BOUNDING_BOX_PADDING_DEG)
    }
}

/// Geographic query region
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    rect: Rect<f64>,
}

impl BoundingBox {
    pub fn around(location: &Location, padding_deg: f64) -> Self {
        let rect = Rect::new(
            coord! { x: location.lon - padding_deg, y: location.lat - padding_deg },
            coord! { x: location.lon + padding_deg, y: location.lat + padding_deg },
        );
        Self { rect }
    }

    pub fn min_lat(&self) -> f64 {
        self.rect.min().y
    }

    pub fn max_lat(&self) -> f64 {
        self.rect.max().y
    }

    pub fn min_lon(&self) -> f64 {
        self.rect.min().x
    }

    pub fn max_lon(&self) -> f64 {
        self.rect.max().x
    }

    /// `[west, south, east, north]`, the order STAC and most tilers expect
    pub fn as_array(&self) -> [f64; 4] {
        [self.min_lon(), self.min_lat(), self.max_lon(), self.max_lat()]
    }

    /// Ground extent `(width, height)` in metres, measured through the box center
    pub fn extent_m(&self) -> (f64, f64) {
        let center = self.rect.center();
        let west = Point::new(self.min_lon(), center.y);
        let east = Point::new(self.max_lon(), center.y);
        let south = Point::new(center.x, self.min_lat());
        let north = Point::new(center.x, self.max_lat());

        (west.haversine_distance(&east), south.haversine_distance(&north))
    }
}

/// Current conditions at a point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    /// Celsius
    pub temperature: f64,
    /// Percent
    pub humidity: f64,
    /// m/s
    pub wind_speed: f64,
    /// Last-hour accumulation in mm
    pub rainfall: f64,
}

impl WeatherSample {
    /// Feature order the fire weather classifier was trained on
    pub fn features(&self) -> [f64; 4] {
        [self.temperature, self.humidity, self.wind_speed, self.rainfall]
    }
}

/// Earthquake reported by the seismic provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeismicEvent {
    pub place: Option<String>,
    pub magnitude: Option<f64>,
    pub time: Option<DateTime<Utc>>,
}

impl SeismicEvent {
    /// Case-insensitive substring match on the place description
    pub fn is_near(&self, place_name: &str) -> bool {
        let needle = place_name.to_lowercase();
        self.place
            .as_deref()
            .map(|place| place.to_lowercase().contains(&needle))
            .unwrap_or(false)
    }
}

/// Satellite scene returned by the imagery search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: String,
    pub collection: String,
    pub datetime: Option<DateTime<Utc>>,
    pub cloud_cover: Option<f64>,
    /// Canonical item URL handed to the render service
    pub self_href: Option<String>,
}
