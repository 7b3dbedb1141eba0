use actix_web::{error, http::StatusCode, web, HttpResponse, Responder};
use tracing::Instrument;

use crate::core::{LandslideAssessor, RiskError, WildfireAssessor};
use crate::models::{ErrorResponse, HealthResponse, Location, LocationRequest};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub wildfire: WildfireAssessor,
    pub landslide: LandslideAssessor,
}

/// Configure all risk routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/wildfire/predict", web::post().to(predict_wildfire))
        .route("/landslide/predict", web::post().to(predict_landslide));
}

impl error::ResponseError for RiskError {
    fn status_code(&self) -> StatusCode {
        match self {
            RiskError::MissingCoordinates(_) => StatusCode::BAD_REQUEST,
            RiskError::NoImagery => StatusCode::NOT_FOUND,
            RiskError::Weather(_) | RiskError::Seismic(_) | RiskError::Imagery(_) => StatusCode::BAD_GATEWAY,
            RiskError::Inference(_) | RiskError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
        })
    }
}

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

fn require_location(req: &LocationRequest) -> Result<Location, RiskError> {
    req.location().ok_or_else(|| {
        let missing = req.missing_fields();
        tracing::info!("Rejected request with missing coordinates: {:?}", missing);
        RiskError::MissingCoordinates(missing)
    })
}

/// Wildfire risk endpoint
///
/// POST /api/v1/wildfire/predict
///
/// Request body:
/// ```json
/// { "lat": 11.34, "lon": 77.73 }
/// ```
async fn predict_wildfire(
    state: web::Data<AppState>,
    req: web::Json<LocationRequest>,
) -> Result<HttpResponse, RiskError> {
    let location = require_location(&req)?;
    let span = tracing::info_span!("wildfire", request_id = %uuid::Uuid::new_v4());

    async move {
        tracing::info!("Assessing wildfire risk at ({}, {})", location.lat, location.lon);

        match state.wildfire.assess(location).await {
            Ok(assessment) => Ok(HttpResponse::Ok().json(assessment)),
            Err(e) => {
                tracing::error!("Wildfire assessment failed: {}", e);
                Err(e)
            }
        }
    }
    .instrument(span)
    .await
}

/// Landslide risk endpoint
///
/// POST /api/v1/landslide/predict
///
/// Request body:
/// ```json
/// { "lat": 11.34, "lon": 77.73 }
/// ```
async fn predict_landslide(
    state: web::Data<AppState>,
    req: web::Json<LocationRequest>,
) -> Result<HttpResponse, RiskError> {
    let location = require_location(&req)?;
    let span = tracing::info_span!("landslide", request_id = %uuid::Uuid::new_v4());

    async move {
        tracing::info!("Assessing landslide risk at ({}, {})", location.lat, location.lon);

        match state.landslide.assess(location).await {
            Ok(assessment) => Ok(HttpResponse::Ok().json(assessment)),
            Err(e) => {
                tracing::error!("Landslide assessment failed: {}", e);
                Err(e)
            }
        }
    }
    .instrument(span)
    .await
}
