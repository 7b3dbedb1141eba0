mod config;
mod core;
mod inference;
mod models;
mod routes;
mod services;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer, middleware};
use crate::config::Settings;
use crate::core::{LandslideAssessor, WildfireAssessor};
use crate::inference::ModelSet;
use crate::routes::AppState;
use crate::services::{ImageryClient, SeismicClient, WeatherClient};
use std::sync::Arc;
use tracing::{info, error};
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Load configuration before logging so the [logging] section applies
    let settings = Settings::load();

    // Initialize logging; LOG_LEVEL / LOG_FORMAT win over the config file
    let (config_level, config_format) = match &settings {
        Ok(s) => (s.logging.level.clone(), s.logging.format.clone()),
        Err(_) => ("info".to_string(), "json".to_string()),
    };
    let log_level = std::env::var("LOG_LEVEL").unwrap_or(config_level);
    let log_format = std::env::var("LOG_FORMAT").unwrap_or(config_format);

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_level))
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }

    info!("Starting hazard risk service...");

    let settings = settings.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    if settings.weather.api_key.is_empty() {
        error!("No weather API key configured; set OPENWEATHER_API_KEY");
    }

    info!("Configuration loaded successfully");

    // Load models once; they are shared read-only by every worker
    let models = ModelSet::load(&settings.models).map_err(|e| {
        error!("Failed to load models: {}", e);
        std::io::Error::other(format!("Model error: {}", e))
    })?;

    // One connection pool for all providers
    let http = settings.http.build_client().map_err(|e| {
        error!("Failed to create HTTP client: {}", e);
        std::io::Error::other(format!("HTTP client error: {}", e))
    })?;

    let weather = Arc::new(WeatherClient::new(
        settings.weather.endpoint.clone(),
        settings.weather.api_key.clone(),
        http.clone(),
    ));
    let imagery = Arc::new(ImageryClient::new(
        settings.imagery.search_endpoint.clone(),
        settings.imagery.render_endpoint.clone(),
        settings.imagery.collection.clone(),
        settings.imagery.max_cloud_cover,
        http.clone(),
    ));
    let seismic = Arc::new(SeismicClient::new(settings.seismic.endpoint.clone(), http));

    info!(
        "Providers initialized (weather: {}, imagery: {}, seismic: {})",
        settings.weather.endpoint, settings.imagery.search_endpoint, settings.seismic.endpoint
    );

    // Build application state
    let app_state = AppState {
        wildfire: WildfireAssessor::new(imagery, Arc::clone(&weather), &models),
        landslide: LandslideAssessor::new(weather, seismic, &models),
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(routes::handle_json_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
