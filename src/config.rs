use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub http: HttpSettings,
    pub weather: WeatherSettings,
    #[serde(default)]
    pub imagery: ImagerySettings,
    #[serde(default)]
    pub seismic: SeismicSettings,
    #[serde(default)]
    pub models: ModelSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Shared outbound HTTP client settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HttpSettings {
    /// Per-request timeout; unset waits indefinitely
    pub timeout_secs: Option<u64>,
}

impl HttpSettings {
    pub fn build_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")));
        if let Some(secs) = self.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        builder.build()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherSettings {
    #[serde(default = "default_weather_endpoint")]
    pub endpoint: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImagerySettings {
    #[serde(default = "default_search_endpoint")]
    pub search_endpoint: String,
    #[serde(default = "default_render_endpoint")]
    pub render_endpoint: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    /// Upper bound on scene cloud cover in percent
    pub max_cloud_cover: Option<f64>,
}

impl Default for ImagerySettings {
    fn default() -> Self {
        Self {
            search_endpoint: default_search_endpoint(),
            render_endpoint: default_render_endpoint(),
            collection: default_collection(),
            max_cloud_cover: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeismicSettings {
    #[serde(default = "default_seismic_endpoint")]
    pub endpoint: String,
}

impl Default for SeismicSettings {
    fn default() -> Self {
        Self { endpoint: default_seismic_endpoint() }
    }
}

/// Paths to the model artifacts loaded at start-up
#[derive(Debug, Clone, Deserialize)]
pub struct ModelSettings {
    #[serde(default = "default_fire_image_model")]
    pub fire_image: PathBuf,
    #[serde(default = "default_fire_weather_model")]
    pub fire_weather: PathBuf,
    #[serde(default = "default_landslide_model")]
    pub landslide: PathBuf,
    #[serde(default = "default_landslide_scaler")]
    pub landslide_scaler: PathBuf,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            fire_image: default_fire_image_model(),
            fire_weather: default_fire_weather_model(),
            landslide: default_landslide_model(),
            landslide_scaler: default_landslide_scaler(),
        }
    }
}

fn default_weather_endpoint() -> String { "https://api.openweathermap.org".to_string() }
fn default_search_endpoint() -> String { "https://earth-search.aws.element84.com/v1".to_string() }
fn default_render_endpoint() -> String { "http://localhost:8081".to_string() }
fn default_collection() -> String { "sentinel-2-l2a".to_string() }
fn default_seismic_endpoint() -> String { "https://earthquake.usgs.gov".to_string() }
fn default_fire_image_model() -> PathBuf { PathBuf::from("models/fire_image.json") }
fn default_fire_weather_model() -> PathBuf { PathBuf::from("models/fire_weather.json") }
fn default_landslide_model() -> PathBuf { PathBuf::from("models/landslide.json") }
fn default_landslide_scaler() -> PathBuf { PathBuf::from("models/landslide_scaler.json") }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with HAZARD_)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., HAZARD__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("HAZARD")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        substitute_env_vars(settings)?.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("HAZARD")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        substitute_env_vars(settings)?.try_deserialize()
    }
}

/// Apply well-known provider variables on top of the layered config
///
/// `OPENWEATHER_API_KEY` is what most deployments already export, so it wins
/// over `weather.api_key` when set.
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Ok(api_key) = env::var("OPENWEATHER_API_KEY") {
        builder = builder.set_override("weather.api_key", api_key)?;
    }

    builder.build()
}
