// Integration tests for Hazard Risk

use actix_web::{test, web, App};
use hazard_risk::core::{ImageTensor, LandslideAssessor, WildfireAssessor};
use hazard_risk::inference::{
    FeatureScaler, ImageClassifier, InferenceError, ModelSet, Scaler, Sequential, TabularClassifier,
};
use hazard_risk::routes::{self, AppState};
use hazard_risk::services::{ImageryClient, SeismicClient, WeatherClient};
use image::{ImageFormat, Rgb, RgbImage};
use mockito::{Matcher, Server, ServerGuard};
use serde_json::{json, Value};
use std::io::Cursor;
use std::sync::{Arc, Mutex};

/// Image model that returns a fixed score and remembers the tensor size it saw
struct FixedImageScore {
    score: f64,
    seen: Mutex<Option<(usize, usize)>>,
}

impl ImageClassifier for FixedImageScore {
    fn predict(&self, image: &ImageTensor) -> Result<f64, InferenceError> {
        *self.seen.lock().unwrap() = Some((image.width(), image.height()));
        Ok(self.score)
    }
}

/// Tabular model that echoes a fixed probability after checking the features
struct ExpectFeatures {
    expected: Vec<f64>,
    output: f64,
}

impl TabularClassifier for ExpectFeatures {
    fn predict_proba(&self, features: &[f64]) -> Result<f64, InferenceError> {
        assert_eq!(features, self.expected.as_slice());
        Ok(self.output)
    }
}

struct Identity;

impl FeatureScaler for Identity {
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, InferenceError> {
        Ok(features.to_vec())
    }
}

fn red_png() -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(RgbImage::from_pixel(320, 200, Rgb([200, 40, 10])))
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

fn models(
    image: Arc<dyn ImageClassifier>,
    fire_weather: Arc<dyn TabularClassifier>,
    landslide: Arc<dyn TabularClassifier>,
    scaler: Arc<dyn FeatureScaler>,
) -> ModelSet {
    ModelSet {
        fire_image: image,
        fire_weather,
        landslide,
        landslide_scaler: scaler,
    }
}

fn app_state(server: &ServerGuard, models: &ModelSet) -> AppState {
    let http = reqwest::Client::new();
    let weather = Arc::new(WeatherClient::new(server.url(), "test_key".to_string(), http.clone()));
    let imagery = Arc::new(ImageryClient::new(
        server.url(),
        server.url(),
        "sentinel-2-l2a".to_string(),
        None,
        http.clone(),
    ));
    let seismic = Arc::new(SeismicClient::new(server.url(), http));

    AppState {
        wildfire: WildfireAssessor::new(imagery, Arc::clone(&weather), models),
        landslide: LandslideAssessor::new(weather, seismic, models),
    }
}

async fn mock_weather(server: &mut ServerGuard, body: &str) {
    server
        .mock("GET", "/data/2.5/weather")
        .match_query(Matcher::Any)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await;
}

async fn mock_scene(server: &mut ServerGuard) {
    let self_href = format!("{}/items/S2B_43PGN_20240321", server.url());
    server
        .mock("POST", "/search")
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "type": "FeatureCollection",
                "features": [{
                    "id": "S2B_43PGN_20240321",
                    "collection": "sentinel-2-l2a",
                    "properties": {"datetime": "2024-03-21T05:21:09Z", "eo:cloud_cover": 2.0},
                    "links": [{"rel": "self", "href": self_href}]
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;
    server
        .mock("GET", Matcher::Regex(r"^/stac/bbox/.*\.png".to_string()))
        .match_query(Matcher::Any)
        .with_header("content-type", "image/png")
        .with_body(red_png())
        .create_async()
        .await;
}

const ERODE_WEATHER: &str = r#"{"main": {"temp": 28.0, "humidity": 60}, "wind": {"speed": 3.2}}"#;

#[actix_web::test]
async fn test_wildfire_end_to_end() {
    let mut server = Server::new_async().await;
    mock_scene(&mut server).await;
    mock_weather(&mut server, ERODE_WEATHER).await;

    let image_model = Arc::new(FixedImageScore { score: 0.2, seen: Mutex::new(None) });
    let set = models(
        image_model.clone(),
        Arc::new(ExpectFeatures { expected: vec![28.0, 60.0, 3.2, 0.0], output: 0.9 }),
        Arc::new(ExpectFeatures { expected: vec![], output: 0.0 }),
        Arc::new(Identity),
    );

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(&server, &set)))
            .configure(routes::configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/wildfire/predict")
        .set_json(json!({"lat": 11.34, "lon": 77.73}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["location"], json!([11.34, 77.73]));
    assert_eq!(body["temperature"], 28.0);
    assert_eq!(body["rainfall"], 0.0);
    assert_eq!(body["cnn_prediction"], 0.2);
    assert_eq!(body["xgb_prediction"], 0.9);

    let final_prob = body["final_prob"].as_f64().unwrap();
    assert!((final_prob - (0.6 * 0.2 + 0.4 * 0.9)).abs() < 1e-9);
    assert_eq!(body["risk_level"], "No signs of fire");

    assert_eq!(*image_model.seen.lock().unwrap(), Some((150, 150)));
}

#[actix_web::test]
async fn test_wildfire_signs_of_fire() {
    let mut server = Server::new_async().await;
    mock_scene(&mut server).await;
    mock_weather(&mut server, r#"{"main": {"temp": 41.0, "humidity": 12}, "wind": {"speed": 9.0}, "rain": {"1h": 0.2}}"#).await;

    let set = models(
        Arc::new(FixedImageScore { score: 0.7, seen: Mutex::new(None) }),
        Arc::new(ExpectFeatures { expected: vec![41.0, 12.0, 9.0, 0.2], output: 0.4 }),
        Arc::new(ExpectFeatures { expected: vec![], output: 0.0 }),
        Arc::new(Identity),
    );

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(&server, &set)))
            .configure(routes::configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/wildfire/predict")
        .set_json(json!({"lat": 34.05, "lon": -118.24}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    // 0.42 + 0.16
    assert!((body["final_prob"].as_f64().unwrap() - 0.58).abs() < 1e-9);
    assert_eq!(body["risk_level"], "signs of fire");
}

#[actix_web::test]
async fn test_wildfire_missing_coordinates() {
    let server = Server::new_async().await;
    let set = models(
        Arc::new(FixedImageScore { score: 0.0, seen: Mutex::new(None) }),
        Arc::new(ExpectFeatures { expected: vec![], output: 0.0 }),
        Arc::new(ExpectFeatures { expected: vec![], output: 0.0 }),
        Arc::new(Identity),
    );

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(&server, &set)))
            .configure(routes::configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/wildfire/predict")
        .set_json(json!({"lat": 11.34}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("lon"));
}

#[actix_web::test]
async fn test_wildfire_no_imagery() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/search")
        .with_body(r#"{"type": "FeatureCollection", "features": []}"#)
        .create_async()
        .await;
    mock_weather(&mut server, ERODE_WEATHER).await;

    let set = models(
        Arc::new(FixedImageScore { score: 0.0, seen: Mutex::new(None) }),
        Arc::new(ExpectFeatures { expected: vec![28.0, 60.0, 3.2, 0.0], output: 0.0 }),
        Arc::new(ExpectFeatures { expected: vec![], output: 0.0 }),
        Arc::new(Identity),
    );

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(&server, &set)))
            .configure(routes::configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/wildfire/predict")
        .set_json(json!({"lat": 0.0, "lon": -150.0}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "No imagery available for this location");
}

#[actix_web::test]
async fn test_wildfire_weather_outage() {
    let mut server = Server::new_async().await;
    mock_scene(&mut server).await;
    server
        .mock("GET", "/data/2.5/weather")
        .match_query(Matcher::Any)
        .with_status(500)
        .create_async()
        .await;

    let set = models(
        Arc::new(FixedImageScore { score: 0.0, seen: Mutex::new(None) }),
        Arc::new(ExpectFeatures { expected: vec![], output: 0.0 }),
        Arc::new(ExpectFeatures { expected: vec![], output: 0.0 }),
        Arc::new(Identity),
    );

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(&server, &set)))
            .configure(routes::configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/wildfire/predict")
        .set_json(json!({"lat": 11.34, "lon": 77.73}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 502);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().starts_with("Weather provider failed"));
}

#[actix_web::test]
async fn test_landslide_end_to_end() {
    let mut server = Server::new_async().await;
    mock_weather(&mut server, r#"{"rain": {"1h": 45.0}}"#).await;
    server
        .mock("GET", "/fdsnws/event/1/query")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("format".into(), "geojson".into()),
            Matcher::UrlEncoded("minmagnitude".into(), "4".into()),
        ]))
        .with_body(
            r#"{"features": [
                {"properties": {"mag": 4.2, "place": "Offshore Sumatra"}},
                {"properties": {"mag": 4.8, "place": "8 km N of Erode, India"}}
            ]}"#,
        )
        .create_async()
        .await;

    let set = models(
        Arc::new(FixedImageScore { score: 0.0, seen: Mutex::new(None) }),
        Arc::new(ExpectFeatures { expected: vec![], output: 0.0 }),
        Arc::new(ExpectFeatures { expected: vec![45.0, 30.0, 0.45, 1.0], output: 0.75 }),
        Arc::new(Identity),
    );

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(&server, &set)))
            .configure(routes::configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/landslide/predict")
        .set_json(json!({"lat": 11.34, "lon": 77.73}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body,
        json!({
            "rainfall": 45.0,
            "soil_saturation": 0.45,
            "slope_angle": 30.0,
            "earthquake_activity": 1,
            "risk": "High Risk"
        })
    );
}

#[actix_web::test]
async fn test_landslide_with_real_artifacts() {
    let mut server = Server::new_async().await;
    mock_weather(&mut server, r#"{"main": {"temp": 25.0, "humidity": 80}}"#).await;
    server
        .mock("GET", "/fdsnws/event/1/query")
        .match_query(Matcher::Any)
        .with_body(r#"{"features": []}"#)
        .create_async()
        .await;

    // Output depends only on scaled rainfall: sigmoid(2 * (0 - 50) / 25) = sigmoid(-4)
    let scaler = Scaler::from_json(
        r#"{"kind": "standard", "mean": [50.0, 30.0, 0.5, 0.1], "scale": [25.0, 5.0, 0.25, 0.3]}"#,
    )
    .unwrap();
    let network = Sequential::from_json(
        r#"{"layers": [{"weights": [[2.0, 0.0, 0.0, 0.0]], "bias": [0.0], "activation": "sigmoid"}]}"#,
    )
    .unwrap();

    let set = models(
        Arc::new(FixedImageScore { score: 0.0, seen: Mutex::new(None) }),
        Arc::new(ExpectFeatures { expected: vec![], output: 0.0 }),
        Arc::new(network),
        Arc::new(scaler),
    );

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(&server, &set)))
            .configure(routes::configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/landslide/predict")
        .set_json(json!({"lat": 11.34, "lon": 77.73}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["rainfall"], 0.0);
    assert_eq!(body["soil_saturation"], 0.0);
    assert_eq!(body["earthquake_activity"], 0);
    assert_eq!(body["risk"], "Low Risk");
}

#[actix_web::test]
async fn test_landslide_missing_field() {
    let server = Server::new_async().await;
    let set = models(
        Arc::new(FixedImageScore { score: 0.0, seen: Mutex::new(None) }),
        Arc::new(ExpectFeatures { expected: vec![], output: 0.0 }),
        Arc::new(ExpectFeatures { expected: vec![], output: 0.0 }),
        Arc::new(Identity),
    );

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(&server, &set)))
            .configure(routes::configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/landslide/predict")
        .set_json(json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Latitude and longitude are required (missing: lat, lon)");
}

#[actix_web::test]
async fn test_malformed_json() {
    let server = Server::new_async().await;
    let set = models(
        Arc::new(FixedImageScore { score: 0.0, seen: Mutex::new(None) }),
        Arc::new(ExpectFeatures { expected: vec![], output: 0.0 }),
        Arc::new(ExpectFeatures { expected: vec![], output: 0.0 }),
        Arc::new(Identity),
    );

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(&server, &set)))
            .app_data(web::JsonConfig::default().error_handler(routes::handle_json_payload_error))
            .configure(routes::configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/landslide/predict")
        .insert_header(("content-type", "application/json"))
        .set_payload(r#"{"lat": "north"}"#)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().starts_with("Invalid JSON"));
}

#[actix_web::test]
async fn test_health() {
    let server = Server::new_async().await;
    let set = models(
        Arc::new(FixedImageScore { score: 0.0, seen: Mutex::new(None) }),
        Arc::new(ExpectFeatures { expected: vec![], output: 0.0 }),
        Arc::new(ExpectFeatures { expected: vec![], output: 0.0 }),
        Arc::new(Identity),
    );

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(&server, &set)))
            .configure(routes::configure_routes),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "healthy");
}
