//! Integration tests for the predictor API endpoints

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use saf_engine::{
    classifier::ModelFormat,
    load_classifier,
    training::{self, BoostingParams, GeneratorConfig, TrainingConfig},
    Classifier, EngineError, FeatureVector, PricingEngine,
};
use saf_server::api::{create_router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

/// Classifier returning a fixed probability
struct FixedClassifier(f64);

impl Classifier for FixedClassifier {
    fn predict_proba(&self, _features: &FeatureVector) -> Result<f64, EngineError> {
        Ok(self.0)
    }

    fn format(&self) -> ModelFormat {
        ModelFormat::TreeEnsemble
    }
}

/// Classifier whose runtime always fails
struct BrokenClassifier;

impl Classifier for BrokenClassifier {
    fn predict_proba(&self, _features: &FeatureVector) -> Result<f64, EngineError> {
        Err(EngineError::Inference("session closed".to_string()))
    }

    fn format(&self) -> ModelFormat {
        ModelFormat::Onnx
    }
}

fn setup_app(classifier: Arc<dyn Classifier>, in_band_errors: bool) -> Router {
    setup_app_with_origins(classifier, in_band_errors, &["http://localhost:3000", "*"])
}

fn setup_app_with_origins(classifier: Arc<dyn Classifier>, in_band_errors: bool, origins: &[&str]) -> Router {
    let engine = PricingEngine::new(classifier).unwrap();
    let state = Arc::new(AppState::new(Arc::new(engine), in_band_errors));
    let origins: Vec<String> = origins.iter().map(|o| o.to_string()).collect();
    create_router(state, &origins)
}

fn preflight(origin: &str) -> Request<Body> {
    Request::builder()
        .method("OPTIONS")
        .uri("/predict")
        .header(header::ORIGIN, origin)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap()
}

fn reference_body() -> Value {
    json!({
        "tier": "Gold",
        "cabin": "Business",
        "route": "HKG-LHR",
        "distance_km": 9600,
        "premium": 25,
        "saf_blend": 0.2,
        "current_saf_miles": 0,
        "saf_flights_taken": 0
    })
}

fn post_predict(body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_predict_reference_passenger() {
    let app = setup_app(Arc::new(FixedClassifier(0.8123)), true);

    let response = app.oneshot(post_predict(&reference_body())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let result = read_json(response).await;
    assert_eq!(result["saf_miles"], 6);
    assert_eq!(result["co2_reduction"], 19182.0);
    assert_eq!(result["net_price"], 24.97);
    assert_eq!(result["profit"], 24.98);
    assert_eq!(result["probability"], 0.812);
    assert_eq!(result["current_saf_miles"], 6.0);
    assert_eq!(result["selectedInputs"]["route"], "HKG-LHR");
    assert_eq!(result["selectedInputs"]["premium"], 25.0);
    assert!(result.get("error").is_none());
}

#[tokio::test]
async fn test_predict_optional_fields_default_to_zero() {
    let app = setup_app(Arc::new(FixedClassifier(0.5)), true);
    let mut body = reference_body();
    body.as_object_mut().unwrap().remove("current_saf_miles");
    body.as_object_mut().unwrap().remove("saf_flights_taken");

    let response = app.oneshot(post_predict(&body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let result = read_json(response).await;
    assert_eq!(result["current_saf_miles"], 6.0);
    assert_eq!(result["selectedInputs"]["saf_flights_taken"], 0.0);
}

#[tokio::test]
async fn test_unknown_route_is_reported_in_band() {
    let app = setup_app(Arc::new(FixedClassifier(0.5)), true);
    let mut body = reference_body();
    body["route"] = json!("HKG-XYZ");

    let response = app.oneshot(post_predict(&body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let result = read_json(response).await;
    let error = result["error"].as_str().unwrap();
    assert!(error.starts_with("Internal Error: "));
    assert!(error.contains("HKG-XYZ"));
    assert_eq!(result["selectedInputs"]["route"], "HKG-XYZ");
    assert!(result.get("probability").is_none());
}

#[tokio::test]
async fn test_unknown_route_is_422_without_in_band_errors() {
    let app = setup_app(Arc::new(FixedClassifier(0.5)), false);
    let mut body = reference_body();
    body["route"] = json!("HKG-XYZ");

    let response = app.oneshot(post_predict(&body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let result = read_json(response).await;
    assert_eq!(result["selectedInputs"]["route"], "HKG-XYZ");
}

#[tokio::test]
async fn test_inference_failure_status_codes() {
    let in_band = setup_app(Arc::new(BrokenClassifier), true);
    let response = in_band.oneshot(post_predict(&reference_body())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let result = read_json(response).await;
    assert!(result["error"].as_str().unwrap().contains("session closed"));

    let strict = setup_app(Arc::new(BrokenClassifier), false);
    let response = strict.oneshot(post_predict(&reference_body())).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_negative_premium_is_rejected_with_echo() {
    let app = setup_app(Arc::new(FixedClassifier(0.5)), true);
    let mut body = reference_body();
    body["premium"] = json!(-5);

    let response = app.oneshot(post_predict(&body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let result = read_json(response).await;
    assert!(result["error"].as_str().unwrap().contains("premium"));
    assert_eq!(result["selectedInputs"]["premium"], -5.0);
}

#[tokio::test]
async fn test_missing_required_field_is_rejected_by_extractor() {
    let app = setup_app(Arc::new(FixedClassifier(0.5)), true);
    let mut body = reference_body();
    body.as_object_mut().unwrap().remove("tier");

    let response = app.oneshot(post_predict(&body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_health_and_root() {
    let app = setup_app(Arc::new(FixedClassifier(0.5)), true);

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await, json!({ "status": "healthy" }));

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        read_json(response).await,
        json!({ "message": "Welcome to SAF Miles Predictor" })
    );
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup_app(Arc::new(FixedClassifier(0.5)), true);

    let response = app
        .clone()
        .oneshot(post_predict(&reference_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("saf_predictor_predictions_total"));
    assert!(text.contains("saf_predictor_prediction_latency_seconds"));
}

#[tokio::test]
async fn test_cors_preflight_is_allowed() {
    let app = setup_app(Arc::new(FixedClassifier(0.5)), true);

    let response = app.oneshot(preflight("http://localhost:3000")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}

#[tokio::test]
async fn test_cors_origin_list_allows_only_listed_origins() {
    let origins = ["http://localhost:3000", "bad\norigin"];
    let app = setup_app_with_origins(Arc::new(FixedClassifier(0.5)), true, &origins);

    let response = app.clone().oneshot(preflight("http://localhost:3000")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:3000"
    );

    let response = app.oneshot(preflight("http://evil.example")).await.unwrap();
    assert!(!response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}

#[tokio::test]
async fn test_overflowing_premium_is_reported_in_band() {
    let app = setup_app(Arc::new(FixedClassifier(0.5)), true);
    let mut body = reference_body();
    body["premium"] = json!(1e307);

    let response = app.oneshot(post_predict(&body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let result = read_json(response).await;
    let error = result["error"].as_str().unwrap();
    assert!(error.starts_with("Internal Error: invalid premium"), "{}", error);
    assert_eq!(result["selectedInputs"]["premium"], 1e307);
}

#[tokio::test]
async fn test_trained_artifact_serves_predictions() {
    let rows = training::generate(&GeneratorConfig {
        samples: 200,
        ..Default::default()
    })
    .unwrap();
    let config = TrainingConfig {
        boosting: BoostingParams {
            n_estimators: 10,
            max_depth: 3,
            ..Default::default()
        },
        ..Default::default()
    };
    let model = training::train_model(&rows, &config).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("saf_model.json");
    let checksum = training::save_ensemble(&model.ensemble, &path).unwrap();
    let loaded = load_classifier(&path, Some(&checksum)).unwrap();

    let app = setup_app(loaded.classifier, true);
    let response = app.oneshot(post_predict(&reference_body())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let result = read_json(response).await;
    let probability = result["probability"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&probability));
    assert_eq!(result["saf_miles"], 6);
}
