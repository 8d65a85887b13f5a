/// HTTP API tests
///
/// Drive the router in-process with `tower::ServiceExt::oneshot` against a
/// model trained on the synthetic dataset.

mod common;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use churn_sentinel::api::{build_router, handlers::HealthResponse, AppState};
use churn_sentinel::monitoring::load_inference_data;
use churn_sentinel::training::train;
use common::{customer, parse_prometheus_output, Workspace};
use serde_json::{json, Value};
use tower::ServiceExt;

fn setup() -> (Workspace, Router) {
    let ws = Workspace::with_dataset(200);
    train(&ws.config).unwrap();
    let state = AppState::load(&ws.config).unwrap();
    (ws, build_router(state))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

fn predict_request(features: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "features": features }).to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let (_ws, app) = setup();

    let (status, body) = send(
        app,
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let health: HealthResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(health.status, "ok");
    assert!(health.model_loaded);
}

#[tokio::test]
async fn test_predict_appends_to_inference_log() {
    let (ws, app) = setup();

    let (status, body) = send(app.clone(), predict_request(Value::Object(customer(0)))).await;
    assert_eq!(status, StatusCode::OK);

    let response: Value = serde_json::from_slice(&body).unwrap();
    let probability = response["churn_probability"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&probability));
    assert_eq!(response["churn_prediction"].as_bool().unwrap(), probability >= 0.5);

    let (status, _) = send(app, predict_request(Value::Object(customer(1)))).await;
    assert_eq!(status, StatusCode::OK);

    let logged = load_inference_data(&ws.config.paths.inference_log).unwrap();
    assert_eq!(logged.len(), 2);
    assert_eq!(logged.get(0, "State"), Some(&json!("CA")));
}

#[tokio::test]
async fn test_predict_rejects_missing_features() {
    let (ws, app) = setup();
    let mut features = customer(3);
    features.remove("Total day minutes");
    features.remove("State");

    let (status, body) = send(app, predict_request(Value::Object(features))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: Value = serde_json::from_slice(&body).unwrap();
    let message = error["error"]["message"].as_str().unwrap();
    assert!(message.contains("Missing features"));
    assert!(message.contains("Total day minutes"));
    assert!(message.contains("State"));

    let logged = load_inference_data(&ws.config.paths.inference_log).unwrap();
    assert!(logged.is_empty());
}

#[tokio::test]
async fn test_extra_features_are_accepted() {
    let (_ws, app) = setup();
    let mut features = customer(5);
    features.insert("Unseen column".to_string(), json!("x"));

    let (status, _) = send(app, predict_request(Value::Object(features))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_predictions_are_all_logged() {
    let (ws, app) = setup();

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let app = app.clone();
            tokio::spawn(async move { send(app, predict_request(Value::Object(customer(i)))).await })
        })
        .collect();
    for handle in handles {
        let (status, _) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK);
    }

    let logged = load_inference_data(&ws.config.paths.inference_log).unwrap();
    assert_eq!(logged.len(), 16);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (_ws, app) = setup();
    let _ = churn_sentinel::metrics::init_metrics();

    let (status, _) = send(app.clone(), predict_request(Value::Object(customer(2)))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        app,
        Request::builder().uri("/metrics").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let text = String::from_utf8(body).unwrap();
    let metrics = parse_prometheus_output(&text);
    assert!(metrics.contains_key("churn_sentinel_prediction_requests_total"));
    assert!(metrics.contains_key("churn_sentinel_prediction_latency_seconds"));
}
