use crate::api::{AppState, PredictionEvent};
use crate::error::{AppError, Result};
use crate::metrics::{PREDICTION_LATENCY_SECONDS, PREDICTION_REQUESTS_TOTAL};
use crate::training::evaluation::DECISION_THRESHOLD;
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;

/// Health check endpoint
pub async fn health_check() -> Result<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        model_loaded: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictRequest {
    pub features: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    pub churn_probability: f64,
    pub churn_prediction: bool,
}

/// Score one customer and append the event to the inference log
pub async fn predict(
    State(state): State<AppState>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<PredictResponse>> {
    PREDICTION_REQUESTS_TOTAL.inc();
    let timer = Instant::now();

    let missing = state
        .schema
        .missing_features(|name| request.features.contains_key(name));
    if !missing.is_empty() {
        return Err(AppError::Validation(format!("Missing features: {:?}", missing)));
    }

    let probability = state.model.predict_row(&request.features);
    let prediction = probability >= DECISION_THRESHOLD;

    // File append and flush run on the blocking pool, off the async workers
    let event = PredictionEvent::new(request.features, probability, prediction);
    let log = Arc::clone(&state.inference_log);
    match tokio::task::spawn_blocking(move || log.append(&event)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!(error = %e, "Failed to append to inference log"),
        Err(e) => tracing::error!(error = %e, "Inference log append task failed"),
    }

    PREDICTION_LATENCY_SECONDS.observe(timer.elapsed().as_secs_f64());

    Ok(Json(PredictResponse {
        churn_probability: probability,
        churn_prediction: prediction,
    }))
}

/// Prometheus metrics endpoint
///
/// Returns metrics in Prometheus text exposition format
pub async fn metrics() -> (StatusCode, String) {
    let metrics = crate::metrics::gather_metrics();
    (StatusCode::OK, metrics)
}
