//! HTTP routes and handlers

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use fraudserve_core::{normalize_slice, Error, PredictionEnvelope, ResponseBuilder};
use serde_json::json;
use tower_http::{
    limit::RequestBodyLimitLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{debug, error, info, warn, Level};
use uuid::Uuid;

use crate::state::AppState;

/// Header carrying the per-request id on prediction responses
pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn create_router(state: AppState) -> Router {
    let max_body_bytes = state.config.max_body_bytes;

    Router::new()
        .route("/health", get(health_check))
        .route("/api", get(api_info))
        .route("/model-info", get(model_info))
        .route("/predict", post(predict))
        .route("/metrics", get(metrics))
        .fallback(fallback)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Response {
    metrics::counter!("fraudserve_requests_total", "endpoint" => "health").increment(1);

    let loaded = state.service.is_loaded();
    let status = if loaded {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let label = if loaded { "healthy" } else { "unhealthy" };
    let body = json!({
        "status": label,
        "model_loaded": loaded,
        "timestamp": Utc::now(),
    });

    (status, Json(body)).into_response()
}

async fn api_info(State(state): State<AppState>) -> Json<serde_json::Value> {
    metrics::counter!("fraudserve_requests_total", "endpoint" => "api").increment(1);

    let service = &state.service;
    Json(json!({
        "service": "fraudserve",
        "version": env!("CARGO_PKG_VERSION"),
        "status": service.status(),
        "model_loaded": service.is_loaded(),
        "model_version": service.model_version(),
        "endpoints": {
            "/health": "GET - service health",
            "/api": "GET - service description",
            "/model-info": "GET - metadata of the loaded model",
            "/predict": "POST - score one transaction or an array of transactions",
            "/metrics": "GET - Prometheus metrics",
        },
        "timestamp": Utc::now(),
    }))
}

async fn model_info(State(state): State<AppState>) -> Result<Response, AppError> {
    metrics::counter!("fraudserve_requests_total", "endpoint" => "model_info").increment(1);

    match state.service.metadata() {
        Some(metadata) => Ok(Json(metadata).into_response()),
        None => Err(AppError::NotFound(
            "Model metadata not available".to_string(),
        )),
    }
}

/// Score one transaction or a batch
async fn predict(State(state): State<AppState>, body: Bytes) -> Result<Response, AppError> {
    metrics::counter!("fraudserve_requests_total", "endpoint" => "predict").increment(1);
    let request_id = Uuid::new_v4();

    let records = normalize_slice(&body).map_err(|e| {
        warn!(%request_id, error = %e, "Rejected prediction request");
        AppError::from(e)
    })?;
    debug!(%request_id, records = records.len(), "Normalized request body");

    // Scoring is CPU-bound; keep it off the async workers
    let service = state.service.clone();
    let envelope = tokio::task::spawn_blocking(move || -> fraudserve_core::Result<PredictionEnvelope> {
        let inference = service.infer(&records)?;
        metrics::histogram!("fraudserve_inference_latency_us").record(inference.latency_us as f64);

        ResponseBuilder::new().build(
            &records,
            &inference.predictions,
            inference.probabilities.as_deref(),
            service.metadata(),
        )
    })
    .await
    .map_err(|e| AppError::Internal(format!("Scoring task failed: {}", e)))?
    .map_err(|e| {
        match &e {
            Error::Prediction(detail) => {
                error!(%request_id, detail = %detail, "Prediction failed")
            }
            other => warn!(%request_id, error = %other, "Prediction request failed"),
        }
        AppError::from(e)
    })?;

    for result in &envelope.predictions {
        metrics::counter!(
            "fraudserve_predictions_total",
            "label" => result.prediction_label.as_str()
        )
        .increment(1);
    }

    info!(
        %request_id,
        predictions = envelope.predictions.len(),
        fraud = envelope
            .predictions
            .iter()
            .filter(|p| p.prediction == 1)
            .count(),
        "Scored transactions"
    );

    let mut response = Json(envelope).into_response();
    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    Ok(response)
}

async fn metrics(State(state): State<AppState>) -> String {
    state.metrics_handle.render()
}

async fn fallback() -> AppError {
    AppError::NotFound("Endpoint not found".to_string())
}

/// Error handling
#[derive(Debug)]
pub enum AppError {
    Service(Error),
    NotFound(String),
    Internal(String),
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        AppError::Service(err)
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Service(Error::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            AppError::Service(Error::ModelNotLoaded) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Service(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            AppError::Service(err) => err.kind(),
            AppError::NotFound(_) => "not_found",
            AppError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind();
        metrics::counter!("fraudserve_errors_total", "type" => kind).increment(1);

        let (message, detail) = match &self {
            AppError::Service(err) => (err.public_message(), err.detail().map(str::to_string)),
            AppError::NotFound(msg) => (msg.clone(), None),
            AppError::Internal(msg) => ("Internal server error".to_string(), Some(msg.clone())),
        };

        let mut error = json!({
            "message": message,
            "type": kind,
        });
        if let Some(detail) = detail {
            error["detail"] = json!(detail);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
