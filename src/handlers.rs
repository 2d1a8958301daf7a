use crate::config::Config;
use crate::errors::AppError;
use crate::models::{BatchPredictionResponse, PredictionResponse};
use crate::services::PredictionService;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::json;
use sqlx::SqlitePool;
use std::sync::Arc;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: SqlitePool,
    /// Application configuration.
    pub config: Config,
    /// Prediction service, present only when the model artifacts loaded at
    /// startup. Requests while absent return 503 rather than killing the
    /// process.
    pub prediction_service: Option<Arc<PredictionService>>,
}

/// Health check endpoint.
///
/// Returns the service status, version, and whether the model is loaded.
pub async fn health(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "churn-api",
            "version": env!("CARGO_PKG_VERSION"),
            "model_loaded": state.prediction_service.is_some(),
        })),
    )
}

/// GET /api/v1/predict/:customer_id
///
/// Predicts churn for a single customer from their order history.
pub async fn predict_churn(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<i64>,
) -> Result<Json<PredictionResponse>, AppError> {
    tracing::info!("GET /predict/{}", customer_id);

    let service = state
        .prediction_service
        .as_ref()
        .ok_or(AppError::ModelUnavailable)?;

    let now = Utc::now().date_naive();
    let response = service.predict(customer_id, now).await?;

    Ok(Json(response))
}

/// POST /api/v1/predict/batch
///
/// Predicts churn for an ordered list of customer ids. Each entry in the
/// response is either a prediction or an error record, in input order.
pub async fn predict_batch(
    State(state): State<Arc<AppState>>,
    Json(customer_ids): Json<Vec<i64>>,
) -> Result<Json<BatchPredictionResponse>, AppError> {
    tracing::info!("POST /predict/batch - {} customers", customer_ids.len());

    let service = state
        .prediction_service
        .as_ref()
        .ok_or(AppError::ModelUnavailable)?;

    let now = Utc::now().date_naive();
    let response = service.predict_batch(&customer_ids, now).await;

    Ok(Json(response))
}
