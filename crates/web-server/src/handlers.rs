use crate::{AppState, error::AppError};
use analytics::ProcessingResult;
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::Utc;
use core_types::PortfolioRequest;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
}

/// # GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// # POST /api/process-data
/// Computes per-ISIN statistics for the posted return series.
///
/// The engine is CPU-bound, so it runs on tokio's blocking pool.
pub async fn process_data(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PortfolioRequest>, JsonRejection>,
) -> Result<Json<ProcessingResult>, AppError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::warn!(error = %rejection.body_text(), "Rejected process-data request.");
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge
        } else {
            AppError::InvalidFormat
        }
    })?;

    tracing::debug!(instruments = request.records_by_isin.len(), "Processing portfolio data.");

    let engine = state.engine;
    let result = tokio::task::spawn_blocking(move || engine.process(&request)).await??;
    Ok(Json(result))
}
