use analytics::AnalyticsError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// The body is not a JSON object with a `registrosPorISIN` mapping.
    #[error("Invalid data format")]
    InvalidFormat,
    #[error("Request body exceeds the configured limit")]
    PayloadTooLarge,
    #[error(transparent)]
    Computation(#[from] AnalyticsError),
    #[error("Computation task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Converts our custom `AppError` into an HTTP response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InvalidFormat => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::PayloadTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, self.to_string()),
            AppError::Computation(analytics_err) => {
                tracing::error!(error = ?analytics_err, "Computation error.");
                (StatusCode::INTERNAL_SERVER_ERROR, analytics_err.to_string())
            }
            AppError::Task(join_err) => {
                tracing::error!(error = ?join_err, "Computation task error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "The computation was aborted".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
