use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use stockpulse_warehouse::WarehouseError;
use thiserror::Error;

/// Handler-level errors mapped onto HTTP statuses.
///
/// Partial pipeline failures never end up here — the trigger endpoints
/// fold them into the run summary. Only malformed requests and
/// storage-level loss become error responses.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Storage(#[from] WarehouseError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Storage(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(serde_json::json!({
            "success": false,
            "error": self.to_string(),
        }));
        (status, body).into_response()
    }
}
