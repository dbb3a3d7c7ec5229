//! Read-only JSON API

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::error::{DB_ERROR_MESSAGE, METHOD_NOT_ALLOWED_MESSAGE};
use crate::AppState;

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
}

/// List all records, newest first
pub async fn list_devices(State(state): State<AppState>) -> Response {
    match state.store.list_records().await {
        Ok(records) => Json(records).into_response(),
        Err(e) => {
            error!("Failed to load records: {}", e);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, DB_ERROR_MESSAGE)
        }
    }
}

/// Anything but GET
pub async fn method_not_allowed() -> Response {
    json_error(StatusCode::METHOD_NOT_ALLOWED, METHOD_NOT_ALLOWED_MESSAGE)
}

fn json_error(status: StatusCode, message: &'static str) -> Response {
    (status, Json(ErrorResponse { error: message })).into_response()
}
