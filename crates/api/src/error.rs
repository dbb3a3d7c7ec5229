//! Handler errors and their HTTP mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::StorageError;
use thiserror::Error;
use tracing::error;

/// Body for store read failures
pub const DB_ERROR_MESSAGE: &str = "Помилка БД";
/// Body for store write failures
pub const SAVE_ERROR_MESSAGE: &str = "Помилка збереження";
/// Body for page rendering failures
pub const RENDER_ERROR_MESSAGE: &str = "Помилка відображення";
/// Body for rejected credentials
pub const UNAUTHORIZED_MESSAGE: &str = "Неавторизований доступ";
/// JSON error for non-GET calls on the API
pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "Метод не підтримується. Використовуйте GET.";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Failed to load records: {0}")]
    List(#[source] StorageError),

    #[error("Failed to save record: {0}")]
    Save(#[source] StorageError),

    #[error("Failed to render page: {0}")]
    Render(#[from] askama::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!("{}", self);

        let body = match self {
            AppError::List(_) => DB_ERROR_MESSAGE,
            AppError::Save(_) => SAVE_ERROR_MESSAGE,
            AppError::Render(_) => RENDER_ERROR_MESSAGE,
        };

        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}
