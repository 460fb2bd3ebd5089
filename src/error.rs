//! Error taxonomy shared by the store, the reporting pipeline and the routes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("DB error: {0}")]
    Store(#[from] sqlx::Error),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Authentication required")]
    Unauthorized,
    #[error("Access denied")]
    Forbidden,
    #[error("Report error: {0}")]
    Report(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // ---
        match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg).into_response(),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AppError::Unauthorized => Redirect::to("/login.html").into_response(),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "access denied").into_response(),
            AppError::Store(e) => {
                tracing::error!("Store failure: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
            }
            AppError::Report(msg) => {
                tracing::error!("Report generation failed: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "report generation failed").into_response()
            }
        }
    }
}
