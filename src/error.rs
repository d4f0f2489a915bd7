// src/error.rs
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::message::ErrorBody;
use crate::services::provider::ProviderError;

pub const MISSING_INPUT: &str = "a message or file is required";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("file too large")]
    PayloadTooLarge,

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn missing_input() -> Self {
        AppError::BadRequest(MISSING_INPUT.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Provider(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match self {
            AppError::BadRequest(msg) => msg,
            AppError::MethodNotAllowed => "method not allowed".to_string(),
            AppError::PayloadTooLarge => "file too large".to_string(),
            AppError::Provider(err) => {
                tracing::error!(error = %err, "chat relay failed calling provider");
                "internal server error".to_string()
            }
            AppError::Internal(err) => {
                tracing::error!(error = ?err, "chat relay failed");
                "internal server error".to_string()
            }
        };

        (status, Json(ErrorBody { error })).into_response()
    }
}
