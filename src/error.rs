use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Connection-level failures. Protocol-level problems are JSON-RPC errors
/// instead and never surface here.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum AppError {
    #[error("Upstream gateway unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Upstream gateway timed out: {0}")]
    UpstreamTimeout(String),

    #[error("Failed to build response: {0}")]
    ResponseError(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: u16,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::UpstreamUnavailable(e) => {
                tracing::error!(error = %e, "Upstream gateway unavailable");
                StatusCode::BAD_GATEWAY
            }
            AppError::UpstreamTimeout(e) => {
                tracing::warn!(error = %e, "Upstream gateway timeout");
                StatusCode::GATEWAY_TIMEOUT
            }
            AppError::ResponseError(e) => {
                tracing::error!(error = %e, "Response construction error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: status.as_u16(),
        });

        (status, body).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::UpstreamTimeout(err.to_string())
        } else {
            AppError::UpstreamUnavailable(err.to_string())
        }
    }
}

impl From<axum::http::Error> for AppError {
    fn from(err: axum::http::Error) -> Self {
        AppError::ResponseError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
