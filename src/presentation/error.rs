// API errors rendered as {"error": "..."}
use crate::application::ingest_service::IngestError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Validation { .. } | IngestError::Malformed(_) => {
                tracing::warn!("Rejected upload: {}", err);
                ApiError::BadRequest(err.to_string())
            }
            IngestError::TooLarge(_) => {
                tracing::warn!("Rejected upload: {}", err);
                ApiError::PayloadTooLarge(err.to_string())
            }
            IngestError::Io(_) => {
                tracing::warn!("Upload stream failed: {}", err);
                ApiError::BadRequest(err.to_string())
            }
            IngestError::Storage(_) => {
                tracing::error!("{}", err);
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!("Storage failure: {:#}", err);
        ApiError::Internal(format!("Storage failure: {err}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
