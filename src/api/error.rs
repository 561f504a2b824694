use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("No input files supplied")]
    EmptyInputSet,

    #[error("Conversion engine failure: {0}")]
    ConversionEngineFailure(#[source] anyhow::Error),

    #[error("Merge engine failure: {0}")]
    MergeEngineFailure(#[source] anyhow::Error),

    #[error("Preview engine failure: {0}")]
    PreviewEngineFailure(#[source] anyhow::Error),

    #[error("Unsupported source format: {0}")]
    UnsupportedSourceFormat(String),

    #[error("Storage area unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Payload Too Large: {0}")]
    PayloadTooLarge(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Engine and storage failures keep their cause for the operator log
        // only; clients get the coarse per-operation message.
        let (status, message) = match self {
            AppError::UnsupportedFormat(fmt) => (
                StatusCode::BAD_REQUEST,
                format!("Unsupported output format: {}", fmt),
            ),
            AppError::EmptyInputSet => (
                StatusCode::BAD_REQUEST,
                "No input files supplied".to_string(),
            ),
            AppError::ConversionEngineFailure(e) => {
                tracing::error!("Conversion error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Conversion failed".to_string())
            }
            AppError::MergeEngineFailure(e) => {
                tracing::error!("Merge error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Merge failed".to_string())
            }
            AppError::PreviewEngineFailure(e) => {
                tracing::error!("Preview generation error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to generate preview".to_string(),
                )
            }
            AppError::UnsupportedSourceFormat(name) => {
                tracing::warn!("Unsupported source document: {}", name);
                (
                    StatusCode::BAD_REQUEST,
                    "Unsupported source format".to_string(),
                )
            }
            AppError::StorageUnavailable(msg) => {
                tracing::error!("Storage unavailable: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            AppError::Io(e) => {
                tracing::error!("I/O error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
