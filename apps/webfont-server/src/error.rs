//! Error types for the webfont server

use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};
use webfont_core::{ErrorClass, PackError};

/// Server error types
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Pack(#[from] PackError),

    #[error("Invalid multipart request: {}", .0.body_text())]
    Multipart(#[from] MultipartError),

    #[error("Invalid multipart request: {}", .0.body_text())]
    MultipartRejection(#[from] MultipartRejection),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: &'static str,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Pack(err) => match err {
                PackError::MissingFile => (StatusCode::BAD_REQUEST, "MISSING_FILE"),
                PackError::UnsupportedFormat(_) => (StatusCode::BAD_REQUEST, "UNSUPPORTED_FORMAT"),
                PackError::FileTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "FILE_TOO_LARGE"),
                PackError::CanonicalConversion(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "CONVERSION_FAILED")
                }
                PackError::NoOutput => (StatusCode::INTERNAL_SERVER_ERROR, "NO_OUTPUT"),
                PackError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            },
            ApiError::Multipart(err) => multipart_status(err.status()),
            ApiError::MultipartRejection(err) => multipart_status(err.status()),
        }
    }
}

/// Bodies over the request limit surface as multipart errors
fn multipart_status(status: StatusCode) -> (StatusCode, &'static str) {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        (status, "FILE_TOO_LARGE")
    } else {
        (StatusCode::BAD_REQUEST, "INVALID_MULTIPART")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        match self {
            ApiError::Pack(ref err) if err.class() != ErrorClass::Validation => {
                error!(code, error = %self, "Font conversion failed");
            }
            _ => warn!(code, error = %self, "Rejected convert request"),
        }

        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
            code,
        };

        (status, Json(body)).into_response()
    }
}
