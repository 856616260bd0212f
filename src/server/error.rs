//! API error type and its JSON `{"error": ...}` response.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::data::entry::{SubmitError, ValidationError};
use crate::data::import::ImportError;
use crate::data::store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("No file uploaded")]
    NoFile,
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Multipart(#[from] MultipartError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<SubmitError> for ApiError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Validation(err) => Self::Validation(err),
            SubmitError::Storage(err) => Self::Store(err),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::NoFile | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Import(ImportError::NoMatchingSheet) => StatusCode::BAD_REQUEST,
            Self::Import(_) | Self::Store(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Multipart(err) => err.status(),
        }
    }

    /// Message sent to the client. Server-side failures stay generic; the
    /// detail goes to the log.
    fn public_message(&self) -> String {
        match self {
            Self::Import(ImportError::NoMatchingSheet) => self.to_string(),
            Self::Import(ImportError::Malformed(_)) => "Failed to process file".to_string(),
            Self::Store(_) | Self::Import(_) | Self::Internal(_) => {
                "Failed to access stored data".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            _ if status.is_server_error() => {
                error!(status = status.as_u16(), error = %self, "request failed")
            }
            Self::Validation(err) => {
                warn!(status = status.as_u16(), missing = ?err.missing, error = %self, "request rejected")
            }
            _ => warn!(status = status.as_u16(), error = %self, "request rejected"),
        }

        let mut body = json!({ "error": self.public_message() });
        // Kinds stored before the failure stay stored; say which.
        if let Self::Import(ImportError::Partial { report, .. }) = &self {
            body["imported"] = json!(report.labels());
            body["rows"] = json!(report.total_rows);
        }
        (status, Json(body)).into_response()
    }
}
