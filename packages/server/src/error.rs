use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::storage::{StorageError, ValidationError};
use serde::Serialize;

use crate::service::{QueryError, UploadError};
use crate::store::StoreError;

/// Structured error response returned by the JSON endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Human-readable error description.
    #[schema(example = "Missing required form fields: growth_media")]
    pub error: String,
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `NOT_FOUND`,
    /// `CONFLICT`, `STORE_UNAVAILABLE`, `STORE_ERROR`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    NotFound(String),
    Conflict(String),
    /// The metadata store could not be reached after retrying.
    Unavailable(String),
    /// A store failure whose message is safe to show.
    Store(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: msg,
                    code: "VALIDATION_ERROR",
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    error: msg,
                    code: "NOT_FOUND",
                },
            ),
            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                ErrorBody {
                    error: msg,
                    code: "CONFLICT",
                },
            ),
            AppError::Unavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorBody {
                    error: msg,
                    code: "STORE_UNAVAILABLE",
                },
            ),
            AppError::Store(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    error: msg,
                    code: "STORE_ERROR",
                },
            ),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: "An unexpected error occurred".into(),
                        code: "INTERNAL_ERROR",
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err.reason)
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Conflict(path) => {
                AppError::Conflict(format!("File '{path}' already exists"))
            }
            StorageError::NotFound(_) => AppError::NotFound("File not found".into()),
            StorageError::UnsafePath(reason) => {
                tracing::warn!(reason, "Rejected unsafe path");
                AppError::Validation(format!("Invalid file path: {reason}"))
            }
            StorageError::NotAFile(_) => AppError::Validation(
                "The requested path refers to a directory, not a file".into(),
            ),
            StorageError::SizeLimitExceeded { limit, .. } => {
                AppError::Validation(format!("File exceeds maximum size of {limit} bytes"))
            }
            StorageError::Io(e) => AppError::Internal(format!("Storage I/O error: {e}")),
        }
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Validation(msg) => AppError::Validation(msg),
            UploadError::Conflict(msg) => AppError::Conflict(msg),
            UploadError::Io(detail) => AppError::Internal(detail),
            UploadError::Store(store) => match store {
                StoreError::MissingValue { column: Some(column) } => {
                    AppError::Validation(format!("'{column}' cannot be empty."))
                }
                StoreError::MissingValue { column: None } => {
                    AppError::Validation("A required field cannot be empty.".into())
                }
                StoreError::Duplicate(detail) => {
                    tracing::warn!(%detail, "Duplicate catalog entry rejected");
                    AppError::Validation(
                        "Database constraint error: a model with this file name is already registered."
                            .into(),
                    )
                }
                StoreError::ConnectionUnavailable(detail) => {
                    tracing::error!(%detail, "Upload failed: metadata store unavailable");
                    AppError::Unavailable("Database connection unavailable.".into())
                }
                StoreError::Query(detail) => {
                    AppError::Internal(format!("Catalog insert failed: {detail}"))
                }
            },
        }
    }
}

impl From<QueryError> for AppError {
    fn from(err: QueryError) -> Self {
        if err.source.is_unavailable() {
            AppError::Unavailable(err.message)
        } else {
            AppError::Store(err.message)
        }
    }
}
