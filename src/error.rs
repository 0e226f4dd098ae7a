use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Domain and infrastructure failures surfaced by handlers.
///
/// Ownership is folded into not-found: a schedule or activity that exists
/// but belongs to someone else produces exactly the same error as one that
/// does not exist at all.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("SCHEDULE with ID {0} cannot be found")]
    ScheduleNotFound(i64),
    #[error("Activity with ID {0} not found.")]
    ActivityNotFound(i64),
    #[error("schedules for owner {0} could not be retrieved")]
    ScheduleQuery(i64),
    #[error("Email already registered")]
    EmailTaken,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Normalized error body returned for every failure.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    pub name: &'static str,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::ScheduleNotFound(_) | ApiError::ActivityNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            ApiError::EmailTaken | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::ScheduleQuery(_) | ApiError::Database(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ApiError::ScheduleNotFound(_) => "ErrorScheduleNotFound",
            ApiError::ActivityNotFound(_) => "ErrorActivityNotFound",
            ApiError::ScheduleQuery(_) => "ErrorScheduleQuery",
            ApiError::EmailTaken => "ErrorUserAlreadyExists",
            ApiError::InvalidCredentials => "ErrorInvalidCredentials",
            ApiError::Validation(_) => "ValidationError",
            ApiError::Database(_) => "StorageError",
            ApiError::Internal(_) => "InternalError",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, name = self.name(), "request failed");
        }
        let body = ErrorBody {
            message: self.to_string(),
            name: self.name(),
        };
        (status, Json(body)).into_response()
    }
}
