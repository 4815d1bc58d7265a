// SPDX-License-Identifier: MPL-2.0

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::records::EntryRejected;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request was malformed or asked for something the time entry rules forbid.
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    /// Anything that went wrong talking to the database.  These are never retried.
    #[error("storage error: {0:#}")]
    Storage(anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<EntryRejected>() {
            Ok(rejected) => ApiError::Validation(rejected.to_string()),
            Err(err) => ApiError::Storage(err),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match &self {
            ApiError::Storage(err) => {
                log::error!("Request failed with storage error: {err:#}");
                "internal storage error".to_owned()
            }
            ApiError::Validation(message) => {
                log::debug!("Rejected request: {message}");
                message.clone()
            }
            ApiError::NotFound(message) => message.clone(),
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_entries_become_validation_errors() {
        let err = ApiError::from(anyhow::Error::from(EntryRejected::TimerAlreadyRunning));
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn other_errors_become_storage_errors() {
        let err = ApiError::from(anyhow::anyhow!("disk on fire"));
        assert!(matches!(err, ApiError::Storage(_)));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
