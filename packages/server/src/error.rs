//! Error responses for the API handlers.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use runner_geofence_server_models::ApiError;

/// Failures that end a request with an error status.
///
/// A location outside the geofence is not one of these; it's a `200` with
/// `allowed: false`.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// The request was malformed. Rendered as `400`.
    #[error("{error}: {details}")]
    Validation {
        /// Short summary.
        error: String,
        /// What exactly was wrong.
        details: String,
    },

    /// Something went wrong that the caller can't fix. Rendered as `500`.
    #[error("Unhandled exception: {details}")]
    Internal {
        /// Underlying failure.
        details: String,
    },
}

impl HandlerError {
    pub(crate) fn validation(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Validation {
            error: error.into(),
            details: details.into(),
        }
    }

    pub(crate) fn internal(details: impl Into<String>) -> Self {
        Self::Internal {
            details: details.into(),
        }
    }
}

impl ResponseError for HandlerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            Self::Validation { error, details } => ApiError {
                error: error.clone(),
                details: Some(details.clone()),
            },
            Self::Internal { details } => ApiError {
                error: "Unhandled exception".to_string(),
                details: Some(details.clone()),
            },
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
