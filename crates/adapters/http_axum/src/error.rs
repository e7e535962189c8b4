//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use twilight_domain::action::ParseActionError;
use twilight_domain::error::TwilightError;

/// JSON error body returned by every endpoint.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps application failures to an HTTP response with the right status code.
#[derive(Debug)]
pub enum ApiError {
    Domain(TwilightError),
    UnknownAction(ParseActionError),
}

impl From<TwilightError> for ApiError {
    fn from(err: TwilightError) -> Self {
        Self::Domain(err)
    }
}

impl From<ParseActionError> for ApiError {
    fn from(err: ParseActionError) -> Self {
        Self::UnknownAction(err)
    }
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        let err = match self {
            Self::UnknownAction(err) => return (StatusCode::BAD_REQUEST, err.to_string()),
            Self::Domain(err) => err,
        };
        match err {
            TwilightError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            TwilightError::InvalidProfile(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            TwilightError::Config(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            TwilightError::Conflict(err) => (StatusCode::CONFLICT, err.to_string()),
            TwilightError::Capacity(err) => (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
            TwilightError::SunCalc(err) => (StatusCode::BAD_GATEWAY, err.to_string()),
            TwilightError::Dispatch(err) => {
                tracing::warn!(step = err.step_index, cause = %err.source, "dispatch failed");
                (StatusCode::BAD_GATEWAY, err.to_string())
            }
            TwilightError::Client(err) => {
                tracing::warn!(error = %err, "lighting api call failed");
                (StatusCode::BAD_GATEWAY, "lighting api call failed".to_string())
            }
            TwilightError::Storage(err) => {
                tracing::error!(error = %err, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        (status, Json(ErrorBody { error: message })).into_response()
    }
}
