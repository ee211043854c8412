//! Maps `AppError` onto HTTP responses.
//!
//! Client errors carry their own message. Server errors are logged with
//! their cause and answered with a fixed message chosen by the route, so
//! nothing internal leaks to the browser.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domains::AppError;
use serde_json::json;
use tracing::error;

const GENERIC_MESSAGE: &str = "Internal server error";

#[derive(Debug)]
pub struct ApiError {
    error: AppError,
    public_message: &'static str,
}

impl ApiError {
    pub fn new(error: AppError, public_message: &'static str) -> Self {
        Self {
            error,
            public_message,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        AppError::InvalidInput(message.into()).into()
    }

    pub fn status(&self) -> StatusCode {
        match self.error {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) | AppError::SessionExpired => StatusCode::UNAUTHORIZED,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Configuration(_) | AppError::Storage(_) | AppError::Delivery(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn client_message(&self) -> String {
        match &self.error {
            AppError::Unauthorized(msg) | AppError::RateLimited(msg) | AppError::InvalidInput(msg) => {
                msg.clone()
            }
            AppError::SessionExpired => "session expired, please log in again".into(),
            _ => self.public_message.into(),
        }
    }
}

impl From<AppError> for ApiError {
    fn from(error: AppError) -> Self {
        Self::new(error, GENERIC_MESSAGE)
    }
}

/// Attaches the route's public failure message to a service result.
pub trait OrReport<T> {
    fn or_report(self, public_message: &'static str) -> Result<T, ApiError>;
}

impl<T> OrReport<T> for domains::Result<T> {
    fn or_report(self, public_message: &'static str) -> Result<T, ApiError> {
        self.map_err(|e| ApiError::new(e, public_message))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.error, "{}", self.public_message);
        }
        (status, Json(json!({ "error": self.client_message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_follows_the_taxonomy() {
        let cases = [
            (AppError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (AppError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (AppError::SessionExpired, StatusCode::UNAUTHORIZED),
            (AppError::RateLimited("x".into()), StatusCode::TOO_MANY_REQUESTS),
            (AppError::Configuration("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::Storage("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::Delivery("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(ApiError::from(error).status(), status);
        }
    }

    #[test]
    fn server_errors_hide_their_cause() {
        let err = ApiError::new(
            AppError::Storage("disk /var/data is full".into()),
            "Failed to create event",
        );
        assert_eq!(err.client_message(), "Failed to create event");

        let err = ApiError::from(AppError::InvalidInput("title and date are required".into()));
        assert_eq!(err.client_message(), "title and date are required");
    }
}
