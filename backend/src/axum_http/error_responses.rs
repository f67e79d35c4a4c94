use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::usecases::{
    assistant::AssistantError, live_sync::LiveSyncError, subscriptions::SubscriptionError,
};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
}

pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            code: status.as_u16(),
            message: message.into(),
        }),
    )
        .into_response()
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::BadRequest(message) => error_response(StatusCode::BAD_REQUEST, message),
            // Internal detail stays in the logs.
            AppError::Internal(_) => error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
            ),
        }
    }
}

impl IntoResponse for SubscriptionError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            SubscriptionError::Internal(_) => error_response(status, "Internal server error"),
            other => error_response(status, other.to_string()),
        }
    }
}

impl IntoResponse for LiveSyncError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            LiveSyncError::Internal(_) => error_response(status, "Internal server error"),
            other => error_response(status, other.to_string()),
        }
    }
}

impl IntoResponse for AssistantError {
    fn into_response(self) -> Response {
        error_response(self.status_code(), self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_errors_do_not_leak_details() {
        let response = SubscriptionError::Internal(anyhow::anyhow!("password=hunter2")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = AppError::Internal(anyhow::anyhow!("db down")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn domain_errors_keep_their_status() {
        assert_eq!(
            SubscriptionError::SubscriptionNotFound.into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            LiveSyncError::Forbidden.into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            LiveSyncError::Upstream(anyhow::anyhow!("quota")).into_response().status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AssistantError::EmptyMessage.into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }
}
