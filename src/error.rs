// ABOUTME: Centralized error handling with the surfaced/swallowed split the identity flow needs
// ABOUTME: Maps application errors to HTTP responses without exposing platform internals

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

use crate::appwrite::PlatformError;

#[derive(Debug)]
pub enum AppError {
    /// The platform refused to issue the email OTP. Always surfaced.
    OtpDispatch(String),
    /// The OTP-for-session exchange failed. Logged; callers observe an absent session id.
    SessionCreation(String),
    /// A document query failed. Swallowed by current-user resolution, surfaced elsewhere.
    Lookup(String),
    /// Any other platform call failure.
    Platform(PlatformError),
    Unauthorized(String),
    BadRequest(String),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::OtpDispatch(msg) => write!(f, "OTP dispatch failed: {}", msg),
            AppError::SessionCreation(msg) => write!(f, "Session creation failed: {}", msg),
            AppError::Lookup(msg) => write!(f, "Lookup failed: {}", msg),
            AppError::Platform(err) => write!(f, "Platform error: {}", err),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::OtpDispatch(msg) => {
                tracing::error!("otp dispatch failed: {}", msg);
                (StatusCode::BAD_GATEWAY, "Failed to send email OTP")
            }
            AppError::SessionCreation(msg) => {
                tracing::warn!("session creation failed: {}", msg);
                (StatusCode::UNAUTHORIZED, "Failed to verify OTP")
            }
            AppError::Lookup(msg) => {
                tracing::error!("lookup failed: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Lookup failed")
            }
            AppError::Platform(err) => {
                tracing::error!("platform call failed: {}", err);
                (StatusCode::BAD_GATEWAY, "Backend platform request failed")
            }
            AppError::Unauthorized(msg) => {
                tracing::warn!("unauthorized: {}", msg);
                (StatusCode::UNAUTHORIZED, "Authentication required")
            }
            AppError::BadRequest(msg) => {
                tracing::warn!("bad request: {}", msg);
                (StatusCode::BAD_REQUEST, msg.as_str())
            }
            AppError::Internal(msg) => {
                tracing::error!("internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<PlatformError> for AppError {
    fn from(err: PlatformError) -> Self {
        AppError::Platform(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
