//! Error handling for the remote control API
//!
//! `ApiError` covers everything a request handler can fail with and maps
//! itself onto an HTTP status plus a JSON body via Axum's IntoResponse.
//! `ListenerError` covers failures to bring a network listener up; those
//! never reach a client and are reported by the lifecycle manager instead.

use std::path::PathBuf;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// API error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for client-side handling
    pub code: &'static str,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Main API error type
#[derive(Error, Debug)]
pub enum ApiError {
    // ========== Authentication & Authorization ==========
    /// Caller is not on the authorization list or carries no valid credential
    #[error("authentication required")]
    Unauthorized,

    /// Invalid token (expired, malformed, wrong signature)
    #[error("invalid authentication token: {0}")]
    InvalidToken(String),

    /// Operation not permitted in the current configuration
    #[error("forbidden: {0}")]
    Forbidden(String),

    // ========== Validation Errors ==========
    /// Request validation failed
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Invalid request body format
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    // ========== Player Errors ==========
    /// The player process is not connected
    #[error("player is not available")]
    PlayerUnavailable,

    /// The player rejected or failed to execute a command
    #[error("player command failed: {0}")]
    PlayerCommandFailed(String),

    /// The player did not answer a command in time
    #[error("player did not respond within {0} seconds")]
    PlayerTimeout(u64),

    // ========== Internal Errors ==========
    /// Credential could not be signed
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl ApiError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 401 Unauthorized
            Self::Unauthorized | Self::InvalidToken(_) => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            Self::Forbidden(_) => StatusCode::FORBIDDEN,

            // 400 Bad Request
            Self::ValidationError(_) | Self::InvalidBody(_) => StatusCode::BAD_REQUEST,

            // 502 Bad Gateway
            Self::PlayerCommandFailed(_) => StatusCode::BAD_GATEWAY,

            // 503 Service Unavailable
            Self::PlayerUnavailable => StatusCode::SERVICE_UNAVAILABLE,

            // 504 Gateway Timeout
            Self::PlayerTimeout(_) => StatusCode::GATEWAY_TIMEOUT,

            // 500 Internal Server Error
            Self::Jwt(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code string for client-side handling
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::InvalidToken(_) => "INVALID_TOKEN",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::InvalidBody(_) => "INVALID_BODY",
            Self::PlayerUnavailable => "PLAYER_UNAVAILABLE",
            Self::PlayerCommandFailed(_) => "PLAYER_COMMAND_FAILED",
            Self::PlayerTimeout(_) => "PLAYER_TIMEOUT",
            Self::Jwt(_) => "JWT_ERROR",
        }
    }

    /// Log the error with appropriate severity based on status code
    pub fn log(&self) {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(
                error = %self,
                code = self.error_code(),
                status = status.as_u16(),
                "Server error occurred"
            );
        } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            tracing::warn!(
                error = %self,
                code = self.error_code(),
                status = status.as_u16(),
                "Authorization error"
            );
        } else {
            tracing::debug!(
                error = %self,
                code = self.error_code(),
                status = status.as_u16(),
                "Client error"
            );
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log();

        let status = self.status_code();
        let error_response = ErrorResponse {
            code: self.error_code(),
            message: self.to_string(),
            details: None,
        };

        (status, Json(error_response)).into_response()
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidBody(rejection.body_text())
    }
}

/// Failure to construct a network listener
#[derive(Error, Debug)]
pub enum ListenerError {
    /// The address could not be bound (in use, permission denied, bad host)
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Certificate or key could not be loaded
    #[error("failed to load TLS material (cert: {}, key: {}): {source}", cert_path.display(), key_path.display())]
    Tls {
        cert_path: PathBuf,
        key_path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The bound socket could not be configured
    #[error("failed to configure listener socket: {0}")]
    Socket(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::Unauthorized.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::ValidationError("test".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::PlayerUnavailable.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::PlayerTimeout(5).status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(ApiError::Unauthorized.error_code(), "UNAUTHORIZED");
        assert_eq!(
            ApiError::PlayerCommandFailed("nope".into()).error_code(),
            "PLAYER_COMMAND_FAILED"
        );
    }

    #[tokio::test]
    async fn test_error_body_has_message() {
        let response = ApiError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "UNAUTHORIZED");
        assert_eq!(json["message"], "authentication required");
        assert!(json.get("details").is_none());
    }

    #[test]
    fn test_signing_failure_is_server_error() {
        let err = ApiError::from(jsonwebtoken::errors::Error::from(
            jsonwebtoken::errors::ErrorKind::InvalidKeyFormat,
        ));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error_code(), "JWT_ERROR");
    }

    #[test]
    fn test_listener_error_display() {
        let err = ListenerError::Tls {
            cert_path: PathBuf::from("/missing/cert.pem"),
            key_path: PathBuf::from("/missing/key.pem"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/missing/cert.pem"));
        assert!(msg.contains("/missing/key.pem"));
    }
}
