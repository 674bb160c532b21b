//! Centralized error types for the dlnacast core library.
//!
//! This module provides a unified error handling system that:
//! - Defines structured error types using `thiserror`
//! - Maps errors to appropriate HTTP status codes
//! - Implements `IntoResponse` for automatic JSON error responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;
use crate::content::ResolveError;
use crate::playback::NavigationError;
use crate::upnp::SoapError;

/// Trait for error types that provide machine-readable error codes.
pub trait ErrorCode {
    /// Returns a machine-readable error code for API responses.
    fn code(&self) -> &'static str;
}

impl ErrorCode for SoapError {
    fn code(&self) -> &'static str {
        match self {
            Self::Http(_) => "http_request_failed",
            Self::HttpStatus(_, _) => "http_error_status",
            Self::Fault(_) => "soap_fault",
            Self::InvalidRequest(_) => "soap_invalid_request",
        }
    }
}

impl ErrorCode for ResolveError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "content_not_found",
        }
    }
}

impl ErrorCode for NavigationError {
    fn code(&self) -> &'static str {
        match self {
            Self::IllegalNavigation => "illegal_navigation",
        }
    }
}

impl ErrorCode for ConfigError {
    fn code(&self) -> &'static str {
        match self {
            Self::Zero(_) => "invalid_configuration",
        }
    }
}

/// Application-wide error type.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum CastError {
    /// No known device has the given UDN.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// A device exists but cannot take the requested role.
    #[error("Device {0} cannot act as {1}")]
    WrongRole(String, &'static str),

    /// Media server request path did not resolve.
    #[error("Content not found: {0}")]
    ContentNotFound(String),

    /// Client sent an invalid or malformed request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Navigation past the root folder.
    #[error("Illegal navigation: {0}")]
    IllegalNavigation(String),

    /// SOAP request to a device failed.
    #[error("SOAP request failed: {0}")]
    Soap(String),

    /// The orchestrator task is no longer running.
    #[error("Playback orchestrator is not running")]
    OrchestratorStopped,

    /// Network-related error (IP detection, binding).
    #[error("Network error: {0}")]
    Network(String),

    /// Configuration rejected at startup.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ErrorCode for CastError {
    fn code(&self) -> &'static str {
        match self {
            Self::DeviceNotFound(_) => "device_not_found",
            Self::WrongRole(_, _) => "wrong_device_role",
            Self::ContentNotFound(_) => "content_not_found",
            Self::InvalidRequest(_) => "invalid_request",
            Self::IllegalNavigation(_) => "illegal_navigation",
            Self::Soap(_) => "soap_error",
            Self::OrchestratorStopped => "orchestrator_stopped",
            Self::Network(_) => "network_error",
            Self::Configuration(_) => "configuration_error",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl CastError {
    /// Maps the error to an appropriate HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::DeviceNotFound(_) | Self::ContentNotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidRequest(_) | Self::WrongRole(_, _) => StatusCode::BAD_REQUEST,
            Self::IllegalNavigation(_) => StatusCode::CONFLICT,
            Self::Soap(_) => StatusCode::BAD_GATEWAY,
            Self::OrchestratorStopped | Self::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Network(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Convenient Result alias for application-wide operations.
pub type CastResult<T> = Result<T, CastError>;

/// JSON response body for error responses.
#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
    status: u16,
}

impl IntoResponse for CastError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.code(),
            message: self.to_string(),
            status: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<SoapError> for CastError {
    fn from(err: SoapError) -> Self {
        Self::Soap(err.to_string())
    }
}

impl From<ResolveError> for CastError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::NotFound(path) => Self::ContentNotFound(path),
        }
    }
}

impl From<NavigationError> for CastError {
    fn from(err: NavigationError) -> Self {
        Self::IllegalNavigation(err.to_string())
    }
}

impl From<ConfigError> for CastError {
    fn from(err: ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}
