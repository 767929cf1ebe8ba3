//! Domain error types
//!
//! This module defines the error hierarchy for Ferry.
//! All errors are domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main Ferry error type
///
/// This is the primary error type used throughout the application.
/// Upstream failures are carried unchanged from the HTTP adapter to the caller.
#[derive(Debug, Error)]
pub enum FerryError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Failure of a call to the tracker web API
    #[error("Upstream call failed: {0}")]
    Upstream(#[from] UpstreamError),

    /// Archive assembly or extraction errors
    #[error("Archive error: {0}")]
    Archive(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

/// Tracker API errors
///
/// Errors that occur when talking to the tracker web API.
/// These errors don't expose the HTTP client's types.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The request never produced a response
    #[error("Failed to connect to tracker server: {0}")]
    ConnectionFailed(String),

    /// The server answered with a non-success status
    #[error("Request to {url} failed with status {status}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },

    /// The response body was not what the endpoint promises
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),
}

impl From<std::io::Error> for FerryError {
    fn from(err: std::io::Error) -> Self {
        FerryError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for FerryError {
    fn from(err: serde_json::Error) -> Self {
        FerryError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for FerryError {
    fn from(err: toml::de::Error) -> Self {
        FerryError::Configuration(format!("TOML parse error: {err}"))
    }
}

impl From<zip::result::ZipError> for FerryError {
    fn from(err: zip::result::ZipError) -> Self {
        FerryError::Archive(err.to_string())
    }
}
