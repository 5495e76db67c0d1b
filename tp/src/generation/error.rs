//! Generation client error types

use std::time::Duration;
use thiserror::Error;

/// Message used when a failed response carries no provider message
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Errors that can occur while calling the generation endpoint
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("No content returned from the generation endpoint")]
    EmptyResponse,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl GenerationError {
    /// Check if this error is worth retrying
    pub fn is_retryable(&self) -> bool {
        match self {
            GenerationError::Api { status, .. } => is_retryable_status(*status),
            GenerationError::Network(_) => true,
            GenerationError::Timeout(_) => true,
            GenerationError::EmptyResponse => false,
            GenerationError::InvalidResponse(_) => false,
        }
    }

    /// HTTP status for API errors
    pub fn status(&self) -> Option<u16> {
        match self {
            GenerationError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Check if an HTTP status code is retryable: 408, 429 and any 5xx
pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500..=599)
}
