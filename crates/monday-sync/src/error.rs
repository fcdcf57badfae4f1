//! Error types for monday.com API calls.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when calling the monday.com API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No API key configured
    #[error("monday.com API key not configured")]
    NotConfigured,

    /// Network-level failure reaching the API
    #[error("Request to monday.com API failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-200 response
    #[error("monday.com API returned error status {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// Response carried a non-empty `errors` array
    #[error("monday.com API returned errors: {}", .0.join(", "))]
    GraphQl(Vec<String>),

    /// Response body did not have the expected shape
    #[error("Failed to decode monday.com API response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Whether the failure came from the remote service rather than from us.
    #[must_use]
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Status { .. } | Self::GraphQl(_))
    }
}
