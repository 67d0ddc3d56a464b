//! Tracker Error Types

use thiserror::Error;

/// Result type for tracker operations
pub type TrackerResult<T> = Result<T, TrackerError>;

/// Errors raised while talking to the issue tracker
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TrackerError {
    /// The tracker could not be reached or answered with an error status
    #[error("Tracker request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// The response body was not the JSON shape we expect
    #[error("Unexpected tracker response from {url}: {message}")]
    InvalidResponse { url: String, message: String },

    /// A single ticket record could not be interpreted
    #[error("Malformed ticket record: {message}")]
    MalformedRecord { message: String },

    #[error("Invalid tracker date: {value}")]
    InvalidDate { value: String },
}

impl TrackerError {
    pub fn transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn invalid_response(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedRecord {
            message: message.into(),
        }
    }
}
