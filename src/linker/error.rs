//! Linker Error Types

use thiserror::Error;

/// Result type for linker construction
pub type LinkerResult<T> = Result<T, LinkerError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LinkerError {
    /// The project name is needed to build the reference patterns
    #[error("Project name must not be empty")]
    EmptyProjectName,

    #[error("Invalid reference pattern: {message}")]
    InvalidPattern { message: String },
}

impl LinkerError {
    pub fn pattern(message: impl Into<String>) -> Self {
        Self::InvalidPattern {
            message: message.into(),
        }
    }
}
