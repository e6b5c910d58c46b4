// src/errors.rs

//! Crate-wide error types.
//!
//! - [`InkflowError`] covers configuration, IO and session-level failures.
//! - [`GenerationError`] is page-scoped: it ends one page in `Error` and never
//!   aborts the session.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum InkflowError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Unsupported persona image: {0}")]
    UnsupportedImage(String),

    #[error("Credentials rejected: {0}")]
    CredentialsRejected(String),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failure of a single remote generation call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// Credential rejected or expired. Escalated above the page level.
    #[error("credential rejected: {0}")]
    Auth(String),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The service answered, but the structured content did not validate.
    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("response carried no image data")]
    MissingImage,
}

impl GenerationError {
    /// Classify a failed remote call from its HTTP status (if any) and the
    /// error text returned by the service.
    pub fn classify(status: Option<u16>, message: impl Into<String>) -> Self {
        let message = message.into();
        let lowered = message.to_lowercase();

        let auth_status = matches!(status, Some(401) | Some(403));
        let auth_text = message.contains("Requested entity")
            || message.contains("API_KEY_INVALID")
            || lowered.contains("permission denied");

        if auth_status || auth_text {
            GenerationError::Auth(message)
        } else {
            GenerationError::Transport(message)
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, GenerationError::Auth(_))
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, InkflowError>;
