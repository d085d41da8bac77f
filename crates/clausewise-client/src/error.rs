//! Error types for the ClauseWise client.

use std::path::PathBuf;
use std::time::Duration;

use crate::upload::FileRejection;

/// Client errors.
///
/// Every server-side failure carries a normalized, human-readable message
/// (see [`crate::detail::extract_detail_message`]) plus the HTTP status where
/// one exists, so callers can either show the message or branch on the code.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Token missing, invalid, or expired (HTTP 401). The session has
    /// already been torn down by the time the caller sees this.
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    /// The server rejected the request with a structured error payload.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// Rate limit exceeded.
    #[error("rate limited: retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// Transport failure: connection refused, timeout, TLS, ...
    #[error("network error: {message}")]
    Network { message: String },

    /// The server answered 2xx but the body did not match the expected shape.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },

    /// Client-side pre-upload validation rejected the selection.
    #[error("upload rejected: {}", describe_rejections(.rejections))]
    UploadRejected { rejections: Vec<FileRejection> },

    /// A local file selected for upload could not be inspected or read.
    #[error("cannot read {}: {message}", path.display())]
    File { path: PathBuf, message: String },

    /// Persisted session could not be read or written.
    #[error("session storage error: {message}")]
    Storage { message: String },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },
}

fn describe_rejections(rejections: &[FileRejection]) -> String {
    if rejections.is_empty() {
        return "no file selected".to_string();
    }
    rejections
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ClientError {
    /// HTTP status code of the failed response, if the failure came from one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Api { status, .. } => Some(*status),
            Self::RateLimited { .. } => Some(429),
            _ => None,
        }
    }

    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { message, .. } | Self::Unauthorized { message } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Api { .. } | Self::InvalidResponse { .. } | Self::File { .. } => 1,
            Self::Config { .. } | Self::Storage { .. } => 2,
            Self::Unauthorized { .. } => 3,
            Self::UploadRejected { .. } => 4,
            Self::RateLimited { .. } | Self::Network { .. } => 5,
        }
    }

    /// Whether the error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Network { .. })
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
