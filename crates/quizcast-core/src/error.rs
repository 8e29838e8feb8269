//! Error types for the I/O seams.
//!
//! Failures fall into three user-facing classes: transport failures (generic
//! "network error", no retry), business-rule rejections (server message shown
//! verbatim), and local storage problems. None are fatal to the process.

use quizcast_proto::ProtocolError;
use thiserror::Error;

/// Message shown for transport-level failures.
pub const NETWORK_ERROR_MESSAGE: &str =
    "Network error. Please check if the backend server is running.";

/// REST call failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// Server answered with `success: false`.
    #[error("{}", message.as_deref().unwrap_or("request rejected"))]
    Rejected {
        /// Server-provided reason.
        message: Option<String>,
    },

    /// Response body did not match the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// Neither the session cookie nor the stored token was accepted.
    #[error("not logged in")]
    Unauthorized,
}

impl ApiError {
    /// Text to show the user.
    ///
    /// Rejections surface the server's message verbatim, falling back to
    /// `fallback` when the server gave none. Everything else collapses to the
    /// generic network message.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Rejected { message } => message.clone().unwrap_or_else(|| fallback.to_string()),
            Self::Unauthorized => "Please log in first.".to_string(),
            Self::Network(_) | Self::Decode(_) => NETWORK_ERROR_MESSAGE.to_string(),
        }
    }
}

impl From<ProtocolError> for ApiError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::Rejected { message } => Self::Rejected { message },
            other => Self::Decode(other.to_string()),
        }
    }
}

/// Real-time channel failure.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Connection is gone.
    #[error("channel closed")]
    Closed,

    /// Connecting or writing failed.
    #[error("channel transport error: {0}")]
    Transport(String),

    /// Server sent something outside the event contract.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Local storage failure.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage i/o: {0}")]
    Io(#[from] std::io::Error),

    /// Backing file is not a JSON object of strings.
    #[error("storage file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}
