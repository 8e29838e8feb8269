//! Runtime errors.

use quizcast_client::ClientError;
use quizcast_core::{ApiError, ChannelError, StorageError};
use thiserror::Error;

/// Failure while applying an event or user request.
///
/// None of these end a session; drivers show them and carry on.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Request rejected by the state machine.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// A REST call made directly by the runtime failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Persisting session state failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Real-time channel failure.
    #[error(transparent)]
    Channel(#[from] ChannelError),
}

impl RuntimeError {
    /// Text to show the user.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Api(err) => err.user_message(fallback),
            other => other.to_string(),
        }
    }
}

/// Invalid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Backend URL does not parse.
    #[error("invalid backend URL {value:?}: {reason}")]
    InvalidUrl {
        /// Rejected value.
        value: String,
        /// Parser message.
        reason: String,
    },

    /// Backend URL is not http or https.
    #[error("backend URL must be http or https, not {0}")]
    UnsupportedScheme(String),
}
