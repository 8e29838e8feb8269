//! Protocol error types.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while decoding or encoding wire data.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Packet is empty or its type prefix is not recognised.
    #[error("malformed packet: {0}")]
    MalformedPacket(String),

    /// JSON body could not be parsed or produced.
    #[error("invalid json: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Event name is not part of the quiz event contract.
    #[error("unknown event: {0}")]
    UnknownEvent(String),

    /// REST envelope carried `success: false`.
    #[error("rejected by server: {}", message.as_deref().unwrap_or("no reason given"))]
    Rejected {
        /// Server-provided reason.
        message: Option<String>,
    },

    /// Text is not one of the values a field accepts.
    #[error("unknown {kind} {value:?}; expected one of {expected}")]
    UnknownValue {
        /// Field being parsed.
        kind: &'static str,
        /// Rejected text.
        value: String,
        /// Accepted values, comma separated.
        expected: &'static str,
    },

    /// Event arrived without the payload argument it requires.
    #[error("event {event} is missing its payload")]
    MissingPayload {
        /// Event name.
        event: String,
    },
}
