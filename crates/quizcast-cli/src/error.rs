//! Command-line errors.

use std::{io, path::PathBuf};

use quizcast_app::{ConfigError, RuntimeError};
use quizcast_client::DraftError;
use quizcast_core::{ApiError, StorageError};
use thiserror::Error;

use crate::terminal::TerminalError;

/// Failure that ends a `quizcast` invocation.
#[derive(Debug, Error)]
pub enum CliError {
    /// Backend URL is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Session file unreadable or unwritable.
    #[error("session file: {0}")]
    Storage(#[from] StorageError),

    /// A REST call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// An operation was refused.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Terminal I/O failed.
    #[error(transparent)]
    Terminal(#[from] TerminalError),

    /// Quiz draft failed validation.
    #[error("invalid quiz: {0}")]
    Draft(#[from] DraftError),

    /// Input file could not be read.
    #[error("could not read {path}: {source}")]
    InputFile {
        /// File given on the command line.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },

    /// Input file is not valid JSON for what it should hold.
    #[error("{path} is not a {what}: {source}")]
    InputJson {
        /// File given on the command line.
        path: PathBuf,
        /// Expected contents, for the message.
        what: &'static str,
        /// Parser error.
        source: serde_json::Error,
    },

    /// Arguments passed parsing but make no sense together.
    #[error("{0}")]
    Usage(String),

    /// Writing output failed.
    #[error("output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Text to show the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(err) => err.user_message("Request failed"),
            Self::Runtime(err) => err.user_message("Request failed"),
            other => other.to_string(),
        }
    }
}
