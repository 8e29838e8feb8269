//! Runtime configuration.
//!
//! The backend base URL is the only setting. It comes from
//! `QUIZCAST_BACKEND_URL` (a `.env` file in the working directory is read
//! first) and falls back to a local development server.

use std::env;

use url::Url;

use crate::error::ConfigError;

/// Environment variable holding the backend base URL.
pub const BACKEND_URL_VAR: &str = "QUIZCAST_BACKEND_URL";

/// Backend used when nothing is configured.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:9000";

/// Resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Validated http(s) URL without a trailing slash.
    backend_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self { backend_url: DEFAULT_BACKEND_URL.to_string() }
    }
}

impl Config {
    /// Load from the process environment, after reading `.env` if present.
    ///
    /// # Errors
    ///
    /// `ConfigError` if the configured URL is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load using `lookup` to read variables.
    ///
    /// # Errors
    ///
    /// `ConfigError` if the configured URL is invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        match lookup(BACKEND_URL_VAR).filter(|value| !value.trim().is_empty()) {
            Some(value) => Ok(Self { backend_url: parse_backend(value.trim())? }),
            None => Ok(Self::default()),
        }
    }

    /// Replace the backend URL (e.g. from a command-line flag).
    ///
    /// # Errors
    ///
    /// `ConfigError` if `url` is invalid.
    pub fn with_backend(mut self, url: &str) -> Result<Self, ConfigError> {
        self.backend_url = parse_backend(url)?;
        Ok(self)
    }

    /// Backend base URL without a trailing slash.
    pub fn backend_url(&self) -> &str {
        &self.backend_url
    }
}

fn parse_backend(value: &str) -> Result<String, ConfigError> {
    let url = Url::parse(value)
        .map_err(|err| ConfigError::InvalidUrl { value: value.to_string(), reason: err.to_string() })?;
    match url.scheme() {
        "http" | "https" => Ok(url.as_str().trim_end_matches('/').to_string()),
        other => Err(ConfigError::UnsupportedScheme(other.to_string())),
    }
}
