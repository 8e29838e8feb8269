//! Persisted participant session.
//!
//! A participant's `{quizId, quizUserId}` pair is written to durable storage
//! on join so a restart resumes the same session. The last display name is
//! stored base64-encoded. That is obfuscation against casual reading, not
//! protection.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use quizcast_proto::{QuizId, QuizUserId};
use serde::{Deserialize, Serialize};

/// A participant's binding to one quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Joined quiz.
    pub quiz_id: QuizId,
    /// Participant id within that quiz.
    pub quiz_user_id: QuizUserId,
}

impl Session {
    /// Create a session.
    pub fn new(quiz_id: impl Into<QuizId>, quiz_user_id: impl Into<QuizUserId>) -> Self {
        Self { quiz_id: quiz_id.into(), quiz_user_id: quiz_user_id.into() }
    }

    /// JSON form written to storage.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse the stored form. Malformed JSON or empty ids yield `None`.
    pub fn decode(stored: &str) -> Option<Self> {
        let session: Self = serde_json::from_str(stored).ok()?;
        if session.quiz_id.as_str().is_empty() || session.quiz_user_id.as_str().is_empty() {
            return None;
        }
        Some(session)
    }
}

/// Raw values read from storage at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedState {
    /// Stored session JSON.
    pub session: Option<String>,
    /// Last join code.
    pub join_code: Option<String>,
    /// Last display name, obfuscated.
    pub display_name: Option<String>,
}

/// Obfuscate a display name for storage.
pub fn obfuscate(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

/// Reverse [`obfuscate`]. Input that is not valid base64 of UTF-8 text is
/// returned unchanged.
pub fn deobfuscate(text: &str) -> String {
    STANDARD
        .decode(text)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_else(|| text.to_string())
}
