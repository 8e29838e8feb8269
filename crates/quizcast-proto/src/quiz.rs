//! Quiz domain types shared by REST payloads and real-time events.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::{QuestionId, QuizId, QuizUserId};

/// One answer option of a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizOption {
    /// Option key shown to participants ("A", "B", ...).
    pub key: String,
    /// Option text.
    pub text: String,
    /// Correctness flag. Only present in the owner's view of a quiz.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
}

impl QuizOption {
    /// Create an option without a correctness flag.
    pub fn new(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self { key: key.into(), text: text.into(), is_correct: None }
    }
}

/// A question as presented to participants.
///
/// Immutable once received. The client holds at most one current question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    /// Server-assigned id. Missing on unsaved drafts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_id: Option<QuestionId>,
    /// Question text.
    pub text: String,
    /// Answer options.
    pub options: Vec<QuizOption>,
    /// Time allowed for answering.
    pub time_limit_seconds: u32,
    /// Marks awarded for a correct answer.
    pub max_marks: u32,
}

impl QuizQuestion {
    /// Whether `key` names one of this question's options.
    pub fn has_option(&self, key: &str) -> bool {
        self.options.iter().any(|o| o.key == key)
    }
}

/// Lifecycle status of a quiz on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizStatus {
    /// Being edited; not joinable.
    Draft,
    /// Hosted with a join code; waiting for start.
    Published,
    /// Started; questions may be pushed.
    Active,
    /// Finished.
    Ended,
}

/// A quiz as returned by the owner-facing endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    /// Storage id.
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Public quiz id.
    pub quiz_id: QuizId,
    /// Title.
    pub title: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Lifecycle status.
    pub status: QuizStatus,
    /// Join code, present once hosted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_code: Option<String>,
    /// Owning user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_user_id: Option<String>,
    /// Questions in push order.
    #[serde(default)]
    pub questions: Vec<QuizQuestion>,
    /// Creation timestamp (ISO 8601, as sent by the server).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Last update timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Current participant count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participants: Option<u32>,
    /// Participant count over the quiz lifetime.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_participants: Option<u32>,
}

/// A participant of a running quiz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Participant id.
    pub quiz_user_id: QuizUserId,
    /// Display name.
    pub participant_name: String,
    /// Score so far.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_score: Option<f64>,
}

/// One leaderboard row. Same shape as [`Participant`]; ordering is the
/// server's (score descending).
pub type LeaderboardEntry = Participant;

/// Authenticated user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Public user id.
    pub user_id: String,
    /// Login name.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Given name.
    #[serde(default)]
    pub first_name: String,
    /// Family name.
    #[serde(default)]
    pub last_name: String,
}

/// Live vote counts for the current question, keyed by option.
///
/// Replaced wholesale on each server push; never accumulated client-side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoteTally(BTreeMap<String, u32>);

impl VoteTally {
    /// Empty tally.
    pub fn new() -> Self {
        Self::default()
    }

    /// Votes for one option.
    pub fn count(&self, key: &str) -> u32 {
        self.0.get(key).copied().unwrap_or(0)
    }

    /// Total votes cast.
    pub fn total(&self) -> u32 {
        self.0.values().sum()
    }

    /// Share of votes for `key`, rounded to a whole percent. Zero when no
    /// votes have been cast.
    pub fn percentage(&self, key: &str) -> u32 {
        let total = self.total();
        if total == 0 {
            return 0;
        }
        (f64::from(self.count(key)) * 100.0 / f64::from(total)).round() as u32
    }

    /// Whether no votes were reported.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate `(option key, count)` in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl FromIterator<(String, u32)> for VoteTally {
    fn from_iter<I: IntoIterator<Item = (String, u32)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
