//! REST request bodies.

use serde::{Deserialize, Serialize};

use crate::{
    ids::{QuestionId, QuizUserId},
    quiz::QuizQuestion,
};

/// Join a quiz by code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    /// Join code, already trimmed and upper-cased.
    pub join_code: String,
    /// Display name, already trimmed.
    pub name: String,
    /// Logged-in user id, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// One participant's answer to one question.
///
/// Write-once per question per participant. The client guards against double
/// submission; the server is expected to be idempotent per
/// `(question_id, quiz_user_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerSubmission {
    /// Answering participant.
    pub quiz_user_id: QuizUserId,
    /// Question being answered.
    pub question_id: QuestionId,
    /// Chosen option key.
    pub selected_option_key: String,
    /// Seconds left on the countdown when the option was chosen.
    pub time_left_seconds: u32,
}

/// Leave a quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequest {
    /// Leaving participant.
    pub quiz_user_id: QuizUserId,
}

/// Quiz contents for create and update calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizDraft {
    /// Title.
    pub title: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Questions.
    pub questions: Vec<QuizQuestion>,
}

/// Email/password login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Account email.
    pub email: String,
    /// Account password.
    pub password: String,
}

/// Account creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupRequest {
    /// Login name.
    pub username: String,
    /// Account email.
    pub email: String,
    /// Account password.
    pub password: String,
    /// Full name.
    pub name: String,
}

/// Filters for list endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Restrict to one owner (admin listing only).
    pub owner_user_id: Option<String>,
    /// Free-text search.
    pub search: Option<String>,
    /// 1-based page.
    pub page: Option<u32>,
    /// Page size.
    pub limit: Option<u32>,
}

impl ListQuery {
    /// Query pairs in a stable order. Empty strings and zero values are
    /// omitted, the same as an unset filter.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(owner) = self.owner_user_id.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("ownerUserId", owner.to_string()));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("search", search.to_string()));
        }
        if let Some(page) = self.page.filter(|p| *p > 0) {
            pairs.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit.filter(|l| *l > 0) {
            pairs.push(("limit", limit.to_string()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use super::*;

    #[test]
    fn answer_submission_wire_shape() {
        let submission = AnswerSubmission {
            quiz_user_id: QuizUserId::new("u1"),
            question_id: QuestionId::new("Q1"),
            selected_option_key: "B".into(),
            time_left_seconds: 30,
        };
        assert_snapshot!(
            serde_json::to_string(&submission).unwrap(),
            @r#"{"quizUserId":"u1","questionId":"Q1","selectedOptionKey":"B","timeLeftSeconds":30}"#
        );
    }

    #[test]
    fn join_request_omits_missing_user() {
        let req = JoinRequest { join_code: "AB12CD".into(), name: "Ada".into(), user_id: None };
        assert_snapshot!(
            serde_json::to_string(&req).unwrap(),
            @r#"{"joinCode":"AB12CD","name":"Ada"}"#
        );
    }

    #[test]
    fn list_query_skips_unset_filters() {
        let query = ListQuery { search: Some("space".into()), page: Some(2), ..Default::default() };
        assert_eq!(
            query.pairs(),
            vec![("search", "space".to_string()), ("page", "2".to_string())]
        );
        assert!(ListQuery::default().pairs().is_empty());
    }
}
