//! REST response envelope and payloads.
//!
//! The server wraps every payload as `{success, message?, ...payload}`. The
//! flag decides whether the flattened remainder is a payload or the message
//! is a rejection reason, so decoding happens in two steps: [`Envelope`] first,
//! then [`Envelope::into_result`] for the typed payload.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::{
    errors::{ProtocolError, Result},
    ids::{QuizId, QuizUserId},
    quiz::{LeaderboardEntry, Participant, Quiz, QuizQuestion, User},
};

/// Decoded response envelope.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Envelope {
    /// Whether the server accepted the request.
    pub success: bool,
    /// Human-readable outcome; the rejection reason when `success` is false.
    #[serde(default)]
    pub message: Option<String>,
    /// Everything else in the body.
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Envelope {
    /// Parse a response body.
    pub fn from_json(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }

    /// Typed payload, or [`ProtocolError::Rejected`] carrying the server's
    /// message when `success` is false.
    pub fn into_result<T: DeserializeOwned>(self) -> Result<T> {
        if !self.success {
            return Err(ProtocolError::Rejected { message: self.message });
        }
        Ok(serde_json::from_value(Value::Object(self.payload))?)
    }

    /// Typed payload nested under a `data` field, the shape used by the
    /// goal and daily-task endpoints.
    pub fn into_data<T: DeserializeOwned>(self) -> Result<T> {
        let Nested { data } = self.into_result()?;
        Ok(data)
    }

    /// Succeeds when the server accepted the request; the payload is ignored.
    pub fn into_ack(self) -> Result<()> {
        if self.success { Ok(()) } else { Err(ProtocolError::Rejected { message: self.message }) }
    }
}

#[derive(Deserialize)]
struct Nested<T> {
    data: T,
}

/// Successful join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinResponse {
    /// Joined quiz.
    pub quiz_id: QuizId,
    /// Participant id for this quiz.
    pub quiz_user_id: QuizUserId,
}

/// Successful host (publish) call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostResponse {
    /// Generated join code.
    #[serde(default)]
    pub join_code: Option<String>,
}

/// The question a quiz is presenting right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentQuestion {
    /// Index of the current question; negative when none has been pushed.
    #[serde(default = "no_index")]
    pub index: i64,
    /// The question, when one is current.
    #[serde(default)]
    pub question: Option<QuizQuestion>,
}

fn no_index() -> i64 {
    -1
}

impl CurrentQuestion {
    /// The current question, if the server reported one.
    pub fn active(self) -> Option<QuizQuestion> {
        if self.index >= 0 { self.question } else { None }
    }
}

/// Single quiz lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizResponse {
    /// The quiz.
    pub quiz: Quiz,
}

/// Participant listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantsResponse {
    /// Participants in join order.
    #[serde(default)]
    pub participants: Vec<Participant>,
}

/// Final standings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardResponse {
    /// Rows, highest score first.
    #[serde(default)]
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// Paging metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Current page.
    pub page: u32,
    /// Page size.
    pub limit: u32,
    /// Total matching items.
    pub total: u32,
    /// Another page follows.
    pub has_next: bool,
    /// A page precedes.
    pub has_prev: bool,
}

/// The caller's quizzes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizListResponse {
    /// Quizzes on this page.
    #[serde(default)]
    pub data: Vec<Quiz>,
    /// Paging metadata.
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// One finished quiz in the admin listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminQuizListItem {
    /// Quiz id.
    pub quiz_id: QuizId,
    /// Title.
    pub title: String,
    /// End timestamp.
    #[serde(default)]
    pub ended_at: Option<String>,
}

/// Finished quizzes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminQuizList {
    /// Items on this page.
    #[serde(default)]
    pub items: Vec<AdminQuizListItem>,
    /// Total matching items.
    #[serde(default)]
    pub total: u32,
}

/// Full record of a quiz for the admin view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminQuizDetails {
    /// The quiz.
    pub quiz: Quiz,
    /// Participants.
    #[serde(default)]
    pub participants: Vec<Participant>,
    /// Final standings.
    #[serde(default)]
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// Login state of the current cookie/token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    /// Whether the session is authenticated.
    #[serde(default)]
    pub is_logged_in: bool,
    /// Profile, when logged in.
    #[serde(default)]
    pub user: Option<User>,
    /// User id, when logged in.
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Successful login or signup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Profile.
    #[serde(default)]
    pub user: Option<User>,
    /// User id.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Bearer token used when cookies are not accepted.
    #[serde(default)]
    pub token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_yields_payload() {
        let env =
            Envelope::from_json(r#"{"success":true,"quizId":"q1","quizUserId":"u1"}"#).unwrap();
        let join: JoinResponse = env.into_result().unwrap();
        assert_eq!(join.quiz_id, QuizId::new("q1"));
        assert_eq!(join.quiz_user_id, QuizUserId::new("u1"));
    }

    #[test]
    fn rejected_envelope_keeps_message() {
        let env = Envelope::from_json(r#"{"success":false,"message":"Invalid join code"}"#).unwrap();
        let err = env.into_result::<JoinResponse>().unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::Rejected { message: Some(ref m) } if m == "Invalid join code"
        ));
    }

    #[test]
    fn success_with_wrong_payload_is_decode_error() {
        let env = Envelope::from_json(r#"{"success":true}"#).unwrap();
        let err = env.into_result::<JoinResponse>().unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidJson(_)));
    }

    #[test]
    fn nested_data_is_unwrapped() {
        let env = Envelope::from_json(r#"{"success":true,"data":{"quizId":"q1","quizUserId":"u1"}}"#)
            .unwrap();
        let join: JoinResponse = env.into_data().unwrap();
        assert_eq!(join.quiz_id, QuizId::new("q1"));

        let env = Envelope::from_json(r#"{"success":true}"#).unwrap();
        assert!(matches!(env.into_data::<JoinResponse>(), Err(ProtocolError::InvalidJson(_))));
    }

    #[test]
    fn ack_ignores_payload() {
        let env = Envelope::from_json(r#"{"success":true,"status":"active"}"#).unwrap();
        assert!(env.into_ack().is_ok());
    }

    #[test]
    fn current_question_without_index_is_inactive() {
        let env = Envelope::from_json(r#"{"success":true}"#).unwrap();
        let cur: CurrentQuestion = env.into_result().unwrap();
        assert_eq!(cur.index, -1);
        assert!(cur.active().is_none());
    }

    #[test]
    fn negative_index_discards_question() {
        let cur = CurrentQuestion {
            index: -1,
            question: Some(QuizQuestion {
                question_id: None,
                text: "stale".into(),
                options: vec![],
                time_limit_seconds: 10,
                max_marks: 1,
            }),
        };
        assert!(cur.active().is_none());
    }
}
