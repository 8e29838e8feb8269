//! Real-time events.
//!
//! socket.io delivers an event as a name plus a list of JSON arguments. The
//! quiz contract uses exactly one argument per event, always carrying the
//! `quizId` it belongs to. The channel is not scoped per connection, so
//! consumers must compare that id against their own session.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    errors::{ProtocolError, Result},
    ids::QuizId,
    quiz::{Participant, QuizQuestion, VoteTally},
};

/// Names of the events the server pushes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    /// `question:pushed`
    QuestionPushed,
    /// `quiz:started`
    QuizStarted,
    /// `quiz:ended`
    QuizEnded,
    /// `votes:update`
    VotesUpdate,
    /// `participant:joined`
    ParticipantJoined,
}

impl EventKind {
    /// Every event kind.
    pub const ALL: [EventKind; 5] = [
        EventKind::QuestionPushed,
        EventKind::QuizStarted,
        EventKind::QuizEnded,
        EventKind::VotesUpdate,
        EventKind::ParticipantJoined,
    ];

    /// Wire name.
    pub fn name(self) -> &'static str {
        match self {
            Self::QuestionPushed => "question:pushed",
            Self::QuizStarted => "quiz:started",
            Self::QuizEnded => "quiz:ended",
            Self::VotesUpdate => "votes:update",
            Self::ParticipantJoined => "participant:joined",
        }
    }

    /// Look up a kind by wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

/// `question:pushed` payload.
///
/// Participants receive the question; the host view only needs the index.
/// Either may be absent depending on the audience.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPushed {
    /// Owning quiz.
    pub quiz_id: QuizId,
    /// Pushed question.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<QuizQuestion>,
    /// Position of the question within the quiz.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
}

/// Payload of events that carry nothing but the quiz id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSignal {
    /// Owning quiz.
    pub quiz_id: QuizId,
}

/// `votes:update` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotesUpdate {
    /// Owning quiz.
    pub quiz_id: QuizId,
    /// Full tally for the current question.
    #[serde(default)]
    pub counts: VoteTally,
}

/// `participant:joined` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantJoined {
    /// Owning quiz.
    pub quiz_id: QuizId,
    /// New participant.
    pub participant: Participant,
}

/// An event pushed by the server, validated and narrowed.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// A question became current.
    QuestionPushed(QuestionPushed),
    /// The host started the quiz.
    QuizStarted(QuizSignal),
    /// The quiz is over.
    QuizEnded(QuizSignal),
    /// Vote counts for the current question changed.
    VotesUpdate(VotesUpdate),
    /// Someone joined.
    ParticipantJoined(ParticipantJoined),
}

impl ServerEvent {
    /// Event kind.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::QuestionPushed(_) => EventKind::QuestionPushed,
            Self::QuizStarted(_) => EventKind::QuizStarted,
            Self::QuizEnded(_) => EventKind::QuizEnded,
            Self::VotesUpdate(_) => EventKind::VotesUpdate,
            Self::ParticipantJoined(_) => EventKind::ParticipantJoined,
        }
    }

    /// Quiz the event belongs to.
    pub fn quiz_id(&self) -> &QuizId {
        match self {
            Self::QuestionPushed(p) => &p.quiz_id,
            Self::QuizStarted(p) | Self::QuizEnded(p) => &p.quiz_id,
            Self::VotesUpdate(p) => &p.quiz_id,
            Self::ParticipantJoined(p) => &p.quiz_id,
        }
    }

    /// Narrow a socket.io event into a typed event.
    ///
    /// Only the first argument is inspected; extra arguments are ignored.
    pub fn from_event(name: &str, args: Vec<Value>) -> Result<Self> {
        let kind =
            EventKind::from_name(name).ok_or_else(|| ProtocolError::UnknownEvent(name.into()))?;
        let payload = args
            .into_iter()
            .next()
            .ok_or_else(|| ProtocolError::MissingPayload { event: name.into() })?;

        Ok(match kind {
            EventKind::QuestionPushed => Self::QuestionPushed(serde_json::from_value(payload)?),
            EventKind::QuizStarted => Self::QuizStarted(serde_json::from_value(payload)?),
            EventKind::QuizEnded => Self::QuizEnded(serde_json::from_value(payload)?),
            EventKind::VotesUpdate => Self::VotesUpdate(serde_json::from_value(payload)?),
            EventKind::ParticipantJoined => {
                Self::ParticipantJoined(serde_json::from_value(payload)?)
            },
        })
    }

    /// Wire name and payload argument.
    pub fn to_event(&self) -> Result<(&'static str, Value)> {
        let payload = match self {
            Self::QuestionPushed(p) => serde_json::to_value(p)?,
            Self::QuizStarted(p) | Self::QuizEnded(p) => serde_json::to_value(p)?,
            Self::VotesUpdate(p) => serde_json::to_value(p)?,
            Self::ParticipantJoined(p) => serde_json::to_value(p)?,
        };
        Ok((self.kind().name(), payload))
    }

    /// Shorthand for a `question:pushed` event carrying a question.
    pub fn question_pushed(quiz_id: impl Into<QuizId>, question: QuizQuestion) -> Self {
        Self::QuestionPushed(QuestionPushed {
            quiz_id: quiz_id.into(),
            question: Some(question),
            index: None,
        })
    }

    /// Shorthand for a `quiz:ended` event.
    pub fn quiz_ended(quiz_id: impl Into<QuizId>) -> Self {
        Self::QuizEnded(QuizSignal { quiz_id: quiz_id.into() })
    }

    /// Shorthand for a `quiz:started` event.
    pub fn quiz_started(quiz_id: impl Into<QuizId>) -> Self {
        Self::QuizStarted(QuizSignal { quiz_id: quiz_id.into() })
    }
}

/// Events the client emits. Joining a room is the only one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEmit {
    /// Subscribe this connection to a quiz's broadcast room.
    JoinRoom {
        /// Room to join.
        quiz_id: QuizId,
    },
}

impl ClientEmit {
    /// Wire name and payload argument.
    pub fn to_event(&self) -> (&'static str, Value) {
        match self {
            Self::JoinRoom { quiz_id } => {
                ("quiz:join-room", serde_json::json!({ "quizId": quiz_id.as_str() }))
            },
        }
    }
}
