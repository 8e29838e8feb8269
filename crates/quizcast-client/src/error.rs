//! Client state machine errors.
//!
//! These reject a user request outright. Guard no-ops (answering twice,
//! answering after time-up) are not errors; they return no actions.

use quizcast_proto::QuizId;
use thiserror::Error;

use crate::draft::DraftError;

/// Rejected request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// A required input was empty.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Join attempted while already in a quiz.
    #[error("already joined quiz {0}")]
    AlreadyJoined(QuizId),

    /// Operation needs a joined session.
    #[error("not joined to a quiz")]
    NotJoined,

    /// Selected key is not one of the current question's options.
    #[error("option {key} is not offered by the current question")]
    UnknownOption {
        /// Selected key.
        key: String,
    },

    /// Start attempted before hosting.
    #[error("quiz is not hosted yet")]
    NotHosted,

    /// Push or end attempted while the quiz is not running.
    #[error("quiz is not active")]
    NotActive,

    /// Push attempted before the quiz details arrived.
    #[error("quiz details are not loaded yet")]
    QuizNotLoaded,

    /// Push index past the last question.
    #[error("question {index} is out of range; the quiz has {len}")]
    QuestionOutOfRange {
        /// Requested index.
        index: u32,
        /// Number of questions.
        len: usize,
    },

    /// Draft failed validation.
    #[error(transparent)]
    Draft(#[from] DraftError),
}
