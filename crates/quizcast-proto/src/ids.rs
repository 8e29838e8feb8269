//! Identifier newtypes.
//!
//! The server hands out opaque string identifiers. Wrapping them keeps a quiz
//! id from being passed where a participant id is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw identifier.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the raw identifier.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Quiz session identifier.
    QuizId
);

string_id!(
    /// Participant identifier, scoped to one quiz.
    QuizUserId
);

string_id!(
    /// Question identifier, assigned by the server when a quiz is saved.
    QuestionId
);

string_id!(
    /// Goal identifier.
    GoalId
);

string_id!(
    /// Milestone identifier, scoped to one goal.
    MilestoneId
);

string_id!(
    /// Subtask identifier, scoped to one milestone.
    SubtaskId
);

string_id!(
    /// Daily task identifier.
    TaskId
);
