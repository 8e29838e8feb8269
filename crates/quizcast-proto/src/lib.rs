//! Wire format for the quizcast client.
//!
//! The backend speaks two protocols:
//!
//! - REST: every response is a JSON envelope `{success, message?, ...payload}`.
//!   [`Envelope`] splits the flag from the payload so callers get a typed
//!   `Result` instead of inspecting loose JSON.
//! - Real-time: socket.io events carried over engine.io websocket frames.
//!   [`Packet`] handles the framing and [`ServerEvent`] narrows the event
//!   name and arguments into a tagged union at the boundary.
//!
//! Goal and daily-task payloads ([`goals`], [`tasks`]) ride the same REST
//! envelope, nested one level deeper under `data`.
//!
//! All JSON uses camelCase field names to match the server.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod errors;
pub mod events;
pub mod goals;
pub mod ids;
pub mod packet;
pub mod quiz;
pub mod requests;
pub mod responses;
pub mod tasks;

pub use errors::{ProtocolError, Result};
pub use events::{ClientEmit, EventKind, ServerEvent};
pub use goals::{
    Goal, GoalCategory, GoalUpdate, GoalsAnalytics, GoalsOverview, Milestone, NewGoal,
    NewMilestone, NewSubtask, Priority, Subtask, SubtaskList,
};
pub use ids::{GoalId, MilestoneId, QuestionId, QuizId, QuizUserId, SubtaskId, TaskId};
pub use packet::{Handshake, Packet, SocketPacket};
pub use quiz::{
    LeaderboardEntry, Participant, Quiz, QuizOption, QuizQuestion, QuizStatus, User, VoteTally,
};
pub use requests::{
    AnswerSubmission, JoinRequest, LeaveRequest, ListQuery, LoginRequest, QuizDraft,
    SignupRequest,
};
pub use responses::{
    AdminQuizDetails, AdminQuizList, AdminQuizListItem, CurrentQuestion, Envelope, HostResponse,
    JoinResponse, LeaderboardResponse, LoginResponse, Pagination, ParticipantsResponse,
    QuizListResponse, QuizResponse, SessionStatus,
};
pub use tasks::{
    CompletionHistory, CompletionRecord, DailyTask, DailyTaskUpdate, HistoryRange, NewDailyTask,
    StreakInfo, TaskToggle, ToggleRequest,
};
