//! Host state machine.
//!
//! The host's view of one quiz they own: publish it, start it, push questions
//! one at a time while watching live votes, and end it to reveal the
//! leaderboard.
//!
//! # State Machine
//!
//! ```text
//! ┌───────┐  Host   ┌────────┐  Start   ┌────────┐  End / quiz:ended  ┌───────┐
//! │ Draft │───────>│ Hosted │────────>│ Active │──────────────────>│ Ended │
//! └───────┘         └────────┘          └────────┘                    └───────┘
//!                                         │    ↑                          │
//!                                         └────┘ Push(i)                  │ Start
//!                                                                         ↓
//!                                                                     (Active)
//! ```
//!
//! A quiz loaded as `published` is already hosted; one loaded as `active`
//! is already running. Ending, by either path, fetches the leaderboard once.

use quizcast_core::ApiError;
use quizcast_proto::{
    HostResponse, LeaderboardEntry, Participant, Quiz, QuizId, QuizStatus, ServerEvent, VoteTally,
};
use tracing::{debug, info, warn};

use crate::error::ClientError;

/// Alert shown when publishing fails.
pub const HOST_FAILED: &str = "Failed to host quiz";
/// Alert shown when starting fails.
pub const START_FAILED: &str = "Failed to start quiz";
/// Alert shown when pushing a question fails.
pub const PUSH_FAILED: &str = "Failed to push question";
/// Alert shown when ending fails.
pub const END_FAILED: &str = "Failed to stop quiz";
/// Alert shown when clearing participants fails.
pub const CLEAR_FAILED: &str = "Failed to clear participants";

/// Inputs to the host machine.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// View opened.
    Mount,
    /// Quiz details arrived.
    QuizLoaded(Result<Quiz, ApiError>),
    /// Participant list arrived.
    ParticipantsLoaded(Result<Vec<Participant>, ApiError>),
    /// User asked to publish.
    HostRequested,
    /// Publish call finished.
    HostCompleted(Result<HostResponse, ApiError>),
    /// User asked to start.
    StartRequested,
    /// Start call finished.
    StartCompleted(Result<(), ApiError>),
    /// User asked to push a question (0-based).
    PushRequested {
        /// Question index.
        index: u32,
    },
    /// Push call finished.
    PushCompleted {
        /// Question index.
        index: u32,
        /// Call result.
        result: Result<(), ApiError>,
    },
    /// User asked to end.
    EndRequested,
    /// End call finished.
    EndCompleted(Result<(), ApiError>),
    /// User asked to clear the participant list.
    ClearRequested,
    /// Clear call finished.
    ClearCompleted(Result<(), ApiError>),
    /// Leaderboard arrived.
    LeaderboardLoaded(Result<Vec<LeaderboardEntry>, ApiError>),
    /// Event from the real-time channel.
    Server(ServerEvent),
}

/// Work for the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostAction {
    /// Subscribe to the quiz room.
    JoinRoom {
        /// Room to join.
        quiz_id: QuizId,
    },
    /// Load quiz details.
    FetchQuiz,
    /// Load the participant list.
    FetchParticipants,
    /// Call the publish endpoint.
    Host,
    /// Call the start endpoint.
    Start,
    /// Call the push endpoint.
    Push {
        /// Question index.
        index: u32,
    },
    /// Call the end endpoint.
    End,
    /// Call the clear-participants endpoint.
    Clear,
    /// Load the leaderboard.
    FetchLeaderboard,
    /// Show a message to the user.
    Alert {
        /// Message text.
        message: String,
    },
}

/// Host state machine.
#[derive(Debug, Clone)]
pub struct Host {
    quiz_id: QuizId,
    quiz: Option<Quiz>,
    join_code: Option<String>,
    participants: Vec<Participant>,
    current_index: Option<u32>,
    votes: VoteTally,
    leaderboard: Vec<LeaderboardEntry>,
    hosted: bool,
    active: bool,
    ended: bool,
}

impl Host {
    /// Machine for `quiz_id`. A join code already known (e.g. from the
    /// create flow) may be supplied.
    pub fn new(quiz_id: impl Into<QuizId>, join_code: Option<String>) -> Self {
        Self {
            quiz_id: quiz_id.into(),
            quiz: None,
            join_code,
            participants: Vec::new(),
            current_index: None,
            votes: VoteTally::new(),
            leaderboard: Vec::new(),
            hosted: false,
            active: false,
            ended: false,
        }
    }

    /// Quiz being hosted.
    pub fn quiz_id(&self) -> &QuizId {
        &self.quiz_id
    }

    /// Loaded quiz details.
    pub fn quiz(&self) -> Option<&Quiz> {
        self.quiz.as_ref()
    }

    /// Join code participants enter.
    pub fn join_code(&self) -> Option<&str> {
        self.join_code.as_deref()
    }

    /// Participants seen so far.
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Index of the question on participants' screens.
    pub fn current_index(&self) -> Option<u32> {
        self.current_index
    }

    /// Live vote counts for the current question.
    pub fn votes(&self) -> &VoteTally {
        &self.votes
    }

    /// Final standings, once ended.
    pub fn leaderboard(&self) -> &[LeaderboardEntry] {
        &self.leaderboard
    }

    /// Whether the quiz is published.
    pub fn is_hosted(&self) -> bool {
        self.hosted
    }

    /// Whether the quiz is running.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the quiz has ended.
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Number of questions, if the quiz is loaded.
    pub fn question_count(&self) -> Option<usize> {
        self.quiz.as_ref().map(|quiz| quiz.questions.len())
    }

    /// Process one event.
    ///
    /// # Errors
    ///
    /// Rejects start before hosting, push or end while not active, and push
    /// of an index past the last question.
    pub fn handle(&mut self, event: HostEvent) -> Result<Vec<HostAction>, ClientError> {
        match event {
            HostEvent::Mount => Ok(vec![
                HostAction::JoinRoom { quiz_id: self.quiz_id.clone() },
                HostAction::FetchQuiz,
                HostAction::FetchParticipants,
            ]),
            HostEvent::QuizLoaded(result) => Ok(self.load_quiz(result)),
            HostEvent::ParticipantsLoaded(result) => {
                match result {
                    Ok(participants) => self.participants = participants,
                    Err(err) => warn!(quiz_id = %self.quiz_id, %err, "could not load participants"),
                }
                Ok(Vec::new())
            },
            HostEvent::HostRequested => Ok(vec![HostAction::Host]),
            HostEvent::HostCompleted(result) => Ok(self.complete_host(result)),
            HostEvent::StartRequested => {
                if !self.hosted {
                    return Err(ClientError::NotHosted);
                }
                Ok(vec![HostAction::Start])
            },
            HostEvent::StartCompleted(result) => Ok(self.complete_start(result)),
            HostEvent::PushRequested { index } => self.request_push(index),
            HostEvent::PushCompleted { index, result } => Ok(self.complete_push(index, result)),
            HostEvent::EndRequested => {
                if !self.active {
                    return Err(ClientError::NotActive);
                }
                Ok(vec![HostAction::End])
            },
            HostEvent::EndCompleted(result) => match result {
                Ok(()) => Ok(self.finish()),
                Err(err) => Ok(alert(&err, END_FAILED)),
            },
            HostEvent::ClearRequested => Ok(vec![HostAction::Clear]),
            HostEvent::ClearCompleted(result) => match result {
                Ok(()) => {
                    self.participants.clear();
                    Ok(Vec::new())
                },
                Err(err) => Ok(alert(&err, CLEAR_FAILED)),
            },
            HostEvent::LeaderboardLoaded(result) => {
                match result {
                    Ok(entries) => self.leaderboard = entries,
                    Err(err) => warn!(quiz_id = %self.quiz_id, %err, "could not load leaderboard"),
                }
                Ok(Vec::new())
            },
            HostEvent::Server(event) => Ok(self.handle_server(event)),
        }
    }

    fn load_quiz(&mut self, result: Result<Quiz, ApiError>) -> Vec<HostAction> {
        let quiz = match result {
            Ok(quiz) => quiz,
            Err(err) => {
                warn!(quiz_id = %self.quiz_id, %err, "could not load quiz");
                return Vec::new();
            },
        };

        self.active = quiz.status == QuizStatus::Active;
        self.hosted = matches!(quiz.status, QuizStatus::Published | QuizStatus::Active);
        if quiz.join_code.is_some() {
            self.join_code.clone_from(&quiz.join_code);
        }
        self.quiz = Some(quiz);
        Vec::new()
    }

    fn complete_host(&mut self, result: Result<HostResponse, ApiError>) -> Vec<HostAction> {
        match result {
            Ok(hosted) => {
                info!(quiz_id = %self.quiz_id, "quiz hosted");
                self.hosted = true;
                if hosted.join_code.is_some() {
                    self.join_code = hosted.join_code;
                }
                if let Some(quiz) = &mut self.quiz {
                    quiz.status = QuizStatus::Published;
                }
                Vec::new()
            },
            Err(err) => alert(&err, HOST_FAILED),
        }
    }

    fn complete_start(&mut self, result: Result<(), ApiError>) -> Vec<HostAction> {
        match result {
            Ok(()) => {
                info!(quiz_id = %self.quiz_id, "quiz started");
                self.start();
                Vec::new()
            },
            Err(err) => alert(&err, START_FAILED),
        }
    }

    fn start(&mut self) {
        self.active = true;
        self.ended = false;
        self.leaderboard.clear();
        if let Some(quiz) = &mut self.quiz {
            quiz.status = QuizStatus::Active;
        }
    }

    fn request_push(&self, index: u32) -> Result<Vec<HostAction>, ClientError> {
        if !self.active {
            return Err(ClientError::NotActive);
        }
        let len = self.question_count().ok_or(ClientError::QuizNotLoaded)?;
        if index as usize >= len {
            return Err(ClientError::QuestionOutOfRange { index, len });
        }
        Ok(vec![HostAction::Push { index }])
    }

    fn complete_push(&mut self, index: u32, result: Result<(), ApiError>) -> Vec<HostAction> {
        match result {
            Ok(()) => {
                self.show_question(index);
                Vec::new()
            },
            Err(err) => alert(&err, PUSH_FAILED),
        }
    }

    fn show_question(&mut self, index: u32) {
        if self.current_index != Some(index) {
            self.votes = VoteTally::new();
        }
        self.current_index = Some(index);
    }

    fn finish(&mut self) -> Vec<HostAction> {
        self.active = false;
        self.current_index = None;
        if let Some(quiz) = &mut self.quiz {
            quiz.status = QuizStatus::Ended;
        }
        if self.ended {
            return Vec::new();
        }
        info!(quiz_id = %self.quiz_id, "quiz ended");
        self.ended = true;
        vec![HostAction::FetchLeaderboard]
    }

    fn handle_server(&mut self, event: ServerEvent) -> Vec<HostAction> {
        if event.quiz_id() != &self.quiz_id {
            debug!(expected = %self.quiz_id, got = %event.quiz_id(), "discarding event for another quiz");
            return Vec::new();
        }

        match event {
            ServerEvent::QuizStarted(_) => {
                self.start();
                Vec::new()
            },
            ServerEvent::ParticipantJoined(joined) => {
                let id = &joined.participant.quiz_user_id;
                if self.participants.iter().all(|p| &p.quiz_user_id != id) {
                    self.participants.push(joined.participant);
                }
                Vec::new()
            },
            ServerEvent::QuestionPushed(pushed) => {
                let index = pushed.index.or_else(|| {
                    let question_id = pushed.question.as_ref()?.question_id.as_ref()?;
                    let quiz = self.quiz.as_ref()?;
                    quiz.questions
                        .iter()
                        .position(|q| q.question_id.as_ref() == Some(question_id))
                        .and_then(|i| u32::try_from(i).ok())
                });
                match index {
                    Some(index) => self.show_question(index),
                    None => debug!(quiz_id = %self.quiz_id, "pushed question not found in quiz"),
                }
                Vec::new()
            },
            ServerEvent::VotesUpdate(update) => {
                self.votes = update.counts;
                Vec::new()
            },
            ServerEvent::QuizEnded(_) => self.finish(),
        }
    }
}

fn alert(err: &ApiError, fallback: &str) -> Vec<HostAction> {
    warn!(%err, "{fallback}");
    vec![HostAction::Alert { message: err.user_message(fallback) }]
}
