//! Participant state machine.
//!
//! One participant's view of one quiz: join, wait for questions, answer each
//! one at most once before its countdown runs out, and stop when the quiz
//! ends. The machine never talks to the network itself; it returns
//! [`ParticipantAction`]s and learns about their outcome through
//! [`ParticipantEvent`]s.
//!
//! # Countdown
//!
//! The machine owns `time_left` but not the clock. It asks for a 1-second
//! countdown with [`ParticipantAction::StartCountdown`] whenever a question
//! is installed and feeds on [`ParticipantEvent::Tick`]. Starting always
//! replaces a running countdown, so only one is ever active.
//!
//! # Optimistic answers
//!
//! Selecting an option flips `has_answered` before the submission goes out so
//! a second selection is a no-op. A failed submission rolls the flag back and
//! the participant may retry. Retries are not deduplicated here.

use quizcast_core::ApiError;
use quizcast_proto::{
    AnswerSubmission, CurrentQuestion, JoinRequest, JoinResponse, QuestionId, QuizId,
    QuizQuestion, QuizUserId, ServerEvent,
};
use tracing::{debug, warn};

use crate::{
    error::ClientError,
    session::{self, PersistedState, Session},
};

/// Alert shown when a join fails without a server message.
pub const JOIN_FAILED: &str = "Failed to join";
/// Alert shown when an answer submission fails.
pub const SUBMIT_FAILED: &str = "Failed to submit answer";

/// Inputs to the participant machine.
#[derive(Debug, Clone, PartialEq)]
pub enum ParticipantEvent {
    /// Values restored from durable storage on mount.
    Initialize(PersistedState),

    /// User asked to join a quiz.
    JoinRequested {
        /// Code as typed.
        join_code: String,
        /// Display name as typed.
        name: String,
        /// Logged-in user, if any.
        user_id: Option<String>,
    },

    /// Join call finished.
    JoinCompleted(Result<JoinResponse, ApiError>),

    /// Event from the real-time channel.
    Server(ServerEvent),

    /// Reconciliation query finished.
    CurrentQuestionFetched {
        /// Quiz the query was issued for.
        quiz_id: QuizId,
        /// Query result.
        result: Result<CurrentQuestion, ApiError>,
    },

    /// One second elapsed on the countdown.
    Tick,

    /// User picked an option of the current question.
    AnswerSelected {
        /// Option key, e.g. `"B"`.
        option_key: String,
    },

    /// Answer submission finished.
    AnswerCompleted {
        /// Question the answer was for.
        question_id: QuestionId,
        /// Submission result.
        result: Result<(), ApiError>,
    },

    /// User left the quiz.
    LeaveRequested,
}

/// Work for the runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum ParticipantAction {
    /// Call the join endpoint.
    Join(JoinRequest),

    /// Subscribe to the quiz room on the real-time channel.
    JoinRoom {
        /// Room to join.
        quiz_id: QuizId,
    },

    /// Ask the server which question is current.
    FetchCurrentQuestion {
        /// Quiz to ask about.
        quiz_id: QuizId,
    },

    /// Call the answer endpoint.
    SubmitAnswer {
        /// Quiz being answered.
        quiz_id: QuizId,
        /// Answer body.
        submission: AnswerSubmission,
    },

    /// Call the leave endpoint.
    Leave {
        /// Quiz being left.
        quiz_id: QuizId,
        /// Participant leaving.
        quiz_user_id: QuizUserId,
    },

    /// Write the session, join code and obfuscated name to storage.
    PersistSession {
        /// Session to store.
        session: Session,
        /// Normalized join code.
        join_code: String,
        /// Display name, already obfuscated.
        display_name: String,
    },

    /// Remove the stored session.
    ClearSession,

    /// Remove the stored session, join code and display name.
    ClearAll,

    /// Start (or restart) the 1-second countdown.
    StartCountdown,

    /// Stop the countdown.
    StopCountdown,

    /// Show a message to the user.
    Alert {
        /// Message text.
        message: String,
    },
}

/// Coarse view state, derived from the machine's fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No session.
    Unjoined,
    /// Joined, no question on screen.
    Waiting,
    /// Question on screen, answer still possible.
    QuestionActive,
    /// Answer sent for the current question.
    Answered,
    /// Countdown ran out before an answer.
    TimedOut,
    /// Quiz is over.
    Ended,
}

/// The question currently on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveQuestion {
    /// Question as pushed by the server.
    pub question: QuizQuestion,
    /// Seconds remaining.
    pub time_left: u32,
    /// Answer sent (or in flight).
    pub has_answered: bool,
    /// Countdown reached zero.
    pub is_time_up: bool,
}

impl ActiveQuestion {
    fn new(question: QuizQuestion) -> Self {
        Self { time_left: question.time_limit_seconds, question, has_answered: false, is_time_up: false }
    }
}

#[derive(Debug, Clone)]
struct PendingJoin {
    join_code: String,
    name: String,
}

/// Participant state machine.
#[derive(Debug, Clone, Default)]
pub struct Participant {
    session: Option<Session>,
    pending_join: Option<PendingJoin>,
    current: Option<ActiveQuestion>,
    ended: bool,
    join_code: String,
    display_name: String,
}

impl Participant {
    /// Unjoined machine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        if self.session.is_none() {
            Phase::Unjoined
        } else if self.ended {
            Phase::Ended
        } else {
            match &self.current {
                None => Phase::Waiting,
                Some(q) if q.has_answered => Phase::Answered,
                Some(q) if q.is_time_up => Phase::TimedOut,
                Some(_) => Phase::QuestionActive,
            }
        }
    }

    /// Active session, if joined.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Question on screen, if any.
    pub fn current(&self) -> Option<&ActiveQuestion> {
        self.current.as_ref()
    }

    /// Whether a join call is in flight.
    pub fn is_joining(&self) -> bool {
        self.pending_join.is_some()
    }

    /// Whether the quiz has ended.
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Last join code, for prefilling the join form.
    pub fn join_code(&self) -> &str {
        &self.join_code
    }

    /// Last display name, for prefilling the join form.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Process one event.
    ///
    /// # Errors
    ///
    /// Rejects join requests with missing fields or while already joined,
    /// answers without a session and answers with an unknown option key.
    /// Every other event is accepted; events that do not apply are ignored.
    pub fn handle(&mut self, event: ParticipantEvent) -> Result<Vec<ParticipantAction>, ClientError> {
        match event {
            ParticipantEvent::Initialize(persisted) => Ok(self.initialize(persisted)),
            ParticipantEvent::JoinRequested { join_code, name, user_id } => {
                self.request_join(&join_code, &name, user_id)
            },
            ParticipantEvent::JoinCompleted(result) => Ok(self.complete_join(result)),
            ParticipantEvent::Server(event) => Ok(self.handle_server(event)),
            ParticipantEvent::CurrentQuestionFetched { quiz_id, result } => {
                Ok(self.reconcile(&quiz_id, result))
            },
            ParticipantEvent::Tick => Ok(self.tick()),
            ParticipantEvent::AnswerSelected { option_key } => self.select_answer(option_key),
            ParticipantEvent::AnswerCompleted { question_id, result } => {
                Ok(self.complete_answer(&question_id, result))
            },
            ParticipantEvent::LeaveRequested => Ok(self.leave()),
        }
    }

    fn initialize(&mut self, persisted: PersistedState) -> Vec<ParticipantAction> {
        *self = Self {
            join_code: persisted.join_code.unwrap_or_default(),
            display_name: persisted
                .display_name
                .map(|stored| session::deobfuscate(&stored))
                .unwrap_or_default(),
            ..Self::default()
        };

        let Some(stored) = persisted.session else {
            return Vec::new();
        };
        match Session::decode(&stored) {
            Some(session) => {
                debug!(quiz_id = %session.quiz_id, "resuming stored session");
                let quiz_id = session.quiz_id.clone();
                self.session = Some(session);
                vec![
                    ParticipantAction::JoinRoom { quiz_id: quiz_id.clone() },
                    ParticipantAction::FetchCurrentQuestion { quiz_id },
                ]
            },
            None => {
                warn!("discarding corrupt stored session");
                vec![ParticipantAction::ClearSession]
            },
        }
    }

    fn request_join(
        &mut self,
        join_code: &str,
        name: &str,
        user_id: Option<String>,
    ) -> Result<Vec<ParticipantAction>, ClientError> {
        if let Some(session) = &self.session {
            return Err(ClientError::AlreadyJoined(session.quiz_id.clone()));
        }
        if self.pending_join.is_some() {
            return Ok(Vec::new());
        }

        let join_code = join_code.trim().to_uppercase();
        let name = name.trim().to_string();
        if join_code.is_empty() {
            return Err(ClientError::MissingField("join code"));
        }
        if name.is_empty() {
            return Err(ClientError::MissingField("name"));
        }

        self.join_code.clone_from(&join_code);
        self.display_name.clone_from(&name);
        self.pending_join = Some(PendingJoin { join_code: join_code.clone(), name: name.clone() });
        Ok(vec![ParticipantAction::Join(JoinRequest { join_code, name, user_id })])
    }

    fn complete_join(&mut self, result: Result<JoinResponse, ApiError>) -> Vec<ParticipantAction> {
        let Some(pending) = self.pending_join.take() else {
            debug!("ignoring join completion with no join in flight");
            return Vec::new();
        };

        match result {
            Ok(joined) => {
                let session = Session { quiz_id: joined.quiz_id, quiz_user_id: joined.quiz_user_id };
                let quiz_id = session.quiz_id.clone();
                self.session = Some(session.clone());
                self.current = None;
                self.ended = false;
                vec![
                    ParticipantAction::PersistSession {
                        session,
                        join_code: pending.join_code,
                        display_name: session::obfuscate(&pending.name),
                    },
                    ParticipantAction::JoinRoom { quiz_id: quiz_id.clone() },
                    ParticipantAction::FetchCurrentQuestion { quiz_id },
                ]
            },
            Err(err) => {
                warn!(%err, "join failed");
                vec![ParticipantAction::Alert { message: err.user_message(JOIN_FAILED) }]
            },
        }
    }

    /// Whether an event for `quiz_id` applies to this session.
    fn accepts(&self, quiz_id: &QuizId) -> bool {
        match &self.session {
            Some(session) if self.ended => {
                debug!(quiz_id = %session.quiz_id, "quiz already ended");
                false
            },
            Some(session) if &session.quiz_id == quiz_id => true,
            Some(session) => {
                debug!(expected = %session.quiz_id, got = %quiz_id, "discarding event for another quiz");
                false
            },
            None => false,
        }
    }

    fn handle_server(&mut self, event: ServerEvent) -> Vec<ParticipantAction> {
        if !self.accepts(event.quiz_id()) {
            return Vec::new();
        }

        match event {
            ServerEvent::QuestionPushed(pushed) => match pushed.question {
                Some(question) => self.install(question),
                None => {
                    warn!(quiz_id = %pushed.quiz_id, "question:pushed without a question");
                    Vec::new()
                },
            },
            ServerEvent::QuizEnded(_) => {
                self.current = None;
                self.ended = true;
                vec![ParticipantAction::StopCountdown, ParticipantAction::ClearSession]
            },
            ServerEvent::QuizStarted(_)
            | ServerEvent::VotesUpdate(_)
            | ServerEvent::ParticipantJoined(_) => Vec::new(),
        }
    }

    fn install(&mut self, question: QuizQuestion) -> Vec<ParticipantAction> {
        self.current = Some(ActiveQuestion::new(question));
        vec![ParticipantAction::StartCountdown]
    }

    fn reconcile(
        &mut self,
        quiz_id: &QuizId,
        result: Result<CurrentQuestion, ApiError>,
    ) -> Vec<ParticipantAction> {
        if !self.accepts(quiz_id) {
            return Vec::new();
        }
        match result {
            Ok(current) => match current.active() {
                Some(question) if self.is_on_screen(&question) => {
                    debug!(question_id = ?question.question_id, "current question already on screen");
                    Vec::new()
                },
                Some(question) => self.install(question),
                None => Vec::new(),
            },
            Err(err) => {
                warn!(%quiz_id, %err, "could not fetch current question");
                Vec::new()
            },
        }
    }

    /// Whether `question` is the one already on screen. Its answer and
    /// countdown state are written once and must survive a late reply.
    fn is_on_screen(&self, question: &QuizQuestion) -> bool {
        match (&self.current, &question.question_id) {
            (Some(current), Some(id)) => current.question.question_id.as_ref() == Some(id),
            _ => false,
        }
    }

    fn tick(&mut self) -> Vec<ParticipantAction> {
        match &mut self.current {
            Some(q) if !q.is_time_up => {
                q.time_left = q.time_left.saturating_sub(1);
                if q.time_left == 0 {
                    q.is_time_up = true;
                    vec![ParticipantAction::StopCountdown]
                } else {
                    Vec::new()
                }
            },
            _ => vec![ParticipantAction::StopCountdown],
        }
    }

    fn select_answer(&mut self, option_key: String) -> Result<Vec<ParticipantAction>, ClientError> {
        let Some(session) = &self.session else {
            return Err(ClientError::NotJoined);
        };
        let Some(current) = self.current.as_mut() else {
            return Ok(Vec::new());
        };
        if current.has_answered || current.is_time_up {
            return Ok(Vec::new());
        }
        let Some(question_id) = current.question.question_id.clone() else {
            warn!("current question has no id; cannot submit");
            return Ok(Vec::new());
        };
        if !current.question.has_option(&option_key) {
            return Err(ClientError::UnknownOption { key: option_key });
        }

        current.has_answered = true;
        Ok(vec![ParticipantAction::SubmitAnswer {
            quiz_id: session.quiz_id.clone(),
            submission: AnswerSubmission {
                quiz_user_id: session.quiz_user_id.clone(),
                question_id,
                selected_option_key: option_key,
                time_left_seconds: current.time_left,
            },
        }])
    }

    fn complete_answer(
        &mut self,
        question_id: &QuestionId,
        result: Result<(), ApiError>,
    ) -> Vec<ParticipantAction> {
        let Err(err) = result else {
            return Vec::new();
        };
        warn!(%question_id, %err, "answer submission failed");

        match &mut self.current {
            Some(q) if q.question.question_id.as_ref() == Some(question_id) => {
                q.has_answered = false;
            },
            _ => debug!(%question_id, "failed answer was for a question no longer on screen"),
        }
        vec![ParticipantAction::Alert { message: SUBMIT_FAILED.to_string() }]
    }

    fn leave(&mut self) -> Vec<ParticipantAction> {
        let mut actions = vec![ParticipantAction::StopCountdown];
        if let Some(session) = self.session.take() {
            actions.push(ParticipantAction::Leave {
                quiz_id: session.quiz_id,
                quiz_user_id: session.quiz_user_id,
            });
        }
        actions.push(ParticipantAction::ClearAll);
        *self = Self::default();
        actions
    }
}

#[cfg(test)]
mod tests {
    use quizcast_proto::QuizOption;

    use super::*;

    fn question(id: &str, text: &str, limit: u32) -> QuizQuestion {
        QuizQuestion {
            question_id: Some(QuestionId::new(id)),
            text: text.to_string(),
            options: vec![QuizOption::new("A", "3"), QuizOption::new("B", "4")],
            time_limit_seconds: limit,
            max_marks: 10,
        }
    }

    fn joined(quiz_id: &str, user_id: &str) -> Participant {
        let mut p = Participant::new();
        p.handle(ParticipantEvent::JoinRequested {
            join_code: "ab12cd".into(),
            name: "Ada".into(),
            user_id: None,
        })
        .unwrap();
        p.handle(ParticipantEvent::JoinCompleted(Ok(JoinResponse {
            quiz_id: QuizId::new(quiz_id),
            quiz_user_id: QuizUserId::new(user_id),
        })))
        .unwrap();
        p
    }

    fn push(p: &mut Participant, quiz_id: &str, q: QuizQuestion) -> Vec<ParticipantAction> {
        p.handle(ParticipantEvent::Server(ServerEvent::question_pushed(quiz_id, q))).unwrap()
    }

    #[test]
    fn join_normalizes_input() {
        let mut p = Participant::new();
        let actions = p
            .handle(ParticipantEvent::JoinRequested {
                join_code: "  ab12cd ".into(),
                name: " Ada ".into(),
                user_id: None,
            })
            .unwrap();

        assert_eq!(actions, vec![ParticipantAction::Join(JoinRequest {
            join_code: "AB12CD".into(),
            name: "Ada".into(),
            user_id: None,
        })]);
        assert!(p.is_joining());
        assert_eq!(p.phase(), Phase::Unjoined);
    }

    #[test]
    fn join_requires_code_and_name() {
        let mut p = Participant::new();
        let err = p
            .handle(ParticipantEvent::JoinRequested {
                join_code: "   ".into(),
                name: "Ada".into(),
                user_id: None,
            })
            .unwrap_err();
        assert_eq!(err, ClientError::MissingField("join code"));

        let err = p
            .handle(ParticipantEvent::JoinRequested {
                join_code: "AB12CD".into(),
                name: "".into(),
                user_id: None,
            })
            .unwrap_err();
        assert_eq!(err, ClientError::MissingField("name"));
        assert!(!p.is_joining());
    }

    #[test]
    fn second_join_while_pending_is_noop() {
        let mut p = Participant::new();
        let request = ParticipantEvent::JoinRequested {
            join_code: "AB12CD".into(),
            name: "Ada".into(),
            user_id: None,
        };
        assert_eq!(p.handle(request.clone()).unwrap().len(), 1);
        assert!(p.handle(request).unwrap().is_empty());
    }

    #[test]
    fn successful_join_persists_and_subscribes() {
        let mut p = Participant::new();
        p.handle(ParticipantEvent::JoinRequested {
            join_code: "ab12cd".into(),
            name: "Ada".into(),
            user_id: None,
        })
        .unwrap();

        let actions = p
            .handle(ParticipantEvent::JoinCompleted(Ok(JoinResponse {
                quiz_id: QuizId::new("q1"),
                quiz_user_id: QuizUserId::new("u1"),
            })))
            .unwrap();

        assert_eq!(actions, vec![
            ParticipantAction::PersistSession {
                session: Session::new("q1", "u1"),
                join_code: "AB12CD".into(),
                display_name: "QWRh".into(),
            },
            ParticipantAction::JoinRoom { quiz_id: QuizId::new("q1") },
            ParticipantAction::FetchCurrentQuestion { quiz_id: QuizId::new("q1") },
        ]);
        assert_eq!(p.phase(), Phase::Waiting);
    }

    #[test]
    fn rejected_join_alerts_with_server_message() {
        let mut p = Participant::new();
        p.handle(ParticipantEvent::JoinRequested {
            join_code: "ZZZZZZ".into(),
            name: "Ada".into(),
            user_id: None,
        })
        .unwrap();

        let actions = p
            .handle(ParticipantEvent::JoinCompleted(Err(ApiError::Rejected {
                message: Some("Invalid join code".into()),
            })))
            .unwrap();

        assert_eq!(actions, vec![ParticipantAction::Alert { message: "Invalid join code".into() }]);
        assert_eq!(p.phase(), Phase::Unjoined);
        assert!(!p.is_joining());
    }

    #[test]
    fn joining_twice_is_rejected() {
        let mut p = joined("q1", "u1");
        let err = p
            .handle(ParticipantEvent::JoinRequested {
                join_code: "AB12CD".into(),
                name: "Ada".into(),
                user_id: None,
            })
            .unwrap_err();
        assert_eq!(err, ClientError::AlreadyJoined(QuizId::new("q1")));
    }

    #[test]
    fn pushed_question_resets_countdown_and_flags() {
        let mut p = joined("q1", "u1");
        assert_eq!(push(&mut p, "q1", question("Q1", "2+2?", 30)), vec![
            ParticipantAction::StartCountdown
        ]);
        p.handle(ParticipantEvent::Tick).unwrap();
        p.handle(ParticipantEvent::AnswerSelected { option_key: "B".into() }).unwrap();
        assert_eq!(p.phase(), Phase::Answered);

        push(&mut p, "q1", question("Q2", "3+3?", 20));
        let current = p.current().unwrap();
        assert_eq!(current.time_left, 20);
        assert!(!current.has_answered);
        assert!(!current.is_time_up);
        assert_eq!(p.phase(), Phase::QuestionActive);
    }

    #[test]
    fn events_for_other_quiz_are_ignored() {
        let mut p = joined("q1", "u1");
        assert!(push(&mut p, "q2", question("Q1", "2+2?", 30)).is_empty());
        assert!(p.current().is_none());

        let actions =
            p.handle(ParticipantEvent::Server(ServerEvent::quiz_ended("q2"))).unwrap();
        assert!(actions.is_empty());
        assert_eq!(p.phase(), Phase::Waiting);
    }

    #[test]
    fn events_before_join_are_ignored() {
        let mut p = Participant::new();
        assert!(push(&mut p, "q1", question("Q1", "2+2?", 30)).is_empty());
        assert_eq!(p.phase(), Phase::Unjoined);
    }

    #[test]
    fn countdown_times_out() {
        let mut p = joined("q1", "u1");
        push(&mut p, "q1", question("Q1", "2+2?", 2));

        assert!(p.handle(ParticipantEvent::Tick).unwrap().is_empty());
        assert_eq!(p.handle(ParticipantEvent::Tick).unwrap(), vec![
            ParticipantAction::StopCountdown
        ]);
        assert_eq!(p.phase(), Phase::TimedOut);
        assert_eq!(p.current().unwrap().time_left, 0);

        // further ticks never underflow
        p.handle(ParticipantEvent::Tick).unwrap();
        assert_eq!(p.current().unwrap().time_left, 0);
    }

    #[test]
    fn zero_time_limit_times_out_on_first_tick() {
        let mut p = joined("q1", "u1");
        push(&mut p, "q1", question("Q1", "2+2?", 0));
        p.handle(ParticipantEvent::Tick).unwrap();
        assert_eq!(p.phase(), Phase::TimedOut);
    }

    #[test]
    fn answer_after_time_up_sends_nothing() {
        let mut p = joined("q1", "u1");
        push(&mut p, "q1", question("Q1", "2+2?", 1));
        p.handle(ParticipantEvent::Tick).unwrap();

        let actions = p.handle(ParticipantEvent::AnswerSelected { option_key: "B".into() }).unwrap();
        assert!(actions.is_empty());
        assert_eq!(p.phase(), Phase::TimedOut);
    }

    #[test]
    fn second_answer_sends_nothing() {
        let mut p = joined("q1", "u1");
        push(&mut p, "q1", question("Q1", "2+2?", 30));

        let first = p.handle(ParticipantEvent::AnswerSelected { option_key: "B".into() }).unwrap();
        assert_eq!(first.len(), 1);
        let second = p.handle(ParticipantEvent::AnswerSelected { option_key: "A".into() }).unwrap();
        assert!(second.is_empty());
    }

    #[test]
    fn answer_carries_time_left() {
        let mut p = joined("q1", "u1");
        push(&mut p, "q1", question("Q1", "2+2?", 30));
        for _ in 0..5 {
            p.handle(ParticipantEvent::Tick).unwrap();
        }

        let actions = p.handle(ParticipantEvent::AnswerSelected { option_key: "B".into() }).unwrap();
        assert_eq!(actions, vec![ParticipantAction::SubmitAnswer {
            quiz_id: QuizId::new("q1"),
            submission: AnswerSubmission {
                quiz_user_id: QuizUserId::new("u1"),
                question_id: QuestionId::new("Q1"),
                selected_option_key: "B".into(),
                time_left_seconds: 25,
            },
        }]);
    }

    #[test]
    fn unknown_option_is_rejected() {
        let mut p = joined("q1", "u1");
        push(&mut p, "q1", question("Q1", "2+2?", 30));

        let err = p.handle(ParticipantEvent::AnswerSelected { option_key: "Z".into() }).unwrap_err();
        assert_eq!(err, ClientError::UnknownOption { key: "Z".into() });
        assert_eq!(p.phase(), Phase::QuestionActive);
    }

    #[test]
    fn answer_without_session_is_rejected() {
        let mut p = Participant::new();
        let err = p.handle(ParticipantEvent::AnswerSelected { option_key: "A".into() }).unwrap_err();
        assert_eq!(err, ClientError::NotJoined);
    }

    #[test]
    fn failed_submission_rolls_back() {
        let mut p = joined("q1", "u1");
        push(&mut p, "q1", question("Q1", "2+2?", 30));
        p.handle(ParticipantEvent::AnswerSelected { option_key: "B".into() }).unwrap();

        let actions = p
            .handle(ParticipantEvent::AnswerCompleted {
                question_id: QuestionId::new("Q1"),
                result: Err(ApiError::Network("timeout".into())),
            })
            .unwrap();
        assert_eq!(actions, vec![ParticipantAction::Alert { message: SUBMIT_FAILED.into() }]);
        assert_eq!(p.phase(), Phase::QuestionActive);

        let retry = p.handle(ParticipantEvent::AnswerSelected { option_key: "B".into() }).unwrap();
        assert_eq!(retry.len(), 1);
    }

    #[test]
    fn stale_failure_does_not_touch_new_question() {
        let mut p = joined("q1", "u1");
        push(&mut p, "q1", question("Q1", "2+2?", 30));
        p.handle(ParticipantEvent::AnswerSelected { option_key: "B".into() }).unwrap();
        push(&mut p, "q1", question("Q2", "3+3?", 30));
        p.handle(ParticipantEvent::AnswerSelected { option_key: "A".into() }).unwrap();

        p.handle(ParticipantEvent::AnswerCompleted {
            question_id: QuestionId::new("Q1"),
            result: Err(ApiError::Network("timeout".into())),
        })
        .unwrap();
        assert_eq!(p.phase(), Phase::Answered);
    }

    #[test]
    fn quiz_end_clears_session() {
        let mut p = joined("q1", "u1");
        push(&mut p, "q1", question("Q1", "2+2?", 30));

        let actions = p.handle(ParticipantEvent::Server(ServerEvent::quiz_ended("q1"))).unwrap();
        assert_eq!(actions, vec![ParticipantAction::StopCountdown, ParticipantAction::ClearSession]);
        assert_eq!(p.phase(), Phase::Ended);
        assert!(p.current().is_none());

        // terminal: later pushes are ignored
        assert!(push(&mut p, "q1", question("Q2", "3+3?", 30)).is_empty());
        assert_eq!(p.phase(), Phase::Ended);
    }

    #[test]
    fn leave_resets_to_unjoined() {
        let mut p = joined("q1", "u1");
        push(&mut p, "q1", question("Q1", "2+2?", 30));

        let actions = p.handle(ParticipantEvent::LeaveRequested).unwrap();
        assert_eq!(actions, vec![
            ParticipantAction::StopCountdown,
            ParticipantAction::Leave { quiz_id: QuizId::new("q1"), quiz_user_id: QuizUserId::new("u1") },
            ParticipantAction::ClearAll,
        ]);
        assert_eq!(p.phase(), Phase::Unjoined);
        assert!(p.session().is_none());
        assert_eq!(p.join_code(), "");
    }

    #[test]
    fn initialize_resumes_stored_session() {
        let mut p = Participant::new();
        let actions = p
            .handle(ParticipantEvent::Initialize(PersistedState {
                session: Some(r#"{"quizId":"q1","quizUserId":"u1"}"#.into()),
                join_code: Some("AB12CD".into()),
                display_name: Some("QWRh".into()),
            }))
            .unwrap();

        assert_eq!(actions, vec![
            ParticipantAction::JoinRoom { quiz_id: QuizId::new("q1") },
            ParticipantAction::FetchCurrentQuestion { quiz_id: QuizId::new("q1") },
        ]);
        assert_eq!(p.phase(), Phase::Waiting);
        assert_eq!(p.join_code(), "AB12CD");
        assert_eq!(p.display_name(), "Ada");
    }

    #[test]
    fn initialize_discards_corrupt_session() {
        let mut p = Participant::new();
        let actions = p
            .handle(ParticipantEvent::Initialize(PersistedState {
                session: Some("{oops".into()),
                ..PersistedState::default()
            }))
            .unwrap();
        assert_eq!(actions, vec![ParticipantAction::ClearSession]);
        assert_eq!(p.phase(), Phase::Unjoined);
    }

    #[test]
    fn reconciliation_overrides_stale_countdown() {
        let mut p = joined("q1", "u1");
        push(&mut p, "q1", question("Q1", "2+2?", 30));
        for _ in 0..12 {
            p.handle(ParticipantEvent::Tick).unwrap();
        }

        let actions = p
            .handle(ParticipantEvent::CurrentQuestionFetched {
                quiz_id: QuizId::new("q1"),
                result: Ok(CurrentQuestion { index: 1, question: Some(question("Q2", "3+3?", 45)) }),
            })
            .unwrap();
        assert_eq!(actions, vec![ParticipantAction::StartCountdown]);
        assert_eq!(p.current().unwrap().time_left, 45);
    }

    #[test]
    fn late_reconciliation_keeps_answer_for_same_question() {
        let mut p = joined("q1", "u1");
        push(&mut p, "q1", question("Q1", "2+2?", 30));
        p.handle(ParticipantEvent::Tick).unwrap();
        p.handle(ParticipantEvent::AnswerSelected { option_key: "B".into() }).unwrap();

        let actions = p
            .handle(ParticipantEvent::CurrentQuestionFetched {
                quiz_id: QuizId::new("q1"),
                result: Ok(CurrentQuestion { index: 0, question: Some(question("Q1", "2+2?", 30)) }),
            })
            .unwrap();
        assert!(actions.is_empty());
        assert_eq!(p.phase(), Phase::Answered);
        assert_eq!(p.current().unwrap().time_left, 29);

        let again = p.handle(ParticipantEvent::AnswerSelected { option_key: "A".into() }).unwrap();
        assert!(again.is_empty());
    }

    #[test]
    fn late_reconciliation_keeps_time_up_for_same_question() {
        let mut p = joined("q1", "u1");
        push(&mut p, "q1", question("Q1", "2+2?", 1));
        p.handle(ParticipantEvent::Tick).unwrap();

        p.handle(ParticipantEvent::CurrentQuestionFetched {
            quiz_id: QuizId::new("q1"),
            result: Ok(CurrentQuestion { index: 0, question: Some(question("Q1", "2+2?", 1)) }),
        })
        .unwrap();
        assert_eq!(p.phase(), Phase::TimedOut);
    }

    #[test]
    fn reconciliation_without_question_keeps_waiting() {
        let mut p = joined("q1", "u1");
        let actions = p
            .handle(ParticipantEvent::CurrentQuestionFetched {
                quiz_id: QuizId::new("q1"),
                result: Ok(CurrentQuestion { index: -1, question: None }),
            })
            .unwrap();
        assert!(actions.is_empty());
        assert_eq!(p.phase(), Phase::Waiting);
    }
}
