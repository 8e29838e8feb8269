//! In-crate fakes for runtime unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use quizcast_core::{ApiError, AuthApi, ChannelError, QuizApi, RealtimeChannel};
use quizcast_proto::{
    AdminQuizDetails, AdminQuizList, AnswerSubmission, ClientEmit, CurrentQuestion, HostResponse,
    JoinRequest, JoinResponse, LeaderboardEntry, ListQuery, LoginRequest, LoginResponse,
    Participant, Quiz, QuizDraft, QuizId, QuizListResponse, QuizUserId, ServerEvent,
    SessionStatus, SignupRequest,
};
use tokio::sync::mpsc;

use crate::hub::ChannelHub;

fn unscripted<T>() -> Result<T, ApiError> {
    Err(ApiError::Network("unscripted".into()))
}

/// API stub. Unset responses fail with a network error; unit calls succeed.
#[derive(Default)]
pub struct StubApi {
    pub join: Option<Result<JoinResponse, ApiError>>,
    pub current: Option<Result<CurrentQuestion, ApiError>>,
    pub quiz: Option<Result<Quiz, ApiError>>,
    pub hosted: Option<Result<HostResponse, ApiError>>,
    pub end: Option<Result<(), ApiError>>,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub status: Option<Result<SessionStatus, ApiError>>,
    pub login: Option<Result<LoginResponse, ApiError>>,
    pub calls: Mutex<Vec<String>>,
}

impl StubApi {
    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl QuizApi for StubApi {
    async fn join(&self, request: &JoinRequest) -> Result<JoinResponse, ApiError> {
        self.record(format!("join {}", request.join_code));
        self.join.clone().unwrap_or_else(unscripted)
    }

    async fn leave(&self, quiz_id: &QuizId, _: &QuizUserId) -> Result<(), ApiError> {
        self.record(format!("leave {quiz_id}"));
        Ok(())
    }

    async fn current_question(&self, quiz_id: &QuizId) -> Result<CurrentQuestion, ApiError> {
        self.record(format!("current {quiz_id}"));
        self.current.clone().unwrap_or(Ok(CurrentQuestion { index: -1, question: None }))
    }

    async fn submit_answer(&self, _: &QuizId, answer: &AnswerSubmission) -> Result<(), ApiError> {
        self.record(format!("answer {}", answer.selected_option_key));
        Ok(())
    }

    async fn get_quiz(&self, quiz_id: &QuizId) -> Result<Quiz, ApiError> {
        self.record(format!("quiz {quiz_id}"));
        self.quiz.clone().unwrap_or_else(unscripted)
    }

    async fn list_participants(&self, quiz_id: &QuizId) -> Result<Vec<Participant>, ApiError> {
        self.record(format!("participants {quiz_id}"));
        Ok(Vec::new())
    }

    async fn host(&self, quiz_id: &QuizId) -> Result<HostResponse, ApiError> {
        self.record(format!("host {quiz_id}"));
        self.hosted.clone().unwrap_or_else(unscripted)
    }

    async fn start(&self, quiz_id: &QuizId) -> Result<(), ApiError> {
        self.record(format!("start {quiz_id}"));
        Ok(())
    }

    async fn push_question(&self, quiz_id: &QuizId, index: u32) -> Result<(), ApiError> {
        self.record(format!("push {quiz_id} {index}"));
        Ok(())
    }

    async fn end(&self, quiz_id: &QuizId) -> Result<(), ApiError> {
        self.record(format!("end {quiz_id}"));
        self.end.clone().unwrap_or(Ok(()))
    }

    async fn leaderboard(&self, quiz_id: &QuizId) -> Result<Vec<LeaderboardEntry>, ApiError> {
        self.record(format!("leaderboard {quiz_id}"));
        Ok(self.leaderboard.clone())
    }

    async fn clear_participants(&self, quiz_id: &QuizId) -> Result<(), ApiError> {
        self.record(format!("clear {quiz_id}"));
        Ok(())
    }

    async fn create_quiz(&self, _: &QuizDraft) -> Result<Quiz, ApiError> {
        unscripted()
    }

    async fn update_draft(&self, _: &QuizId, _: &QuizDraft) -> Result<(), ApiError> {
        unscripted()
    }

    async fn list_quizzes(&self, _: &ListQuery) -> Result<QuizListResponse, ApiError> {
        unscripted()
    }

    async fn admin_list_past(&self, _: &ListQuery) -> Result<AdminQuizList, ApiError> {
        unscripted()
    }

    async fn admin_details(&self, _: &QuizId) -> Result<AdminQuizDetails, ApiError> {
        unscripted()
    }
}

#[async_trait]
impl AuthApi for StubApi {
    async fn session_status(&self) -> Result<SessionStatus, ApiError> {
        self.record("status");
        self.status.clone().unwrap_or_else(unscripted)
    }

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.record(format!("login {}", request.email));
        self.login.clone().unwrap_or_else(unscripted)
    }

    async fn signup(&self, request: &SignupRequest) -> Result<LoginResponse, ApiError> {
        self.record(format!("signup {}", request.email));
        self.login.clone().unwrap_or_else(unscripted)
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.record("logout");
        Ok(())
    }
}

/// Channel fed from an mpsc sender; emits are recorded.
pub struct QueueChannel {
    incoming: mpsc::UnboundedReceiver<ServerEvent>,
    pub emitted: Arc<Mutex<Vec<ClientEmit>>>,
}

#[async_trait]
impl RealtimeChannel for QueueChannel {
    async fn emit(&mut self, event: ClientEmit) -> Result<(), ChannelError> {
        self.emitted.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push(event);
        Ok(())
    }

    async fn recv(&mut self) -> Option<ServerEvent> {
        self.incoming.recv().await
    }

    fn is_connected(&self) -> bool {
        true
    }

    async fn close(&mut self) {
        self.incoming.close();
    }
}

/// Hub over a [`QueueChannel`] plus the sender feeding it.
pub fn hub() -> (ChannelHub<QueueChannel>, mpsc::UnboundedSender<ServerEvent>) {
    let (tx, incoming) = mpsc::unbounded_channel();
    (ChannelHub::new(QueueChannel { incoming, emitted: Arc::default() }), tx)
}
