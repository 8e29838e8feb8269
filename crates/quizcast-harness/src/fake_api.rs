//! Scripted REST backend.
//!
//! Every call is recorded as an [`ApiCall`]. Responses come from scripts set
//! up by the test; anything unscripted gets a plausible default so tests only
//! script what they care about.

use std::{
    collections::{BTreeMap, VecDeque},
    sync::{Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use quizcast_core::{ApiError, AuthApi, QuizApi};
use quizcast_proto::{
    AdminQuizDetails, AdminQuizList, AnswerSubmission, CurrentQuestion, HostResponse, JoinRequest,
    JoinResponse, LeaderboardEntry, ListQuery, LoginRequest, LoginResponse, Participant, Quiz,
    QuizDraft, QuizId, QuizListResponse, QuizStatus, QuizUserId, SessionStatus, SignupRequest,
};

/// One recorded call.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    /// `join`
    Join(JoinRequest),
    /// `leave`
    Leave {
        /// Quiz left.
        quiz_id: QuizId,
        /// Participant leaving.
        quiz_user_id: QuizUserId,
    },
    /// `current_question`
    CurrentQuestion(QuizId),
    /// `submit_answer`
    SubmitAnswer {
        /// Quiz answered.
        quiz_id: QuizId,
        /// Body sent.
        submission: AnswerSubmission,
    },
    /// `get_quiz`
    GetQuiz(QuizId),
    /// `list_participants`
    ListParticipants(QuizId),
    /// `host`
    Host(QuizId),
    /// `start`
    Start(QuizId),
    /// `push_question`
    Push {
        /// Quiz.
        quiz_id: QuizId,
        /// Question index.
        index: u32,
    },
    /// `end`
    End(QuizId),
    /// `leaderboard`
    Leaderboard(QuizId),
    /// `clear_participants`
    ClearParticipants(QuizId),
    /// `create_quiz`
    CreateQuiz(QuizDraft),
    /// `update_draft`
    UpdateDraft(QuizId),
    /// `list_quizzes`
    ListQuizzes(ListQuery),
    /// `admin_list_past`
    AdminListPast(ListQuery),
    /// `admin_details`
    AdminDetails(QuizId),
    /// `session_status`
    SessionStatus,
    /// `login`
    Login(String),
    /// `signup`
    Signup(String),
    /// `logout`
    Logout,
}

impl ApiCall {
    /// Method name, as accepted by [`FakeApi::fail_next`].
    pub fn method(&self) -> &'static str {
        match self {
            Self::Join(_) => "join",
            Self::Leave { .. } => "leave",
            Self::CurrentQuestion(_) => "current_question",
            Self::SubmitAnswer { .. } => "submit_answer",
            Self::GetQuiz(_) => "get_quiz",
            Self::ListParticipants(_) => "list_participants",
            Self::Host(_) => "host",
            Self::Start(_) => "start",
            Self::Push { .. } => "push_question",
            Self::End(_) => "end",
            Self::Leaderboard(_) => "leaderboard",
            Self::ClearParticipants(_) => "clear_participants",
            Self::CreateQuiz(_) => "create_quiz",
            Self::UpdateDraft(_) => "update_draft",
            Self::ListQuizzes(_) => "list_quizzes",
            Self::AdminListPast(_) => "admin_list_past",
            Self::AdminDetails(_) => "admin_details",
            Self::SessionStatus => "session_status",
            Self::Login(_) => "login",
            Self::Signup(_) => "signup",
            Self::Logout => "logout",
        }
    }
}

#[derive(Debug, Default)]
struct Script {
    calls: Vec<ApiCall>,
    joins: VecDeque<Result<JoinResponse, ApiError>>,
    current: Option<CurrentQuestion>,
    quiz: Option<Quiz>,
    participants: Vec<Participant>,
    leaderboard: Vec<LeaderboardEntry>,
    status: Option<SessionStatus>,
    login: Option<LoginResponse>,
    failures: BTreeMap<&'static str, VecDeque<ApiError>>,
}

/// In-memory [`QuizApi`] and [`AuthApi`].
#[derive(Debug, Default)]
pub struct FakeApi {
    script: Mutex<Script>,
}

impl FakeApi {
    /// Backend with nothing scripted.
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue the result of the next `join`. Unscripted joins are rejected
    /// with "Invalid join code".
    pub fn script_join(&self, result: Result<JoinResponse, ApiError>) {
        self.script().joins.push_back(result);
    }

    /// Answer to `current_question`. Defaults to "no question yet".
    pub fn set_current_question(&self, current: CurrentQuestion) {
        self.script().current = Some(current);
    }

    /// Quiz returned by `get_quiz`.
    pub fn set_quiz(&self, quiz: Quiz) {
        self.script().quiz = Some(quiz);
    }

    /// Participants returned by `list_participants`.
    pub fn set_participants(&self, participants: Vec<Participant>) {
        self.script().participants = participants;
    }

    /// Rows returned by `leaderboard`.
    pub fn set_leaderboard(&self, leaderboard: Vec<LeaderboardEntry>) {
        self.script().leaderboard = leaderboard;
    }

    /// Result of `session_status`. Defaults to logged out.
    pub fn set_session_status(&self, status: SessionStatus) {
        self.script().status = Some(status);
    }

    /// Result of `login` and `signup`. Unscripted logins are rejected.
    pub fn set_login(&self, login: LoginResponse) {
        self.script().login = Some(login);
    }

    /// Make the next call to `method` fail with `err`. Failures queue per
    /// method.
    pub fn fail_next(&self, method: &'static str, err: ApiError) {
        self.script().failures.entry(method).or_default().push_back(err);
    }

    /// Every call so far, oldest first.
    pub fn calls(&self) -> Vec<ApiCall> {
        self.script().calls.clone()
    }

    /// Number of recorded calls to `method`.
    pub fn count(&self, method: &str) -> usize {
        self.script().calls.iter().filter(|call| call.method() == method).count()
    }

    /// Answers submitted so far.
    pub fn submissions(&self) -> Vec<AnswerSubmission> {
        self.script()
            .calls
            .iter()
            .filter_map(|call| match call {
                ApiCall::SubmitAnswer { submission, .. } => Some(submission.clone()),
                _ => None,
            })
            .collect()
    }

    /// Record `call` and return a queued failure for its method, if any.
    fn record(&self, call: ApiCall) -> Result<MutexGuard<'_, Script>, ApiError> {
        let mut script = self.script();
        let method = call.method();
        script.calls.push(call);
        let failure = script.failures.get_mut(method).and_then(VecDeque::pop_front);
        match failure {
            Some(err) => Err(err),
            None => Ok(script),
        }
    }

    fn missing_quiz() -> ApiError {
        ApiError::Rejected { message: Some("Quiz not found".into()) }
    }
}

#[async_trait]
impl QuizApi for FakeApi {
    async fn join(&self, request: &JoinRequest) -> Result<JoinResponse, ApiError> {
        let mut script = self.record(ApiCall::Join(request.clone()))?;
        script.joins.pop_front().unwrap_or_else(|| {
            Err(ApiError::Rejected { message: Some("Invalid join code".into()) })
        })
    }

    async fn leave(&self, quiz_id: &QuizId, quiz_user_id: &QuizUserId) -> Result<(), ApiError> {
        self.record(ApiCall::Leave { quiz_id: quiz_id.clone(), quiz_user_id: quiz_user_id.clone() })?;
        Ok(())
    }

    async fn current_question(&self, quiz_id: &QuizId) -> Result<CurrentQuestion, ApiError> {
        let script = self.record(ApiCall::CurrentQuestion(quiz_id.clone()))?;
        Ok(script.current.clone().unwrap_or(CurrentQuestion { index: -1, question: None }))
    }

    async fn submit_answer(
        &self,
        quiz_id: &QuizId,
        submission: &AnswerSubmission,
    ) -> Result<(), ApiError> {
        self.record(ApiCall::SubmitAnswer {
            quiz_id: quiz_id.clone(),
            submission: submission.clone(),
        })?;
        Ok(())
    }

    async fn get_quiz(&self, quiz_id: &QuizId) -> Result<Quiz, ApiError> {
        let script = self.record(ApiCall::GetQuiz(quiz_id.clone()))?;
        script.quiz.clone().filter(|quiz| &quiz.quiz_id == quiz_id).ok_or_else(Self::missing_quiz)
    }

    async fn list_participants(&self, quiz_id: &QuizId) -> Result<Vec<Participant>, ApiError> {
        let script = self.record(ApiCall::ListParticipants(quiz_id.clone()))?;
        Ok(script.participants.clone())
    }

    async fn host(&self, quiz_id: &QuizId) -> Result<HostResponse, ApiError> {
        let mut script = self.record(ApiCall::Host(quiz_id.clone()))?;
        let quiz = script.quiz.as_mut().ok_or_else(Self::missing_quiz)?;
        quiz.status = QuizStatus::Published;
        Ok(HostResponse { join_code: quiz.join_code.clone() })
    }

    async fn start(&self, quiz_id: &QuizId) -> Result<(), ApiError> {
        let mut script = self.record(ApiCall::Start(quiz_id.clone()))?;
        if let Some(quiz) = script.quiz.as_mut() {
            quiz.status = QuizStatus::Active;
        }
        Ok(())
    }

    async fn push_question(&self, quiz_id: &QuizId, index: u32) -> Result<(), ApiError> {
        self.record(ApiCall::Push { quiz_id: quiz_id.clone(), index })?;
        Ok(())
    }

    async fn end(&self, quiz_id: &QuizId) -> Result<(), ApiError> {
        let mut script = self.record(ApiCall::End(quiz_id.clone()))?;
        if let Some(quiz) = script.quiz.as_mut() {
            quiz.status = QuizStatus::Ended;
        }
        Ok(())
    }

    async fn leaderboard(&self, quiz_id: &QuizId) -> Result<Vec<LeaderboardEntry>, ApiError> {
        let script = self.record(ApiCall::Leaderboard(quiz_id.clone()))?;
        Ok(script.leaderboard.clone())
    }

    async fn clear_participants(&self, quiz_id: &QuizId) -> Result<(), ApiError> {
        let mut script = self.record(ApiCall::ClearParticipants(quiz_id.clone()))?;
        script.participants.clear();
        Ok(())
    }

    async fn create_quiz(&self, draft: &QuizDraft) -> Result<Quiz, ApiError> {
        let mut script = self.record(ApiCall::CreateQuiz(draft.clone()))?;
        let created = script.calls.iter().filter(|c| c.method() == "create_quiz").count();
        let quiz = Quiz {
            id: None,
            quiz_id: QuizId::new(format!("quiz-{created}")),
            title: draft.title.clone(),
            description: draft.description.clone(),
            status: QuizStatus::Draft,
            join_code: None,
            owner_user_id: None,
            questions: draft.questions.clone(),
            created_at: None,
            updated_at: None,
            participants: None,
            total_participants: None,
        };
        script.quiz = Some(quiz.clone());
        Ok(quiz)
    }

    async fn update_draft(&self, quiz_id: &QuizId, draft: &QuizDraft) -> Result<(), ApiError> {
        let mut script = self.record(ApiCall::UpdateDraft(quiz_id.clone()))?;
        if let Some(quiz) = script.quiz.as_mut().filter(|quiz| &quiz.quiz_id == quiz_id) {
            quiz.title.clone_from(&draft.title);
            quiz.description.clone_from(&draft.description);
            quiz.questions.clone_from(&draft.questions);
        }
        Ok(())
    }

    async fn list_quizzes(&self, query: &ListQuery) -> Result<QuizListResponse, ApiError> {
        let script = self.record(ApiCall::ListQuizzes(query.clone()))?;
        Ok(QuizListResponse { data: script.quiz.clone().into_iter().collect(), pagination: None })
    }

    async fn admin_list_past(&self, query: &ListQuery) -> Result<AdminQuizList, ApiError> {
        self.record(ApiCall::AdminListPast(query.clone()))?;
        Ok(AdminQuizList { items: Vec::new(), total: 0 })
    }

    async fn admin_details(&self, quiz_id: &QuizId) -> Result<AdminQuizDetails, ApiError> {
        let script = self.record(ApiCall::AdminDetails(quiz_id.clone()))?;
        let quiz = script.quiz.clone().ok_or_else(Self::missing_quiz)?;
        Ok(AdminQuizDetails {
            quiz,
            participants: script.participants.clone(),
            leaderboard: script.leaderboard.clone(),
        })
    }
}

#[async_trait]
impl AuthApi for FakeApi {
    async fn session_status(&self) -> Result<SessionStatus, ApiError> {
        let script = self.record(ApiCall::SessionStatus)?;
        Ok(script.status.clone().unwrap_or(SessionStatus {
            is_logged_in: false,
            user: None,
            user_id: None,
        }))
    }

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        let script = self.record(ApiCall::Login(request.email.clone()))?;
        script
            .login
            .clone()
            .ok_or(ApiError::Rejected { message: Some("Invalid credentials".into()) })
    }

    async fn signup(&self, request: &SignupRequest) -> Result<LoginResponse, ApiError> {
        let script = self.record(ApiCall::Signup(request.email.clone()))?;
        script.login.clone().ok_or(ApiError::Rejected { message: None })
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.record(ApiCall::Logout)?;
        Ok(())
    }
}
