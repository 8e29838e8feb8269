//! REST client.
//!
//! Every call carries the session cookie. A `401` is retried once with the
//! stored bearer token, if there is one. The response body is decoded as an
//! envelope whatever the status code, so a rejection's message reaches the
//! user verbatim. Goal and daily-task payloads sit one level deeper, under
//! `data`.

use std::sync::Arc;

use async_trait::async_trait;
use quizcast_core::{ApiError, AuthApi, DailyTasksApi, GoalsApi, QuizApi, Storage, keys};
use quizcast_proto::{
    AdminQuizDetails, AdminQuizList, AnswerSubmission, CompletionHistory, CurrentQuestion,
    DailyTask, DailyTaskUpdate, Envelope, Goal, GoalCategory, GoalId, GoalUpdate, GoalsOverview,
    HistoryRange, HostResponse, JoinRequest, JoinResponse, LeaderboardEntry, LeaderboardResponse,
    LeaveRequest, ListQuery, LoginRequest, LoginResponse, MilestoneId, NewDailyTask, NewGoal,
    NewSubtask, Participant, ParticipantsResponse, Quiz, QuizDraft, QuizId, QuizListResponse,
    QuizResponse, QuizUserId, SessionStatus, SignupRequest, StreakInfo, SubtaskId, SubtaskList,
    TaskId, TaskToggle, ToggleRequest,
};
use reqwest::{Client, Method, Response, StatusCode, header::ACCEPT};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

/// HTTP implementation of every REST action trait.
#[derive(Clone)]
pub struct HttpApi {
    client: Client,
    base: String,
    tokens: Option<Arc<dyn Storage>>,
}

impl std::fmt::Debug for HttpApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpApi").field("base", &self.base).finish_non_exhaustive()
    }
}

impl HttpApi {
    /// Client for the backend at `base_url`.
    ///
    /// # Errors
    ///
    /// `Network` if the URL does not parse or the HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base = Url::parse(base_url).map_err(|err| ApiError::Network(format!("{base_url}: {err}")))?;
        let client = Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|err| ApiError::Network(err.to_string()))?;
        Ok(Self { client, base: base.as_str().trim_end_matches('/').to_string(), tokens: None })
    }

    /// Read the bearer token fallback from `storage`.
    #[must_use]
    pub fn with_token_store(mut self, storage: Arc<dyn Storage>) -> Self {
        self.tokens = Some(storage);
        self
    }

    /// Backend base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn stored_token(&self) -> Option<String> {
        let storage = self.tokens.as_ref()?;
        match storage.get(keys::AUTH_TOKEN) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(err) => {
                warn!(%err, "could not read stored token");
                None
            },
        }
    }

    async fn send(
        &self,
        method: &Method,
        url: &str,
        body: Option<&Value>,
        query: &[(&'static str, String)],
        token: Option<&str>,
    ) -> Result<Response, ApiError> {
        let mut request = self.client.request(method.clone(), url).header(ACCEPT, "application/json");
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.map_err(|err| ApiError::Network(err.to_string()))
    }

    async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        query: &[(&'static str, String)],
    ) -> Result<Envelope, ApiError> {
        let url = format!("{}/api/{path}", self.base);
        debug!(%method, %url, "api call");

        let mut response = self.send(&method, &url, body.as_ref(), query, None).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            if let Some(token) = self.stored_token() {
                debug!(%url, "retrying with bearer token");
                response = self.send(&method, &url, body.as_ref(), query, Some(&token)).await?;
            }
        }

        let status = response.status();
        let text = response.text().await.map_err(|err| ApiError::Network(err.to_string()))?;
        match Envelope::from_json(&text) {
            Ok(envelope) => Ok(envelope),
            Err(_) if status == StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized),
            Err(err) => Err(ApiError::Decode(format!("{status}: {err}"))),
        }
    }

    async fn get(&self, path: &str) -> Result<Envelope, ApiError> {
        self.call(Method::GET, path, None, &[]).await
    }

    async fn post(&self, path: &str, body: Option<&(impl Serialize + Sync)>) -> Result<Envelope, ApiError> {
        let body = body.map(to_json).transpose()?;
        self.call(Method::POST, path, body, &[]).await
    }

    async fn send_body(
        &self,
        method: Method,
        path: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<Envelope, ApiError> {
        self.call(method, path, Some(to_json(body)?), &[]).await
    }
}

fn to_json(body: &(impl Serialize + Sync)) -> Result<Value, ApiError> {
    serde_json::to_value(body).map_err(|err| ApiError::Decode(err.to_string()))
}

/// Placeholder body type for POSTs without one.
const NO_BODY: Option<&Value> = None;

#[async_trait]
impl QuizApi for HttpApi {
    async fn join(&self, request: &JoinRequest) -> Result<JoinResponse, ApiError> {
        Ok(self.post("quizzes/join", Some(request)).await?.into_result()?)
    }

    async fn leave(&self, quiz_id: &QuizId, quiz_user_id: &QuizUserId) -> Result<(), ApiError> {
        let body = LeaveRequest { quiz_user_id: quiz_user_id.clone() };
        Ok(self.post(&format!("quizzes/{quiz_id}/leave"), Some(&body)).await?.into_ack()?)
    }

    async fn current_question(&self, quiz_id: &QuizId) -> Result<CurrentQuestion, ApiError> {
        Ok(self.get(&format!("quizzes/{quiz_id}/current")).await?.into_result()?)
    }

    async fn submit_answer(
        &self,
        quiz_id: &QuizId,
        submission: &AnswerSubmission,
    ) -> Result<(), ApiError> {
        Ok(self.post(&format!("quizzes/{quiz_id}/answer"), Some(submission)).await?.into_ack()?)
    }

    async fn get_quiz(&self, quiz_id: &QuizId) -> Result<Quiz, ApiError> {
        let response: QuizResponse = self.get(&format!("quizzes/{quiz_id}")).await?.into_result()?;
        Ok(response.quiz)
    }

    async fn list_participants(&self, quiz_id: &QuizId) -> Result<Vec<Participant>, ApiError> {
        let response: ParticipantsResponse =
            self.get(&format!("quizzes/{quiz_id}/participants")).await?.into_result()?;
        Ok(response.participants)
    }

    async fn host(&self, quiz_id: &QuizId) -> Result<HostResponse, ApiError> {
        Ok(self.post(&format!("quizzes/{quiz_id}/publish"), NO_BODY).await?.into_result()?)
    }

    async fn start(&self, quiz_id: &QuizId) -> Result<(), ApiError> {
        Ok(self.post(&format!("quizzes/{quiz_id}/start"), NO_BODY).await?.into_ack()?)
    }

    async fn push_question(&self, quiz_id: &QuizId, index: u32) -> Result<(), ApiError> {
        Ok(self.post(&format!("quizzes/{quiz_id}/push/{index}"), NO_BODY).await?.into_ack()?)
    }

    async fn end(&self, quiz_id: &QuizId) -> Result<(), ApiError> {
        Ok(self.post(&format!("quizzes/{quiz_id}/end"), NO_BODY).await?.into_ack()?)
    }

    async fn leaderboard(&self, quiz_id: &QuizId) -> Result<Vec<LeaderboardEntry>, ApiError> {
        let response: LeaderboardResponse =
            self.get(&format!("quizzes/{quiz_id}/leaderboard")).await?.into_result()?;
        Ok(response.leaderboard)
    }

    async fn clear_participants(&self, quiz_id: &QuizId) -> Result<(), ApiError> {
        Ok(self.post(&format!("quizzes/{quiz_id}/participants/clear"), NO_BODY).await?.into_ack()?)
    }

    async fn create_quiz(&self, draft: &QuizDraft) -> Result<Quiz, ApiError> {
        let response: QuizResponse = self.post("quizzes", Some(draft)).await?.into_result()?;
        Ok(response.quiz)
    }

    async fn update_draft(&self, quiz_id: &QuizId, draft: &QuizDraft) -> Result<(), ApiError> {
        let body = to_json(draft)?;
        Ok(self.call(Method::PATCH, &format!("quizzes/{quiz_id}"), Some(body), &[]).await?.into_ack()?)
    }

    async fn list_quizzes(&self, query: &ListQuery) -> Result<QuizListResponse, ApiError> {
        Ok(self.call(Method::GET, "quizzes", None, &query.pairs()).await?.into_result()?)
    }

    async fn admin_list_past(&self, query: &ListQuery) -> Result<AdminQuizList, ApiError> {
        Ok(self.call(Method::GET, "quizzes/admin/past", None, &query.pairs()).await?.into_result()?)
    }

    async fn admin_details(&self, quiz_id: &QuizId) -> Result<AdminQuizDetails, ApiError> {
        Ok(self.get(&format!("quizzes/admin/{quiz_id}")).await?.into_result()?)
    }
}

#[async_trait]
impl AuthApi for HttpApi {
    async fn session_status(&self) -> Result<SessionStatus, ApiError> {
        Ok(self.get("auth/session-status").await?.into_result()?)
    }

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        Ok(self.post("auth/login", Some(request)).await?.into_result()?)
    }

    async fn signup(&self, request: &SignupRequest) -> Result<LoginResponse, ApiError> {
        Ok(self.post("auth/signup", Some(request)).await?.into_result()?)
    }

    async fn logout(&self) -> Result<(), ApiError> {
        Ok(self.post("auth/logout", NO_BODY).await?.into_ack()?)
    }
}

#[async_trait]
impl GoalsApi for HttpApi {
    async fn list_goals(&self) -> Result<GoalsOverview, ApiError> {
        Ok(self.get("goals").await?.into_data()?)
    }

    async fn goals_by_category(&self, category: GoalCategory) -> Result<Vec<Goal>, ApiError> {
        Ok(self.get(&format!("goals/category/{category}")).await?.into_data()?)
    }

    async fn get_goal(&self, id: &GoalId) -> Result<Goal, ApiError> {
        Ok(self.get(&format!("goals/{id}")).await?.into_data()?)
    }

    async fn create_goal(&self, goal: &NewGoal) -> Result<Goal, ApiError> {
        Ok(self.post("goals", Some(goal)).await?.into_data()?)
    }

    async fn update_goal(&self, id: &GoalId, update: &GoalUpdate) -> Result<Goal, ApiError> {
        Ok(self.send_body(Method::PUT, &format!("goals/{id}"), update).await?.into_data()?)
    }

    async fn delete_goal(&self, id: &GoalId) -> Result<(), ApiError> {
        Ok(self.call(Method::DELETE, &format!("goals/{id}"), None, &[]).await?.into_ack()?)
    }

    async fn toggle_goal(&self, id: &GoalId) -> Result<Goal, ApiError> {
        let path = format!("goals/{id}/toggle-completion");
        Ok(self.call(Method::PATCH, &path, None, &[]).await?.into_data()?)
    }

    async fn toggle_milestone(
        &self,
        goal: &GoalId,
        milestone: &MilestoneId,
    ) -> Result<Goal, ApiError> {
        let path = format!("goals/{goal}/milestones/{milestone}/toggle-completion");
        Ok(self.call(Method::PATCH, &path, None, &[]).await?.into_data()?)
    }

    async fn toggle_subtask(
        &self,
        goal: &GoalId,
        milestone: &MilestoneId,
        subtask: &SubtaskId,
    ) -> Result<Goal, ApiError> {
        let path = format!("goals/{goal}/milestones/{milestone}/subtasks/{subtask}/toggle-completion");
        Ok(self.call(Method::PATCH, &path, None, &[]).await?.into_data()?)
    }

    async fn add_subtasks(
        &self,
        goal: &GoalId,
        milestone: &MilestoneId,
        subtasks: &[NewSubtask],
    ) -> Result<Goal, ApiError> {
        let body = SubtaskList { subtasks: subtasks.to_vec() };
        let path = format!("goals/{goal}/milestones/{milestone}/subtasks");
        Ok(self.post(&path, Some(&body)).await?.into_data()?)
    }

    async fn replace_subtasks(
        &self,
        goal: &GoalId,
        milestone: &MilestoneId,
        subtasks: &[NewSubtask],
    ) -> Result<Goal, ApiError> {
        let body = SubtaskList { subtasks: subtasks.to_vec() };
        let path = format!("goals/{goal}/milestones/{milestone}/subtasks");
        Ok(self.send_body(Method::PUT, &path, &body).await?.into_data()?)
    }

    async fn delete_subtask(
        &self,
        goal: &GoalId,
        milestone: &MilestoneId,
        subtask: &SubtaskId,
    ) -> Result<Goal, ApiError> {
        let path = format!("goals/{goal}/milestones/{milestone}/subtasks/{subtask}");
        Ok(self.call(Method::DELETE, &path, None, &[]).await?.into_data()?)
    }
}

#[async_trait]
impl DailyTasksApi for HttpApi {
    async fn list_tasks(&self, date: Option<&str>) -> Result<Vec<DailyTask>, ApiError> {
        let query: Vec<_> =
            date.filter(|d| !d.is_empty()).map(|d| ("date", d.to_string())).into_iter().collect();
        Ok(self.call(Method::GET, "daily-tasks", None, &query).await?.into_data()?)
    }

    async fn get_task(&self, id: &TaskId) -> Result<DailyTask, ApiError> {
        Ok(self.get(&format!("daily-tasks/{id}")).await?.into_data()?)
    }

    async fn create_task(&self, task: &NewDailyTask) -> Result<DailyTask, ApiError> {
        Ok(self.post("daily-tasks", Some(task)).await?.into_data()?)
    }

    async fn update_task(
        &self,
        id: &TaskId,
        update: &DailyTaskUpdate,
    ) -> Result<DailyTask, ApiError> {
        Ok(self.send_body(Method::PUT, &format!("daily-tasks/{id}"), update).await?.into_data()?)
    }

    async fn delete_task(&self, id: &TaskId) -> Result<(), ApiError> {
        Ok(self.call(Method::DELETE, &format!("daily-tasks/{id}"), None, &[]).await?.into_ack()?)
    }

    async fn toggle_task(&self, id: &TaskId, date: Option<&str>) -> Result<TaskToggle, ApiError> {
        let body = ToggleRequest { date: date.filter(|d| !d.is_empty()).map(str::to_string) };
        let path = format!("daily-tasks/{id}/toggle-completion");
        Ok(self.send_body(Method::PATCH, &path, &body).await?.into_data()?)
    }

    async fn streak_info(&self) -> Result<StreakInfo, ApiError> {
        Ok(self.get("daily-tasks/streak/info").await?.into_data()?)
    }

    async fn completion_history(
        &self,
        range: &HistoryRange,
    ) -> Result<CompletionHistory, ApiError> {
        let path = "daily-tasks/stats/history";
        Ok(self.call(Method::GET, path, None, &range.pairs()).await?.into_data()?)
    }
}
