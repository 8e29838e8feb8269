//! REST action traits.
//!
//! Each method issues exactly one HTTP call and returns the typed payload of
//! the response envelope. No retries and no timeouts beyond the transport's
//! defaults; callers decide what a failure means for the user.

use async_trait::async_trait;
use quizcast_proto::{
    AdminQuizDetails, AdminQuizList, AnswerSubmission, CompletionHistory, CurrentQuestion,
    DailyTask, DailyTaskUpdate, Goal, GoalCategory, GoalId, GoalUpdate, GoalsOverview,
    HistoryRange, HostResponse, JoinRequest, JoinResponse, LeaderboardEntry, ListQuery,
    LoginRequest, LoginResponse, MilestoneId, NewDailyTask, NewGoal, NewSubtask, Participant,
    Quiz, QuizDraft, QuizId, QuizListResponse, QuizUserId, SessionStatus, SignupRequest,
    StreakInfo, SubtaskId, TaskId, TaskToggle,
};

use crate::error::ApiError;

/// Quiz endpoints.
#[async_trait]
pub trait QuizApi: Send + Sync {
    /// Join a quiz by code.
    async fn join(&self, request: &JoinRequest) -> Result<JoinResponse, ApiError>;

    /// Remove a participant from a quiz.
    async fn leave(&self, quiz_id: &QuizId, quiz_user_id: &QuizUserId) -> Result<(), ApiError>;

    /// The question the quiz is presenting right now.
    async fn current_question(&self, quiz_id: &QuizId) -> Result<CurrentQuestion, ApiError>;

    /// Submit one answer.
    async fn submit_answer(
        &self,
        quiz_id: &QuizId,
        submission: &AnswerSubmission,
    ) -> Result<(), ApiError>;

    /// Fetch one quiz (owner view).
    async fn get_quiz(&self, quiz_id: &QuizId) -> Result<Quiz, ApiError>;

    /// Participants currently joined.
    async fn list_participants(&self, quiz_id: &QuizId) -> Result<Vec<Participant>, ApiError>;

    /// Publish a quiz and obtain its join code.
    async fn host(&self, quiz_id: &QuizId) -> Result<HostResponse, ApiError>;

    /// Start a hosted quiz.
    async fn start(&self, quiz_id: &QuizId) -> Result<(), ApiError>;

    /// Make the question at `index` current.
    async fn push_question(&self, quiz_id: &QuizId, index: u32) -> Result<(), ApiError>;

    /// End a quiz.
    async fn end(&self, quiz_id: &QuizId) -> Result<(), ApiError>;

    /// Final standings.
    async fn leaderboard(&self, quiz_id: &QuizId) -> Result<Vec<LeaderboardEntry>, ApiError>;

    /// Remove every participant.
    async fn clear_participants(&self, quiz_id: &QuizId) -> Result<(), ApiError>;

    /// Create a draft quiz.
    async fn create_quiz(&self, draft: &QuizDraft) -> Result<Quiz, ApiError>;

    /// Replace a draft's contents.
    async fn update_draft(&self, quiz_id: &QuizId, draft: &QuizDraft) -> Result<(), ApiError>;

    /// The caller's quizzes.
    async fn list_quizzes(&self, query: &ListQuery) -> Result<QuizListResponse, ApiError>;

    /// Finished quizzes (admin).
    async fn admin_list_past(&self, query: &ListQuery) -> Result<AdminQuizList, ApiError>;

    /// Full record of one quiz (admin).
    async fn admin_details(&self, quiz_id: &QuizId) -> Result<AdminQuizDetails, ApiError>;
}

/// Authentication endpoints.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Login state of the current session.
    async fn session_status(&self) -> Result<SessionStatus, ApiError>;

    /// Log in with email and password.
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError>;

    /// Create an account and log in.
    async fn signup(&self, request: &SignupRequest) -> Result<LoginResponse, ApiError>;

    /// End the session.
    async fn logout(&self) -> Result<(), ApiError>;
}

/// Goal tracker endpoints. All require a logged-in session.
#[async_trait]
pub trait GoalsApi: Send + Sync {
    /// The caller's goals with completion figures.
    async fn list_goals(&self) -> Result<GoalsOverview, ApiError>;

    /// Goals in one planning horizon.
    async fn goals_by_category(&self, category: GoalCategory) -> Result<Vec<Goal>, ApiError>;

    /// Fetch one goal.
    async fn get_goal(&self, id: &GoalId) -> Result<Goal, ApiError>;

    /// Create a goal.
    async fn create_goal(&self, goal: &NewGoal) -> Result<Goal, ApiError>;

    /// Apply a partial update.
    async fn update_goal(&self, id: &GoalId, update: &GoalUpdate) -> Result<Goal, ApiError>;

    /// Delete a goal.
    async fn delete_goal(&self, id: &GoalId) -> Result<(), ApiError>;

    /// Flip a goal's completion.
    async fn toggle_goal(&self, id: &GoalId) -> Result<Goal, ApiError>;

    /// Flip a milestone's completion.
    async fn toggle_milestone(
        &self,
        goal: &GoalId,
        milestone: &MilestoneId,
    ) -> Result<Goal, ApiError>;

    /// Flip a subtask's completion.
    async fn toggle_subtask(
        &self,
        goal: &GoalId,
        milestone: &MilestoneId,
        subtask: &SubtaskId,
    ) -> Result<Goal, ApiError>;

    /// Append subtasks to a milestone.
    async fn add_subtasks(
        &self,
        goal: &GoalId,
        milestone: &MilestoneId,
        subtasks: &[NewSubtask],
    ) -> Result<Goal, ApiError>;

    /// Replace a milestone's subtasks.
    async fn replace_subtasks(
        &self,
        goal: &GoalId,
        milestone: &MilestoneId,
        subtasks: &[NewSubtask],
    ) -> Result<Goal, ApiError>;

    /// Delete one subtask.
    async fn delete_subtask(
        &self,
        goal: &GoalId,
        milestone: &MilestoneId,
        subtask: &SubtaskId,
    ) -> Result<Goal, ApiError>;
}

/// Daily task endpoints. All require a logged-in session.
#[async_trait]
pub trait DailyTasksApi: Send + Sync {
    /// Tasks scheduled on `date`, or today when unset.
    async fn list_tasks(&self, date: Option<&str>) -> Result<Vec<DailyTask>, ApiError>;

    /// Fetch one task.
    async fn get_task(&self, id: &TaskId) -> Result<DailyTask, ApiError>;

    /// Create a task.
    async fn create_task(&self, task: &NewDailyTask) -> Result<DailyTask, ApiError>;

    /// Apply a partial update.
    async fn update_task(&self, id: &TaskId, update: &DailyTaskUpdate)
    -> Result<DailyTask, ApiError>;

    /// Delete a task.
    async fn delete_task(&self, id: &TaskId) -> Result<(), ApiError>;

    /// Flip completion for `date`, or today when unset.
    async fn toggle_task(&self, id: &TaskId, date: Option<&str>) -> Result<TaskToggle, ApiError>;

    /// Streak figures.
    async fn streak_info(&self) -> Result<StreakInfo, ApiError>;

    /// Completions grouped by day.
    async fn completion_history(&self, range: &HistoryRange)
    -> Result<CompletionHistory, ApiError>;
}
