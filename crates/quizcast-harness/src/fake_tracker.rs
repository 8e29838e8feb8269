//! In-memory goal and daily-task backend.
//!
//! Keeps real state rather than scripts: created goals get sequential ids,
//! toggles flip flags, and daily completions are recorded per day so listing
//! and history reflect earlier calls.

use std::{
    collections::{BTreeMap, VecDeque},
    sync::{Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use quizcast_core::{ApiError, DailyTasksApi, GoalsApi};
use quizcast_proto::{
    CompletionHistory, CompletionRecord, DailyTask, DailyTaskUpdate, Goal, GoalCategory, GoalId,
    GoalUpdate, GoalsAnalytics, GoalsOverview, HistoryRange, Milestone, MilestoneId, NewDailyTask,
    NewGoal, NewMilestone, NewSubtask, StreakInfo, Subtask, SubtaskId, TaskId, TaskToggle,
};

#[derive(Debug, Default)]
struct State {
    calls: Vec<&'static str>,
    next_id: u32,
    today: String,
    goals: BTreeMap<GoalId, Goal>,
    tasks: BTreeMap<TaskId, DailyTask>,
    completions: Vec<CompletionRecord>,
    streak: (u32, u32),
    failures: BTreeMap<&'static str, VecDeque<ApiError>>,
}

impl State {
    fn id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{}", self.next_id)
    }

    fn subtasks(&mut self, new: &[NewSubtask]) -> Vec<Subtask> {
        new.iter()
            .map(|s| Subtask {
                id: SubtaskId::new(self.id("s")),
                title: s.title.clone(),
                completed: false,
                created_at: self.today.clone(),
            })
            .collect()
    }

    fn milestones(&mut self, new: &[NewMilestone]) -> Vec<Milestone> {
        new.iter()
            .map(|m| Milestone {
                id: MilestoneId::new(self.id("m")),
                title: m.title.clone(),
                description: m.description.clone(),
                target_date: m.target_date.clone(),
                completed: false,
                subtasks: self.subtasks(&m.subtasks),
                created_at: self.today.clone(),
                progress: None,
            })
            .collect()
    }

    fn goal(&mut self, id: &GoalId) -> Result<&mut Goal, ApiError> {
        self.goals.get_mut(id).ok_or_else(|| not_found("Goal"))
    }

    fn milestone(&mut self, goal: &GoalId, milestone: &MilestoneId) -> Result<&mut Milestone, ApiError> {
        self.goal(goal)?
            .milestones
            .iter_mut()
            .find(|m| &m.id == milestone)
            .ok_or_else(|| not_found("Milestone"))
    }

    fn task(&mut self, id: &TaskId) -> Result<&mut DailyTask, ApiError> {
        self.tasks.get_mut(id).ok_or_else(|| not_found("Task"))
    }

    fn done_on(&self, task: &TaskId, date: &str) -> bool {
        self.completions.iter().any(|c| &c.task_id == task && c.completed_date == date)
    }
}

fn not_found(what: &str) -> ApiError {
    ApiError::Rejected { message: Some(format!("{what} not found")) }
}

/// In-memory [`GoalsApi`] and [`DailyTasksApi`].
#[derive(Debug)]
pub struct FakeTracker {
    state: Mutex<State>,
}

impl Default for FakeTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeTracker {
    /// Day used when a call leaves the date unset.
    pub const TODAY: &'static str = "2026-10-18";

    /// Empty backend.
    pub fn new() -> Self {
        let state = State { today: Self::TODAY.into(), ..State::default() };
        Self { state: Mutex::new(state) }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, method: &'static str) -> Result<MutexGuard<'_, State>, ApiError> {
        let mut state = self.state();
        state.calls.push(method);
        match state.failures.get_mut(method).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(state),
        }
    }

    /// Make the next call to `method` fail with `err`.
    pub fn fail_next(&self, method: &'static str, err: ApiError) {
        self.state().failures.entry(method).or_default().push_back(err);
    }

    /// Method names called so far, oldest first.
    pub fn calls(&self) -> Vec<&'static str> {
        self.state().calls.clone()
    }

    /// Streak figures reported by `streak_info`.
    pub fn set_streak(&self, current: u32, longest: u32) {
        self.state().streak = (current, longest);
    }

    /// Snapshot of a stored goal.
    pub fn goal(&self, id: &GoalId) -> Option<Goal> {
        self.state().goals.get(id).cloned()
    }

    /// Snapshot of a stored task.
    pub fn task(&self, id: &TaskId) -> Option<DailyTask> {
        self.state().tasks.get(id).cloned()
    }
}

#[async_trait]
impl GoalsApi for FakeTracker {
    async fn list_goals(&self) -> Result<GoalsOverview, ApiError> {
        let state = self.record("list_goals")?;
        let goals: Vec<Goal> = state.goals.values().cloned().collect();
        let total_goals = goals.len() as u32;
        let total_completed = goals.iter().filter(|g| g.completed).count() as u32;
        let completion_rate = if total_goals == 0 {
            0.0
        } else {
            f64::from(total_completed) * 100.0 / f64::from(total_goals)
        };
        let analytics = GoalsAnalytics {
            current_streak: state.streak.0,
            longest_streak: state.streak.1,
            total_completed,
            total_goals,
            completion_rate,
        };
        Ok(GoalsOverview { goals, analytics })
    }

    async fn goals_by_category(&self, category: GoalCategory) -> Result<Vec<Goal>, ApiError> {
        let state = self.record("goals_by_category")?;
        Ok(state.goals.values().filter(|g| g.category == category).cloned().collect())
    }

    async fn get_goal(&self, id: &GoalId) -> Result<Goal, ApiError> {
        let mut state = self.record("get_goal")?;
        Ok(state.goal(id)?.clone())
    }

    async fn create_goal(&self, goal: &NewGoal) -> Result<Goal, ApiError> {
        let mut state = self.record("create_goal")?;
        let id = GoalId::new(state.id("g"));
        let created = Goal {
            id: id.clone(),
            title: goal.title.clone(),
            description: goal.description.clone(),
            category: goal.category,
            priority: goal.priority,
            target_date: goal.target_date.clone(),
            created_at: state.today.clone(),
            completed: false,
            milestones: state.milestones(&goal.milestones),
            completed_at: None,
            progress: None,
        };
        state.goals.insert(id, created.clone());
        Ok(created)
    }

    async fn update_goal(&self, id: &GoalId, update: &GoalUpdate) -> Result<Goal, ApiError> {
        let mut state = self.record("update_goal")?;
        let milestones = update.milestones.as_deref().map(|m| state.milestones(m));
        let goal = state.goal(id)?;
        if let Some(title) = &update.title {
            goal.title.clone_from(title);
        }
        if update.description.is_some() {
            goal.description.clone_from(&update.description);
        }
        if let Some(category) = update.category {
            goal.category = category;
        }
        if let Some(priority) = update.priority {
            goal.priority = priority;
        }
        if let Some(date) = &update.target_date {
            goal.target_date.clone_from(date);
        }
        if let Some(completed) = update.completed {
            goal.completed = completed;
        }
        if let Some(milestones) = milestones {
            goal.milestones = milestones;
        }
        Ok(goal.clone())
    }

    async fn delete_goal(&self, id: &GoalId) -> Result<(), ApiError> {
        let mut state = self.record("delete_goal")?;
        state.goals.remove(id).map(drop).ok_or_else(|| not_found("Goal"))
    }

    async fn toggle_goal(&self, id: &GoalId) -> Result<Goal, ApiError> {
        let mut state = self.record("toggle_goal")?;
        let today = state.today.clone();
        let goal = state.goal(id)?;
        goal.completed = !goal.completed;
        goal.completed_at = goal.completed.then_some(today);
        Ok(goal.clone())
    }

    async fn toggle_milestone(
        &self,
        goal: &GoalId,
        milestone: &MilestoneId,
    ) -> Result<Goal, ApiError> {
        let mut state = self.record("toggle_milestone")?;
        let found = state.milestone(goal, milestone)?;
        found.completed = !found.completed;
        Ok(state.goal(goal)?.clone())
    }

    async fn toggle_subtask(
        &self,
        goal: &GoalId,
        milestone: &MilestoneId,
        subtask: &SubtaskId,
    ) -> Result<Goal, ApiError> {
        let mut state = self.record("toggle_subtask")?;
        let found = state
            .milestone(goal, milestone)?
            .subtasks
            .iter_mut()
            .find(|s| &s.id == subtask)
            .ok_or_else(|| not_found("Subtask"))?;
        found.completed = !found.completed;
        Ok(state.goal(goal)?.clone())
    }

    async fn add_subtasks(
        &self,
        goal: &GoalId,
        milestone: &MilestoneId,
        subtasks: &[NewSubtask],
    ) -> Result<Goal, ApiError> {
        let mut state = self.record("add_subtasks")?;
        let added = state.subtasks(subtasks);
        state.milestone(goal, milestone)?.subtasks.extend(added);
        Ok(state.goal(goal)?.clone())
    }

    async fn replace_subtasks(
        &self,
        goal: &GoalId,
        milestone: &MilestoneId,
        subtasks: &[NewSubtask],
    ) -> Result<Goal, ApiError> {
        let mut state = self.record("replace_subtasks")?;
        let replaced = state.subtasks(subtasks);
        state.milestone(goal, milestone)?.subtasks = replaced;
        Ok(state.goal(goal)?.clone())
    }

    async fn delete_subtask(
        &self,
        goal: &GoalId,
        milestone: &MilestoneId,
        subtask: &SubtaskId,
    ) -> Result<Goal, ApiError> {
        let mut state = self.record("delete_subtask")?;
        let found = state.milestone(goal, milestone)?;
        let before = found.subtasks.len();
        found.subtasks.retain(|s| &s.id != subtask);
        if found.subtasks.len() == before {
            return Err(not_found("Subtask"));
        }
        Ok(state.goal(goal)?.clone())
    }
}

#[async_trait]
impl DailyTasksApi for FakeTracker {
    async fn list_tasks(&self, date: Option<&str>) -> Result<Vec<DailyTask>, ApiError> {
        let state = self.record("list_tasks")?;
        let day = date.unwrap_or(state.today.as_str()).to_string();
        Ok(state
            .tasks
            .values()
            .filter(|t| t.date_started <= day && day <= t.date_ended)
            .map(|t| DailyTask { is_completed_today: state.done_on(&t.id, &day), ..t.clone() })
            .collect())
    }

    async fn get_task(&self, id: &TaskId) -> Result<DailyTask, ApiError> {
        let mut state = self.record("get_task")?;
        Ok(state.task(id)?.clone())
    }

    async fn create_task(&self, task: &NewDailyTask) -> Result<DailyTask, ApiError> {
        let mut state = self.record("create_task")?;
        let id = TaskId::new(state.id("t"));
        let created = DailyTask {
            id: id.clone(),
            user_id: "user-1".into(),
            title: task.title.clone(),
            description: task.description.clone(),
            priority: task.priority,
            date_started: task.date_started.clone(),
            date_ended: task.date_ended.clone(),
            daily_start_time: task.daily_start_time.clone(),
            daily_end_time: task.daily_end_time.clone(),
            last_completed_date: None,
            is_active: true,
            is_completed_today: false,
            created_at: state.today.clone(),
            updated_at: state.today.clone(),
        };
        state.tasks.insert(id, created.clone());
        Ok(created)
    }

    async fn update_task(
        &self,
        id: &TaskId,
        update: &DailyTaskUpdate,
    ) -> Result<DailyTask, ApiError> {
        let mut state = self.record("update_task")?;
        let task = state.task(id)?;
        let set = |field: &mut String, value: &Option<String>| {
            if let Some(value) = value {
                field.clone_from(value);
            }
        };
        set(&mut task.title, &update.title);
        set(&mut task.date_started, &update.date_started);
        set(&mut task.date_ended, &update.date_ended);
        set(&mut task.daily_start_time, &update.daily_start_time);
        set(&mut task.daily_end_time, &update.daily_end_time);
        if update.description.is_some() {
            task.description.clone_from(&update.description);
        }
        if let Some(priority) = update.priority {
            task.priority = priority;
        }
        if let Some(active) = update.is_active {
            task.is_active = active;
        }
        Ok(task.clone())
    }

    async fn delete_task(&self, id: &TaskId) -> Result<(), ApiError> {
        let mut state = self.record("delete_task")?;
        state.tasks.remove(id).ok_or_else(|| not_found("Task"))?;
        state.completions.retain(|c| &c.task_id != id);
        Ok(())
    }

    async fn toggle_task(&self, id: &TaskId, date: Option<&str>) -> Result<TaskToggle, ApiError> {
        let mut state = self.record("toggle_task")?;
        let day = date.unwrap_or(state.today.as_str()).to_string();
        state.task(id)?;
        let is_completed = if state.done_on(id, &day) {
            state.completions.retain(|c| !(&c.task_id == id && c.completed_date == day));
            false
        } else {
            let record_id = state.id("c");
            state.completions.push(CompletionRecord {
                id: record_id,
                task_id: id.clone(),
                completed_date: day.clone(),
                completed_at: day.clone(),
            });
            state.task(id)?.last_completed_date = Some(day.clone());
            true
        };
        let all_tasks_completed =
            state.tasks.values().filter(|t| t.is_active).all(|t| state.done_on(&t.id, &day));
        Ok(TaskToggle { task_id: id.clone(), is_completed, all_tasks_completed })
    }

    async fn streak_info(&self) -> Result<StreakInfo, ApiError> {
        let state = self.record("streak_info")?;
        let active: Vec<&DailyTask> = state.tasks.values().filter(|t| t.is_active).collect();
        let completed_today = active.iter().filter(|t| state.done_on(&t.id, &state.today)).count();
        Ok(StreakInfo {
            current_streak: state.streak.0,
            longest_streak: state.streak.1,
            total_active_tasks: active.len() as u32,
            completed_today: completed_today as u32,
        })
    }

    async fn completion_history(
        &self,
        range: &HistoryRange,
    ) -> Result<CompletionHistory, ApiError> {
        let state = self.record("completion_history")?;
        let mut history = CompletionHistory::default();
        for record in &state.completions {
            let day = record.completed_date.as_str();
            let after_start = range.start_date.as_deref().is_none_or(|start| start <= day);
            let before_end = range.end_date.as_deref().is_none_or(|end| day <= end);
            if after_start && before_end {
                history.stats.entry(day.to_string()).or_default().push(record.clone());
                history.total_completions += 1;
            }
        }
        Ok(history)
    }
}
