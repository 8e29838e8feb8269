//! Daily task payloads.
//!
//! A daily task recurs every day between `date_started` and `date_ended`
//! inside a daily time window. Completion is recorded per day; the server
//! answers with `is_completed_today` relative to the requested date.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{goals::Priority, ids::TaskId};

/// A recurring daily task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTask {
    /// Task id.
    #[serde(rename = "_id")]
    pub id: TaskId,
    /// Owning user.
    #[serde(default)]
    pub user_id: String,
    /// Title.
    pub title: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Priority.
    pub priority: Priority,
    /// First day the task applies.
    pub date_started: String,
    /// Last day the task applies.
    pub date_ended: String,
    /// Window start, `HH:MM`.
    pub daily_start_time: String,
    /// Window end, `HH:MM`.
    pub daily_end_time: String,
    /// Most recent completion day.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_completed_date: Option<String>,
    /// Inactive tasks are kept but not scheduled.
    #[serde(default = "active")]
    pub is_active: bool,
    /// Completion for the requested day.
    #[serde(default)]
    pub is_completed_today: bool,
    /// Creation time.
    #[serde(default)]
    pub created_at: String,
    /// Last modification time.
    #[serde(default)]
    pub updated_at: String,
}

fn active() -> bool {
    true
}

/// Task contents for the create call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDailyTask {
    /// Title.
    pub title: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Priority.
    pub priority: Priority,
    /// First day.
    pub date_started: String,
    /// Last day.
    pub date_ended: String,
    /// Window start, `HH:MM`.
    pub daily_start_time: String,
    /// Window end, `HH:MM`.
    pub daily_end_time: String,
}

/// Partial task update. Unset fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTaskUpdate {
    /// New title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New priority.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// New first day.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_started: Option<String>,
    /// New last day.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_ended: Option<String>,
    /// New window start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_start_time: Option<String>,
    /// New window end.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_end_time: Option<String>,
    /// Pause or resume the task.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Body of the toggle call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleRequest {
    /// Day to toggle; the server uses today when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// Outcome of a toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskToggle {
    /// Toggled task.
    pub task_id: TaskId,
    /// Completion after the toggle.
    pub is_completed: bool,
    /// Whether every active task is now done for the day.
    #[serde(default)]
    pub all_tasks_completed: bool,
}

/// Streak figures across all daily tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakInfo {
    /// Consecutive days with every task done.
    #[serde(default)]
    pub current_streak: u32,
    /// Best streak so far.
    #[serde(default)]
    pub longest_streak: u32,
    /// Tasks currently scheduled.
    #[serde(default)]
    pub total_active_tasks: u32,
    /// Tasks done today.
    #[serde(default)]
    pub completed_today: u32,
}

/// One recorded completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRecord {
    /// Record id.
    #[serde(rename = "_id", default)]
    pub id: String,
    /// Completed task.
    pub task_id: TaskId,
    /// Day the completion counts for.
    pub completed_date: String,
    /// When it was recorded.
    #[serde(default)]
    pub completed_at: String,
}

/// Completions grouped by day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionHistory {
    /// Day to completions, in date order.
    #[serde(default)]
    pub stats: BTreeMap<String, Vec<CompletionRecord>>,
    /// Completions in the whole range.
    #[serde(default)]
    pub total_completions: u32,
}

/// Date bounds for the history call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryRange {
    /// First day, inclusive.
    pub start_date: Option<String>,
    /// Last day, inclusive.
    pub end_date: Option<String>,
}

impl HistoryRange {
    /// Query pairs; empty bounds are omitted.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(start) = self.start_date.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("startDate", start.to_string()));
        }
        if let Some(end) = self.end_date.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("endDate", end.to_string()));
        }
        pairs
    }
}
