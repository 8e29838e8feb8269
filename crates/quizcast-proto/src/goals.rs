//! Goal tracker payloads.
//!
//! A goal carries milestones, and each milestone carries subtasks. Completion
//! is toggled at every level through separate endpoints. The server owns
//! progress and streak figures; the client only displays them. Dates stay as
//! the ISO-8601 strings the server sends.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    errors::ProtocolError,
    ids::{GoalId, MilestoneId, SubtaskId},
};

/// Planning horizon of a goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalCategory {
    /// Due within a week.
    Weekly,
    /// Due within a month.
    Monthly,
    /// Due within a quarter.
    Quarterly,
    /// Due within a year.
    Yearly,
}

impl GoalCategory {
    /// Wire name, also used in the category listing path.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
        }
    }
}

impl fmt::Display for GoalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GoalCategory {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "yearly" => Ok(Self::Yearly),
            _ => Err(ProtocolError::UnknownValue {
                kind: "category",
                value: s.to_string(),
                expected: "weekly, monthly, quarterly, yearly",
            }),
        }
    }
}

/// Priority of a goal or daily task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Low.
    Low,
    /// Medium.
    Medium,
    /// High.
    High,
}

impl Priority {
    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(ProtocolError::UnknownValue {
                kind: "priority",
                value: s.to_string(),
                expected: "low, medium, high",
            }),
        }
    }
}

/// Smallest unit of work under a milestone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    /// Subtask id.
    #[serde(rename = "_id")]
    pub id: SubtaskId,
    /// Title.
    pub title: String,
    /// Completion flag.
    #[serde(default)]
    pub completed: bool,
    /// Creation time.
    #[serde(default)]
    pub created_at: String,
}

/// Intermediate checkpoint of a goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    /// Milestone id.
    #[serde(rename = "_id")]
    pub id: MilestoneId,
    /// Title.
    pub title: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Due date.
    pub target_date: String,
    /// Completion flag.
    #[serde(default)]
    pub completed: bool,
    /// Subtasks.
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    /// Creation time.
    #[serde(default)]
    pub created_at: String,
    /// Server-computed percentage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
}

/// A goal with its milestones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    /// Goal id.
    #[serde(rename = "_id")]
    pub id: GoalId,
    /// Title.
    pub title: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Planning horizon.
    pub category: GoalCategory,
    /// Priority.
    pub priority: Priority,
    /// Due date.
    pub target_date: String,
    /// Creation time.
    #[serde(default)]
    pub created_at: String,
    /// Completion flag.
    #[serde(default)]
    pub completed: bool,
    /// Milestones.
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    /// When the goal was completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    /// Server-computed percentage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
}

impl Goal {
    /// Percentage shown for the goal.
    ///
    /// Prefers the server figure. Otherwise counts completed milestones, and a
    /// goal without milestones is all or nothing.
    pub fn progress_percent(&self) -> u32 {
        if let Some(progress) = self.progress {
            return progress.clamp(0.0, 100.0).round() as u32;
        }
        if self.milestones.is_empty() {
            return if self.completed { 100 } else { 0 };
        }
        let done = self.milestones.iter().filter(|m| m.completed).count();
        (done * 100 / self.milestones.len()) as u32
    }

    /// Look up a milestone by id.
    pub fn milestone(&self, id: &MilestoneId) -> Option<&Milestone> {
        self.milestones.iter().find(|m| &m.id == id)
    }
}

/// Completion figures across all of a user's goals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalsAnalytics {
    /// Consecutive periods with a completed goal.
    #[serde(default)]
    pub current_streak: u32,
    /// Best streak so far.
    #[serde(default)]
    pub longest_streak: u32,
    /// Goals completed.
    #[serde(default)]
    pub total_completed: u32,
    /// Goals in total.
    #[serde(default)]
    pub total_goals: u32,
    /// Percentage of goals completed.
    #[serde(default)]
    pub completion_rate: f64,
}

/// Payload of the goal listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoalsOverview {
    /// Goals, newest first.
    #[serde(default)]
    pub goals: Vec<Goal>,
    /// Completion figures.
    #[serde(default)]
    pub analytics: GoalsAnalytics,
}

/// Subtask to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSubtask {
    /// Title.
    pub title: String,
}

impl NewSubtask {
    /// Subtask with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into() }
    }
}

/// Milestone to create along with a goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMilestone {
    /// Title.
    pub title: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Due date.
    pub target_date: String,
    /// Initial subtasks.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<NewSubtask>,
}

/// Goal contents for the create call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGoal {
    /// Title.
    pub title: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Planning horizon.
    pub category: GoalCategory,
    /// Priority.
    pub priority: Priority,
    /// Due date.
    pub target_date: String,
    /// Initial milestones.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub milestones: Vec<NewMilestone>,
}

/// Partial goal update. Unset fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalUpdate {
    /// New title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New horizon.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<GoalCategory>,
    /// New priority.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// New due date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_date: Option<String>,
    /// New completion flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    /// Replacement milestones.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestones: Option<Vec<NewMilestone>>,
}

/// Body of the subtask add and replace calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtaskList {
    /// Subtasks to add, or the full replacement list.
    pub subtasks: Vec<NewSubtask>,
}
