//! `goals` and `tasks` subcommands.
//!
//! Each invocation is a single REST call; edits to milestones and subtasks
//! answer with the whole goal, which is what gets printed. Handlers return
//! their output lines instead of printing them.

use std::path::PathBuf;

use clap::Subcommand;
use quizcast_core::{DailyTasksApi, GoalsApi};
use quizcast_proto::{
    DailyTaskUpdate, Goal, GoalCategory, GoalId, GoalUpdate, HistoryRange, MilestoneId,
    NewDailyTask, NewGoal, NewSubtask, Priority, SubtaskId, TaskId,
};

use crate::{cli::read_json, error::CliError, report};

/// `goals` subcommands.
#[derive(Debug, Subcommand)]
pub enum GoalsCommand {
    /// List goals with completion figures.
    List {
        /// Only one planning horizon: weekly, monthly, quarterly or yearly.
        #[arg(long)]
        category: Option<GoalCategory>,
    },

    /// Show a goal with its milestones and subtasks.
    Show {
        /// Goal id.
        goal_id: String,
    },

    /// Create a goal from a JSON file
    /// (`{title, category, priority, targetDate, milestones?}`).
    Create {
        /// Goal file.
        file: PathBuf,
    },

    /// Apply a partial update from a JSON file.
    Update {
        /// Goal id.
        goal_id: String,
        /// Update file; unset fields are left as they are.
        file: PathBuf,
    },

    /// Flip completion of a goal, or of one of its milestones or subtasks.
    Toggle {
        /// Goal id.
        goal_id: String,
        /// Milestone to toggle instead of the goal.
        #[arg(long)]
        milestone: Option<String>,
        /// Subtask of `--milestone` to toggle.
        #[arg(long, requires = "milestone")]
        subtask: Option<String>,
    },

    /// Delete a goal.
    Delete {
        /// Goal id.
        goal_id: String,
    },

    /// Edit the subtasks of a milestone.
    Subtasks {
        /// Subtask operation.
        #[command(subcommand)]
        action: SubtasksCommand,
    },
}

/// `goals subtasks` subcommands.
#[derive(Debug, Subcommand)]
pub enum SubtasksCommand {
    /// Append subtasks.
    Add {
        /// Goal id.
        goal_id: String,
        /// Milestone id.
        milestone_id: String,
        /// Subtask titles.
        #[arg(required = true)]
        titles: Vec<String>,
    },

    /// Replace all subtasks. No titles clears the list.
    Set {
        /// Goal id.
        goal_id: String,
        /// Milestone id.
        milestone_id: String,
        /// Subtask titles.
        titles: Vec<String>,
    },

    /// Delete one subtask.
    Remove {
        /// Goal id.
        goal_id: String,
        /// Milestone id.
        milestone_id: String,
        /// Subtask id.
        subtask_id: String,
    },
}

/// `tasks` subcommands.
#[derive(Debug, Subcommand)]
pub enum TasksCommand {
    /// Tasks scheduled on a day.
    List {
        /// Day as YYYY-MM-DD; the server's today when unset.
        #[arg(long, value_parser = parse_day)]
        date: Option<String>,
    },

    /// Show one task.
    Show {
        /// Task id.
        task_id: String,
    },

    /// Create a recurring task.
    Create {
        /// Title.
        #[arg(long)]
        title: String,
        /// Optional description.
        #[arg(long)]
        description: Option<String>,
        /// low, medium or high.
        #[arg(long, default_value = "medium")]
        priority: Priority,
        /// First day, YYYY-MM-DD.
        #[arg(long, value_parser = parse_day)]
        from: String,
        /// Last day, YYYY-MM-DD.
        #[arg(long, value_parser = parse_day)]
        to: String,
        /// Daily window start, HH:MM.
        #[arg(long, value_parser = parse_clock)]
        start: String,
        /// Daily window end, HH:MM.
        #[arg(long, value_parser = parse_clock)]
        end: String,
    },

    /// Apply a partial update from a JSON file.
    Update {
        /// Task id.
        task_id: String,
        /// Update file; unset fields are left as they are.
        file: PathBuf,
    },

    /// Stop scheduling a task without deleting it.
    Pause {
        /// Task id.
        task_id: String,
    },

    /// Schedule a paused task again.
    Resume {
        /// Task id.
        task_id: String,
    },

    /// Flip completion for a day.
    Toggle {
        /// Task id.
        task_id: String,
        /// Day as YYYY-MM-DD; the server's today when unset.
        #[arg(long, value_parser = parse_day)]
        date: Option<String>,
    },

    /// Delete a task and its completions.
    Delete {
        /// Task id.
        task_id: String,
    },

    /// Current and best streak.
    Streak,

    /// Completions grouped by day.
    History {
        /// First day, YYYY-MM-DD.
        #[arg(long, value_parser = parse_day)]
        from: Option<String>,
        /// Last day, YYYY-MM-DD.
        #[arg(long, value_parser = parse_day)]
        to: Option<String>,
    },
}

/// Accept `YYYY-MM-DD`.
fn parse_day(text: &str) -> Result<String, String> {
    let bytes = text.as_bytes();
    let shaped = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes.iter().enumerate().all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    let month = text.get(5..7).and_then(|m| m.parse::<u8>().ok()).unwrap_or(0);
    let day = text.get(8..10).and_then(|d| d.parse::<u8>().ok()).unwrap_or(0);
    if shaped && (1..=12).contains(&month) && (1..=31).contains(&day) {
        Ok(text.to_string())
    } else {
        Err(format!("expected YYYY-MM-DD, got {text:?}"))
    }
}

/// Accept `H:MM` or `HH:MM`, normalised to `HH:MM`.
fn parse_clock(text: &str) -> Result<String, String> {
    report::clock(text)
        .map(|(hour, minute)| format!("{hour:02}:{minute:02}"))
        .ok_or_else(|| format!("expected HH:MM, got {text:?}"))
}

fn toggled(what: &str, id: &str, done: bool, goal: &Goal) -> String {
    let state = if done { "done" } else { "reopened" };
    format!("{what} {id} {state}; {} is {}% done.", goal.title, goal.progress_percent())
}

/// Run a `goals` subcommand and return its output.
pub async fn goals<A>(api: &A, action: GoalsCommand) -> Result<Vec<String>, CliError>
where
    A: GoalsApi + ?Sized,
{
    let lines = match action {
        GoalsCommand::List { category: None } => report::goals_overview(&api.list_goals().await?),
        GoalsCommand::List { category: Some(category) } => {
            report::goal_rows(&api.goals_by_category(category).await?)
        },
        GoalsCommand::Show { goal_id } => {
            report::goal_details(&api.get_goal(&GoalId::new(goal_id)).await?)
        },
        GoalsCommand::Create { file } => {
            let new: NewGoal = read_json(file, "goal").await?;
            let goal = api.create_goal(&new).await?;
            let mut lines = vec![format!("Created goal {}.", goal.id)];
            lines.extend(report::goal_details(&goal));
            lines
        },
        GoalsCommand::Update { goal_id, file } => {
            let update: GoalUpdate = read_json(file, "goal update").await?;
            report::goal_details(&api.update_goal(&GoalId::new(goal_id), &update).await?)
        },
        GoalsCommand::Toggle { goal_id, milestone, subtask } => {
            let goal_id = GoalId::new(goal_id);
            match (milestone.map(MilestoneId::new), subtask.map(SubtaskId::new)) {
                (None, _) => {
                    let goal = api.toggle_goal(&goal_id).await?;
                    vec![toggled("Goal", goal_id.as_str(), goal.completed, &goal)]
                },
                (Some(milestone), None) => {
                    let goal = api.toggle_milestone(&goal_id, &milestone).await?;
                    let done = goal.milestone(&milestone).is_some_and(|m| m.completed);
                    vec![toggled("Milestone", milestone.as_str(), done, &goal)]
                },
                (Some(milestone), Some(subtask)) => {
                    let goal = api.toggle_subtask(&goal_id, &milestone, &subtask).await?;
                    let done = goal
                        .milestone(&milestone)
                        .and_then(|m| m.subtasks.iter().find(|s| s.id == subtask))
                        .is_some_and(|s| s.completed);
                    vec![toggled("Subtask", subtask.as_str(), done, &goal)]
                },
            }
        },
        GoalsCommand::Delete { goal_id } => {
            let goal_id = GoalId::new(goal_id);
            api.delete_goal(&goal_id).await?;
            vec![format!("Deleted goal {goal_id}.")]
        },
        GoalsCommand::Subtasks { action } => subtasks(api, action).await?,
    };
    Ok(lines)
}

async fn subtasks<A>(api: &A, action: SubtasksCommand) -> Result<Vec<String>, CliError>
where
    A: GoalsApi + ?Sized,
{
    let titles = |titles: Vec<String>| -> Vec<NewSubtask> {
        titles.into_iter().filter(|t| !t.trim().is_empty()).map(NewSubtask::new).collect()
    };
    let goal = match action {
        SubtasksCommand::Add { goal_id, milestone_id, titles: new } => {
            let new = titles(new);
            if new.is_empty() {
                return Err(CliError::Usage("subtask titles must not be blank".into()));
            }
            api.add_subtasks(&GoalId::new(goal_id), &MilestoneId::new(milestone_id), &new).await?
        },
        SubtasksCommand::Set { goal_id, milestone_id, titles: new } => {
            let new = titles(new);
            api.replace_subtasks(&GoalId::new(goal_id), &MilestoneId::new(milestone_id), &new)
                .await?
        },
        SubtasksCommand::Remove { goal_id, milestone_id, subtask_id } => {
            let (goal_id, milestone_id) = (GoalId::new(goal_id), MilestoneId::new(milestone_id));
            api.delete_subtask(&goal_id, &milestone_id, &SubtaskId::new(subtask_id)).await?
        },
    };
    Ok(report::goal_details(&goal))
}

/// Run a `tasks` subcommand and return its output.
pub async fn tasks<A>(api: &A, action: TasksCommand) -> Result<Vec<String>, CliError>
where
    A: DailyTasksApi + ?Sized,
{
    let lines = match action {
        TasksCommand::List { date } => report::task_rows(&api.list_tasks(date.as_deref()).await?),
        TasksCommand::Show { task_id } => {
            report::task_details(&api.get_task(&TaskId::new(task_id)).await?)
        },
        TasksCommand::Create { title, description, priority, from, to, start, end } => {
            if to < from {
                return Err(CliError::Usage(format!("--to {to} is before --from {from}")));
            }
            if title.trim().is_empty() {
                return Err(CliError::Usage("task title must not be blank".into()));
            }
            let new = NewDailyTask {
                title: title.trim().to_string(),
                description: description.filter(|d| !d.trim().is_empty()),
                priority,
                date_started: from,
                date_ended: to,
                daily_start_time: start,
                daily_end_time: end,
            };
            let task = api.create_task(&new).await?;
            let mut lines = vec![format!("Created task {}.", task.id)];
            lines.extend(report::task_details(&task));
            lines
        },
        TasksCommand::Update { task_id, file } => {
            let update: DailyTaskUpdate = read_json(file, "task update").await?;
            report::task_details(&api.update_task(&TaskId::new(task_id), &update).await?)
        },
        TasksCommand::Pause { task_id } => set_active(api, task_id, false).await?,
        TasksCommand::Resume { task_id } => set_active(api, task_id, true).await?,
        TasksCommand::Toggle { task_id, date } => {
            report::task_toggle(&api.toggle_task(&TaskId::new(task_id), date.as_deref()).await?)
        },
        TasksCommand::Delete { task_id } => {
            let task_id = TaskId::new(task_id);
            api.delete_task(&task_id).await?;
            vec![format!("Deleted task {task_id}.")]
        },
        TasksCommand::Streak => report::streak(&api.streak_info().await?),
        TasksCommand::History { from, to } => {
            let range = HistoryRange { start_date: from, end_date: to };
            report::history(&api.completion_history(&range).await?)
        },
    };
    Ok(lines)
}

async fn set_active<A>(api: &A, task_id: String, active: bool) -> Result<Vec<String>, CliError>
where
    A: DailyTasksApi + ?Sized,
{
    let update = DailyTaskUpdate { is_active: Some(active), ..DailyTaskUpdate::default() };
    Ok(report::task_details(&api.update_task(&TaskId::new(task_id), &update).await?))
}
