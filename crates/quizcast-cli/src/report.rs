//! Text output for the one-shot subcommands.

use quizcast_proto::{
    AdminQuizDetails, AdminQuizList, CompletionHistory, DailyTask, Goal, GoalsOverview, Quiz,
    QuizListResponse, QuizStatus, StreakInfo, TaskToggle, User,
};

pub(crate) fn status_name(status: QuizStatus) -> &'static str {
    match status {
        QuizStatus::Draft => "draft",
        QuizStatus::Published => "published",
        QuizStatus::Active => "active",
        QuizStatus::Ended => "ended",
    }
}

fn quiz_row(quiz: &Quiz) -> String {
    let code = quiz.join_code.as_deref().unwrap_or("-");
    format!("{:<24} {:<10} {:<8} {}", quiz.quiz_id.as_str(), status_name(quiz.status), code, quiz.title)
}

/// `quizzes list` output.
pub fn quiz_list(list: &QuizListResponse) -> Vec<String> {
    if list.data.is_empty() {
        return vec!["No quizzes found.".into()];
    }
    let mut lines = vec![format!("{:<24} {:<10} {:<8} {}", "ID", "STATUS", "CODE", "TITLE")];
    lines.extend(list.data.iter().map(quiz_row));
    if let Some(page) = &list.pagination {
        let more = if page.has_next { ", more with --page" } else { "" };
        lines.push(format!("page {} ({} total{more})", page.page, page.total));
    }
    lines
}

/// `quizzes past` output.
pub fn past_quizzes(list: &AdminQuizList) -> Vec<String> {
    if list.items.is_empty() {
        return vec!["No finished quizzes.".into()];
    }
    let mut lines: Vec<String> = list
        .items
        .iter()
        .map(|item| {
            let ended = item.ended_at.as_deref().unwrap_or("-");
            format!("{:<24} {:<26} {}", item.quiz_id.as_str(), ended, item.title)
        })
        .collect();
    lines.push(format!("{} finished", list.total));
    lines
}

/// `quizzes details` output.
pub fn quiz_details(details: &AdminQuizDetails) -> Vec<String> {
    let quiz = &details.quiz;
    let mut lines = vec![
        format!("{} ({})", quiz.title, status_name(quiz.status)),
        format!("{} questions, {} participants", quiz.questions.len(), details.participants.len()),
    ];
    for (number, question) in quiz.questions.iter().enumerate() {
        let correct: Vec<&str> = question
            .options
            .iter()
            .filter(|o| o.is_correct == Some(true))
            .map(|o| o.key.as_str())
            .collect();
        lines.push(format!(
            "  {}. {} [{}s, {} marks, answer {}]",
            number + 1,
            question.text,
            question.time_limit_seconds,
            question.max_marks,
            correct.join("/")
        ));
    }
    if !details.leaderboard.is_empty() {
        lines.push("Leaderboard:".into());
        lines.extend(details.leaderboard.iter().enumerate().map(|(rank, entry)| {
            let score = entry.total_score.map_or_else(|| "-".to_string(), |s| s.to_string());
            format!("  {}. {}  {score}", rank + 1, entry.participant_name)
        }));
    }
    lines
}

/// `whoami` output.
pub fn user(user: Option<&User>) -> String {
    let Some(user) = user else {
        return "Not logged in.".into();
    };
    let name = format!("{} {}", user.first_name, user.last_name);
    match name.trim() {
        "" => format!("{} <{}>", user.username, user.email),
        name => format!("{} <{}> ({name})", user.username, user.email),
    }
}

fn mark(done: bool) -> &'static str {
    if done { "[x]" } else { "[ ]" }
}

/// Calendar day of an ISO-8601 timestamp.
fn day(timestamp: &str) -> &str {
    timestamp.get(..10).unwrap_or(timestamp)
}

/// Split `HH:MM` into hour and minute.
pub(crate) fn clock(time: &str) -> Option<(u32, u32)> {
    let (hour, minute) = time.trim().split_once(':')?;
    if minute.len() != 2 || hour.is_empty() || hour.len() > 2 {
        return None;
    }
    let (hour, minute) = (hour.parse().ok()?, minute.parse().ok()?);
    (hour < 24 && minute < 60).then_some((hour, minute))
}

/// `HH:MM` on a 12-hour clock, e.g. `7:05 PM`. Unparseable input is shown
/// as is.
pub fn format_time(time: &str) -> String {
    let Some((hour, minute)) = clock(time) else {
        return time.to_string();
    };
    let suffix = if hour >= 12 { "PM" } else { "AM" };
    let hour = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{hour}:{minute:02} {suffix}")
}

fn goal_row(goal: &Goal) -> String {
    format!(
        "{} {:<24} {:<9} {:<6} {:>3}%  {} (due {})",
        mark(goal.completed),
        goal.id.as_str(),
        goal.category.as_str(),
        goal.priority.as_str(),
        goal.progress_percent(),
        goal.title,
        day(&goal.target_date)
    )
}

/// `goals list --category` output.
pub fn goal_rows(goals: &[Goal]) -> Vec<String> {
    if goals.is_empty() {
        return vec!["No goals found.".into()];
    }
    goals.iter().map(goal_row).collect()
}

/// `goals list` output.
pub fn goals_overview(overview: &GoalsOverview) -> Vec<String> {
    let mut lines = goal_rows(&overview.goals);
    let stats = &overview.analytics;
    lines.push(format!(
        "{} of {} completed ({:.0}%), streak {} (best {})",
        stats.total_completed,
        stats.total_goals,
        stats.completion_rate,
        stats.current_streak,
        stats.longest_streak
    ));
    lines
}

/// `goals show` output: the goal with its milestones and subtasks.
pub fn goal_details(goal: &Goal) -> Vec<String> {
    let mut lines = vec![
        format!("{} {} ({})", mark(goal.completed), goal.title, goal.id),
        format!(
            "{}, {} priority, due {}, {}% done",
            goal.category,
            goal.priority,
            day(&goal.target_date),
            goal.progress_percent()
        ),
    ];
    if let Some(description) = goal.description.as_deref().filter(|d| !d.is_empty()) {
        lines.push(description.to_string());
    }
    for milestone in &goal.milestones {
        lines.push(format!(
            "  {} {} ({}, due {})",
            mark(milestone.completed),
            milestone.title,
            milestone.id,
            day(&milestone.target_date)
        ));
        lines.extend(
            milestone
                .subtasks
                .iter()
                .map(|s| format!("      {} {} ({})", mark(s.completed), s.title, s.id)),
        );
    }
    lines
}

fn task_row(task: &DailyTask) -> String {
    let paused = if task.is_active { "" } else { " (paused)" };
    format!(
        "{} {:<24} {:>8} - {:<8} {:<6} {}{paused}",
        mark(task.is_completed_today),
        task.id.as_str(),
        format_time(&task.daily_start_time),
        format_time(&task.daily_end_time),
        task.priority.as_str(),
        task.title
    )
}

/// `tasks list` output.
pub fn task_rows(tasks: &[DailyTask]) -> Vec<String> {
    if tasks.is_empty() {
        return vec!["No tasks scheduled.".into()];
    }
    let mut lines: Vec<String> = tasks.iter().map(task_row).collect();
    let done = tasks.iter().filter(|t| t.is_completed_today).count();
    lines.push(format!("{done} of {} done", tasks.len()));
    lines
}

/// `tasks show` output.
pub fn task_details(task: &DailyTask) -> Vec<String> {
    let mut lines = vec![
        task_row(task),
        format!("runs {} to {}", day(&task.date_started), day(&task.date_ended)),
    ];
    if let Some(description) = task.description.as_deref().filter(|d| !d.is_empty()) {
        lines.push(description.to_string());
    }
    if let Some(last) = &task.last_completed_date {
        lines.push(format!("last done {}", day(last)));
    }
    lines
}

/// `tasks toggle` output.
pub fn task_toggle(toggle: &TaskToggle) -> Vec<String> {
    let mut lines = vec![if toggle.is_completed {
        format!("Task {} done.", toggle.task_id)
    } else {
        format!("Task {} reopened.", toggle.task_id)
    }];
    if toggle.all_tasks_completed {
        lines.push("Every task is done for the day.".into());
    }
    lines
}

/// `tasks streak` output.
pub fn streak(info: &StreakInfo) -> Vec<String> {
    vec![
        format!("streak {} days (best {})", info.current_streak, info.longest_streak),
        format!("{} of {} tasks done today", info.completed_today, info.total_active_tasks),
    ]
}

/// `tasks history` output.
pub fn history(history: &CompletionHistory) -> Vec<String> {
    let mut lines: Vec<String> = history
        .stats
        .iter()
        .map(|(date, records)| {
            let tasks: Vec<&str> = records.iter().map(|r| r.task_id.as_str()).collect();
            format!("{date}  {:>2}  {}", records.len(), tasks.join(" "))
        })
        .collect();
    lines.push(format!("{} completions", history.total_completions));
    lines
}
