//! Chat formatting for task listings and the morning briefing.
//!
//! All output is Telegram HTML. User-supplied text (titles) is escaped.

use chrono::NaiveDate;
use taskbridge_models::{SubtaskRecord, TaskCategory, TaskPriority, TaskRecord};

/// Subtasks shown under each task before collapsing the rest.
const MAX_SUBTASKS_SHOWN: usize = 3;

/// Urgent titles listed in the briefing.
const MAX_URGENT_SHOWN: usize = 3;

/// A task together with its open subtasks.
#[derive(Debug, Clone)]
pub struct TaskListing {
    pub task: TaskRecord,
    pub subtasks: Vec<SubtaskRecord>,
}

impl TaskListing {
    pub fn new(task: TaskRecord) -> Self {
        Self {
            task,
            subtasks: Vec::new(),
        }
    }

    pub fn with_subtasks(task: TaskRecord, subtasks: Vec<SubtaskRecord>) -> Self {
        Self { task, subtasks }
    }
}

/// Escape HTML special characters for Telegram HTML mode.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Icon for a task's priority; non-urgent tasks use the category colour.
pub fn priority_icon(priority: &TaskPriority, category: TaskCategory) -> &'static str {
    match (priority, category) {
        (TaskPriority::Urgent, _) => "🔴",
        (TaskPriority::High, _) => "🟠",
        (_, TaskCategory::Deep) => "🟡",
        (_, TaskCategory::Light) => "🟢",
    }
}

fn category_header(category: TaskCategory) -> &'static str {
    match category {
        TaskCategory::Deep => "<b>🔴 DEEP WORK TASKS</b>",
        TaskCategory::Light => "<b>🟢 LIGHT WORK TASKS</b>",
    }
}

/// Render the open tasks of one category.
pub fn format_task_list(category: TaskCategory, listings: &[TaskListing]) -> String {
    let mut text = format!("{}\n\n", category_header(category));

    if listings.is_empty() {
        text.push_str(&format!(
            "No active {} tasks\n",
            category.label().to_lowercase()
        ));
        return text;
    }

    for listing in listings {
        let task = &listing.task;
        text.push_str(&format!(
            "{} <b>{}</b>\n",
            priority_icon(&task.priority, category),
            html_escape(&task.title)
        ));
        text.push_str(&format!(
            "ID: <code>{}...</code> | Priority: {}",
            html_escape(task.id.short()),
            html_escape(task.priority.as_str())
        ));
        if let Some(minutes) = task.estimated_duration {
            text.push_str(&format!(" | Est: {}m", minutes));
        }
        if let Some(blocks) = task.focus_blocks {
            text.push_str(&format!(" | {} blocks", blocks));
        }
        if let Some(ref due) = task.task_date {
            text.push_str(&format!(" | Due: {}", html_escape(due.as_str())));
        }
        text.push('\n');

        if !listing.subtasks.is_empty() {
            text.push_str(&format_subtasks(&listing.subtasks));
        }
        text.push('\n');
    }

    text
}

fn format_subtasks(subtasks: &[SubtaskRecord]) -> String {
    let mut text = format!("📎 {} subtasks:\n", subtasks.len());
    let shown = subtasks.len().min(MAX_SUBTASKS_SHOWN);
    for (idx, sub) in subtasks.iter().take(shown).enumerate() {
        let branch = if idx + 1 == shown { "└" } else { "├" };
        text.push_str(&format!("  {} ○ {}\n", branch, html_escape(&sub.title)));
    }
    if subtasks.len() > MAX_SUBTASKS_SHOWN {
        text.push_str(&format!(
            "  └ ...and {} more\n",
            subtasks.len() - MAX_SUBTASKS_SHOWN
        ));
    }
    text
}

/// Render the morning briefing: urgent deep work, what's due today, totals.
pub fn format_briefing(today: NaiveDate, deep: &[TaskRecord], light: &[TaskRecord]) -> String {
    let today_str = today.format("%Y-%m-%d").to_string();
    let mut text = format!("<b>📋 Tasks - {}</b>\n\n", today_str);

    let urgent: Vec<&TaskRecord> = deep
        .iter()
        .filter(|t| t.priority == TaskPriority::Urgent)
        .collect();
    if !urgent.is_empty() {
        text.push_str(&format!("🔴 <b>URGENT: {} tasks</b>\n", urgent.len()));
        for task in urgent.iter().take(MAX_URGENT_SHOWN) {
            text.push_str(&format!("• {}\n", html_escape(&task.title)));
        }
        text.push('\n');
    }

    let due_today: Vec<&TaskRecord> = deep
        .iter()
        .filter(|t| t.task_date.as_ref().is_some_and(|d| d.as_str() == today_str))
        .collect();
    if !due_today.is_empty() {
        text.push_str("📅 <b>DUE TODAY</b>\n");
        for task in due_today {
            text.push_str(&format!("• {}\n", html_escape(&task.title)));
        }
        text.push('\n');
    }

    text.push_str("📊 <b>Summary</b>\n");
    text.push_str(&format!("• Deep Work: {} active\n", deep.len()));
    text.push_str(&format!("• Light Work: {} active\n", light.len()));
    text.push_str(&format!("• Total: {} tasks\n\n", deep.len() + light.len()));
    text.push_str("<i>Commands: /tasks, /deep, /light, /add</i>");

    text
}
