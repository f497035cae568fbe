//! Chat text for each wizard step.

use taskbridge_models::{NewTask, TaskCategory, TaskDraft, TaskPriority};

use super::types::{Markup, Reply};
use crate::format::html_escape;
use crate::session::{ConversationSession, WizardStep};

pub(crate) const PRIORITY_CHOICES: &str = "URGENT, HIGH, MEDIUM, LOW";

fn category_badge(category: TaskCategory) -> String {
    let icon = match category {
        TaskCategory::Deep => "🔴",
        TaskCategory::Light => "🟢",
    };
    format!("{} {}", icon, category.label())
}

pub(crate) fn start() -> Reply {
    Reply::send("<b>Create New Task</b>\n\nWhat's the task title?")
}

pub(crate) fn ask_category(title: &str) -> Reply {
    Reply::send(format!(
        "Great! \"{}\"\n\nIs this <b>Deep Work</b> (focused, creative) or \
         <b>Light Work</b> (admin, quick tasks)?",
        html_escape(title)
    ))
    .with_markup(Markup::CategoryChoice)
}

/// Priority question, echoing the chosen category.
pub(crate) fn ask_priority_text(draft: &TaskDraft) -> String {
    let category = draft
        .category
        .map(category_badge)
        .unwrap_or_else(|| "unknown".to_string());
    format!(
        "Great! \"{}\"\n\nType: {}\n\nWhat's the priority? ({})",
        html_escape(&draft.title),
        category,
        PRIORITY_CHOICES
    )
}

pub(crate) fn ask_duration(priority: &TaskPriority) -> Reply {
    Reply::send(format!(
        "Priority set to <b>{}</b>\n\nHow long do you think this will take? \
         (in minutes, or type \"skip\")",
        html_escape(priority.as_str())
    ))
}

pub(crate) fn ask_date(estimated_minutes: Option<u32>) -> Reply {
    let estimate = match estimated_minutes {
        Some(m) => format!("Estimated: {}m", m),
        None => "No estimate".to_string(),
    };
    Reply::send(format!(
        "Got it! {}\n\nWhen is this due? (YYYY-MM-DD format, or type \"skip\")",
        estimate
    ))
}

pub(crate) fn created(task: &NewTask) -> Reply {
    let mut text = format!(
        "✅ <b>Task created!</b>\n\n\"{}\"\nPriority: {}\n",
        html_escape(&task.title),
        html_escape(task.priority.as_str())
    );
    if let Some(minutes) = task.estimated_minutes {
        text.push_str(&format!("Duration: {}m\n", minutes));
    }
    if let Some(ref due) = task.due_date {
        text.push_str(&format!("Due: {}\n", html_escape(due.as_str())));
    }
    text.push_str(
        "\nWould you like to add subtasks? (send each subtask as its own message, or \"done\")",
    );
    Reply::send(text)
}

pub(crate) fn creation_failed() -> Reply {
    Reply::send("❌ Failed to create task. Please try again.")
}

pub(crate) fn subtask_added(title: &str) -> Reply {
    Reply::send(format!(
        "✅ Added subtask: \"{}\"\n\nAdd another or type \"done\"",
        html_escape(title)
    ))
}

pub(crate) fn subtask_failed(title: &str) -> Reply {
    Reply::send(format!(
        "❌ Could not add subtask \"{}\". Try again or type \"done\"",
        html_escape(title)
    ))
}

pub(crate) fn completed() -> Reply {
    Reply::send("✅ Task creation complete! Use /tasks to see all your tasks.")
}

pub(crate) fn cancelled() -> Reply {
    Reply::send("Task creation cancelled.")
}

/// Cancel after the task was stored: only the subtask loop ends.
pub(crate) fn subtasks_stopped() -> Reply {
    Reply::send(
        "Stopped adding subtasks. The task itself was already saved;          use /complete to close it or /tasks to see it.",
    )
}

/// Repeat the question for the session's current step.
pub(crate) fn current(session: &ConversationSession) -> Reply {
    let draft = session.draft();
    match session.step() {
        WizardStep::AwaitingTitle => start(),
        WizardStep::AwaitingCategory => ask_category(&draft.title),
        WizardStep::AwaitingPriority => Reply::send(ask_priority_text(draft)),
        WizardStep::AwaitingDuration => {
            let priority = draft.priority.clone().unwrap_or_default();
            ask_duration(&priority)
        }
        WizardStep::AwaitingDate => ask_date(draft.estimated_minutes),
        WizardStep::AwaitingSubtasks => {
            Reply::send("Send a subtask title, or type \"done\" to finish.")
        }
    }
}
