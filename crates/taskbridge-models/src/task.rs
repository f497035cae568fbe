//! Task types for Task Bridge.
//!
//! Tasks live in a remote store and come in two categories (deep and light
//! work). A [`TaskDraft`] is filled in turn by turn while a user answers the
//! creation wizard, then finalized into a [`NewTask`] for insertion.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::ids::{SubtaskId, TaskId};

/// Category of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskCategory {
    /// Focused, creative work.
    Deep,
    /// Admin and quick tasks.
    Light,
}

impl TaskCategory {
    /// All categories, in display order.
    pub const ALL: [TaskCategory; 2] = [TaskCategory::Deep, TaskCategory::Light];

    /// Returns the lowercase identifier (`deep` or `light`).
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskCategory::Deep => "deep",
            TaskCategory::Light => "light",
        }
    }

    /// Returns the human label shown in chat.
    pub fn label(&self) -> &'static str {
        match self {
            TaskCategory::Deep => "Deep Work",
            TaskCategory::Light => "Light Work",
        }
    }

    /// Parses a category from free text.
    ///
    /// Accepts `deep`, `light`, `deep work` and `light work` in any case.
    pub fn from_text(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "deep" | "deep work" => Some(TaskCategory::Deep),
            "light" | "light work" => Some(TaskCategory::Light),
            _ => None,
        }
    }
}

impl fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority of a task, stored upper-cased in the remote store.
///
/// The store has historically accepted any text here, so values outside the
/// four known levels are kept as [`TaskPriority::Unrecognized`] instead of
/// being rejected at deserialization time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum TaskPriority {
    Urgent,
    High,
    #[default]
    Medium,
    Low,
    /// Any other upper-cased text.
    Unrecognized(String),
}

impl TaskPriority {
    /// The four known levels, most urgent first.
    pub const KNOWN: [TaskPriority; 4] = [
        TaskPriority::Urgent,
        TaskPriority::High,
        TaskPriority::Medium,
        TaskPriority::Low,
    ];

    /// Normalizes user text into a priority. Never fails.
    pub fn from_text(text: &str) -> Self {
        let upper = text.trim().to_uppercase();
        match upper.as_str() {
            "URGENT" => TaskPriority::Urgent,
            "HIGH" => TaskPriority::High,
            "MEDIUM" => TaskPriority::Medium,
            "LOW" => TaskPriority::Low,
            _ => TaskPriority::Unrecognized(upper),
        }
    }

    /// Returns the upper-case form written to the store.
    pub fn as_str(&self) -> &str {
        match self {
            TaskPriority::Urgent => "URGENT",
            TaskPriority::High => "HIGH",
            TaskPriority::Medium => "MEDIUM",
            TaskPriority::Low => "LOW",
            TaskPriority::Unrecognized(s) => s,
        }
    }

    /// Whether this is one of the four known levels.
    pub fn is_recognized(&self) -> bool {
        !matches!(self, TaskPriority::Unrecognized(_))
    }
}

impl From<String> for TaskPriority {
    fn from(s: String) -> Self {
        TaskPriority::from_text(&s)
    }
}

impl From<TaskPriority> for String {
    fn from(p: TaskPriority) -> Self {
        p.as_str().to_string()
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A due date in `YYYY-MM-DD` shape.
///
/// Only the shape is guaranteed by callers; the value is not checked against
/// the calendar and is passed to the store as written.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DueDate(String);

impl DueDate {
    /// Wraps an already shape-checked date string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Returns the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DueDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A task being assembled over several chat turns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskDraft {
    pub title: String,
    pub category: Option<TaskCategory>,
    pub priority: Option<TaskPriority>,
    pub estimated_minutes: Option<u32>,
    pub due_date: Option<DueDate>,
    /// Subtasks attached so far, in the order they were added.
    pub subtask_titles: Vec<String>,
}

impl TaskDraft {
    /// Creates an empty draft.
    pub fn new() -> Self {
        Self::default()
    }

    /// Turns the draft into an insertable task.
    ///
    /// Returns `None` while the title, category or priority is still missing.
    pub fn finalize(&self) -> Option<NewTask> {
        if self.title.is_empty() {
            return None;
        }
        Some(NewTask {
            title: self.title.clone(),
            category: self.category?,
            priority: self.priority.clone()?,
            estimated_minutes: self.estimated_minutes,
            due_date: self.due_date.clone(),
        })
    }
}

/// A complete task ready to be written to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub category: TaskCategory,
    pub priority: TaskPriority,
    pub estimated_minutes: Option<u32>,
    pub due_date: Option<DueDate>,
}

/// Reads an explicit `null` column as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A task row read back from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub priority: TaskPriority,
    /// Estimated duration in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus_blocks: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_date: Option<DueDate>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub completed: bool,
}

/// A subtask row read back from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtaskRecord {
    pub id: SubtaskId,
    pub task_id: TaskId,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub completed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_text() {
        assert_eq!(TaskCategory::from_text("Deep"), Some(TaskCategory::Deep));
        assert_eq!(TaskCategory::from_text(" light work "), Some(TaskCategory::Light));
        assert_eq!(TaskCategory::from_text("medium"), None);
    }

    #[test]
    fn test_priority_normalizes_case() {
        assert_eq!(TaskPriority::from_text("urgent"), TaskPriority::Urgent);
        assert_eq!(TaskPriority::from_text("High"), TaskPriority::High);
        assert_eq!(TaskPriority::from_text("urgent").as_str(), "URGENT");
    }

    #[test]
    fn test_priority_keeps_unknown_text() {
        let p = TaskPriority::from_text("whenever");
        assert_eq!(p, TaskPriority::Unrecognized("WHENEVER".to_string()));
        assert!(!p.is_recognized());
        assert_eq!(p.as_str(), "WHENEVER");
    }

    #[test]
    fn test_priority_serde_uses_uppercase_string() {
        let json = serde_json::to_string(&TaskPriority::Low).unwrap();
        assert_eq!(json, "\"LOW\"");
        let p: TaskPriority = serde_json::from_str("\"someday\"").unwrap();
        assert_eq!(p.as_str(), "SOMEDAY");
    }

    #[test]
    fn test_finalize_requires_category_and_priority() {
        let mut draft = TaskDraft::new();
        draft.title = "Write report".to_string();
        assert!(draft.finalize().is_none());

        draft.category = Some(TaskCategory::Deep);
        assert!(draft.finalize().is_none());

        draft.priority = Some(TaskPriority::Urgent);
        draft.estimated_minutes = Some(45);
        let task = draft.finalize().unwrap();
        assert_eq!(task.title, "Write report");
        assert_eq!(task.category, TaskCategory::Deep);
        assert_eq!(task.priority, TaskPriority::Urgent);
        assert_eq!(task.estimated_minutes, Some(45));
        assert!(task.due_date.is_none());
    }

    #[test]
    fn test_task_record_tolerates_missing_optionals() {
        let json = r#"{"id":"abc","title":"Inbox zero","priority":"HIGH"}"#;
        let record: TaskRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.priority, TaskPriority::High);
        assert!(record.estimated_duration.is_none());
        assert!(!record.completed);
    }

    #[test]
    fn test_task_record_reads_null_columns() {
        let json = r#"[{"id":"a","title":"Plan","priority":null,"estimated_duration":null,
            "focus_blocks":null,"task_date":null,"completed":null}]"#;
        let rows: Vec<TaskRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(rows[0].priority, TaskPriority::Medium);
        assert!(rows[0].task_date.is_none());
        assert!(!rows[0].completed);
    }

    #[test]
    fn test_records_accept_integer_keys() {
        let json = r#"{"id":17,"title":"Plan","priority":"HIGH","completed":false}"#;
        let task: TaskRecord = serde_json::from_str(json).unwrap();
        assert_eq!(task.id.as_str(), "17");

        let json = r#"{"id":3,"task_id":17,"title":"Outline","completed":null}"#;
        let sub: SubtaskRecord = serde_json::from_str(json).unwrap();
        assert_eq!(sub.task_id, task.id);
        assert!(!sub.completed);
    }
}
