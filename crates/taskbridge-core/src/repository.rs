//! TaskRepository trait for remote task store backends.
//!
//! The creation wizard only needs [`TaskRepository::create_task`] and
//! [`TaskRepository::create_subtask`]. The read and update methods back the
//! bot's listing, briefing and completion commands.

use async_trait::async_trait;

use taskbridge_models::{NewTask, SubtaskRecord, TaskCategory, TaskId, TaskRecord};

use crate::error::RepositoryResult;

/// Trait for task store backends.
///
/// Implementations own authentication and transport details; callers only
/// see categories, IDs and records. All operations are async so that both
/// remote and in-memory backends fit.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Insert a task and return the ID the store assigned.
    async fn create_task(&self, task: &NewTask) -> RepositoryResult<TaskId>;

    /// Attach a subtask to an existing task.
    async fn create_subtask(
        &self,
        category: TaskCategory,
        task_id: &TaskId,
        title: &str,
    ) -> RepositoryResult<()>;

    /// List incomplete tasks of a category, most urgent first.
    async fn list_tasks(
        &self,
        category: TaskCategory,
        limit: usize,
    ) -> RepositoryResult<Vec<TaskRecord>>;

    /// List incomplete subtasks of a task.
    async fn list_subtasks(
        &self,
        category: TaskCategory,
        task_id: &TaskId,
    ) -> RepositoryResult<Vec<SubtaskRecord>>;

    /// Mark a task complete.
    ///
    /// Returns `Ok(false)` when the store accepted the request but nothing
    /// matched.
    async fn complete_task(&self, category: TaskCategory, task_id: &TaskId)
        -> RepositoryResult<bool>;
}
