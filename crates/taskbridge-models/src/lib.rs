//! Core data models for Task Bridge.
//!
//! This crate provides the task types shared by the wizard, the remote task
//! store client and the Telegram bot: categories, priorities, drafts being
//! collected in chat, and the records read back from the store.

pub mod ids;
pub mod task;

// Re-export main types
pub use ids::{SubtaskId, TaskId};
pub use task::{
    DueDate, NewTask, SubtaskRecord, TaskCategory, TaskDraft, TaskPriority, TaskRecord,
};
