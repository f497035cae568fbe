//! Task store backends for Task Bridge.
//!
//! The hosted store is a Supabase project: four PostgREST tables, one task
//! table and one subtask table per category.
//!
//! # Example
//!
//! ```no_run
//! use taskbridge_core::{Settings, TaskRepository};
//! use taskbridge_models::TaskCategory;
//! use taskbridge_store::SupabaseRepository;
//!
//! # async fn run() -> taskbridge_store::Result<()> {
//! let settings = Settings::from_env().expect("settings");
//! let store = SupabaseRepository::from_settings(&settings)?;
//! let open = store.list_tasks(TaskCategory::Deep, 10).await?;
//! # Ok(())
//! # }
//! ```

pub mod postgrest;

pub use postgrest::SupabaseRepository;
pub use taskbridge_core::RepositoryError;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;
