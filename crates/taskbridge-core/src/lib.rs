//! Task Bridge Core - business logic shared by every Task Bridge front end.
//!
//! - **config**: Settings, config paths and env-file loading
//! - **error**: Repository and configuration errors
//! - **format**: HTML rendering of task lists and the morning briefing
//! - **intent**: Keyword routing for free-text messages
//! - **repository**: The [`TaskRepository`] seam to the remote task store
//! - **session**: Per-conversation wizard sessions and their store
//! - **wizard**: The multi-step task creation flow

pub mod config;
pub mod error;
pub mod format;
pub mod intent;
pub mod repository;
pub mod session;
pub mod wizard;

pub use config::{config_dir, ensure_config_dir, env_file, load_env_files, state_dir, Settings};
pub use error::{ConfigError, ConfigResult, RepositoryError, RepositoryResult};
pub use format::{format_briefing, format_task_list, html_escape, TaskListing};
pub use intent::{classify, Intent, HELP_HINT};
pub use repository::TaskRepository;
pub use session::{ConversationId, ConversationSession, SessionGuard, SessionStore, WizardStep};
pub use wizard::{
    Delivery, FieldNote, Markup, Outcome, Reply, TaskWizard, Transition, WizardInput,
    WizardOptions,
};
