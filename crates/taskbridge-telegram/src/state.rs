//! Shared state for the Telegram bot.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use futures::future::join_all;
use taskbridge_core::{
    format_briefing, format_task_list, RepositoryError, RepositoryResult, SessionStore, Settings, TaskListing,
    TaskRepository, TaskWizard, WizardOptions,
};
use taskbridge_models::{TaskCategory, TaskId};
use teloxide::types::ChatId;
use tracing::{debug, warn};

/// Tasks shown per category listing.
pub const LIST_LIMIT: usize = 5;

/// Tasks per category considered by the briefing.
pub const BRIEFING_LIMIT: usize = 20;

/// The calendar day the briefing treats as "today".
///
/// Due dates are compared in UTC so the answer doesn't depend on the host's
/// time zone.
pub fn briefing_day(now: DateTime<Utc>) -> NaiveDate {
    now.date_naive()
}

/// State shared by every handler.
pub struct BridgeState {
    settings: Settings,
    repository: Arc<dyn TaskRepository>,
    wizard: TaskWizard,
}

impl BridgeState {
    pub fn new(settings: Settings, repository: Arc<dyn TaskRepository>) -> Self {
        let options = WizardOptions {
            strict_priority: settings.strict_priority,
        };
        let wizard = TaskWizard::with_options(
            Arc::new(SessionStore::new()),
            Arc::clone(&repository),
            options,
        );
        Self {
            settings,
            repository,
            wizard,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn wizard(&self) -> &TaskWizard {
        &self.wizard
    }

    pub fn repository(&self) -> &Arc<dyn TaskRepository> {
        &self.repository
    }

    /// Check if a chat may talk to the bot.
    pub fn is_authorized(&self, chat_id: ChatId) -> bool {
        self.settings.is_chat_allowed(chat_id.0)
    }

    /// Open tasks of a category, each with its open subtasks.
    ///
    /// A failed subtask lookup shows the task without subtasks.
    pub async fn listings(&self, category: TaskCategory) -> RepositoryResult<Vec<TaskListing>> {
        let tasks = self.repository.list_tasks(category, LIST_LIMIT).await?;
        let lookups = tasks.iter().map(|task| self.repository.list_subtasks(category, &task.id));
        let subtasks = join_all(lookups).await;

        Ok(tasks
            .into_iter()
            .zip(subtasks)
            .map(|(task, subs)| match subs {
                Ok(subs) => TaskListing::with_subtasks(task, subs),
                Err(e) => {
                    warn!(task_id = %task.id, error = %e, "Failed to load subtasks");
                    TaskListing::new(task)
                }
            })
            .collect())
    }

    /// Rendered listing for a category.
    pub async fn task_list_text(&self, category: TaskCategory) -> RepositoryResult<String> {
        let listings = self.listings(category).await?;
        debug!(category = %category, count = listings.len(), "Rendering task list");
        Ok(format_task_list(category, &listings))
    }

    /// Rendered morning briefing for `today`.
    pub async fn briefing_text(&self, today: NaiveDate) -> RepositoryResult<String> {
        let (deep, light) = tokio::try_join!(
            self.repository.list_tasks(TaskCategory::Deep, BRIEFING_LIMIT),
            self.repository.list_tasks(TaskCategory::Light, BRIEFING_LIMIT),
        )?;
        Ok(format_briefing(today, &deep, &light))
    }

    /// Mark a task complete, trying deep work first, then light work.
    ///
    /// Returns the category the task was found in. A table that rejects the
    /// ID (e.g. a short ID that is not a valid key) counts as not found there;
    /// the error only surfaces when every table rejected it or the store is
    /// unreachable.
    pub async fn complete(&self, task_id: &TaskId) -> RepositoryResult<Option<TaskCategory>> {
        let mut rejected = None;
        let mut answered = false;
        for category in TaskCategory::ALL {
            match self.repository.complete_task(category, task_id).await {
                Ok(true) => return Ok(Some(category)),
                Ok(false) => answered = true,
                Err(e @ RepositoryError::Status { .. }) => {
                    warn!(
                        category = %category,
                        task_id = %task_id,
                        error = %e,
                        "Store rejected completion"
                    );
                    rejected = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        match rejected {
            Some(e) if !answered => Err(e),
            _ => Ok(None),
        }
    }
}

/// Create shared state wrapped in an Arc.
pub fn create_shared_state(
    settings: Settings,
    repository: Arc<dyn TaskRepository>,
) -> Arc<BridgeState> {
    Arc::new(BridgeState::new(settings, repository))
}
