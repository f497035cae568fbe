//! Conversational task creation wizard.
//!
//! Collects a new task's fields over several chat turns, persists it, then
//! attaches subtasks until the user says "done".
//!
//! # Steps
//!
//! 1. **Title** - any non-empty text
//! 2. **Category** - deep or light, typed or picked from the quick-reply
//!    keyboard (the keyboard path edits the previous prompt in place)
//! 3. **Priority** - upper-cased; unknown levels pass through unless strict
//! 4. **Duration** - minutes, or "skip"; unparseable text is dropped
//! 5. **Date** - `YYYY-MM-DD` shape, or "skip"; anything else is dropped.
//!    The task is then written. A failed write ends the session.
//! 6. **Subtasks** - each message becomes a subtask until "done"
//!
//! "cancel" abandons the draft before step 6. Once the task is stored it
//! only ends the subtask loop; the task stays.
//!
//! Inputs that fit no transition re-send the current prompt and leave the
//! session untouched.

mod prompts;
#[cfg(test)]
mod tests;
mod types;

use std::sync::{Arc, OnceLock};

use regex::Regex;
use taskbridge_models::{DueDate, TaskCategory, TaskPriority};
use tracing::{error, info, warn};

pub use self::types::{Delivery, FieldNote, Markup, Outcome, Reply, Transition, WizardInput};

use crate::repository::TaskRepository;
use crate::session::{ConversationId, ConversationSession, SessionStore, WizardStep};

/// Keyword that skips an optional field.
const SKIP: &str = "skip";

/// Keyword that ends the subtask loop.
const DONE: &str = "done";

/// Keyword that abandons the wizard at any step.
const CANCEL: &str = "cancel";

static DATE_PATTERN: OnceLock<Regex> = OnceLock::new();
static LEADING_INT: OnceLock<Regex> = OnceLock::new();

fn date_pattern() -> &'static Regex {
    DATE_PATTERN.get_or_init(|| {
        Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("date pattern is valid")
    })
}

fn leading_int() -> &'static Regex {
    LEADING_INT.get_or_init(|| Regex::new(r"^\s*\+?([0-9]+)").expect("integer pattern is valid"))
}

/// Parse an estimate in minutes from the start of the text.
///
/// Trailing text is ignored (`"45 min"` is 45). Negative or oversized
/// numbers yield `None`.
pub fn parse_minutes(text: &str) -> Option<u32> {
    leading_int()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
}

/// Accept text shaped like `YYYY-MM-DD`. The calendar is not consulted.
pub fn parse_due_date(text: &str) -> Option<DueDate> {
    date_pattern()
        .is_match(text)
        .then(|| DueDate::from_string(text))
}

fn is_keyword(text: &str, keyword: &str) -> bool {
    text.eq_ignore_ascii_case(keyword)
}

/// Behaviour switches for the wizard.
#[derive(Debug, Clone, Copy, Default)]
pub struct WizardOptions {
    /// Re-prompt instead of storing priorities outside the four known levels.
    pub strict_priority: bool,
}

/// Drives wizard sessions against a session store and a task repository.
pub struct TaskWizard {
    sessions: Arc<SessionStore>,
    repository: Arc<dyn TaskRepository>,
    options: WizardOptions,
}

impl TaskWizard {
    pub fn new(sessions: Arc<SessionStore>, repository: Arc<dyn TaskRepository>) -> Self {
        Self::with_options(sessions, repository, WizardOptions::default())
    }

    pub fn with_options(
        sessions: Arc<SessionStore>,
        repository: Arc<dyn TaskRepository>,
        options: WizardOptions,
    ) -> Self {
        Self {
            sessions,
            repository,
            options,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn repository(&self) -> &Arc<dyn TaskRepository> {
        &self.repository
    }

    /// Start a wizard for a conversation, discarding any unfinished one.
    pub async fn start(&self, id: ConversationId) -> Reply {
        let mut guard = self.sessions.lock(id).await;
        if let Some(previous) = guard.remove() {
            info!(conversation = %id, step = ?previous.step(), "Restarting unfinished wizard");
        }
        guard.put(ConversationSession::new(id));
        info!(conversation = %id, "Task wizard started");
        prompts::start()
    }

    /// Whether a conversation is in the middle of the wizard.
    pub async fn is_active(&self, id: ConversationId) -> bool {
        self.sessions.contains(id).await
    }

    /// Abandon a conversation's wizard. Returns `None` if none was running.
    pub async fn cancel(&self, id: ConversationId) -> Option<Reply> {
        let removed = self.sessions.remove(id).await?;
        info!(conversation = %id, step = ?removed.step(), "Task wizard cancelled");
        Some(cancel_reply(removed.step()))
    }

    /// Feed one input to a conversation's wizard.
    ///
    /// Returns `None` when the conversation has no wizard running, so the
    /// caller can route the message elsewhere. The conversation stays locked
    /// for the whole transition, including repository calls.
    pub async fn handle(&self, id: ConversationId, input: WizardInput) -> Option<Transition> {
        let mut guard = self.sessions.lock(id).await;
        let session = guard.get_mut()?;

        let transition = self.apply(session, input).await;

        for note in &transition.notes {
            warn!(conversation = %id, note = ?note, "Lenient field handling");
        }
        if transition.outcome.ends_session() {
            guard.remove();
            info!(conversation = %id, outcome = ?transition.outcome, "Task wizard finished");
        }

        Some(transition)
    }

    async fn apply(&self, session: &mut ConversationSession, input: WizardInput) -> Transition {
        let text = match input {
            WizardInput::CategorySelected(category) => {
                return self.select_category(session, category, Delivery::EditPrevious);
            }
            WizardInput::Text(text) => text.trim().to_string(),
        };

        if is_keyword(&text, CANCEL) {
            let outcome = match session.step() {
                WizardStep::AwaitingSubtasks => Outcome::Completed,
                _ => Outcome::Cancelled,
            };
            return Transition::new(outcome, cancel_reply(session.step()));
        }

        match session.step() {
            WizardStep::AwaitingTitle => self.take_title(session, text),
            WizardStep::AwaitingCategory => match TaskCategory::from_text(&text) {
                Some(category) => self.select_category(session, category, Delivery::Send),
                None => reprompt(session),
            },
            WizardStep::AwaitingPriority => self.take_priority(session, &text),
            WizardStep::AwaitingDuration => self.take_duration(session, text),
            WizardStep::AwaitingDate => self.take_date_and_persist(session, text).await,
            WizardStep::AwaitingSubtasks => self.take_subtask(session, text).await,
        }
    }

    fn take_title(&self, session: &mut ConversationSession, title: String) -> Transition {
        if title.is_empty() {
            return reprompt(session);
        }
        session.draft.title = title;
        let step = session.advance();
        Transition::new(Outcome::Advanced(step), prompts::ask_category(&session.draft.title))
    }

    fn select_category(
        &self,
        session: &mut ConversationSession,
        category: TaskCategory,
        delivery: Delivery,
    ) -> Transition {
        if session.step() != WizardStep::AwaitingCategory {
            // Stale keyboard press from an earlier prompt.
            return reprompt(session);
        }
        session.draft.category = Some(category);
        let step = session.advance();
        let text = prompts::ask_priority_text(&session.draft);
        let reply = match delivery {
            Delivery::EditPrevious => Reply::edit(text),
            Delivery::Send => Reply::send(text),
        };
        Transition::new(Outcome::Advanced(step), reply)
    }

    fn take_priority(&self, session: &mut ConversationSession, text: &str) -> Transition {
        if text.is_empty() {
            return reprompt(session);
        }
        let priority = TaskPriority::from_text(text);
        let note = if priority.is_recognized() {
            None
        } else if self.options.strict_priority {
            return reprompt(session);
        } else {
            Some(FieldNote::UnrecognizedPriority {
                value: priority.as_str().to_string(),
            })
        };

        let reply = prompts::ask_duration(&priority);
        session.draft.priority = Some(priority);
        let step = session.advance();
        Transition::new(Outcome::Advanced(step), reply).with_note(note)
    }

    fn take_duration(&self, session: &mut ConversationSession, text: String) -> Transition {
        let mut note = None;
        if !is_keyword(&text, SKIP) {
            match parse_minutes(&text) {
                Some(minutes) => session.draft.estimated_minutes = Some(minutes),
                None => note = Some(FieldNote::DurationDropped { raw: text }),
            }
        }
        let step = session.advance();
        Transition::new(
            Outcome::Advanced(step),
            prompts::ask_date(session.draft.estimated_minutes),
        )
        .with_note(note)
    }

    async fn take_date_and_persist(
        &self,
        session: &mut ConversationSession,
        text: String,
    ) -> Transition {
        let mut note = None;
        if !is_keyword(&text, SKIP) {
            match parse_due_date(&text) {
                Some(date) => session.draft.due_date = Some(date),
                None => note = Some(FieldNote::DueDateDropped { raw: text }),
            }
        }

        let Some(task) = session.draft.finalize() else {
            error!(conversation = %session.conversation_id(), "Draft incomplete at persistence step");
            return Transition::new(Outcome::Aborted, prompts::creation_failed()).with_note(note);
        };

        match self.repository.create_task(&task).await {
            Ok(task_id) => {
                info!(
                    conversation = %session.conversation_id(),
                    task_id = %task_id,
                    category = %task.category,
                    "Task created"
                );
                session.mark_created(task_id);
                Transition::new(
                    Outcome::Advanced(WizardStep::AwaitingSubtasks),
                    prompts::created(&task),
                )
                .with_note(note)
            }
            Err(e) => {
                error!(conversation = %session.conversation_id(), error = %e, "Task creation failed");
                Transition::new(Outcome::Aborted, prompts::creation_failed()).with_note(note)
            }
        }
    }

    async fn take_subtask(&self, session: &mut ConversationSession, title: String) -> Transition {
        if is_keyword(&title, DONE) {
            return Transition::new(Outcome::Completed, prompts::completed());
        }
        if title.is_empty() {
            return reprompt(session);
        }

        let (Some(task_id), Some(category)) =
            (session.created_task_id().cloned(), session.draft.category)
        else {
            error!(conversation = %session.conversation_id(), "Subtask step without a created task");
            return Transition::new(Outcome::Aborted, prompts::creation_failed());
        };

        match self.repository.create_subtask(category, &task_id, &title).await {
            Ok(()) => {
                info!(conversation = %session.conversation_id(), task_id = %task_id, "Subtask added");
                let reply = prompts::subtask_added(&title);
                session.draft.subtask_titles.push(title);
                Transition::new(Outcome::SubtaskAdded, reply)
            }
            Err(e) => {
                warn!(conversation = %session.conversation_id(), error = %e, "Subtask creation failed");
                Transition::new(Outcome::SubtaskFailed, prompts::subtask_failed(&title))
            }
        }
    }
}

fn cancel_reply(step: WizardStep) -> Reply {
    match step {
        WizardStep::AwaitingSubtasks => prompts::subtasks_stopped(),
        _ => prompts::cancelled(),
    }
}

fn reprompt(session: &ConversationSession) -> Transition {
    Transition::new(Outcome::Reprompted, prompts::current(session))
}
