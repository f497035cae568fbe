//! Type definitions for the task creation wizard.

use taskbridge_models::TaskCategory;

use crate::session::WizardStep;

/// One inbound event for a conversation running the wizard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardInput {
    /// Free text typed by the user.
    Text(String),
    /// A category picked from the quick-reply keyboard.
    CategorySelected(TaskCategory),
}

impl WizardInput {
    pub fn text(s: impl Into<String>) -> Self {
        WizardInput::Text(s.into())
    }
}

/// How a reply should reach the chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Send a new message.
    Send,
    /// Replace the text of the message the quick-reply came from.
    EditPrevious,
}

/// Interactive element attached to a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Markup {
    None,
    /// Deep/Light buttons for the category step.
    CategoryChoice,
}

/// An outbound message produced by a wizard transition. Text is Telegram HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub markup: Markup,
    pub delivery: Delivery,
}

impl Reply {
    /// A plain new message.
    pub fn send(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            markup: Markup::None,
            delivery: Delivery::Send,
        }
    }

    /// An in-place edit of the previous prompt.
    pub fn edit(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            markup: Markup::None,
            delivery: Delivery::EditPrevious,
        }
    }

    pub fn with_markup(mut self, markup: Markup) -> Self {
        self.markup = markup;
        self
    }
}

/// What a transition did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Moved forward to the given step.
    Advanced(WizardStep),
    /// Input did not fit the current step; the prompt was repeated.
    Reprompted,
    /// A subtask was attached; still collecting subtasks.
    SubtaskAdded,
    /// Attaching a subtask failed; still collecting subtasks.
    SubtaskFailed,
    /// User said "done". Session removed.
    Completed,
    /// The task could not be persisted. Session removed.
    Aborted,
    /// User cancelled. Session removed.
    Cancelled,
}

impl Outcome {
    /// Whether the session is removed after this transition.
    pub fn ends_session(&self) -> bool {
        matches!(self, Outcome::Completed | Outcome::Aborted | Outcome::Cancelled)
    }
}

/// A lenient-parsing branch taken while filling the draft.
///
/// None of these are shown to the user; they are logged and reported so the
/// permissive behaviour stays observable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldNote {
    /// Duration text was neither "skip" nor an integer; left unset.
    DurationDropped { raw: String },
    /// Date text was neither "skip" nor `YYYY-MM-DD` shaped; left unset.
    DueDateDropped { raw: String },
    /// Priority outside URGENT/HIGH/MEDIUM/LOW, stored anyway.
    UnrecognizedPriority { value: String },
}

/// The result of feeding one input to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub reply: Reply,
    pub outcome: Outcome,
    pub notes: Vec<FieldNote>,
}

impl Transition {
    pub fn new(outcome: Outcome, reply: Reply) -> Self {
        Self {
            reply,
            outcome,
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: Option<FieldNote>) -> Self {
        self.notes.extend(note);
        self
    }
}
