//! Conversation sessions and the store that holds them.
//!
//! A [`ConversationSession`] tracks one chat's progress through the task
//! creation wizard. The [`SessionStore`] keeps at most one session per
//! conversation and hands out a [`SessionGuard`] per conversation: every
//! read-modify-write of a session happens while that guard is held, so two
//! messages from the same chat can never interleave their transitions, even
//! when a repository call suspends in between.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use taskbridge_models::{TaskDraft, TaskId};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

/// Opaque identifier of the chat a wizard runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConversationId(i64);

impl ConversationId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw chat ID.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl From<i64> for ConversationId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Steps of the task creation wizard, in the order they are visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WizardStep {
    AwaitingTitle,
    AwaitingCategory,
    AwaitingPriority,
    AwaitingDuration,
    AwaitingDate,
    /// Terminal loop: collects subtasks until the user says "done".
    AwaitingSubtasks,
}

impl WizardStep {
    /// The step after this one, or `None` for the subtask loop.
    pub fn next(self) -> Option<Self> {
        match self {
            WizardStep::AwaitingTitle => Some(WizardStep::AwaitingCategory),
            WizardStep::AwaitingCategory => Some(WizardStep::AwaitingPriority),
            WizardStep::AwaitingPriority => Some(WizardStep::AwaitingDuration),
            WizardStep::AwaitingDuration => Some(WizardStep::AwaitingDate),
            WizardStep::AwaitingDate => Some(WizardStep::AwaitingSubtasks),
            WizardStep::AwaitingSubtasks => None,
        }
    }
}

/// One chat's in-progress task creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSession {
    conversation_id: ConversationId,
    step: WizardStep,
    pub(crate) draft: TaskDraft,
    created_task_id: Option<TaskId>,
}

impl ConversationSession {
    /// Creates a session at the first step with an empty draft.
    pub fn new(conversation_id: ConversationId) -> Self {
        Self {
            conversation_id,
            step: WizardStep::AwaitingTitle,
            draft: TaskDraft::new(),
            created_task_id: None,
        }
    }

    pub fn conversation_id(&self) -> ConversationId {
        self.conversation_id
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn draft(&self) -> &TaskDraft {
        &self.draft
    }

    /// ID of the persisted task, once the draft has been written.
    pub fn created_task_id(&self) -> Option<&TaskId> {
        self.created_task_id.as_ref()
    }

    /// Moves to the next step. The subtask loop never advances.
    pub(crate) fn advance(&mut self) -> WizardStep {
        if let Some(next) = self.step.next() {
            debug!(conversation = %self.conversation_id, from = ?self.step, to = ?next, "Wizard step advanced");
            self.step = next;
        }
        self.step
    }

    /// Records the persisted task ID and enters the subtask loop.
    ///
    /// The ID is set at most once per session.
    pub(crate) fn mark_created(&mut self, task_id: TaskId) {
        debug_assert!(self.created_task_id.is_none(), "task ID already recorded");
        if self.created_task_id.is_none() {
            self.created_task_id = Some(task_id);
        }
        self.step = WizardStep::AwaitingSubtasks;
    }
}

type Slot = Arc<Mutex<Option<ConversationSession>>>;

/// Store of in-flight wizard sessions, keyed by conversation.
///
/// Created once at startup and shared by `Arc`; dropping it discards every
/// in-flight session. Nothing is persisted across restarts.
#[derive(Default)]
pub struct SessionStore {
    slots: Mutex<HashMap<ConversationId, Slot>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire exclusive access to one conversation's session slot.
    ///
    /// Waits while another handler holds the same conversation. Different
    /// conversations never block each other beyond the brief map lookup.
    pub async fn lock(&self, id: ConversationId) -> SessionGuard {
        let slot = {
            let mut slots = self.slots.lock().await;
            prune_idle(&mut slots);
            Arc::clone(slots.entry(id).or_default())
        };
        SessionGuard {
            id,
            guard: slot.lock_owned().await,
        }
    }

    /// Snapshot of a conversation's session.
    pub async fn get(&self, id: ConversationId) -> Option<ConversationSession> {
        self.lock(id).await.get().cloned()
    }

    /// Insert or replace the session for its conversation.
    pub async fn put(&self, session: ConversationSession) {
        self.lock(session.conversation_id()).await.put(session);
    }

    /// Remove a conversation's session, returning it if there was one.
    pub async fn remove(&self, id: ConversationId) -> Option<ConversationSession> {
        self.lock(id).await.remove()
    }

    /// Whether a conversation has a session in progress.
    pub async fn contains(&self, id: ConversationId) -> bool {
        self.lock(id).await.is_active()
    }

    /// Number of sessions in progress.
    pub async fn len(&self) -> usize {
        let slots: Vec<Slot> = self.slots.lock().await.values().cloned().collect();
        let mut count = 0;
        for slot in slots {
            if slot.lock().await.is_some() {
                count += 1;
            }
        }
        count
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Drop slots nobody holds or waits on and that carry no session.
fn prune_idle(slots: &mut HashMap<ConversationId, Slot>) {
    slots.retain(|_, slot| {
        if Arc::strong_count(slot) > 1 {
            return true;
        }
        match slot.try_lock() {
            Ok(session) => session.is_some(),
            Err(_) => true,
        }
    });
}

/// Exclusive handle on one conversation's session slot.
pub struct SessionGuard {
    id: ConversationId,
    guard: OwnedMutexGuard<Option<ConversationSession>>,
}

impl SessionGuard {
    pub fn id(&self) -> ConversationId {
        self.id
    }

    pub fn get(&self) -> Option<&ConversationSession> {
        self.guard.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut ConversationSession> {
        self.guard.as_mut()
    }

    pub fn is_active(&self) -> bool {
        self.guard.is_some()
    }

    /// Insert or replace the session in this slot.
    pub fn put(&mut self, session: ConversationSession) {
        debug_assert_eq!(session.conversation_id(), self.id);
        *self.guard = Some(session);
    }

    /// Take the session out of the slot.
    pub fn remove(&mut self) -> Option<ConversationSession> {
        let removed = self.guard.take();
        if removed.is_some() {
            debug!(conversation = %self.id, "Session removed");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_step_order() {
        let mut step = WizardStep::AwaitingTitle;
        let mut visited = vec![step];
        while let Some(next) = step.next() {
            assert!(next > step);
            visited.push(next);
            step = next;
        }
        assert_eq!(visited.len(), 6);
        assert_eq!(step, WizardStep::AwaitingSubtasks);
    }

    #[test]
    fn test_advance_stops_at_subtasks() {
        let mut session = ConversationSession::new(ConversationId::new(1));
        for _ in 0..10 {
            session.advance();
        }
        assert_eq!(session.step(), WizardStep::AwaitingSubtasks);
    }

    #[test]
    fn test_mark_created_enters_subtask_loop() {
        let mut session = ConversationSession::new(ConversationId::new(1));
        assert!(session.created_task_id().is_none());
        session.mark_created(TaskId::from("t-1"));
        assert_eq!(session.created_task_id().map(|t| t.as_str()), Some("t-1"));
        assert_eq!(session.step(), WizardStep::AwaitingSubtasks);
    }

    #[tokio::test]
    async fn test_put_get_remove() {
        let store = SessionStore::new();
        let id = ConversationId::new(7);
        assert!(store.get(id).await.is_none());

        store.put(ConversationSession::new(id)).await;
        assert!(store.contains(id).await);
        assert_eq!(store.len().await, 1);

        let removed = store.remove(id).await;
        assert!(removed.is_some());
        assert!(store.remove(id).await.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_put_replaces_existing_session() {
        let store = SessionStore::new();
        let id = ConversationId::new(7);

        let mut first = ConversationSession::new(id);
        first.advance();
        store.put(first).await;
        store.put(ConversationSession::new(id)).await;

        assert_eq!(store.len().await, 1);
        assert_eq!(store.get(id).await.unwrap().step(), WizardStep::AwaitingTitle);
    }

    #[tokio::test]
    async fn test_idle_slots_are_pruned() {
        let store = SessionStore::new();
        for i in 0..5 {
            let _ = store.get(ConversationId::new(i)).await;
        }
        store.put(ConversationSession::new(ConversationId::new(99))).await;
        let _ = store.get(ConversationId::new(100)).await;

        let slots = store.slots.lock().await;
        assert!(slots.contains_key(&ConversationId::new(99)));
        assert!(slots.len() <= 2);
    }

    #[tokio::test]
    async fn test_same_conversation_is_serialized() {
        let store = Arc::new(SessionStore::new());
        let id = ConversationId::new(1);

        let mut guard = store.lock(id).await;
        guard.put(ConversationSession::new(id));

        let waiter = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                let guard = store.lock(id).await;
                guard.get().map(|s| s.step())
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        guard.get_mut().unwrap().advance();
        drop(guard);

        let seen = waiter.await.unwrap();
        assert_eq!(seen, Some(WizardStep::AwaitingCategory));
    }

    #[tokio::test]
    async fn test_other_conversations_do_not_block() {
        let store = SessionStore::new();
        let _held = store.lock(ConversationId::new(1)).await;

        let other = tokio::time::timeout(
            Duration::from_millis(200),
            store.lock(ConversationId::new(2)),
        )
        .await;
        assert!(other.is_ok());
    }
}
