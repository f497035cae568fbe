use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use async_trait::async_trait;
use taskbridge_models::{NewTask, SubtaskRecord, TaskCategory, TaskId, TaskPriority, TaskRecord};

use super::*;
use crate::error::{RepositoryError, RepositoryResult};

/// Mock repository that records every write.
#[derive(Default)]
struct MockRepository {
    tasks: StdMutex<Vec<NewTask>>,
    subtasks: StdMutex<Vec<(TaskCategory, TaskId, String)>>,
    fail_tasks: AtomicBool,
    fail_subtasks: AtomicBool,
    delay: Option<Duration>,
}

impl MockRepository {
    fn new() -> Self {
        Self::default()
    }

    fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    fn tasks(&self) -> Vec<NewTask> {
        self.tasks.lock().unwrap().clone()
    }

    fn subtasks(&self) -> Vec<(TaskCategory, TaskId, String)> {
        self.subtasks.lock().unwrap().clone()
    }
}

#[async_trait]
impl TaskRepository for MockRepository {
    async fn create_task(&self, task: &NewTask) -> RepositoryResult<TaskId> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_tasks.load(Ordering::SeqCst) {
            return Err(RepositoryError::Status {
                status: 500,
                body: "boom".to_string(),
            });
        }
        let mut tasks = self.tasks.lock().unwrap();
        tasks.push(task.clone());
        Ok(TaskId::from_string(format!("task-{}", tasks.len())))
    }

    async fn create_subtask(
        &self,
        category: TaskCategory,
        task_id: &TaskId,
        title: &str,
    ) -> RepositoryResult<()> {
        if self.fail_subtasks.load(Ordering::SeqCst) {
            return Err(RepositoryError::Http("connection reset".to_string()));
        }
        self.subtasks
            .lock()
            .unwrap()
            .push((category, task_id.clone(), title.to_string()));
        Ok(())
    }

    async fn list_tasks(
        &self,
        _category: TaskCategory,
        _limit: usize,
    ) -> RepositoryResult<Vec<TaskRecord>> {
        Ok(Vec::new())
    }

    async fn list_subtasks(
        &self,
        _category: TaskCategory,
        _task_id: &TaskId,
    ) -> RepositoryResult<Vec<SubtaskRecord>> {
        Ok(Vec::new())
    }

    async fn complete_task(
        &self,
        _category: TaskCategory,
        _task_id: &TaskId,
    ) -> RepositoryResult<bool> {
        Ok(false)
    }
}

fn setup() -> (TaskWizard, Arc<MockRepository>) {
    setup_with(MockRepository::new(), WizardOptions::default())
}

fn setup_with(repo: MockRepository, options: WizardOptions) -> (TaskWizard, Arc<MockRepository>) {
    let repo = Arc::new(repo);
    let wizard = TaskWizard::with_options(
        Arc::new(SessionStore::new()),
        Arc::clone(&repo) as Arc<dyn TaskRepository>,
        options,
    );
    (wizard, repo)
}

const CHAT: ConversationId = ConversationId::new(42);

async fn send(wizard: &TaskWizard, text: &str) -> Transition {
    wizard
        .handle(CHAT, WizardInput::text(text))
        .await
        .expect("session should be active")
}

async fn step_of(wizard: &TaskWizard) -> Option<WizardStep> {
    wizard.sessions().get(CHAT).await.map(|s| s.step())
}

/// Walk a fresh session up to the date step.
async fn fill_to_date(wizard: &TaskWizard, title: &str, category: &str, priority: &str) {
    wizard.start(CHAT).await;
    send(wizard, title).await;
    send(wizard, category).await;
    send(wizard, priority).await;
    send(wizard, "skip").await;
}

#[tokio::test]
async fn test_start_prompts_for_title() {
    let (wizard, _) = setup();
    let reply = wizard.start(CHAT).await;

    assert!(reply.text.contains("What's the task title?"));
    assert_eq!(reply.delivery, Delivery::Send);
    assert_eq!(step_of(&wizard).await, Some(WizardStep::AwaitingTitle));
}

#[tokio::test]
async fn test_no_session_returns_none() {
    let (wizard, _) = setup();
    assert!(wizard.handle(CHAT, WizardInput::text("hello")).await.is_none());
    assert!(!wizard.is_active(CHAT).await);
}

#[tokio::test]
async fn test_full_flow_with_subtasks() {
    let (wizard, repo) = setup();
    wizard.start(CHAT).await;

    let t = send(&wizard, "Write report").await;
    assert_eq!(t.outcome, Outcome::Advanced(WizardStep::AwaitingCategory));
    assert_eq!(t.reply.markup, Markup::CategoryChoice);

    let t = send(&wizard, "deep").await;
    assert_eq!(t.outcome, Outcome::Advanced(WizardStep::AwaitingPriority));
    assert_eq!(t.reply.delivery, Delivery::Send);
    assert!(t.reply.text.contains("Deep Work"));

    let t = send(&wizard, "high").await;
    assert_eq!(t.outcome, Outcome::Advanced(WizardStep::AwaitingDuration));
    assert!(t.reply.text.contains("<b>HIGH</b>"));
    assert!(t.notes.is_empty());

    let t = send(&wizard, "90").await;
    assert_eq!(t.outcome, Outcome::Advanced(WizardStep::AwaitingDate));
    assert!(t.reply.text.contains("Estimated: 90m"));

    let t = send(&wizard, "2024-06-01").await;
    assert_eq!(t.outcome, Outcome::Advanced(WizardStep::AwaitingSubtasks));
    assert!(t.reply.text.contains("Task created!"));
    assert!(t.reply.text.contains("Duration: 90m"));
    assert!(t.reply.text.contains("Due: 2024-06-01"));

    let tasks = repo.tasks();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "Write report");
    assert_eq!(tasks[0].category, TaskCategory::Deep);
    assert_eq!(tasks[0].priority, TaskPriority::High);
    assert_eq!(tasks[0].estimated_minutes, Some(90));
    assert_eq!(tasks[0].due_date.as_ref().map(|d| d.as_str()), Some("2024-06-01"));

    let session = wizard.sessions().get(CHAT).await.unwrap();
    assert_eq!(session.created_task_id().map(|t| t.as_str()), Some("task-1"));

    let t = send(&wizard, "Draft outline").await;
    assert_eq!(t.outcome, Outcome::SubtaskAdded);
    let t = send(&wizard, "Collect figures").await;
    assert_eq!(t.outcome, Outcome::SubtaskAdded);

    let t = send(&wizard, "done").await;
    assert_eq!(t.outcome, Outcome::Completed);
    assert!(t.reply.text.contains("/tasks"));
    assert!(!wizard.is_active(CHAT).await);

    let subtasks = repo.subtasks();
    assert_eq!(subtasks.len(), 2);
    assert!(subtasks
        .iter()
        .all(|(cat, id, _)| *cat == TaskCategory::Deep && id.as_str() == "task-1"));
    assert_eq!(subtasks[0].2, "Draft outline");
    assert_eq!(subtasks[1].2, "Collect figures");
}

#[tokio::test]
async fn test_skip_optional_fields() {
    let (wizard, repo) = setup();
    fill_to_date(&wizard, "Reply to emails", "light", "low").await;

    let t = send(&wizard, "SKIP").await;
    assert_eq!(t.outcome, Outcome::Advanced(WizardStep::AwaitingSubtasks));
    assert!(t.notes.is_empty());
    assert!(!t.reply.text.contains("Duration:"));
    assert!(!t.reply.text.contains("Due:"));

    let tasks = repo.tasks();
    assert_eq!(tasks[0].category, TaskCategory::Light);
    assert_eq!(tasks[0].priority, TaskPriority::Low);
    assert!(tasks[0].estimated_minutes.is_none());
    assert!(tasks[0].due_date.is_none());
}

#[tokio::test]
async fn test_quick_reply_category_edits_prompt() {
    let (wizard, _) = setup();
    wizard.start(CHAT).await;
    send(&wizard, "Plan sprint").await;

    let t = wizard
        .handle(CHAT, WizardInput::CategorySelected(TaskCategory::Light))
        .await
        .unwrap();
    assert_eq!(t.outcome, Outcome::Advanced(WizardStep::AwaitingPriority));
    assert_eq!(t.reply.delivery, Delivery::EditPrevious);
    assert!(t.reply.text.contains("🟢 Light Work"));
    assert!(t.reply.text.contains("URGENT, HIGH, MEDIUM, LOW"));
}

#[tokio::test]
async fn test_stale_category_selection_is_ignored() {
    let (wizard, _) = setup();
    wizard.start(CHAT).await;
    send(&wizard, "Plan sprint").await;
    send(&wizard, "deep").await;

    let t = wizard
        .handle(CHAT, WizardInput::CategorySelected(TaskCategory::Light))
        .await
        .unwrap();
    assert_eq!(t.outcome, Outcome::Reprompted);
    let session = wizard.sessions().get(CHAT).await.unwrap();
    assert_eq!(session.step(), WizardStep::AwaitingPriority);
    assert_eq!(session.draft().category, Some(TaskCategory::Deep));
}

#[tokio::test]
async fn test_unknown_category_text_reprompts() {
    let (wizard, _) = setup();
    wizard.start(CHAT).await;
    send(&wizard, "Plan sprint").await;

    let t = send(&wizard, "medium-ish").await;
    assert_eq!(t.outcome, Outcome::Reprompted);
    assert_eq!(t.reply.markup, Markup::CategoryChoice);
    assert_eq!(step_of(&wizard).await, Some(WizardStep::AwaitingCategory));
}

#[tokio::test]
async fn test_empty_title_reprompts() {
    let (wizard, _) = setup();
    wizard.start(CHAT).await;

    let t = send(&wizard, "   ").await;
    assert_eq!(t.outcome, Outcome::Reprompted);
    assert_eq!(step_of(&wizard).await, Some(WizardStep::AwaitingTitle));
}

#[tokio::test]
async fn test_unrecognized_priority_passes_through() {
    let (wizard, repo) = setup();
    fill_to_date(&wizard, "Odd one", "deep", "whenever").await;
    send(&wizard, "skip").await;

    assert_eq!(
        repo.tasks()[0].priority,
        TaskPriority::Unrecognized("WHENEVER".to_string())
    );
}

#[tokio::test]
async fn test_unrecognized_priority_is_noted() {
    let (wizard, _) = setup();
    wizard.start(CHAT).await;
    send(&wizard, "Odd one").await;
    send(&wizard, "deep").await;

    let t = send(&wizard, "soonish").await;
    assert_eq!(t.outcome, Outcome::Advanced(WizardStep::AwaitingDuration));
    assert_eq!(
        t.notes,
        vec![FieldNote::UnrecognizedPriority {
            value: "SOONISH".to_string()
        }]
    );
}

#[tokio::test]
async fn test_strict_priority_reprompts() {
    let (wizard, _) = setup_with(
        MockRepository::new(),
        WizardOptions {
            strict_priority: true,
        },
    );
    wizard.start(CHAT).await;
    send(&wizard, "Odd one").await;
    send(&wizard, "deep").await;

    let t = send(&wizard, "soonish").await;
    assert_eq!(t.outcome, Outcome::Reprompted);
    assert_eq!(step_of(&wizard).await, Some(WizardStep::AwaitingPriority));

    let t = send(&wizard, "urgent").await;
    assert_eq!(t.outcome, Outcome::Advanced(WizardStep::AwaitingDuration));
}

#[tokio::test]
async fn test_unparseable_duration_is_dropped() {
    let (wizard, repo) = setup();
    wizard.start(CHAT).await;
    send(&wizard, "Sketch").await;
    send(&wizard, "light").await;
    send(&wizard, "medium").await;

    let t = send(&wizard, "a while").await;
    assert_eq!(t.outcome, Outcome::Advanced(WizardStep::AwaitingDate));
    assert!(t.reply.text.contains("No estimate"));
    assert_eq!(
        t.notes,
        vec![FieldNote::DurationDropped {
            raw: "a while".to_string()
        }]
    );

    send(&wizard, "skip").await;
    assert!(repo.tasks()[0].estimated_minutes.is_none());
}

#[tokio::test]
async fn test_malformed_date_is_dropped_but_task_created() {
    let (wizard, repo) = setup();
    fill_to_date(&wizard, "Sketch", "light", "medium").await;

    let t = send(&wizard, "next friday").await;
    assert_eq!(t.outcome, Outcome::Advanced(WizardStep::AwaitingSubtasks));
    assert_eq!(
        t.notes,
        vec![FieldNote::DueDateDropped {
            raw: "next friday".to_string()
        }]
    );
    assert_eq!(repo.tasks().len(), 1);
    assert!(repo.tasks()[0].due_date.is_none());
}

#[tokio::test]
async fn test_creation_failure_aborts() {
    let repo = MockRepository::new();
    repo.fail_tasks.store(true, Ordering::SeqCst);
    let (wizard, repo) = setup_with(repo, WizardOptions::default());
    fill_to_date(&wizard, "Doomed", "deep", "high").await;

    let t = send(&wizard, "skip").await;
    assert_eq!(t.outcome, Outcome::Aborted);
    assert!(t.reply.text.contains("Failed to create task"));
    assert!(!wizard.is_active(CHAT).await);
    assert!(repo.tasks().is_empty());
}

#[tokio::test]
async fn test_subtask_failure_keeps_loop_open() {
    let (wizard, repo) = setup();
    fill_to_date(&wizard, "Parent", "light", "low").await;
    send(&wizard, "skip").await;

    repo.fail_subtasks.store(true, Ordering::SeqCst);
    let t = send(&wizard, "Flaky child").await;
    assert_eq!(t.outcome, Outcome::SubtaskFailed);
    assert!(t.reply.text.contains("Could not add subtask"));

    let session = wizard.sessions().get(CHAT).await.unwrap();
    assert_eq!(session.step(), WizardStep::AwaitingSubtasks);
    assert!(session.draft().subtask_titles.is_empty());

    repo.fail_subtasks.store(false, Ordering::SeqCst);
    let t = send(&wizard, "Steady child").await;
    assert_eq!(t.outcome, Outcome::SubtaskAdded);
    let subtasks = repo.subtasks();
    assert_eq!(subtasks.len(), 1);
    assert_eq!(subtasks[0].0, TaskCategory::Light);
}

#[tokio::test]
async fn test_done_is_case_insensitive() {
    let (wizard, repo) = setup();
    fill_to_date(&wizard, "Parent", "deep", "low").await;
    send(&wizard, "skip").await;

    let t = send(&wizard, " Done ").await;
    assert_eq!(t.outcome, Outcome::Completed);
    assert!(repo.subtasks().is_empty());
}

#[tokio::test]
async fn test_cancel_text_ends_session() {
    let (wizard, repo) = setup();
    wizard.start(CHAT).await;
    send(&wizard, "Never mind").await;

    let t = send(&wizard, "Cancel").await;
    assert_eq!(t.outcome, Outcome::Cancelled);
    assert!(!wizard.is_active(CHAT).await);
    assert!(repo.tasks().is_empty());
}

#[tokio::test]
async fn test_cancel_command() {
    let (wizard, _) = setup();
    assert!(wizard.cancel(CHAT).await.is_none());

    wizard.start(CHAT).await;
    let reply = wizard.cancel(CHAT).await.unwrap();
    assert!(reply.text.contains("cancelled"));
    assert!(!wizard.is_active(CHAT).await);
}

#[tokio::test]
async fn test_cancel_after_creation_keeps_task() {
    let (wizard, repo) = setup();
    fill_to_date(&wizard, "Ship release", "light", "high").await;
    send(&wizard, "skip").await;
    send(&wizard, "Tag build").await;

    let t = send(&wizard, "cancel").await;
    assert_eq!(t.outcome, Outcome::Completed);
    assert!(t.reply.text.contains("already saved"));
    assert!(!t.reply.text.contains("cancelled"));
    assert!(!wizard.is_active(CHAT).await);
    assert_eq!(repo.tasks().len(), 1);
    assert_eq!(repo.subtasks().len(), 1);
}

#[tokio::test]
async fn test_cancel_command_after_creation_keeps_task() {
    let (wizard, repo) = setup();
    fill_to_date(&wizard, "Ship release", "deep", "low").await;
    send(&wizard, "2024-06-01").await;

    let reply = wizard.cancel(CHAT).await.unwrap();
    assert!(reply.text.contains("already saved"));
    assert!(!wizard.is_active(CHAT).await);
    assert_eq!(repo.tasks().len(), 1);
}

#[tokio::test]
async fn test_restart_discards_draft() {
    let (wizard, _) = setup();
    wizard.start(CHAT).await;
    send(&wizard, "First idea").await;

    wizard.start(CHAT).await;
    let session = wizard.sessions().get(CHAT).await.unwrap();
    assert_eq!(session.step(), WizardStep::AwaitingTitle);
    assert!(session.draft().title.is_empty());
}

#[tokio::test]
async fn test_conversations_are_independent() {
    let (wizard, _) = setup();
    let other = ConversationId::new(7);

    wizard.start(CHAT).await;
    wizard.start(other).await;
    send(&wizard, "Mine").await;

    assert_eq!(step_of(&wizard).await, Some(WizardStep::AwaitingCategory));
    let theirs = wizard.sessions().get(other).await.unwrap();
    assert_eq!(theirs.step(), WizardStep::AwaitingTitle);
}

#[tokio::test]
async fn test_title_is_html_escaped_in_prompt() {
    let (wizard, _) = setup();
    wizard.start(CHAT).await;

    let t = send(&wizard, "Fix <b> & stuff").await;
    assert!(t.reply.text.contains("Fix &lt;b&gt; &amp; stuff"));
}

#[tokio::test]
async fn test_concurrent_inputs_are_serialized() {
    let (wizard, repo) = setup_with(
        MockRepository::slow(Duration::from_millis(50)),
        WizardOptions::default(),
    );
    let wizard = Arc::new(wizard);
    fill_to_date(&wizard, "Slow write", "deep", "high").await;

    let first = {
        let wizard = Arc::clone(&wizard);
        tokio::spawn(async move { wizard.handle(CHAT, WizardInput::text("skip")).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    let second = {
        let wizard = Arc::clone(&wizard);
        tokio::spawn(async move { wizard.handle(CHAT, WizardInput::text("First subtask")).await })
    };

    let first = first.await.unwrap().unwrap();
    let second = second.await.unwrap().unwrap();

    assert_eq!(first.outcome, Outcome::Advanced(WizardStep::AwaitingSubtasks));
    assert_eq!(second.outcome, Outcome::SubtaskAdded);
    assert_eq!(repo.tasks().len(), 1);
    assert_eq!(repo.subtasks()[0].1.as_str(), "task-1");
}

#[test]
fn test_parse_minutes() {
    assert_eq!(parse_minutes("45"), Some(45));
    assert_eq!(parse_minutes("45 min"), Some(45));
    assert_eq!(parse_minutes("+30"), Some(30));
    assert_eq!(parse_minutes("-5"), None);
    assert_eq!(parse_minutes("about 5"), None);
    assert_eq!(parse_minutes("99999999999"), None);
}

#[test]
fn test_parse_due_date_is_shape_only() {
    assert!(parse_due_date("2024-06-01").is_some());
    assert!(parse_due_date("2024-13-45").is_some());
    assert!(parse_due_date("2024-6-1").is_none());
    assert!(parse_due_date("tomorrow").is_none());
    assert!(parse_due_date("2024-06-01T10:00").is_none());
}

#[tokio::test]
async fn test_minimal_task_without_subtasks() {
    let (wizard, repo) = setup();
    wizard.start(CHAT).await;
    for line in ["Write report", "deep", "urgent", "45", "skip"] {
        send(&wizard, line).await;
    }
    let t = send(&wizard, "done").await;
    assert_eq!(t.outcome, Outcome::Completed);

    assert_eq!(
        repo.tasks(),
        vec![NewTask {
            title: "Write report".to_string(),
            category: TaskCategory::Deep,
            priority: TaskPriority::Urgent,
            estimated_minutes: Some(45),
            due_date: None,
        }]
    );
    assert!(repo.subtasks().is_empty());
    assert!(!wizard.is_active(CHAT).await);
}

#[tokio::test]
async fn test_impossible_calendar_date_is_stored_verbatim() {
    let (wizard, repo) = setup();
    fill_to_date(&wizard, "Odd date", "light", "low").await;

    let t = send(&wizard, "2024-13-45").await;
    assert!(t.notes.is_empty());
    assert_eq!(
        repo.tasks()[0].due_date.as_ref().map(|d| d.as_str()),
        Some("2024-13-45")
    );
}

#[tokio::test]
async fn test_creation_failure_never_collects_subtasks() {
    let repo = MockRepository::new();
    repo.fail_tasks.store(true, Ordering::SeqCst);
    let (wizard, repo) = setup_with(repo, WizardOptions::default());
    fill_to_date(&wizard, "Doomed", "light", "low").await;
    send(&wizard, "2024-06-01").await;

    assert!(wizard.handle(CHAT, WizardInput::text("Subtask")).await.is_none());
    assert!(repo.subtasks().is_empty());
}
