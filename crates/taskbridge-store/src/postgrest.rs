//! Supabase REST (PostgREST) implementation of [`TaskRepository`].

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use taskbridge_core::{RepositoryError, RepositoryResult, Settings, TaskRepository};
use taskbridge_models::{NewTask, SubtaskRecord, TaskCategory, TaskId, TaskRecord};

/// Path prefix of the PostgREST API on a Supabase project.
const REST_PREFIX: &str = "rest/v1";

/// Table holding tasks of a category.
pub fn task_table(category: TaskCategory) -> &'static str {
    match category {
        TaskCategory::Deep => "deep_work_tasks",
        TaskCategory::Light => "light_work_tasks",
    }
}

/// Table holding subtasks of a category's tasks.
pub fn subtask_table(category: TaskCategory) -> &'static str {
    match category {
        TaskCategory::Deep => "deep_work_subtasks",
        TaskCategory::Light => "light_work_subtasks",
    }
}

/// Query for a user's open tasks, most urgent first.
pub fn open_tasks_query(user_id: &Uuid, limit: usize) -> Vec<(&'static str, String)> {
    vec![
        ("select", "*".to_string()),
        ("completed", "eq.false".to_string()),
        ("user_id", format!("eq.{}", user_id)),
        ("order", "priority.asc".to_string()),
        ("limit", limit.to_string()),
    ]
}

/// Query for a task's open subtasks.
pub fn open_subtasks_query(task_id: &TaskId) -> Vec<(&'static str, String)> {
    vec![
        ("select", "*".to_string()),
        ("task_id", format!("eq.{}", task_id)),
        ("completed", "eq.false".to_string()),
    ]
}

/// Filter selecting one row by ID.
pub fn by_id_query(id: &TaskId) -> Vec<(&'static str, String)> {
    vec![("id", format!("eq.{}", id))]
}

/// Row written to a task table.
#[derive(Debug, Serialize)]
pub struct TaskInsert<'a> {
    pub title: &'a str,
    pub priority: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_date: Option<&'a str>,
    pub user_id: Uuid,
    pub completed: bool,
}

impl<'a> TaskInsert<'a> {
    pub fn new(task: &'a NewTask, user_id: Uuid) -> Self {
        Self {
            title: &task.title,
            priority: task.priority.as_str(),
            estimated_duration: task.estimated_minutes,
            task_date: task.due_date.as_ref().map(|d| d.as_str()),
            user_id,
            completed: false,
        }
    }
}

/// Row written to a subtask table.
#[derive(Debug, Serialize)]
pub struct SubtaskInsert<'a> {
    pub task_id: &'a str,
    pub title: &'a str,
    pub completed: bool,
}

/// ID of the first row in a `return=representation` response.
///
/// PostgREST may hand back text or integer keys; both become a [`TaskId`].
pub fn first_row_id(rows: &Value) -> Option<TaskId> {
    match rows.as_array()?.first()?.get("id")? {
        Value::String(s) if !s.is_empty() => Some(TaskId::from_string(s.clone())),
        Value::Number(n) => Some(TaskId::from_string(n.to_string())),
        _ => None,
    }
}

/// Task repository backed by a Supabase project's REST API.
#[derive(Clone)]
pub struct SupabaseRepository {
    client: reqwest::Client,
    rest_base: String,
    api_key: String,
    user_id: Uuid,
}

impl SupabaseRepository {
    /// Create a repository for the project at `project_url`.
    pub fn new(
        project_url: &Url,
        api_key: impl Into<String>,
        user_id: Uuid,
        timeout: Duration,
    ) -> RepositoryResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RepositoryError::Http(e.to_string()))?;

        Ok(Self {
            client,
            rest_base: format!("{}/{}", project_url.as_str().trim_end_matches('/'), REST_PREFIX),
            api_key: api_key.into(),
            user_id,
        })
    }

    pub fn from_settings(settings: &Settings) -> RepositoryResult<Self> {
        Self::new(
            &settings.store_url,
            settings.store_key.clone(),
            settings.user_id,
            settings.http_timeout,
        )
    }

    /// Full URL of a table endpoint.
    pub fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.rest_base, table)
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    fn request(&self, method: reqwest::Method, table: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.table_url(table))
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> RepositoryResult<Value> {
        let response = request
            .send()
            .await
            .map_err(|e| RepositoryError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(RepositoryError::Status { status, body });
        }

        response
            .json()
            .await
            .map_err(|e| RepositoryError::Decode(e.to_string()))
    }

    async fn get<T>(&self, table: &str, query: &[(&'static str, String)]) -> RepositoryResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        debug!(table, "Querying store");
        let rows = self
            .send(self.request(reqwest::Method::GET, table).query(query))
            .await?;
        serde_json::from_value(rows).map_err(|e| RepositoryError::Decode(e.to_string()))
    }

    async fn insert<B: Serialize + ?Sized>(&self, table: &str, body: &B) -> RepositoryResult<Value> {
        debug!(table, "Inserting row");
        self.send(
            self.request(reqwest::Method::POST, table)
                .header("Prefer", "return=representation")
                .json(body),
        )
        .await
    }
}

#[async_trait]
impl TaskRepository for SupabaseRepository {
    async fn create_task(&self, task: &NewTask) -> RepositoryResult<TaskId> {
        let table = task_table(task.category);
        let rows = self
            .insert(table, &TaskInsert::new(task, self.user_id))
            .await?;
        first_row_id(&rows).ok_or_else(|| {
            warn!(table, "Insert returned no row");
            RepositoryError::NoRecord("task")
        })
    }

    async fn create_subtask(
        &self,
        category: TaskCategory,
        task_id: &TaskId,
        title: &str,
    ) -> RepositoryResult<()> {
        let table = subtask_table(category);
        let body = SubtaskInsert {
            task_id: task_id.as_str(),
            title,
            completed: false,
        };
        let rows = self.insert(table, &body).await?;
        match first_row_id(&rows) {
            Some(_) => Ok(()),
            None => {
                warn!(table, task_id = %task_id, "Insert returned no row");
                Err(RepositoryError::NoRecord("subtask"))
            }
        }
    }

    async fn list_tasks(
        &self,
        category: TaskCategory,
        limit: usize,
    ) -> RepositoryResult<Vec<TaskRecord>> {
        self.get(task_table(category), &open_tasks_query(&self.user_id, limit))
            .await
    }

    async fn list_subtasks(
        &self,
        category: TaskCategory,
        task_id: &TaskId,
    ) -> RepositoryResult<Vec<SubtaskRecord>> {
        self.get(subtask_table(category), &open_subtasks_query(task_id))
            .await
    }

    async fn complete_task(
        &self,
        category: TaskCategory,
        task_id: &TaskId,
    ) -> RepositoryResult<bool> {
        let table = task_table(category);
        debug!(table, task_id = %task_id, "Completing task");
        let rows = self
            .send(
                self.request(reqwest::Method::PATCH, table)
                    .query(&by_id_query(task_id))
                    .header("Prefer", "return=representation")
                    .json(&serde_json::json!({ "completed": true })),
            )
            .await?;
        Ok(rows.as_array().is_some_and(|rows| !rows.is_empty()))
    }
}
