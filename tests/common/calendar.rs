use async_trait::async_trait;
use chrono::{DateTime, Utc};
use taskcal::auth::UserToken;
use taskcal::error::{google_calendar_error, AppResult};
use taskcal::google_calendar::models::EventResource;
use taskcal::google_calendar::{NewTask, Task, TaskCalendar};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct StoredTask {
    task: Task,
    due: DateTime<Utc>,
}

/// Calendar kept in memory, standing in for Google
#[derive(Debug, Default)]
pub struct InMemoryCalendar {
    tasks: RwLock<Vec<StoredTask>>,
    access_tokens: RwLock<Vec<String>>,
    failure: Option<String>,
    next_id: RwLock<u64>,
}

impl InMemoryCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// A calendar whose every call fails with `message`
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Snapshot of all stored tasks in insertion order
    pub async fn tasks(&self) -> Vec<Task> {
        self.tasks.read().await.iter().map(|t| t.task.clone()).collect()
    }

    /// Access tokens presented so far, oldest first
    pub async fn access_tokens_seen(&self) -> Vec<String> {
        self.access_tokens.read().await.clone()
    }

    async fn record(&self, token: &UserToken) -> AppResult<()> {
        self.access_tokens.write().await.push(token.access_token.clone());
        match &self.failure {
            Some(message) => Err(google_calendar_error(message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TaskCalendar for InMemoryCalendar {
    async fn list_upcoming(
        &self,
        token: &UserToken,
        time_min: DateTime<Utc>,
        max_results: u32,
    ) -> AppResult<Vec<Task>> {
        self.record(token).await?;

        let mut upcoming: Vec<StoredTask> = self
            .tasks
            .read()
            .await
            .iter()
            .filter(|t| t.due >= time_min)
            .cloned()
            .collect();
        upcoming.sort_by_key(|t| t.due);

        Ok(upcoming
            .into_iter()
            .take(max_results as usize)
            .map(|t| t.task)
            .collect())
    }

    async fn create(&self, token: &UserToken, task: &NewTask) -> AppResult<Task> {
        self.record(token).await?;

        let id = {
            let mut next_id = self.next_id.write().await;
            *next_id += 1;
            format!("task{}", *next_id)
        };

        let created = Task::from_event(EventResource {
            id: Some(id),
            ..task.to_event()
        })
        .ok_or_else(|| google_calendar_error("Inserted event has no ID"))?;

        self.tasks.write().await.push(StoredTask {
            task: created.clone(),
            due: task.due,
        });
        Ok(created)
    }

    async fn delete(&self, token: &UserToken, task_id: &str) -> AppResult<()> {
        self.record(token).await?;

        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|t| t.task.id != task_id);
        if tasks.len() == before {
            return Err(google_calendar_error(&format!(
                "Failed to delete event: HTTP 404 Not Found - {}",
                task_id
            )));
        }
        Ok(())
    }
}
