use super::models::{EventList, EventResource, NewTask, Task};
use super::time::to_google_datetime;
use crate::auth::UserToken;
use crate::error::{google_calendar_error, AppResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response};
use tracing::{debug, info};
use url::Url;

/// Base URL of the Google Calendar v3 API
pub const GOOGLE_CALENDAR_API: &str = "https://www.googleapis.com/calendar/v3";

/// Calendar operations the task pages need
#[async_trait]
pub trait TaskCalendar: Send + Sync + 'static {
    /// Upcoming single-instance events starting at or after `time_min`, soonest first
    async fn list_upcoming(
        &self,
        token: &UserToken,
        time_min: DateTime<Utc>,
        max_results: u32,
    ) -> AppResult<Vec<Task>>;

    /// Insert a task as a point event
    async fn create(&self, token: &UserToken, task: &NewTask) -> AppResult<Task>;

    /// Delete a task by event ID
    async fn delete(&self, token: &UserToken, task_id: &str) -> AppResult<()>;
}

/// Google Calendar REST client bound to one calendar
#[derive(Clone)]
pub struct GoogleCalendarClient {
    http: Client,
    calendar_id: String,
    base_url: String,
}

impl GoogleCalendarClient {
    pub fn new(http: Client, calendar_id: impl Into<String>) -> Self {
        Self::with_base_url(http, calendar_id, GOOGLE_CALENDAR_API)
    }

    /// Point the client at another API root
    pub fn with_base_url(
        http: Client,
        calendar_id: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            calendar_id: calendar_id.into(),
            base_url: base_url.into(),
        }
    }

    /// `.../calendars/{calendarId}/events[/{eventId}]`
    pub fn events_url(&self, event_id: Option<&str>) -> AppResult<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| google_calendar_error(&format!("Failed to parse URL: {}", e)))?;

        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| google_calendar_error("Calendar API URL cannot be a base"))?;
            segments.pop_if_empty();
            segments.extend(["calendars", self.calendar_id.as_str(), "events"]);
            if let Some(event_id) = event_id {
                segments.push(event_id);
            }
        }

        Ok(url)
    }
}

#[async_trait]
impl TaskCalendar for GoogleCalendarClient {
    async fn list_upcoming(
        &self,
        token: &UserToken,
        time_min: DateTime<Utc>,
        max_results: u32,
    ) -> AppResult<Vec<Task>> {
        let mut url = self.events_url(None)?;
        url.query_pairs_mut()
            .append_pair("timeMin", &to_google_datetime(&time_min))
            .append_pair("maxResults", &max_results.to_string())
            .append_pair("singleEvents", "true")
            .append_pair("orderBy", "startTime");

        let response = self
            .http
            .get(url)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to fetch events: {}", e)))?;

        let response = check_status(response, "fetch events").await?;

        let events: EventList = response
            .json()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to parse events response: {}", e)))?;

        let tasks: Vec<Task> = events.items.into_iter().filter_map(Task::from_event).collect();
        debug!("Fetched {} upcoming tasks", tasks.len());
        Ok(tasks)
    }

    async fn create(&self, token: &UserToken, task: &NewTask) -> AppResult<Task> {
        let event = task.to_event();
        debug!("Event to add: {:?}", event);

        let response = self
            .http
            .post(self.events_url(None)?)
            .bearer_auth(&token.access_token)
            .json(&event)
            .send()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to insert event: {}", e)))?;

        let response = check_status(response, "insert event").await?;

        let created: EventResource = response
            .json()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to parse inserted event: {}", e)))?;

        let created = Task::from_event(created)
            .ok_or_else(|| google_calendar_error("Inserted event has no ID"))?;
        info!("Event added successfully: {}", created.id);
        Ok(created)
    }

    async fn delete(&self, token: &UserToken, task_id: &str) -> AppResult<()> {
        let response = self
            .http
            .delete(self.events_url(Some(task_id))?)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to delete event: {}", e)))?;

        check_status(response, "delete event").await?;
        info!("Event deleted: {}", task_id);
        Ok(())
    }
}

async fn check_status(response: Response, action: &str) -> AppResult<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let error_body = response
        .text()
        .await
        .unwrap_or_else(|_| "Could not read error response".to_string());
    Err(google_calendar_error(&format!(
        "Failed to {}: HTTP {} - {}",
        action, status, error_body
    )))
}
