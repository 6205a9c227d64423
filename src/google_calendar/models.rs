use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::time::to_google_datetime;

pub const NO_TITLE: &str = "No Title";
pub const NO_DESCRIPTION: &str = "No Description";
pub const NO_START_TIME: &str = "No Start Time";

/// Start or end of a Google Calendar event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

/// The subset of a Google Calendar event resource this app reads and writes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EventResource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<EventDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<EventDateTime>,
}

/// Response body of `events.list`
#[derive(Debug, Clone, Deserialize, Default)]
pub struct EventList {
    #[serde(default)]
    pub items: Vec<EventResource>,
}

/// A task as shown on the task page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub summary: String,
    pub description: String,
    pub start: String,
}

impl Task {
    /// Project a remote event into a task, filling display defaults.
    /// Events without an ID can't be deleted and are skipped.
    pub fn from_event(event: EventResource) -> Option<Self> {
        let id = event.id?;
        let start = event
            .start
            .and_then(|start| start.date_time)
            .unwrap_or_else(|| NO_START_TIME.to_string());

        Some(Self {
            id,
            summary: event.summary.unwrap_or_else(|| NO_TITLE.to_string()),
            description: event.description.unwrap_or_else(|| NO_DESCRIPTION.to_string()),
            start,
        })
    }

    /// Path of the delete link for this task
    pub fn delete_path(&self) -> String {
        format!("/delete/{}", urlencoding::encode(&self.id))
    }
}

/// A task submitted from the task form
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Due instant; the event starts and ends here
    pub due: DateTime<Utc>,
}

impl NewTask {
    /// Build the zero-duration event sent to `events.insert`
    pub fn to_event(&self) -> EventResource {
        let point = EventDateTime {
            date_time: Some(to_google_datetime(&self.due)),
            date: None,
            time_zone: Some("UTC".to_string()),
        };

        EventResource {
            id: None,
            summary: self.title.clone(),
            description: self.description.clone(),
            start: Some(point.clone()),
            end: Some(point),
        }
    }
}
