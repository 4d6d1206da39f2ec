//! Google Calendar API (`calendar/v3`).

use bon::Builder;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::http::GoogleApi;
use crate::error::Result;

pub const CALENDAR_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";
pub const PRIMARY_CALENDAR: &str = "primary";

/// `start`/`end` of an event: `dateTime` for timed events, `date` for all-day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl EventTime {
    pub fn at(date_time: impl Into<String>) -> Self {
        Self {
            date_time: Some(date_time.into()),
            ..Self::default()
        }
    }

    pub fn all_day(date: impl Into<String>) -> Self {
        Self {
            date: Some(date.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub start: Option<EventTime>,
    #[serde(default)]
    pub end: Option<EventTime>,
    #[serde(default)]
    pub html_link: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Event to create.
#[derive(Debug, Clone, Builder, Serialize)]
pub struct NewEvent {
    #[builder(into)]
    pub summary: String,
    pub start: EventTime,
    pub end: EventTime,
    #[builder(into)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[builder(into)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEntry {
    pub id: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub time_zone: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

/// Query for [`CalendarClient::list_events`].
#[derive(Debug, Clone, Builder)]
pub struct EventQuery {
    #[builder(into, default = PRIMARY_CALENDAR.to_string())]
    pub calendar_id: String,
    /// RFC 3339 lower bound.
    #[builder(into)]
    pub time_min: Option<String>,
    #[builder(into)]
    pub time_max: Option<String>,
    #[builder(default = 10)]
    pub max_results: u32,
}

pub struct CalendarClient {
    api: GoogleApi,
}

impl CalendarClient {
    pub fn new(api: GoogleApi) -> Self {
        Self { api }
    }

    /// Expanded single events ordered by start time.
    pub async fn list_events(&self, query: &EventQuery) -> Result<Vec<Event>> {
        let mut params = vec![
            ("singleEvents", "true".to_string()),
            ("orderBy", "startTime".to_string()),
            ("maxResults", query.max_results.to_string()),
        ];
        if let Some(min) = &query.time_min {
            params.push(("timeMin", min.clone()));
        }
        if let Some(max) = &query.time_max {
            params.push(("timeMax", max.clone()));
        }
        let page: Page<Event> = self
            .api
            .get_json(&["calendars", query.calendar_id.as_str(), "events"], &params)
            .await?;
        Ok(page.items)
    }

    pub async fn create_event(&self, calendar_id: &str, event: &NewEvent) -> Result<Event> {
        self.api
            .send_json(Method::POST, &["calendars", calendar_id, "events"], &[], event)
            .await
    }

    /// Partial update; only the fields present in `patch` change.
    pub async fn update_event(&self, calendar_id: &str, id: &str, patch: &Value) -> Result<Event> {
        self.api
            .send_json(
                Method::PATCH,
                &["calendars", calendar_id, "events", id],
                &[],
                patch,
            )
            .await
    }

    pub async fn delete_event(&self, calendar_id: &str, id: &str) -> Result<()> {
        self.api
            .delete(&["calendars", calendar_id, "events", id])
            .await
    }

    pub async fn list_calendars(&self) -> Result<Vec<CalendarEntry>> {
        let page: Page<CalendarEntry> = self.api.get_json(&["users", "me", "calendarList"], &[]).await?;
        Ok(page.items)
    }
}
