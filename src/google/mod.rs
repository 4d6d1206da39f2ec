//! Thin wrappers over the Gmail, Calendar and Drive REST APIs.

pub mod calendar;
pub mod drive;
pub mod gmail;
pub mod http;

use std::sync::Arc;

pub use calendar::{CalendarClient, Event, EventQuery, EventTime, NewEvent};
pub use drive::{DriveClient, DriveFile};
pub use gmail::{GmailClient, MessageDetail, MessageRef, OutgoingMessage};
pub use http::{AccessTokenProvider, GoogleApi};

use crate::auth::GoogleService;

/// Production base URL for a service's REST API.
pub fn default_base_url(service: GoogleService) -> &'static str {
    match service {
        GoogleService::Gmail => gmail::GMAIL_BASE_URL,
        GoogleService::Calendar => calendar::CALENDAR_BASE_URL,
        GoogleService::Drive => drive::DRIVE_BASE_URL,
    }
}

/// [`GoogleApi`] for `service` at its production base URL.
pub fn api_for(service: GoogleService, tokens: Arc<dyn AccessTokenProvider>) -> GoogleApi {
    GoogleApi::new(tokens, default_base_url(service))
}
