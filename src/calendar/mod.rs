//! Event store adapter.
//!
//! The only component with a committing side effect. Inserts happen once,
//! after confirmation, and are never retried: calendar writes are not
//! idempotent and a retry could double-book.

use crate::composer::CandidateEvent;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate};
use std::time::Duration;

mod display;
mod google;

pub use display::format_upcoming;
pub use google::GoogleCalendarStore;

/// Custom error type for calendar operations
#[derive(Debug, thiserror::Error)]
pub enum CalendarError {
    #[error("Calendar request failed: {0}")]
    Network(String),
    #[error("Calendar request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Calendar rejected the request (status {status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("Unexpected calendar response: {0}")]
    InvalidResponse(String),
    #[error("Invalid calendar configuration: {0}")]
    Configuration(String),
}

/// A candidate event the backend has accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedEvent {
    pub event: CandidateEvent,
    pub id: String,
    pub link: String,
}

/// Start of an event as reported by the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventStart {
    DateTime(DateTime<FixedOffset>),
    AllDay(NaiveDate),
}

/// Read-only view of an existing event, used for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    pub id: String,
    pub summary: String,
    pub start: EventStart,
}

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Commit a confirmed event and notify its attendees
    async fn insert(&self, event: CandidateEvent) -> Result<CommittedEvent, CalendarError>;

    /// Next `count` events from now, ascending by start time
    async fn list_upcoming(&self, count: u32) -> Result<Vec<CalendarEvent>, CalendarError>;
}
