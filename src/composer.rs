//! Event composer: validated candidate events from raw intents.
//!
//! Pure transformation. The oracle never supplies an end time; every event
//! lasts [`DEFAULT_DURATION_MINUTES`].

use crate::contacts::ContactDirectory;
use crate::parser::RawIntent;
use crate::time_parser::parse_event_time;
use chrono::{DateTime, Duration};
use chrono_tz::Tz;
use log::{debug, warn};
use std::collections::BTreeSet;

pub const DEFAULT_DURATION_MINUTES: i64 = 60;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CompositionError {
    #[error("Could not understand the time '{raw}'. Try rephrasing the request with a concrete date and time")]
    UnparseableTime { raw: String },
    #[error("Event starting at '{raw}' cannot be represented")]
    TimeOverflow { raw: String },
}

/// A validated event awaiting confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateEvent {
    pub summary: String,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    pub attendee_emails: BTreeSet<String>,
    /// Guest names that matched nothing in the directory, in request order
    pub unresolved_guest_names: Vec<String>,
}

impl CandidateEvent {
    pub fn has_summary(&self) -> bool {
        !self.summary.trim().is_empty()
    }
}

/// Merge guests, fix the time and build the candidate event
pub fn compose(
    intent: &RawIntent,
    directory: &ContactDirectory,
    default_time_zone: Tz,
    now: DateTime<Tz>,
) -> Result<CandidateEvent, CompositionError> {
    let start = parse_event_time(&intent.time, now, default_time_zone)
        .ok_or_else(|| CompositionError::UnparseableTime { raw: intent.time.clone() })?;
    let end = start
        .checked_add_signed(Duration::minutes(DEFAULT_DURATION_MINUTES))
        .ok_or_else(|| CompositionError::TimeOverflow { raw: intent.time.clone() })?;

    let mut attendee_emails = BTreeSet::new();
    let mut unresolved_guest_names: Vec<String> = Vec::new();
    for name in &intent.guests {
        let name = name.trim();
        if name.is_empty() {
            debug!("Skipping empty guest name");
            continue;
        }
        let emails = directory.resolve(name);
        if emails.is_empty() {
            warn!("Guest '{}' is not in the contact directory", name);
            if !unresolved_guest_names.iter().any(|n| n == name) {
                unresolved_guest_names.push(name.to_string());
            }
        } else {
            debug!("Guest '{}' resolved to {:?}", name, emails);
            attendee_emails.extend(emails);
        }
    }

    if intent.summary.trim().is_empty() {
        warn!("Extracted intent has an empty summary");
    }

    Ok(CandidateEvent {
        summary: intent.summary.clone(),
        start,
        end,
        attendee_emails,
        unresolved_guest_names,
    })
}
