use crate::calendar::{CalendarError, CalendarEvent, CommittedEvent, EventStore};
use crate::composer::{compose, CandidateEvent, CompositionError};
use crate::confirm::{ConfirmationState, Confirmer};
use crate::contacts::ContactDirectory;
use crate::parser::{ExtractionError, IntentExtractor};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use log::{debug, info};
use rustyline::error::ReadlineError;

/// Fatal errors for a single request. Unresolved guests and rejection are not errors.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Composition(#[from] CompositionError),
    #[error(transparent)]
    Backend(#[from] CalendarError),
    #[error("Confirmation prompt failed: {0}")]
    Prompt(#[from] ReadlineError),
}

/// How a request ended
#[derive(Debug)]
pub enum Outcome {
    Committed(CommittedEvent),
    /// User declined; nothing was written
    Rejected(CandidateEvent),
}

/// The scheduling pipeline: extract, compose, confirm, commit
pub struct Application {
    directory: ContactDirectory,
    extractor: IntentExtractor,
    store: Box<dyn EventStore>,
    time_zone: Tz,
}

impl Application {
    pub fn new(
        directory: ContactDirectory,
        extractor: IntentExtractor,
        store: Box<dyn EventStore>,
        time_zone: Tz,
    ) -> Self {
        Self { directory, extractor, store, time_zone }
    }

    /// Run one request end-to-end against the current clock
    pub async fn process(
        &self,
        text: &str,
        confirmer: &mut dyn Confirmer,
    ) -> Result<Outcome, RequestError> {
        self.process_at(text, Utc::now(), confirmer).await
    }

    /// Run one request with an explicit "now" for relative dates
    pub async fn process_at(
        &self,
        text: &str,
        now: DateTime<Utc>,
        confirmer: &mut dyn Confirmer,
    ) -> Result<Outcome, RequestError> {
        let now = now.with_timezone(&self.time_zone);
        info!("Processing request: {}", text);

        let intent = self
            .extractor
            .extract(text, now.date_naive(), &self.directory.valid_names())
            .await?;

        let candidate = compose(&intent, &self.directory, self.time_zone, now)?;
        debug!("Candidate event: {:?}", candidate);

        let state = ConfirmationState::default().decide(confirmer.confirm(&candidate)?);
        if !state.is_accepted() {
            info!("Request rejected by user; nothing written");
            return Ok(Outcome::Rejected(candidate));
        }

        let committed = self.store.insert(candidate).await?;
        Ok(Outcome::Committed(committed))
    }

    /// Upcoming events for display
    pub async fn upcoming(&self, count: u32) -> Result<Vec<CalendarEvent>, RequestError> {
        Ok(self.store.list_upcoming(count).await?)
    }
}
