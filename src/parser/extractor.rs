//! Structured-intent extraction.
//!
//! Builds the oracle request from the user's text, today's date and the
//! directory's valid names, then decodes the reply into a [`RawIntent`].
//! The reply is only checked for shape here. Whether the time parses or the
//! guests exist is the composer's business.

use super::traits::{ExtractionError, IntentOracle, OracleRequest};
use crate::validation::{sanitize_user_input, MAX_REQUEST_LEN};
use chrono::NaiveDate;
use chrono_tz::Tz;
use log::{debug, info};
use serde::Deserialize;
use std::collections::BTreeSet;

pub const SYSTEM_PROMPT: &str = "You are a calendar assistant. Return ONLY JSON.";

/// Oracle output. Untrusted: names may be unknown and the time may not parse.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawIntent {
    pub summary: String,
    pub time: String,
    /// A missing key means no guests; a non-array value is still an error
    #[serde(default)]
    pub guests: Vec<String>,
}

pub struct IntentExtractor {
    oracle: Box<dyn IntentOracle>,
    time_zone: Tz,
}

impl IntentExtractor {
    pub fn new(oracle: Box<dyn IntentOracle>, time_zone: Tz) -> Self {
        Self { oracle, time_zone }
    }

    /// Turn free text into a raw intent with a single oracle round trip
    pub async fn extract(
        &self,
        raw_text: &str,
        current_date: NaiveDate,
        valid_names: &BTreeSet<String>,
    ) -> Result<RawIntent, ExtractionError> {
        let text = sanitize_user_input(raw_text);
        let text = text.trim();
        if text.is_empty() {
            return Err(ExtractionError::InvalidInput("empty request".to_string()));
        }
        if text.chars().count() > MAX_REQUEST_LEN {
            return Err(ExtractionError::InvalidInput(format!(
                "request too long (max {} characters)",
                MAX_REQUEST_LEN
            )));
        }

        let request = OracleRequest {
            system: SYSTEM_PROMPT.to_string(),
            prompt: build_prompt(text, current_date, valid_names, self.time_zone),
        };
        debug!("Extraction prompt:\n{}", request.prompt);

        let content = self.oracle.complete(&request).await?;
        debug!("Raw oracle content: {}", content);

        let intent = parse_intent(&content)?;
        info!(
            "Extracted intent: summary='{}', time='{}', {} guest name(s)",
            intent.summary,
            intent.time,
            intent.guests.len()
        );
        Ok(intent)
    }
}

/// Build the user prompt given to the oracle
pub fn build_prompt(
    text: &str,
    current_date: NaiveDate,
    valid_names: &BTreeSet<String>,
    time_zone: Tz,
) -> String {
    // JSON string literals, so a quote inside a name cannot break the list
    let names = valid_names
        .iter()
        .map(|n| serde_json::Value::from(n.as_str()).to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        r#"Extract a calendar event from: "{text}"
Today is: {date} ({weekday})
Time zone: {tz}
Valid Guests: [{names}]

Rules:
1. "time" is the event start as an ISO-8601 string (YYYY-MM-DDTHH:MM:SS), resolved against today's date.
2. "guests" only contains names copied exactly from Valid Guests. Use [] when nobody is mentioned.
3. "summary" is a short title for the event.

Return ONLY a JSON object:
{{"summary": "text", "time": "ISO format string", "guests": ["names"]}}"#,
        text = text.replace('"', "'"),
        date = current_date.format("%Y-%m-%d"),
        weekday = current_date.format("%A"),
        tz = time_zone.name(),
        names = names,
    )
}

/// Decode oracle content into a raw intent.
///
/// Surrounding whitespace and a single Markdown code fence are tolerated.
/// Anything else that is not the expected object is an error.
pub fn parse_intent(content: &str) -> Result<RawIntent, ExtractionError> {
    let json = strip_code_fence(content.trim());
    serde_json::from_str::<RawIntent>(json).map_err(|e| ExtractionError::Malformed {
        reason: e.to_string(),
        content: content.to_string(),
    })
}

fn strip_code_fence(content: &str) -> &str {
    let Some(inner) = content.strip_prefix("```") else {
        return content;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}
