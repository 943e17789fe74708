//! Google Calendar v3 implementation of the event store

use super::{CalendarError, CalendarEvent, CommittedEvent, EventStart, EventStore};
use crate::composer::CandidateEvent;
use crate::config::CalendarConfig;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use log::{debug, info, warn};
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

const UNTITLED: &str = "(no title)";

#[derive(Debug, Serialize)]
struct EventBody<'a> {
    summary: &'a str,
    start: EventTime,
    end: EventTime,
    attendees: Vec<Attendee<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventTime {
    date_time: String,
    time_zone: String,
}

#[derive(Debug, Serialize)]
struct Attendee<'a> {
    email: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InsertedEvent {
    id: String,
    html_link: String,
}

#[derive(Debug, Deserialize)]
struct EventsResponse {
    #[serde(default)]
    items: Vec<GoogleEvent>,
}

#[derive(Debug, Deserialize)]
struct GoogleEvent {
    id: String,
    summary: Option<String>,
    start: GoogleEventStart,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleEventStart {
    date_time: Option<String>,
    date: Option<String>,
}

/// Event store backed by the Google Calendar REST API
pub struct GoogleCalendarStore {
    http: Client,
    token: SecretString,
    events_url: Url,
    send_updates: String,
    timeout: Duration,
}

impl GoogleCalendarStore {
    pub fn new(
        token: SecretString,
        config: &CalendarConfig,
        timeout: Duration,
    ) -> Result<Self, CalendarError> {
        let mut events_url = Url::parse(&config.api_base).map_err(|e| {
            CalendarError::Configuration(format!("bad api_base '{}': {}", config.api_base, e))
        })?;
        events_url
            .path_segments_mut()
            .map_err(|_| {
                CalendarError::Configuration(format!("api_base '{}' cannot be a base", config.api_base))
            })?
            .pop_if_empty()
            .extend(["calendars", config.calendar_id.as_str(), "events"]);

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CalendarError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http, token, events_url, send_updates: config.send_updates.clone(), timeout })
    }

    fn map_send_error(&self, e: reqwest::Error) -> CalendarError {
        if e.is_timeout() {
            CalendarError::Timeout(self.timeout)
        } else {
            CalendarError::Network(e.to_string())
        }
    }

    async fn check_status(response: Response) -> Result<Response, CalendarError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
        Err(CalendarError::Rejected { status: status.as_u16(), message })
    }

    async fn list_from(
        &self,
        time_min: DateTime<Utc>,
        count: u32,
    ) -> Result<Vec<CalendarEvent>, CalendarError> {
        let query = [
            ("timeMin", time_min.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("maxResults", count.to_string()),
            ("singleEvents", "true".to_string()),
            ("orderBy", "startTime".to_string()),
        ];
        debug!("Listing up to {} upcoming events", count);
        let response = self
            .http
            .get(self.events_url.clone())
            .bearer_auth(self.token.expose_secret())
            .query(&query)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let response = Self::check_status(response).await?;

        let listed: EventsResponse = response.json().await.map_err(|e| {
            CalendarError::InvalidResponse(format!("Failed to parse events list: {}", e))
        })?;

        Ok(listed.items.into_iter().filter_map(convert_event).collect())
    }
}

fn convert_event(event: GoogleEvent) -> Option<CalendarEvent> {
    let start = match (&event.start.date_time, &event.start.date) {
        (Some(date_time), _) => {
            DateTime::parse_from_rfc3339(date_time).ok().map(EventStart::DateTime)
        }
        (None, Some(date)) => {
            NaiveDate::parse_from_str(date, "%Y-%m-%d").ok().map(EventStart::AllDay)
        }
        (None, None) => None,
    };
    let Some(start) = start else {
        warn!("Skipping event {} with unreadable start {:?}", event.id, event.start);
        return None;
    };
    let summary =
        event.summary.filter(|s| !s.trim().is_empty()).unwrap_or_else(|| UNTITLED.to_string());
    Some(CalendarEvent { id: event.id, summary, start })
}

#[async_trait]
impl EventStore for GoogleCalendarStore {
    async fn insert(&self, event: CandidateEvent) -> Result<CommittedEvent, CalendarError> {
        let time_zone = event.start.timezone().name();
        let body = EventBody {
            summary: &event.summary,
            start: EventTime {
                date_time: event.start.to_rfc3339_opts(SecondsFormat::Secs, true),
                time_zone: time_zone.to_string(),
            },
            end: EventTime {
                date_time: event.end.to_rfc3339_opts(SecondsFormat::Secs, true),
                time_zone: time_zone.to_string(),
            },
            attendees: event
                .attendee_emails
                .iter()
                .map(|email| Attendee { email: email.as_str() })
                .collect(),
        };

        debug!("Inserting event '{}' with {} attendee(s)", event.summary, body.attendees.len());
        let response = self
            .http
            .post(self.events_url.clone())
            .bearer_auth(self.token.expose_secret())
            .query(&[("sendUpdates", self.send_updates.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let response = Self::check_status(response).await?;

        let inserted: InsertedEvent = response.json().await.map_err(|e| {
            CalendarError::InvalidResponse(format!("Failed to parse inserted event: {}", e))
        })?;
        info!("Created event {}", inserted.id);

        Ok(CommittedEvent { event, id: inserted.id, link: inserted.html_link })
    }

    async fn list_upcoming(&self, count: u32) -> Result<Vec<CalendarEvent>, CalendarError> {
        self.list_from(Utc::now(), count).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store(server: &MockServer, calendar_id: &str) -> GoogleCalendarStore {
        let config = CalendarConfig {
            api_base: format!("{}/calendar/v3", server.uri()),
            calendar_id: calendar_id.to_string(),
            ..CalendarConfig::default()
        };
        GoogleCalendarStore::new("ya29.token".to_string().into(), &config, Duration::from_secs(5))
            .unwrap()
    }

    fn candidate() -> CandidateEvent {
        let tz = chrono_tz::Europe::London;
        let start = tz.with_ymd_and_hms(2026, 10, 23, 12, 0, 0).unwrap();
        CandidateEvent {
            summary: "lunch".to_string(),
            start,
            end: start + chrono::Duration::hours(1),
            attendee_emails: ["sam@x.com".to_string(), "dee@x.com".to_string()].into(),
            unresolved_guest_names: vec!["Bob".to_string()],
        }
    }

    #[tokio::test]
    async fn test_slow_insert_times_out_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/calendar/v3/calendars/primary/events"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .expect(1)
            .mount(&server)
            .await;
        let config = CalendarConfig {
            api_base: format!("{}/calendar/v3", server.uri()),
            ..CalendarConfig::default()
        };
        let store = GoogleCalendarStore::new(
            "ya29.token".to_string().into(),
            &config,
            Duration::from_millis(200),
        )
        .unwrap();

        let err = store.insert(candidate()).await.unwrap_err();
        assert!(
            matches!(err, CalendarError::Timeout(limit) if limit == Duration::from_millis(200)),
            "{:?}",
            err
        );
    }

    #[tokio::test]
    async fn test_insert_posts_event_and_returns_link() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/calendar/v3/calendars/primary/events"))
            .and(query_param("sendUpdates", "all"))
            .and(header("authorization", "Bearer ya29.token"))
            .and(body_json(json!({
                "summary": "lunch",
                "start": {"dateTime": "2026-10-23T12:00:00+01:00", "timeZone": "Europe/London"},
                "end": {"dateTime": "2026-10-23T13:00:00+01:00", "timeZone": "Europe/London"},
                "attendees": [{"email": "dee@x.com"}, {"email": "sam@x.com"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "evt123",
                "htmlLink": "https://calendar.google.com/event?eid=evt123",
                "status": "confirmed"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let committed = store(&server, "primary").insert(candidate()).await.unwrap();
        assert_eq!(committed.id, "evt123");
        assert_eq!(committed.link, "https://calendar.google.com/event?eid=evt123");
        assert_eq!(committed.event, candidate());
    }

    #[tokio::test]
    async fn test_insert_rejection_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(400).set_body_string("{\"error\": \"Invalid attendee email\"}"),
            )
            .expect(1)
            .mount(&server)
            .await;

        match store(&server, "primary").insert(candidate()).await {
            Err(CalendarError::Rejected { status, message }) => {
                assert_eq!(status, 400);
                assert!(message.contains("Invalid attendee email"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_calendar_id_stays_one_path_segment() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/calendar/v3/calendars/team%2Fops@group.calendar.google.com/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
            .expect(1)
            .mount(&server)
            .await;

        let events = store(&server, "team/ops@group.calendar.google.com").list_upcoming(5).await.unwrap();
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_list_upcoming_queries_ordered_single_events() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/calendar/v3/calendars/primary/events"))
            .and(query_param("timeMin", "2026-10-19T10:00:00Z"))
            .and(query_param("maxResults", "3"))
            .and(query_param("singleEvents", "true"))
            .and(query_param("orderBy", "startTime"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    {"id": "a", "summary": "standup", "start": {"dateTime": "2026-10-19T11:00:00Z"}},
                    {"id": "b", "start": {"date": "2026-10-20"}},
                    {"id": "c", "summary": "broken", "start": {}}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let now = Utc.with_ymd_and_hms(2026, 10, 19, 10, 0, 0).unwrap();
        let events = store(&server, "primary").list_from(now, 3).await.unwrap();
        assert_eq!(
            events,
            vec![
                CalendarEvent {
                    id: "a".to_string(),
                    summary: "standup".to_string(),
                    start: EventStart::DateTime(
                        DateTime::parse_from_rfc3339("2026-10-19T11:00:00Z").unwrap()
                    ),
                },
                CalendarEvent {
                    id: "b".to_string(),
                    summary: UNTITLED.to_string(),
                    start: EventStart::AllDay(NaiveDate::from_ymd_opt(2026, 10, 20).unwrap()),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_unauthorized_list_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid_grant"))
            .mount(&server)
            .await;

        let err = store(&server, "primary").list_upcoming(10).await.unwrap_err();
        assert!(matches!(err, CalendarError::Rejected { status: 401, .. }));
    }
}
