// Full pipeline over HTTP, with both the oracle and the calendar mocked.
use chrono::{TimeZone, Utc};
use chrono_tz::Tz;
use huddle::app::{Application, Outcome};
use huddle::calendar::{format_upcoming, GoogleCalendarStore};
use huddle::composer::CandidateEvent;
use huddle::config::{CalendarConfig, LanguageModelConfig};
use huddle::confirm::{Confirmer, Decision};
use huddle::parser::{GroqClient, IntentExtractor};
use huddle::ContactDirectory;
use rustyline::error::ReadlineError;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Answer(Decision);

impl Confirmer for Answer {
    fn confirm(&mut self, _event: &CandidateEvent) -> Result<Decision, ReadlineError> {
        Ok(self.0)
    }
}

async fn application(server: &MockServer) -> Application {
    let llm = LanguageModelConfig {
        api_base: format!("{}/openai/v1", server.uri()),
        ..LanguageModelConfig::default()
    };
    let calendar = CalendarConfig {
        api_base: format!("{}/calendar/v3", server.uri()),
        ..CalendarConfig::default()
    };
    let timeout = Duration::from_secs(5);
    let oracle = GroqClient::new("groq-key".to_string().into(), &llm, timeout).unwrap();
    let store = GoogleCalendarStore::new("ya29.token".to_string().into(), &calendar, timeout).unwrap();
    let directory = ContactDirectory::from_json(
        r#"{"Sam": "sam@x.com", "design team": ["sam@x.com", "dee@x.com"]}"#,
    )
    .unwrap();

    Application::new(directory, IntentExtractor::new(Box::new(oracle), Tz::UTC), Box::new(store), Tz::UTC)
}

async fn mock_oracle(server: &MockServer, content: &str) {
    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_lunch_with_sam_and_design_team() {
    let server = MockServer::start().await;
    mock_oracle(
        &server,
        r#"{"summary": "Lunch", "time": "2026-10-23T12:00:00", "guests": ["Sam", "design team"]}"#,
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/calendar/v3/calendars/primary/events"))
        .and(query_param("sendUpdates", "all"))
        .and(body_partial_json(json!({
            "summary": "Lunch",
            "start": {"dateTime": "2026-10-23T12:00:00Z", "timeZone": "UTC"},
            "end": {"dateTime": "2026-10-23T13:00:00Z", "timeZone": "UTC"},
            "attendees": [{"email": "dee@x.com"}, {"email": "sam@x.com"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "evt42",
            "htmlLink": "https://calendar.google.com/event?eid=evt42"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/calendar/v3/calendars/primary/events"))
        .and(query_param("maxResults", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"id": "evt42", "summary": "Lunch", "start": {"dateTime": "2026-10-23T12:00:00Z"}}]
        })))
        .mount(&server)
        .await;

    let app = application(&server).await;
    let now = Utc.with_ymd_and_hms(2026, 10, 19, 10, 0, 0).unwrap();
    let outcome = app
        .process_at("lunch with Sam and the design team Friday at noon", now, &mut Answer(Decision::Accepted))
        .await
        .unwrap();

    let Outcome::Committed(committed) = outcome else {
        panic!("expected a committed event");
    };
    assert_eq!(committed.link, "https://calendar.google.com/event?eid=evt42");

    let upcoming = app.upcoming(10).await.unwrap();
    assert!(format_upcoming(&upcoming).contains("10-23  12:00  Lunch"));
}

#[tokio::test]
async fn test_rejected_request_sends_nothing_to_calendar() {
    let server = MockServer::start().await;
    mock_oracle(&server, r#"{"summary": "Sync", "time": "2026-10-20T15:00:00", "guests": []}"#).await;
    Mock::given(method("POST"))
        .and(path("/calendar/v3/calendars/primary/events"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let app = application(&server).await;
    let now = Utc.with_ymd_and_hms(2026, 10, 19, 10, 0, 0).unwrap();
    let outcome = app.process_at("sync", now, &mut Answer(Decision::Rejected)).await.unwrap();

    assert!(matches!(outcome, Outcome::Rejected(_)));
}
