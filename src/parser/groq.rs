//! Groq oracle client.
//!
//! Talks to any OpenAI-compatible chat-completions endpoint; the defaults
//! point at Groq. JSON-only output is requested through `response_format`.

use super::traits::{ExtractionError, IntentOracle, OracleRequest};
use crate::config::LanguageModelConfig;
use async_trait::async_trait;
use log::debug;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Chat-completions client used as the intent oracle
pub struct GroqClient {
    http: Client,
    api_key: SecretString,
    endpoint: String,
    model: String,
    temperature: f32,
    timeout: Duration,
}

impl GroqClient {
    pub fn new(
        api_key: SecretString,
        config: &LanguageModelConfig,
        timeout: Duration,
    ) -> Result<Self, ExtractionError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExtractionError::Network(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            api_key,
            endpoint: format!("{}/chat/completions", config.api_base.trim_end_matches('/')),
            model: config.model.clone(),
            temperature: config.temperature,
            timeout,
        })
    }

    fn map_send_error(&self, e: reqwest::Error) -> ExtractionError {
        if e.is_timeout() {
            ExtractionError::Timeout(self.timeout)
        } else {
            ExtractionError::Network(e.to_string())
        }
    }
}

#[async_trait]
impl IntentOracle for GroqClient {
    async fn complete(&self, request: &OracleRequest) -> Result<String, ExtractionError> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: &request.system },
                ChatMessage { role: "user", content: &request.prompt },
            ],
            temperature: self.temperature,
            response_format: ResponseFormat { format_type: "json_object" },
        };

        debug!("Sending extraction request to {} (model {})", self.endpoint, self.model);
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        debug!("Oracle responded with status {}", status);
        if !status.is_success() {
            let message = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    ExtractionError::Authentication(format!("Invalid API key ({})", status))
                }
                _ => ExtractionError::Api { status: status.as_u16(), message },
            });
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            ExtractionError::Network(format!("Failed to decode oracle response: {}", e))
        })?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(ExtractionError::EmptyResponse)
    }
}
