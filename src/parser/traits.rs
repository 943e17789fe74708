//! Parser traits module for Huddle
//!
//! Defines the seam between the intent extractor and whatever service turns
//! text into structure, plus the error type every extraction step shares.

use async_trait::async_trait;
use std::time::Duration;

/// A single request to the text-to-structure oracle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleRequest {
    /// Instruction fixing the output format
    pub system: String,
    /// User text plus context (date, valid guest names)
    pub prompt: String,
}

/// Errors raised while turning free text into a raw intent
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("Invalid request text: {0}")]
    InvalidInput(String),

    #[error("Oracle request failed: {0}")]
    Network(String),

    #[error("Oracle request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Oracle authentication failed: {0}")]
    Authentication(String),

    #[error("Oracle API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Oracle returned no content")]
    EmptyResponse,

    #[error("Oracle returned malformed intent ({reason}): {content}")]
    Malformed { reason: String, content: String },
}

/// Text-to-structure oracle. One blocking round trip per call, no retries.
#[async_trait]
pub trait IntentOracle: Send + Sync {
    /// Send the request and return the raw response content
    async fn complete(&self, request: &OracleRequest) -> Result<String, ExtractionError>;
}
