//! Relay transport: single request/response exchange with the external
//! relay endpoint.
//!
//! The relay is opaque; the wire contract is a POST of the message list and
//! a JSON reply whose field name varies. Field aliases are kept as ordered
//! data so the full set is enumerable in tests.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use gvbot_core::config::RelayConfig;
use gvbot_core::types::Message;

/// Reply field aliases tried in order; first non-empty wins.
pub const REPLY_ALIASES: &[&str] = &["reply", "text", "message", "output_text"];

/// Error field aliases tried in order on a non-2xx response.
pub const ERROR_ALIASES: &[&str] = &["error", "message"];

/// Typed relay failure. Transport and protocol failures are recovered by
/// the caller as a substituted chat bubble; none are fatal.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Network unreachable, timeout, or other client-side failure.
    #[error("relay unreachable: {0}")]
    Transport(String),
    /// Non-2xx status with the extracted (or generic) error text.
    #[error("{message}")]
    Status { code: u16, message: String },
    /// 2xx response with no usable reply text.
    #[error("relay returned no text")]
    EmptyReply,
}

/// Request body: `{"messages": [...]}`.
#[derive(Debug, Serialize)]
struct RelayRequest<'a> {
    messages: &'a [Message],
}

/// Extract the reply from a success (2xx) body.
///
/// Malformed JSON degrades to treating the raw body as the reply text; a
/// well-formed body with no non-empty alias is an empty-result failure.
pub fn parse_success_body(raw: &str) -> Result<String, RelayError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => {
            for alias in REPLY_ALIASES {
                if let Some(text) = value.get(alias).and_then(Value::as_str) {
                    if !text.is_empty() {
                        return Ok(text.to_string());
                    }
                }
            }
            Err(RelayError::EmptyReply)
        }
        Err(_) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                Err(RelayError::EmptyReply)
            } else {
                Ok(trimmed.to_string())
            }
        }
    }
}

/// Build the error for a non-2xx response: first error-alias text, else a
/// generic status-coded message.
pub fn parse_failure_body(status: u16, raw: &str) -> RelayError {
    if let Ok(value) = serde_json::from_str::<Value>(raw) {
        for alias in ERROR_ALIASES {
            if let Some(text) = value.get(alias).and_then(Value::as_str) {
                if !text.is_empty() {
                    return RelayError::Status {
                        code: status,
                        message: text.to_string(),
                    };
                }
            }
        }
    }
    RelayError::Status {
        code: status,
        message: format!("Relay error ({})", status),
    }
}

/// Classify a raw status + body pair into a reply or a typed failure.
pub fn parse_relay_response(status: u16, raw: &str) -> Result<String, RelayError> {
    if (200..300).contains(&status) {
        parse_success_body(raw)
    } else {
        Err(parse_failure_body(status, raw))
    }
}

/// Seam for the relay exchange so sessions can be tested without a network.
#[async_trait]
pub trait RelayTransport: Send + Sync {
    async fn exchange(&self, messages: &[Message]) -> Result<String, RelayError>;
}

/// HTTP relay client.
pub struct RelayClient {
    client: reqwest::Client,
    endpoint: String,
}

impl RelayClient {
    pub fn new(config: &RelayConfig) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RelayError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RelayTransport for RelayClient {
    async fn exchange(&self, messages: &[Message]) -> Result<String, RelayError> {
        let request = RelayRequest { messages };
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| RelayError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let raw = response
            .text()
            .await
            .map_err(|e| RelayError::Transport(e.to_string()))?;
        debug!(status, bytes = raw.len(), "Relay response received");

        parse_relay_response(status, &raw)
    }
}
