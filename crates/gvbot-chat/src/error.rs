//! Error types for the conversational client.

use gvbot_core::error::GvBotError;

use crate::relay::RelayError;

/// Errors from the chat engine.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("a request is already in flight")]
    Busy,
    #[error("relay error: {0}")]
    Relay(#[from] RelayError),
    #[error("knowledge error: {0}")]
    Knowledge(String),
    #[error("voice error: {0}")]
    Voice(String),
    #[error("history error: {0}")]
    History(String),
}

impl From<ChatError> for GvBotError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Relay(e) => GvBotError::Relay(e.to_string()),
            ChatError::Knowledge(msg) => GvBotError::Knowledge(msg),
            ChatError::Voice(msg) => GvBotError::Voice(msg),
            ChatError::History(msg) => GvBotError::History(msg),
            other => GvBotError::Relay(other.to_string()),
        }
    }
}
