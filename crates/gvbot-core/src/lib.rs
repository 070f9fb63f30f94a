//! Shared foundation for the GvBot workspace.
//!
//! Holds the configuration model, the top-level error type, and the domain
//! types exchanged between the chat and signal crates.

pub mod config;
pub mod error;
pub mod types;

pub use config::GvBotConfig;
pub use error::{GvBotError, Result};
pub use types::{KnowledgeChunk, Message, Role, VoiceDescriptor};
