//! Best-effort chat history persistence.
//!
//! The rolling history (most recent messages only) is stored as a small JSON
//! file. Corrupt or missing data loads as an empty history and is never
//! fatal to the session.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use gvbot_core::types::Message;

use crate::error::ChatError;

/// On-disk history document.
#[derive(Debug, Default, Serialize, Deserialize)]
struct HistoryFile {
    #[serde(default)]
    messages: Vec<Message>,
}

/// File-backed store for the last `max_messages` chat messages.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
    max_messages: usize,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>, max_messages: usize) -> Self {
        Self {
            path: path.into(),
            max_messages,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load persisted messages. Missing or corrupt data yields an empty
    /// history with a warning, never an error.
    pub fn load(&self) -> Vec<Message> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return Vec::new(),
        };
        match serde_json::from_str::<HistoryFile>(&raw) {
            Ok(file) => file.messages,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Corrupt history file; starting empty");
                Vec::new()
            }
        }
    }

    /// Persist the most recent `max_messages` entries.
    pub fn save(&self, messages: &[Message]) -> Result<(), ChatError> {
        let start = messages.len().saturating_sub(self.max_messages);
        let file = HistoryFile {
            messages: messages[start..].to_vec(),
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ChatError::History(e.to_string()))?;
        }
        let json =
            serde_json::to_string_pretty(&file).map_err(|e| ChatError::History(e.to_string()))?;
        std::fs::write(&self.path, json).map_err(|e| ChatError::History(e.to_string()))
    }
}
