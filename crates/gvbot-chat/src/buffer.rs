//! Bounded rolling conversation buffer.
//!
//! Holds the recent window of messages sent with each relay request. Older
//! entries are discarded on overflow, not archived.

use std::collections::VecDeque;

use gvbot_core::types::Message;

/// Ordered message window with a fixed capacity.
///
/// `append` drops the oldest entries once the cap is exceeded; `snapshot`
/// returns a stable copy for transmission so an in-flight request is not
/// affected by later appends.
#[derive(Debug, Clone)]
pub struct ConversationBuffer {
    cap: usize,
    messages: VecDeque<Message>,
}

impl ConversationBuffer {
    /// Create an empty buffer with the given capacity.
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            messages: VecDeque::new(),
        }
    }

    /// Create a buffer seeded with existing messages, keeping only the most
    /// recent `cap` entries.
    pub fn with_messages(cap: usize, messages: impl IntoIterator<Item = Message>) -> Self {
        let mut buffer = Self::new(cap);
        for message in messages {
            buffer.append(message);
        }
        buffer
    }

    /// Append a message, evicting from the front until the cap holds.
    pub fn append(&mut self, message: Message) {
        self.messages.push_back(message);
        while self.messages.len() > self.cap {
            self.messages.pop_front();
        }
    }

    /// Stable ordered copy of the current window.
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }
}
