//! Conversational client for GvBot.
//!
//! Maintains a bounded rolling conversation buffer, grounds queries with
//! keyword-retrieved knowledge chunks, exchanges the conversation with the
//! external relay, and queues spoken replies behind a synthesizer seam.

pub mod buffer;
pub mod error;
pub mod history;
pub mod knowledge;
pub mod relay;
pub mod session;
pub mod speech;
pub mod voice;

pub use buffer::ConversationBuffer;
pub use error::ChatError;
pub use history::HistoryStore;
pub use knowledge::{KnowledgeIndex, Retrieval, Retriever};
pub use relay::{RelayClient, RelayError, RelayTransport};
pub use session::{ChatSession, TurnOutcome};
pub use speech::{LoggingSynthesizer, SpeechQueue, Synthesizer, UtteranceParams};
pub use voice::{VoiceRanker, VoiceSession};
