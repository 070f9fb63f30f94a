//! The chat session: one turn pipeline tying buffer, retrieval, relay, and
//! speech together.
//!
//! Side effects per turn happen in a fixed order: append user message ->
//! send -> (on success) append reply -> speak reply -> (on failure) append
//! error bubble. Further sends are rejected while a request is in flight,
//! and a reply is appended only after its turn id matches the in-flight
//! request, so replies can never race across turns.

use tracing::warn;
use uuid::Uuid;

use gvbot_core::types::{Message, VoiceDescriptor};

use crate::buffer::ConversationBuffer;
use crate::error::ChatError;
use crate::knowledge::{KnowledgeIndex, Retrieval, Retriever};
use crate::relay::{RelayError, RelayTransport};
use crate::speech::{SpeechQueue, Synthesizer};
use crate::voice::{VoiceRanker, VoiceSession};

/// Substituted bubble for a success response with no usable text.
const NO_TEXT_BUBBLE: &str = "(No text returned)";

/// How a turn resolved. Both variants correspond to exactly one appended
/// assistant message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The relay answered; the reply was appended and queued for speech.
    Reply(String),
    /// The exchange failed; a fallback bubble was appended, nothing spoken.
    Fallback(String),
}

impl TurnOutcome {
    /// The visible bubble text either way.
    pub fn text(&self) -> &str {
        match self {
            TurnOutcome::Reply(text) | TurnOutcome::Fallback(text) => text,
        }
    }
}

/// A single conversation with the relay.
pub struct ChatSession<T: RelayTransport, S: Synthesizer> {
    id: Uuid,
    buffer: ConversationBuffer,
    transport: T,
    speech: SpeechQueue<S>,
    system_preamble: Option<String>,
    knowledge: Option<(KnowledgeIndex, Retriever)>,
    voice: VoiceSession,
    log: Vec<Message>,
    next_turn: u64,
    in_flight: Option<u64>,
    last_retrieval: Retrieval,
}

impl<T: RelayTransport, S: Synthesizer> ChatSession<T, S> {
    pub fn new(
        transport: T,
        speech: SpeechQueue<S>,
        buffer_cap: usize,
        system_preamble: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            buffer: ConversationBuffer::new(buffer_cap),
            transport,
            speech,
            system_preamble,
            knowledge: None,
            voice: VoiceSession::new(),
            log: Vec::new(),
            next_turn: 0,
            in_flight: None,
            last_retrieval: Retrieval::default(),
        }
    }

    /// Attach a knowledge index; subsequent queries get grounding context.
    pub fn with_knowledge(mut self, index: KnowledgeIndex, retriever: Retriever) -> Self {
        self.knowledge = Some((index, retriever));
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Full ordered display log (not the bounded transmission window).
    pub fn log(&self) -> &[Message] {
        &self.log
    }

    /// Chunks behind the most recent grounded turn, for citation.
    pub fn last_retrieval(&self) -> &Retrieval {
        &self.last_retrieval
    }

    /// Seed buffer and log from persisted history.
    pub fn seed_history(&mut self, messages: Vec<Message>) {
        for message in &messages {
            self.buffer.append(message.clone());
        }
        self.log.extend(messages);
    }

    /// Toggle spoken replies; disabling cancels in-progress speech.
    pub fn set_voice_enabled(&mut self, enabled: bool) {
        self.speech.set_enabled(enabled);
    }

    /// Set the voice name used for subsequent utterances.
    pub fn set_voice(&mut self, voice: Option<String>) {
        self.speech.set_voice(voice);
    }

    /// Record an explicit voice choice, applied on the next voice-list
    /// re-evaluation.
    pub fn choose_voice(&mut self, name: impl Into<String>) {
        self.voice.choose(name);
    }

    /// The selected voice after the last re-evaluation.
    pub fn current_voice(&self) -> Option<&VoiceDescriptor> {
        self.voice.current()
    }

    /// Re-rank against a fresh platform voice list and carry the selection
    /// onto subsequent utterances.
    pub fn voices_changed(&mut self, ranker: &VoiceRanker, voices: &[VoiceDescriptor]) {
        self.voice.voices_changed(ranker, voices);
        self.speech
            .set_voice(self.voice.current().map(|v| v.name.clone()));
    }

    /// Run one turn of the pipeline.
    ///
    /// Never returns a relay failure: transport, protocol, and empty-result
    /// failures all resolve to a `Fallback` bubble so the UI is never left
    /// in a "thinking" state.
    pub async fn send(&mut self, text: &str) -> Result<TurnOutcome, ChatError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if self.in_flight.is_some() {
            return Err(ChatError::Busy);
        }

        // 1. Append the user message.
        let user = Message::user(trimmed);
        self.buffer.append(user.clone());
        self.log.push(user);

        // 2. Capture a stable outgoing snapshot before suspending.
        let outgoing = self.build_outgoing(trimmed);

        let turn = self.next_turn;
        self.next_turn += 1;
        self.in_flight = Some(turn);

        // 3. The single suspension point of the exchange.
        let result = self.transport.exchange(&outgoing).await;

        // Ordering check: only the matching in-flight turn may append.
        if self.in_flight != Some(turn) {
            warn!(turn, "Stale relay reply dropped");
            return Err(ChatError::Busy);
        }
        self.in_flight = None;

        match result {
            Ok(reply) => {
                // 4. Append the reply, then speak it.
                let assistant = Message::assistant(reply.clone());
                self.buffer.append(assistant.clone());
                self.log.push(assistant);

                self.speech.speak(&reply);
                if let Err(e) = self.speech.drain().await {
                    // Speech failure is a local capability problem, never
                    // fatal to the turn.
                    warn!(error = %e, "Speech output failed");
                }
                Ok(TurnOutcome::Reply(reply))
            }
            Err(err) => {
                let bubble = fallback_bubble(&err);
                let assistant = Message::assistant(bubble.clone());
                self.buffer.append(assistant.clone());
                self.log.push(assistant);
                Ok(TurnOutcome::Fallback(bubble))
            }
        }
    }

    fn build_outgoing(&mut self, query: &str) -> Vec<Message> {
        let mut outgoing = Vec::new();
        if let Some(ref preamble) = self.system_preamble {
            outgoing.push(Message::system(preamble.clone()));
        }
        if let Some((ref index, ref retriever)) = self.knowledge {
            let retrieval = retriever.retrieve(index, query);
            if !retrieval.context.is_empty() {
                outgoing.push(Message::system(format!(
                    "Reference material:\n\n{}",
                    retrieval.context
                )));
            }
            self.last_retrieval = retrieval;
        }
        outgoing.extend(self.buffer.snapshot());
        outgoing
    }
}

/// Visible bubble text for a failed exchange.
fn fallback_bubble(err: &RelayError) -> String {
    match err {
        RelayError::EmptyReply => NO_TEXT_BUBBLE.to_string(),
        other => format!("Relay error: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use gvbot_core::config::{RetrievalConfig, VoiceConfig};
    use gvbot_core::types::{KnowledgeChunk, Role};

    use super::*;
    use crate::speech::test_support::RecordingSynthesizer;

    /// Scripted transport: pops one prepared result per exchange and
    /// records every outgoing message list.
    struct ScriptedTransport {
        script: Mutex<VecDeque<Result<String, RelayError>>>,
        seen: Mutex<Vec<Vec<Message>>>,
    }

    impl ScriptedTransport {
        fn new(script: Vec<Result<String, RelayError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn reply(text: &str) -> Self {
            Self::new(vec![Ok(text.to_string())])
        }
    }

    #[async_trait]
    impl RelayTransport for ScriptedTransport {
        async fn exchange(&self, messages: &[Message]) -> Result<String, RelayError> {
            self.seen.lock().unwrap().push(messages.to_vec());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(RelayError::Transport("script exhausted".to_string())))
        }
    }

    fn session(
        transport: ScriptedTransport,
    ) -> (
        ChatSession<ScriptedTransport, RecordingSynthesizer>,
        RecordingSynthesizer,
    ) {
        let synth = RecordingSynthesizer::default();
        let speech = SpeechQueue::new(synth.clone(), &VoiceConfig::default());
        (ChatSession::new(transport, speech, 16, None), synth)
    }

    // ---- Success path ----

    #[tokio::test]
    async fn test_success_appends_one_reply_and_speaks_once() {
        let (mut s, synth) = session(ScriptedTransport::reply("hi"));
        let outcome = s.send("hello").await.unwrap();
        assert_eq!(outcome, TurnOutcome::Reply("hi".to_string()));

        let assistant: Vec<&Message> =
            s.log().iter().filter(|m| m.role == Role::Assistant).collect();
        assert_eq!(assistant.len(), 1);
        assert_eq!(assistant[0].content, "hi");
        assert_eq!(synth.spoken(), vec!["hi"]);
    }

    #[tokio::test]
    async fn test_side_effect_order_user_then_send_then_reply() {
        let transport = ScriptedTransport::reply("answer");
        let (mut s, _) = session(transport);
        s.send("question").await.unwrap();

        // The transport saw the user message (appended before the send).
        let seen = s.transport.seen.lock().unwrap();
        let last = seen[0].last().unwrap();
        assert_eq!(last.role, Role::User);
        assert_eq!(last.content, "question");

        // The log shows user then assistant.
        assert_eq!(s.log()[0].role, Role::User);
        assert_eq!(s.log()[1].role, Role::Assistant);
    }

    // ---- Failure path ----

    #[tokio::test]
    async fn test_status_failure_appends_bubble_no_speech() {
        let transport = ScriptedTransport::new(vec![Err(RelayError::Status {
            code: 500,
            message: "boom".to_string(),
        })]);
        let (mut s, synth) = session(transport);
        let outcome = s.send("hello").await.unwrap();

        let TurnOutcome::Fallback(bubble) = outcome else {
            panic!("expected fallback");
        };
        assert!(bubble.contains("boom"));

        let assistant: Vec<&Message> =
            s.log().iter().filter(|m| m.role == Role::Assistant).collect();
        assert_eq!(assistant.len(), 1);
        assert!(assistant[0].content.contains("boom"));
        assert!(synth.spoken().is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_appends_bubble() {
        let transport = ScriptedTransport::new(vec![Err(RelayError::Transport(
            "connection refused".to_string(),
        ))]);
        let (mut s, synth) = session(transport);
        let outcome = s.send("hello").await.unwrap();
        assert!(outcome.text().contains("connection refused"));
        assert!(synth.spoken().is_empty());
    }

    #[tokio::test]
    async fn test_empty_reply_substitutes_placeholder() {
        let transport = ScriptedTransport::new(vec![Err(RelayError::EmptyReply)]);
        let (mut s, _) = session(transport);
        let outcome = s.send("hello").await.unwrap();
        assert_eq!(outcome.text(), "(No text returned)");
    }

    #[tokio::test]
    async fn test_failed_turn_leaves_session_usable() {
        let transport = ScriptedTransport::new(vec![
            Err(RelayError::Transport("down".to_string())),
            Ok("recovered".to_string()),
        ]);
        let (mut s, _) = session(transport);
        s.send("first").await.unwrap();
        let outcome = s.send("second").await.unwrap();
        assert_eq!(outcome, TurnOutcome::Reply("recovered".to_string()));
    }

    // ---- Validation ----

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let (mut s, _) = session(ScriptedTransport::reply("unused"));
        assert!(matches!(s.send("   ").await, Err(ChatError::EmptyMessage)));
        assert!(s.log().is_empty());
    }

    // ---- Preamble and retrieval ----

    #[tokio::test]
    async fn test_system_preamble_sent_first() {
        let transport = ScriptedTransport::reply("ok");
        let synth = RecordingSynthesizer::default();
        let speech = SpeechQueue::new(synth, &VoiceConfig::default());
        let mut s = ChatSession::new(transport, speech, 16, Some("You are Gv.".to_string()));
        s.send("hello").await.unwrap();

        let seen = s.transport.seen.lock().unwrap();
        assert_eq!(seen[0][0].role, Role::System);
        assert_eq!(seen[0][0].content, "You are Gv.");
    }

    #[tokio::test]
    async fn test_retrieval_context_injected_as_system_message() {
        let index = KnowledgeIndex::from_chunks(vec![KnowledgeChunk {
            source: "handbook".to_string(),
            url: None,
            text: "drift rises before recovery".to_string(),
            tags: vec!["drift".to_string()],
        }]);
        let retriever = Retriever::new(&RetrievalConfig::default());
        let (s, _) = session(ScriptedTransport::reply("ok"));
        let mut s = s.with_knowledge(index, retriever);
        s.send("what is drift").await.unwrap();

        let seen = s.transport.seen.lock().unwrap();
        let system: Vec<&Message> = seen[0].iter().filter(|m| m.role == Role::System).collect();
        assert_eq!(system.len(), 1);
        assert!(system[0].content.contains("drift rises before recovery"));
        drop(seen);
        assert_eq!(s.last_retrieval().picks.len(), 1);
    }

    #[tokio::test]
    async fn test_no_context_no_extra_system_message() {
        let index = KnowledgeIndex::from_chunks(vec![KnowledgeChunk {
            source: "handbook".to_string(),
            url: None,
            text: "unrelated body".to_string(),
            tags: vec![],
        }]);
        let retriever = Retriever::new(&RetrievalConfig::default());
        let (s, _) = session(ScriptedTransport::reply("ok"));
        let mut s = s.with_knowledge(index, retriever);
        s.send("zzz qqq").await.unwrap();

        let seen = s.transport.seen.lock().unwrap();
        assert!(seen[0].iter().all(|m| m.role != Role::System));
    }

    // ---- Buffer bounds across turns ----

    #[tokio::test]
    async fn test_buffer_window_bounded_across_turns() {
        let script: Vec<Result<String, RelayError>> =
            (0..20).map(|i| Ok(format!("reply {}", i))).collect();
        let transport = ScriptedTransport::new(script);
        let synth = RecordingSynthesizer::default();
        let speech = SpeechQueue::new(synth, &VoiceConfig::default());
        let mut s = ChatSession::new(transport, speech, 6, None);

        for i in 0..20 {
            s.send(&format!("message {}", i)).await.unwrap();
        }

        // The transmitted window never exceeds the cap.
        let seen = s.transport.seen.lock().unwrap();
        assert!(seen.iter().all(|msgs| msgs.len() <= 6));
        // The display log keeps everything.
        assert_eq!(s.log.len(), 40);
    }

    // ---- History seeding ----

    #[tokio::test]
    async fn test_seed_history_feeds_buffer_and_log() {
        let (mut s, _) = session(ScriptedTransport::reply("ok"));
        s.seed_history(vec![Message::user("old"), Message::assistant("older reply")]);
        assert_eq!(s.log().len(), 2);

        s.send("new").await.unwrap();
        let seen = s.transport.seen.lock().unwrap();
        assert_eq!(seen[0].len(), 3); // old pair + new user message
        assert_eq!(seen[0][0].content, "old");
    }

    // ---- Voice toggle and selection ----

    #[tokio::test]
    async fn test_voice_disabled_no_speech_on_reply() {
        let (mut s, synth) = session(ScriptedTransport::reply("quiet"));
        s.set_voice_enabled(false);
        s.send("hello").await.unwrap();
        assert!(synth.spoken().is_empty());
    }

    #[tokio::test]
    async fn test_selected_voice_carried_onto_utterances() {
        let ranker = VoiceRanker::new(&VoiceConfig::default());
        let voices = [
            VoiceDescriptor::new("Microsoft Zira", "en-US"),
            VoiceDescriptor::new("Microsoft Aria", "en-US"),
        ];
        let (mut s, synth) = session(ScriptedTransport::reply("spoken"));
        s.voices_changed(&ranker, &voices);
        assert_eq!(s.current_voice().unwrap().name, "Microsoft Aria");

        s.send("hello").await.unwrap();
        assert_eq!(
            synth.spoken_voices(),
            vec![Some("Microsoft Aria".to_string())]
        );
    }

    #[tokio::test]
    async fn test_explicit_voice_choice_applied_on_reevaluation() {
        let ranker = VoiceRanker::new(&VoiceConfig::default());
        let voices = [
            VoiceDescriptor::new("Microsoft Zira", "en-US"),
            VoiceDescriptor::new("Microsoft Aria", "en-US"),
        ];
        let (mut s, _) = session(ScriptedTransport::reply("spoken"));
        s.choose_voice("Microsoft Zira");
        s.voices_changed(&ranker, &voices);
        assert_eq!(s.current_voice().unwrap().name, "Microsoft Zira");
    }
}
