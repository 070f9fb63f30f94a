//! Serialized speech output.
//!
//! Replaces callback-chained utterances with an explicit queue of pending
//! text segments drained by a single consumer that awaits each completion.
//! Starting a new spoken reply cancels whatever is in progress; disabling
//! voice cancels immediately. The synthesizer itself is a seam: the
//! platform engine is outside this system.

use std::collections::VecDeque;

use async_trait::async_trait;
use tracing::debug;

use gvbot_core::config::VoiceConfig;

use crate::error::ChatError;

/// Per-utterance synthesis parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct UtteranceParams {
    pub rate: f64,
    pub pitch: f64,
    pub volume: f64,
    /// Selected voice name, if any.
    pub voice: Option<String>,
}

impl UtteranceParams {
    pub fn from_config(config: &VoiceConfig) -> Self {
        Self {
            rate: config.rate,
            pitch: config.pitch,
            volume: config.volume,
            voice: None,
        }
    }
}

/// Seam over the platform speech engine.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Speak one utterance to completion.
    async fn utter(&self, text: &str, params: &UtteranceParams) -> Result<(), ChatError>;

    /// Cancel any utterance in progress.
    fn cancel(&self);
}

/// A synthesizer that reports utterances through the log. Used where no
/// platform engine is attached (headless runs, the CLI).
#[derive(Debug, Default)]
pub struct LoggingSynthesizer;

#[async_trait]
impl Synthesizer for LoggingSynthesizer {
    async fn utter(&self, text: &str, params: &UtteranceParams) -> Result<(), ChatError> {
        tracing::info!(
            rate = params.rate,
            pitch = params.pitch,
            voice = params.voice.as_deref().unwrap_or("auto"),
            "Speaking: {}",
            text
        );
        Ok(())
    }

    fn cancel(&self) {}
}

/// Single-consumer utterance queue.
pub struct SpeechQueue<S: Synthesizer> {
    synth: S,
    params: UtteranceParams,
    enabled: bool,
    pending: VecDeque<String>,
}

impl<S: Synthesizer> SpeechQueue<S> {
    pub fn new(synth: S, config: &VoiceConfig) -> Self {
        Self {
            synth,
            params: UtteranceParams::from_config(config),
            enabled: config.enabled,
            pending: VecDeque::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Set the voice name carried on subsequent utterances.
    pub fn set_voice(&mut self, voice: Option<String>) {
        self.params.voice = voice;
    }

    /// Toggle voice output. Disabling cancels any in-progress utterance and
    /// clears the queue immediately.
    pub fn set_enabled(&mut self, enabled: bool) {
        if !enabled {
            self.synth.cancel();
            self.pending.clear();
        }
        self.enabled = enabled;
    }

    /// Queue a reply for speaking, split into paragraph segments.
    ///
    /// Cancels the utterance in progress and discards anything still
    /// pending: a new reply always supersedes the old one. A no-op while
    /// voice is disabled.
    pub fn speak(&mut self, text: &str) {
        if !self.enabled {
            return;
        }
        self.synth.cancel();
        self.pending.clear();
        for segment in text.split("\n\n") {
            let segment = segment.trim();
            if !segment.is_empty() {
                self.pending.push_back(segment.to_string());
            }
        }
        debug!(segments = self.pending.len(), "Reply queued for speech");
    }

    /// Drain the queue, awaiting each utterance's completion before the
    /// next. Returns the number of segments spoken.
    pub async fn drain(&mut self) -> Result<usize, ChatError> {
        let mut spoken = 0;
        while let Some(segment) = self.pending.pop_front() {
            self.synth.utter(&segment, &self.params).await?;
            spoken += 1;
        }
        Ok(spoken)
    }

    /// Cancel the in-progress utterance and clear the queue.
    pub fn cancel(&mut self) {
        self.synth.cancel();
        self.pending.clear();
    }
}
