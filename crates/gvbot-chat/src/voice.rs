//! Voice selection over platform-supplied synthesis voices.
//!
//! The platform owns the voice list and may replace it at any time, so
//! selection is a pure ranking re-run on every change notification. An
//! explicit user choice takes priority over automatic ranking but survives
//! a re-evaluation only while the named voice is still present.

use tracing::debug;

use gvbot_core::config::VoiceConfig;
use gvbot_core::types::VoiceDescriptor;

/// Ranks voices by locale and name heuristics.
#[derive(Debug, Clone)]
pub struct VoiceRanker {
    locale: String,
    preferred_names: Vec<String>,
    disallowed_markers: Vec<String>,
}

impl VoiceRanker {
    pub fn new(config: &VoiceConfig) -> Self {
        Self {
            locale: config.locale.to_lowercase(),
            preferred_names: config
                .preferred_names
                .iter()
                .map(|n| n.to_lowercase())
                .collect(),
            disallowed_markers: config
                .disallowed_markers
                .iter()
                .map(|m| m.to_lowercase())
                .collect(),
        }
    }

    /// A voice carrying a disallowed marker in its name or locale is never
    /// selected, regardless of any other rank.
    pub fn is_allowed(&self, voice: &VoiceDescriptor) -> bool {
        let name = voice.name.to_lowercase();
        let lang = normalize_lang(&voice.lang);
        !self
            .disallowed_markers
            .iter()
            .any(|marker| name.contains(marker.as_str()) || lang.contains(marker.as_str()))
    }

    /// Pick the best available voice.
    ///
    /// Preference order: first preferred-name match among target-locale
    /// voices, then the first target-locale voice, then the first
    /// English-locale voice, then the first voice overall, then none.
    pub fn select(&self, voices: &[VoiceDescriptor]) -> Option<VoiceDescriptor> {
        let allowed: Vec<&VoiceDescriptor> =
            voices.iter().filter(|v| self.is_allowed(v)).collect();
        if allowed.is_empty() {
            return None;
        }

        let locals: Vec<&&VoiceDescriptor> = allowed
            .iter()
            .filter(|v| self.matches_locale(v))
            .collect();

        for preferred in &self.preferred_names {
            if let Some(found) = locals
                .iter()
                .find(|v| v.name.to_lowercase().contains(preferred.as_str()))
            {
                return Some((***found).clone());
            }
        }

        if let Some(first_local) = locals.first() {
            return Some((***first_local).clone());
        }

        if let Some(english) = allowed.iter().find(|v| is_english(v)) {
            return Some((**english).clone());
        }

        allowed.first().map(|v| (**v).clone())
    }

    fn matches_locale(&self, voice: &VoiceDescriptor) -> bool {
        normalize_lang(&voice.lang).starts_with(&self.locale)
            || voice.name.to_lowercase().contains(&self.locale)
    }
}

/// Lowercase a language tag and fold `_` separators to `-`.
fn normalize_lang(lang: &str) -> String {
    lang.to_lowercase().replace('_', "-")
}

fn is_english(voice: &VoiceDescriptor) -> bool {
    normalize_lang(&voice.lang).starts_with("en") || voice.name.to_lowercase().contains("english")
}

/// Tracks the chosen voice across platform voice-list changes.
#[derive(Debug, Clone, Default)]
pub struct VoiceSession {
    explicit_choice: Option<String>,
    current: Option<VoiceDescriptor>,
}

impl VoiceSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently selected voice, if any.
    pub fn current(&self) -> Option<&VoiceDescriptor> {
        self.current.as_ref()
    }

    /// Record an explicit user choice by voice name. Takes effect on the
    /// next re-evaluation if the named voice exists then.
    pub fn choose(&mut self, name: impl Into<String>) {
        self.explicit_choice = Some(name.into());
    }

    /// Clear the explicit choice and return to automatic ranking.
    pub fn clear_choice(&mut self) {
        self.explicit_choice = None;
    }

    /// Re-evaluate the selection against a fresh voice list.
    ///
    /// An explicit user choice wins while its voice is still present and
    /// allowed; otherwise the ranker decides.
    pub fn voices_changed(&mut self, ranker: &VoiceRanker, voices: &[VoiceDescriptor]) {
        if let Some(ref name) = self.explicit_choice {
            if let Some(found) = voices
                .iter()
                .find(|v| v.name == *name && ranker.is_allowed(v))
            {
                self.current = Some(found.clone());
                return;
            }
        }
        self.current = ranker.select(voices);
        debug!(voice = ?self.current.as_ref().map(|v| v.name.as_str()), "Voice selection re-evaluated");
    }
}
