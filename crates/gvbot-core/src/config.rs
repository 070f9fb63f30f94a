use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;

/// Top-level configuration for GvBot.
///
/// Loaded from `~/.gvbot/config.toml` by default. Product-tuning constants
/// (status thresholds, preferred voice names, retrieval budgets) live here
/// rather than as literals so deployments can adjust them without rebuilds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GvBotConfig {
    pub general: GeneralConfig,
    pub relay: RelayConfig,
    pub retrieval: RetrievalConfig,
    pub voice: VoiceConfig,
    pub history: HistoryConfig,
    pub signals: SignalConfig,
    pub guard: GuardConfig,
}

impl GvBotConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: GvBotConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration, falling back to defaults if the file is missing
    /// or unparsable.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Data directory for history and cached files.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.gvbot/data".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Relay endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// HTTP endpoint that accepts the conversation and returns a reply.
    pub endpoint: String,
    /// Optional system preamble prepended to every request.
    pub system_preamble: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Rolling conversation window sent with each request.
    pub buffer_cap: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://gvbot-relay.example.workers.dev/".to_string(),
            system_preamble: None,
            timeout_secs: 30,
            buffer_cap: 16,
        }
    }
}

/// Knowledge retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Path to the knowledge index JSON document.
    pub index_path: Option<String>,
    /// Maximum chunks selected per query.
    pub top_k: usize,
    /// Character budget for the concatenated context.
    pub context_budget: usize,
    /// Maximum query tokens considered.
    pub max_query_tokens: usize,
    /// Chunk source names containing one of these substrings get a bonus.
    pub source_markers: Vec<String>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            index_path: None,
            top_k: 5,
            context_budget: 5500,
            max_query_tokens: 80,
            source_markers: vec!["core".to_string(), "primer".to_string()],
        }
    }
}

/// Voice output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Whether spoken replies are enabled.
    pub enabled: bool,
    /// Utterance rate multiplier.
    pub rate: f64,
    /// Utterance pitch multiplier.
    pub pitch: f64,
    /// Utterance volume (0.0 to 1.0).
    pub volume: f64,
    /// Preferred locale for voice selection.
    pub locale: String,
    /// Ordered voice-name substrings; first match wins.
    pub preferred_names: Vec<String>,
    /// A voice whose name or locale contains one of these is never selected.
    pub disallowed_markers: Vec<String>,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rate: 0.95,
            pitch: 1.05,
            volume: 1.0,
            locale: "en-US".to_string(),
            preferred_names: vec![
                "aria".to_string(),
                "jenny".to_string(),
                "samantha".to_string(),
                "serena".to_string(),
                "victoria".to_string(),
                "ava".to_string(),
                "google".to_string(),
                "zira".to_string(),
            ],
            disallowed_markers: vec!["es-".to_string(), "fr-".to_string(), "de-".to_string()],
        }
    }
}

/// Chat history persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// History file name inside the data directory.
    pub file_name: String,
    /// Most recent messages retained.
    pub max_messages: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            file_name: "history.json".to_string(),
            max_messages: 30,
        }
    }
}

/// Signal dashboard settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Ordered CSV source candidates (file paths or URLs); first success wins.
    pub sources: Vec<String>,
    /// Status derivation thresholds.
    pub thresholds: StatusThresholds,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            sources: vec!["signals.csv".to_string()],
            thresholds: StatusThresholds::default(),
        }
    }
}

/// Threshold tests for the three-state status derivation.
///
/// RECOVERY and DRIFT are each a disjunction: a reading trips the band if
/// any present field crosses its threshold; missing fields are skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusThresholds {
    /// RECOVERY if drift >= this.
    pub recovery_drift: f64,
    /// RECOVERY if risk >= this.
    pub recovery_risk: f64,
    /// RECOVERY if godscore <= this.
    pub recovery_godscore: f64,
    /// DRIFT if drift >= this.
    pub drift_drift: f64,
    /// DRIFT if risk >= this.
    pub drift_risk: f64,
    /// DRIFT if godscore <= this.
    pub drift_godscore: f64,
}

impl Default for StatusThresholds {
    fn default() -> Self {
        Self {
            recovery_drift: 0.35,
            recovery_risk: 0.65,
            recovery_godscore: 60.0,
            drift_drift: 0.20,
            drift_risk: 0.45,
            drift_godscore: 75.0,
        }
    }
}

/// Tunable parameters for the runtime guard.
///
/// Defaults are conservative; the update rule is
/// `gv' = clamp(gv + strain - damping * gv)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Pulls the score down each step (self-healing).
    pub damping: f64,
    /// Score lower bound.
    pub floor: f64,
    /// Score upper bound.
    pub ceiling: f64,
    /// Strain weight per generated token.
    pub w_tokens: f64,
    /// Strain weight per tool call.
    pub w_tool_calls: f64,
    /// Strain weight per error.
    pub w_errors: f64,
    /// Strain weight per repeated identical action.
    pub w_repeat: f64,
    /// Strain weight per recursion level.
    pub w_recursion: f64,
    /// Yellow band starts at this score.
    pub yellow_at: f64,
    /// Red band starts at this score.
    pub red_at: f64,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            damping: 0.06,
            floor: 0.0,
            ceiling: 100.0,
            w_tokens: 0.002,
            w_tool_calls: 1.25,
            w_errors: 3.0,
            w_repeat: 0.9,
            w_recursion: 0.6,
            yellow_at: 35.0,
            red_at: 70.0,
        }
    }
}
