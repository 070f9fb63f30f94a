//! Deterministic runtime guard over agent-loop telemetry.
//!
//! Update rule: `gv' = clamp(gv + strain - damping * gv)`. The damping term
//! pulls the score back toward zero each step, so a quiet loop recovers on
//! its own while sustained strain ratchets the score into the yellow and
//! red bands.

use serde::{Deserialize, Serialize};
use tracing::debug;

use gvbot_core::config::GuardConfig;

use crate::sentinel::RiskBand;

/// Added strain when a step's latency exceeds this, in milliseconds.
const LATENCY_PENALTY_AT_MS: u64 = 1500;
const LATENCY_PENALTY: f64 = 0.5;

/// Telemetry deltas for one step of an agent or tool loop. All fields are
/// observable from the host loop without model introspection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSignals {
    /// Tokens generated since the last step.
    pub token_delta: i64,
    /// Tool calls since the last step.
    pub tool_calls_delta: i64,
    /// Errors since the last step.
    pub error_delta: i64,
    /// Repeated identical actions since the last step.
    pub repeated_action_delta: i64,
    /// Current recursion depth.
    pub recursion_depth: i64,
    /// Wall-clock latency of the step, if measured.
    pub latency_ms: Option<u64>,
}

impl RuntimeSignals {
    /// Negative deltas read as zero.
    pub fn clamp_nonnegative(&self) -> Self {
        Self {
            token_delta: self.token_delta.max(0),
            tool_calls_delta: self.tool_calls_delta.max(0),
            error_delta: self.error_delta.max(0),
            repeated_action_delta: self.repeated_action_delta.max(0),
            recursion_depth: self.recursion_depth.max(0),
            latency_ms: self.latency_ms,
        }
    }
}

/// The recommendation for the host loop after one guard step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuardAction {
    Continue,
    Slow,
    Halt,
}

/// Output of one guard step, serializable for the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct GuardDecision {
    pub step: u64,
    pub gv: f64,
    pub strain: f64,
    pub band: RiskBand,
    pub recommended_action: GuardAction,
    pub signals: RuntimeSignals,
}

/// Damped strain accumulator with band thresholds.
#[derive(Debug, Clone)]
pub struct RuntimeGuard {
    config: GuardConfig,
    gv: f64,
    step: u64,
}

impl RuntimeGuard {
    pub fn new(config: GuardConfig) -> Self {
        Self {
            config,
            gv: 0.0,
            step: 0,
        }
    }

    pub fn reset(&mut self) {
        self.gv = 0.0;
        self.step = 0;
    }

    pub fn score(&self) -> f64 {
        self.gv
    }

    /// Weighted strain contributed by one step's telemetry.
    pub fn compute_strain(&self, signals: &RuntimeSignals) -> f64 {
        let s = signals.clamp_nonnegative();
        let c = &self.config;

        let mut strain = 0.0;
        strain += c.w_tokens * s.token_delta as f64;
        strain += c.w_tool_calls * s.tool_calls_delta as f64;
        strain += c.w_errors * s.error_delta as f64;
        strain += c.w_repeat * s.repeated_action_delta as f64;
        strain += c.w_recursion * s.recursion_depth as f64;

        // High latency often correlates with thrash.
        if s.latency_ms.map_or(false, |ms| ms > LATENCY_PENALTY_AT_MS) {
            strain += LATENCY_PENALTY;
        }

        strain
    }

    /// Advance one step and produce the banded decision. The decision
    /// echoes the clamped signal values, not the raw input.
    pub fn step(&mut self, signals: RuntimeSignals) -> GuardDecision {
        let signals = signals.clamp_nonnegative();
        let strain = self.compute_strain(&signals);

        let c = self.config.clone();
        let gv_next = (self.gv + strain - c.damping * self.gv).clamp(c.floor, c.ceiling);
        self.gv = gv_next;
        self.step += 1;

        let (band, recommended_action) = if gv_next >= c.red_at {
            (RiskBand::Red, GuardAction::Halt)
        } else if gv_next >= c.yellow_at {
            (RiskBand::Yellow, GuardAction::Slow)
        } else {
            (RiskBand::Green, GuardAction::Continue)
        };

        debug!(step = self.step, gv = gv_next, ?band, "Guard step");
        GuardDecision {
            step: self.step,
            gv: round4(gv_next),
            strain: round4(strain),
            band,
            recommended_action,
            signals,
        }
    }
}

fn round4(value: f64) -> f64 {
    (value * 10000.0).round() / 10000.0
}
