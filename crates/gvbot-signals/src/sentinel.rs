//! GV sentinel: a normalized constraint strain score over named risk
//! signals, with band classification and per-system history.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimum effective constraint strength; avoids division blowup.
const MIN_CONSTRAINT: f64 = 0.01;

/// Actions recommended in the yellow band.
pub const YELLOW_ACTIONS: &[&str] = &["alert"];

/// Actions recommended in the red band.
pub const RED_ACTIONS: &[&str] = &["alert", "throttle", "require_human_review"];

/// Risk band shared by the sentinel and the runtime guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskBand {
    Green,
    Yellow,
    Red,
}

/// Compute the GV score: mean signal strain over effective constraint
/// strength, capped at 1.0 and rounded to three decimals.
pub fn compute_gv(signals: &BTreeMap<String, f64>, constraint_strength: f64) -> f64 {
    if signals.is_empty() {
        return 0.0;
    }
    let average_strain = signals.values().sum::<f64>() / signals.len() as f64;
    let effective_constraint = constraint_strength.max(MIN_CONSTRAINT);
    let gv = average_strain / effective_constraint;
    round3(gv.min(1.0))
}

/// Classify a GV score into a band and its recommended actions.
pub fn classify_gv(gv_score: f64) -> (RiskBand, Vec<String>) {
    let actions = |list: &[&str]| list.iter().map(|a| a.to_string()).collect();
    if gv_score < 0.5 {
        (RiskBand::Green, Vec::new())
    } else if gv_score < 0.75 {
        (RiskBand::Yellow, actions(YELLOW_ACTIONS))
    } else {
        (RiskBand::Red, actions(RED_ACTIONS))
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// One sentinel evaluation.
#[derive(Debug, Clone, Serialize)]
pub struct GvRecord {
    pub system_id: String,
    pub gv_score: f64,
    pub band: RiskBand,
    pub actions: Vec<String>,
    pub signals: BTreeMap<String, f64>,
    pub timestamp: DateTime<Utc>,
}

/// Runtime strain monitor for one observed system. Each evaluation is
/// appended to the history.
#[derive(Debug, Clone)]
pub struct Sentinel {
    system_id: String,
    constraint_strength: f64,
    history: Vec<GvRecord>,
}

impl Sentinel {
    pub fn new(system_id: impl Into<String>, constraint_strength: f64) -> Self {
        Self {
            system_id: system_id.into(),
            constraint_strength,
            history: Vec::new(),
        }
    }

    pub fn history(&self) -> &[GvRecord] {
        &self.history
    }

    /// Evaluate the current signal set and record the result.
    pub fn evaluate(&mut self, signals: BTreeMap<String, f64>) -> GvRecord {
        let gv_score = compute_gv(&signals, self.constraint_strength);
        let (band, actions) = classify_gv(gv_score);
        let record = GvRecord {
            system_id: self.system_id.clone(),
            gv_score,
            band,
            actions,
            signals,
            timestamp: Utc::now(),
        };
        self.history.push(record.clone());
        record
    }
}
