//! Three-state status derivation over the most recent signal reading.

use std::fmt;

use serde::{Deserialize, Serialize};

use gvbot_core::config::StatusThresholds;

/// Placeholder shown for a missing or unparsable field.
pub const MISSING_FIELD: &str = "-";

/// Dashboard status, worst band first in derivation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Stable,
    Drift,
    Recovery,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Stable => write!(f, "STABLE"),
            Status::Drift => write!(f, "DRIFT"),
            Status::Recovery => write!(f, "RECOVERY"),
        }
    }
}

/// The four numeric fields of one signal row. A missing field never trips
/// a threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalReading {
    pub godscore: Option<f64>,
    pub risk: Option<f64>,
    pub drift: Option<f64>,
    pub recovery: Option<f64>,
}

impl SignalReading {
    /// Render a field for display, with a dash for missing values.
    pub fn format_field(value: Option<f64>) -> String {
        match value {
            Some(v) => format!("{}", v),
            None => MISSING_FIELD.to_string(),
        }
    }
}

/// Derive the status band. RECOVERY and DRIFT are each a disjunction of
/// threshold tests; fields absent from the reading are skipped.
pub fn derive_status(reading: &SignalReading, thresholds: &StatusThresholds) -> Status {
    let at_least = |value: Option<f64>, limit: f64| value.map_or(false, |v| v >= limit);
    let at_most = |value: Option<f64>, limit: f64| value.map_or(false, |v| v <= limit);

    if at_least(reading.drift, thresholds.recovery_drift)
        || at_least(reading.risk, thresholds.recovery_risk)
        || at_most(reading.godscore, thresholds.recovery_godscore)
    {
        return Status::Recovery;
    }
    if at_least(reading.drift, thresholds.drift_drift)
        || at_least(reading.risk, thresholds.drift_risk)
        || at_most(reading.godscore, thresholds.drift_godscore)
    {
        return Status::Drift;
    }
    Status::Stable
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds() -> StatusThresholds {
        StatusThresholds::default()
    }

    fn reading(godscore: Option<f64>, risk: Option<f64>, drift: Option<f64>) -> SignalReading {
        SignalReading {
            godscore,
            risk,
            drift,
            recovery: None,
        }
    }

    // ---- Band derivation ----

    #[test]
    fn test_high_drift_is_recovery() {
        let r = reading(None, None, Some(0.4));
        assert_eq!(derive_status(&r, &thresholds()), Status::Recovery);
    }

    #[test]
    fn test_moderate_drift_is_drift() {
        let r = reading(None, None, Some(0.25));
        assert_eq!(derive_status(&r, &thresholds()), Status::Drift);
    }

    #[test]
    fn test_healthy_reading_is_stable() {
        let r = reading(Some(80.0), Some(0.1), Some(0.05));
        assert_eq!(derive_status(&r, &thresholds()), Status::Stable);
    }

    #[test]
    fn test_all_missing_is_stable() {
        let r = SignalReading::default();
        assert_eq!(derive_status(&r, &thresholds()), Status::Stable);
    }

    #[test]
    fn test_low_godscore_is_recovery() {
        let r = reading(Some(55.0), None, None);
        assert_eq!(derive_status(&r, &thresholds()), Status::Recovery);
    }

    #[test]
    fn test_mid_godscore_is_drift() {
        let r = reading(Some(70.0), None, None);
        assert_eq!(derive_status(&r, &thresholds()), Status::Drift);
    }

    #[test]
    fn test_high_risk_is_recovery() {
        let r = reading(None, Some(0.7), None);
        assert_eq!(derive_status(&r, &thresholds()), Status::Recovery);
    }

    #[test]
    fn test_moderate_risk_is_drift() {
        let r = reading(None, Some(0.5), None);
        assert_eq!(derive_status(&r, &thresholds()), Status::Drift);
    }

    #[test]
    fn test_recovery_outranks_drift() {
        // Drift field says DRIFT, risk field says RECOVERY.
        let r = reading(None, Some(0.8), Some(0.25));
        assert_eq!(derive_status(&r, &thresholds()), Status::Recovery);
    }

    #[test]
    fn test_thresholds_are_inclusive() {
        assert_eq!(
            derive_status(&reading(None, None, Some(0.35)), &thresholds()),
            Status::Recovery
        );
        assert_eq!(
            derive_status(&reading(None, None, Some(0.20)), &thresholds()),
            Status::Drift
        );
        assert_eq!(
            derive_status(&reading(Some(60.0), None, None), &thresholds()),
            Status::Recovery
        );
    }

    #[test]
    fn test_missing_field_never_trips_threshold() {
        // Only godscore present and healthy; absent risk/drift must not fire.
        let r = reading(Some(90.0), None, None);
        assert_eq!(derive_status(&r, &thresholds()), Status::Stable);
    }

    // ---- Display ----

    #[test]
    fn test_status_display() {
        assert_eq!(Status::Stable.to_string(), "STABLE");
        assert_eq!(Status::Drift.to_string(), "DRIFT");
        assert_eq!(Status::Recovery.to_string(), "RECOVERY");
    }

    #[test]
    fn test_format_field_dash_for_missing() {
        assert_eq!(SignalReading::format_field(None), "-");
        assert_eq!(SignalReading::format_field(Some(0.35)), "0.35");
    }
}
