//! One parsed CSV record with alias-based field access.
//!
//! Column names vary across signal exports, so each logical field carries
//! an ordered alias list tried in priority order; the first present,
//! non-empty column wins. The alias lists are data so tests can enumerate
//! every accepted name.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::StringRecord;

use crate::status::SignalReading;

/// Column aliases for the row timestamp.
pub const TIMESTAMP_ALIASES: &[&str] = &["timestamp", "time", "date", "datetime", "ts"];

/// Column aliases for the godscore field.
pub const GODSCORE_ALIASES: &[&str] = &["godscore", "god_score", "gv", "gv_score", "score"];

/// Column aliases for the risk field.
pub const RISK_ALIASES: &[&str] = &["risk", "risk_score", "risk_level"];

/// Column aliases for the drift field.
pub const DRIFT_ALIASES: &[&str] = &["drift", "drift_score", "drift_rate"];

/// Column aliases for the recovery field.
pub const RECOVERY_ALIASES: &[&str] = &["recovery", "recovery_score", "recovery_rate"];

/// Timestamp layouts tried in order after RFC 3339.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// One CSV record, keyed by lowercased column name in column order.
#[derive(Debug, Clone, Default)]
pub struct SignalRow {
    fields: Vec<(String, String)>,
}

impl SignalRow {
    pub fn from_record(headers: &StringRecord, record: &StringRecord) -> Self {
        let fields = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.trim().to_lowercase(), v.trim().to_string()))
            .collect();
        Self { fields }
    }

    #[cfg(test)]
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self {
            fields: pairs
                .iter()
                .map(|(k, v)| (k.to_lowercase(), v.to_string()))
                .collect(),
        }
    }

    /// First alias with a non-empty value, in alias priority order.
    pub fn get(&self, aliases: &[&str]) -> Option<&str> {
        for alias in aliases {
            if let Some((_, value)) = self.fields.iter().find(|(name, _)| name == alias) {
                if !value.is_empty() {
                    return Some(value.as_str());
                }
            }
        }
        None
    }

    /// Numeric field lookup; unparsable text reads as absent.
    pub fn number(&self, aliases: &[&str]) -> Option<f64> {
        self.get(aliases).and_then(parse_number)
    }

    /// Raw timestamp text, if any timestamp-alias column is present.
    pub fn timestamp_text(&self) -> Option<&str> {
        self.get(TIMESTAMP_ALIASES)
    }

    /// Best-effort timestamp parse for recency ordering.
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        self.timestamp_text().and_then(parse_timestamp)
    }

    /// The four dashboard fields of this row.
    pub fn reading(&self) -> SignalReading {
        SignalReading {
            godscore: self.number(GODSCORE_ALIASES),
            risk: self.number(RISK_ALIASES),
            drift: self.number(DRIFT_ALIASES),
            recovery: self.number(RECOVERY_ALIASES),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.iter().all(|(_, v)| v.is_empty())
    }
}

/// Parse numeric text, tolerating a trailing percent sign.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim().trim_end_matches('%').trim();
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Try RFC 3339, then common datetime layouts, then bare dates.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }
    for format in TIMESTAMP_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date.and_hms_opt(0, 0, 0)?);
        }
    }
    None
}
