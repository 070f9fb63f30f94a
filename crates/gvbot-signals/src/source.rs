//! Ordered-candidate CSV loading and the dashboard report.
//!
//! Sources are tried in configured order; the first one that fetches and
//! parses wins. A failing source is logged and skipped, and total failure
//! is reported only after the whole list is exhausted.

use std::path::Path;

use csv::ReaderBuilder;
use tracing::{info, warn};

use gvbot_core::config::{SignalConfig, StatusThresholds};

use crate::error::SignalError;
use crate::row::SignalRow;
use crate::status::{derive_status, SignalReading, Status};

/// The dashboard view of the most recent reading from one source.
#[derive(Debug, Clone)]
pub struct SignalReport {
    /// The source that produced this report.
    pub source: String,
    /// Raw timestamp text of the chosen row, if present.
    pub timestamp: Option<String>,
    pub reading: SignalReading,
    pub status: Status,
}

impl SignalReport {
    /// Plain-text rendering for the CLI.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Source:   {}\n", self.source));
        if let Some(ref ts) = self.timestamp {
            out.push_str(&format!("As of:    {}\n", ts));
        }
        out.push_str(&format!("Status:   {}\n", self.status));
        out.push_str(&format!(
            "GodScore: {}\n",
            SignalReading::format_field(self.reading.godscore)
        ));
        out.push_str(&format!(
            "Risk:     {}\n",
            SignalReading::format_field(self.reading.risk)
        ));
        out.push_str(&format!(
            "Drift:    {}\n",
            SignalReading::format_field(self.reading.drift)
        ));
        out.push_str(&format!(
            "Recovery: {}\n",
            SignalReading::format_field(self.reading.recovery)
        ));
        out
    }
}

/// Fetches signal CSVs from an ordered candidate list.
pub struct SignalFetcher {
    sources: Vec<String>,
    thresholds: StatusThresholds,
    client: reqwest::Client,
}

impl SignalFetcher {
    pub fn new(config: &SignalConfig) -> Self {
        Self {
            sources: config.sources.clone(),
            thresholds: config.thresholds.clone(),
            client: reqwest::Client::new(),
        }
    }

    /// Load the first usable source and derive its report.
    pub async fn fetch(&self) -> Result<SignalReport, SignalError> {
        for source in &self.sources {
            match self.fetch_one(source).await {
                Ok(report) => {
                    info!(source = %source, status = %report.status, "Signal report ready");
                    return Ok(report);
                }
                Err(e) => {
                    warn!(source = %source, error = %e, "Signal source skipped");
                }
            }
        }
        Err(SignalError::AllSourcesFailed(self.sources.len()))
    }

    async fn fetch_one(&self, source: &str) -> Result<SignalReport, SignalError> {
        let raw = self.load_raw(source).await?;
        self.report_from_csv(source, &raw)
    }

    async fn load_raw(&self, source: &str) -> Result<String, SignalError> {
        let fetch_err = |message: String| SignalError::Fetch {
            source_name: source.to_string(),
            message,
        };

        if source.starts_with("http://") || source.starts_with("https://") {
            let response = self
                .client
                .get(source)
                .send()
                .await
                .map_err(|e| fetch_err(e.to_string()))?;
            if !response.status().is_success() {
                return Err(fetch_err(format!("status {}", response.status().as_u16())));
            }
            response.text().await.map_err(|e| fetch_err(e.to_string()))
        } else {
            std::fs::read_to_string(Path::new(source)).map_err(|e| fetch_err(e.to_string()))
        }
    }

    /// Parse a CSV document and derive the report for its most recent row.
    pub fn report_from_csv(&self, source: &str, raw: &str) -> Result<SignalReport, SignalError> {
        let rows = parse_csv(raw)?;
        let row = latest_row(&rows).ok_or(SignalError::NoRows)?;
        let reading = row.reading();
        Ok(SignalReport {
            source: source.to_string(),
            timestamp: row.timestamp_text().map(str::to_string),
            status: derive_status(&reading, &self.thresholds),
            reading,
        })
    }
}

/// Parse a headered, double-quote-escaped CSV document into rows.
pub fn parse_csv(raw: &str) -> Result<Vec<SignalRow>, SignalError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(raw.as_bytes());
    let headers = reader
        .headers()
        .map_err(|e| SignalError::Parse(e.to_string()))?
        .clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| SignalError::Parse(e.to_string()))?;
        let row = SignalRow::from_record(&headers, &record);
        if !row.is_empty() {
            rows.push(row);
        }
    }
    Ok(rows)
}

/// The most recent row: the one with the greatest parseable timestamp, or
/// the last row when no timestamp parses.
pub fn latest_row(rows: &[SignalRow]) -> Option<&SignalRow> {
    rows.iter()
        .filter_map(|row| row.timestamp().map(|ts| (ts, row)))
        .max_by_key(|(ts, _)| *ts)
        .map(|(_, row)| row)
        .or_else(|| rows.last())
}
