//! Inference log reader
//!
//! Each line of the inference log is a JSON envelope whose `record.message`
//! holds a stringified mapping. Decoding happens in two stages (strict JSON
//! for the envelope, [`parse_mapping`] for the message) and every failure is
//! a skipped line, never an error.

use super::literal::parse_mapping;
use crate::data::{Row, Table};
use crate::error::Result;
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

/// Event tag marking served predictions
pub const PREDICTION_EVENT: &str = "prediction";

/// Why a log line was not turned into a row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Blank,
    InvalidEncoding,
    InvalidEnvelope,
    MissingMessage,
    InvalidMessage,
    OtherEvent,
    MissingFeatures,
}

/// Counters collected while reading a log
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadStats {
    pub lines: usize,
    pub predictions: usize,
    pub skipped: usize,
}

/// Load served prediction features from the inference log into a table
///
/// Returns an empty table when no line carries a prediction event.
pub fn load_inference_data(log_path: &Path) -> Result<Table> {
    load_inference_data_with_stats(log_path).map(|(table, _)| table)
}

/// Same as [`load_inference_data`], also reporting line counters
pub fn load_inference_data_with_stats(log_path: &Path) -> Result<(Table, ReadStats)> {
    let reader = BufReader::new(File::open(log_path)?);
    let mut table = Table::new();
    let mut stats = ReadStats::default();

    for (index, raw) in reader.split(b'\n').enumerate() {
        let raw = raw?;
        stats.lines += 1;

        let parsed = String::from_utf8(raw)
            .map_err(|_| SkipReason::InvalidEncoding)
            .and_then(|line| parse_line(&line));

        match parsed {
            Ok(features) => {
                stats.predictions += 1;
                table.push_row(features);
            }
            Err(SkipReason::Blank) => {}
            Err(reason) => {
                stats.skipped += 1;
                debug!(line = index + 1, ?reason, "Skipping inference log line");
            }
        }
    }

    info!(
        path = %log_path.display(),
        lines = stats.lines,
        predictions = stats.predictions,
        skipped = stats.skipped,
        "Loaded inference log"
    );

    Ok((table, stats))
}

/// Decode one log line into the features of a prediction event
pub fn parse_line(line: &str) -> std::result::Result<Row, SkipReason> {
    let line = line.trim();
    if line.is_empty() {
        return Err(SkipReason::Blank);
    }

    let envelope: Value = serde_json::from_str(line).map_err(|_| SkipReason::InvalidEnvelope)?;

    let message = envelope
        .get("record")
        .and_then(|record| record.get("message"))
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty())
        .ok_or(SkipReason::MissingMessage)?;

    let payload = parse_mapping(message).map_err(|_| SkipReason::InvalidMessage)?;

    if payload.get("event").and_then(Value::as_str) != Some(PREDICTION_EVENT) {
        return Err(SkipReason::OtherEvent);
    }

    match payload.get("features") {
        Some(Value::Object(features)) => Ok(features.clone()),
        _ => Err(SkipReason::MissingFeatures),
    }
}
