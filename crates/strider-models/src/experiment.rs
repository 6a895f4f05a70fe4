//! Experiment tuples from the batch conf file.
//!
//! One experiment per line, seven whitespace-separated fields:
//!
//! ```text
//! # strategy        pair           timeframe start     IS  OOS epochs
//! QFLRSI_Strategy   BTC/USDT:USDT  1h        20240101  90  30  200
//! ```
//!
//! Blank lines and `#` comments are skipped. A malformed line is an error for
//! that line only; the batch driver logs and skips it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::timerange::parse_date;

/// One experiment definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentSpec {
    pub strategy: String,
    pub pair: String,
    pub timeframe: String,
    pub start_date: NaiveDate,
    pub is_days: u32,
    pub oos_days: u32,
    pub epochs: u32,
}

impl ExperimentSpec {
    /// Parses one conf line. Returns `Ok(None)` for blanks and comments.
    pub fn parse_line(line: &str) -> Result<Option<Self>, ExperimentParseError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != 7 {
            return Err(ExperimentParseError::FieldCount(parts.len()));
        }

        let start_date = parse_date(parts[3])
            .map_err(|_| ExperimentParseError::BadDate(parts[3].to_string()))?;

        Ok(Some(Self {
            strategy: parts[0].to_string(),
            pair: parts[1].to_string(),
            timeframe: parts[2].to_string(),
            start_date,
            is_days: parse_field("is_days", parts[4])?,
            oos_days: parse_field("oos_days", parts[5])?,
            epochs: parse_field("epochs", parts[6])?,
        }))
    }

    /// Filesystem-safe pair name (`BTC/USDT:USDT` becomes `BTC-USDT:USDT`).
    pub fn pair_dir(&self) -> String {
        self.pair.replace('/', "-")
    }

    /// Name of the short-side sibling strategy.
    pub fn short_strategy(&self) -> String {
        format!("{}Short", self.strategy)
    }
}

fn parse_field(field: &'static str, value: &str) -> Result<u32, ExperimentParseError> {
    value
        .parse::<u32>()
        .map_err(|_| ExperimentParseError::BadNumber {
            field,
            value: value.to_string(),
        })
}

/// Outcome of loading a conf file: parsed specs plus the lines that failed.
#[derive(Debug, Default)]
pub struct LoadedExperiments {
    pub specs: Vec<ExperimentSpec>,
    /// 1-based line number and the reason each bad line was skipped.
    pub skipped: Vec<(usize, ExperimentParseError)>,
}

/// Reads a whole conf file, collecting valid specs and bad lines separately.
pub fn load_experiments(path: &Path) -> std::io::Result<LoadedExperiments> {
    let content = std::fs::read_to_string(path)?;
    let mut loaded = LoadedExperiments::default();
    for (idx, line) in content.lines().enumerate() {
        match ExperimentSpec::parse_line(line) {
            Ok(Some(spec)) => loaded.specs.push(spec),
            Ok(None) => {}
            Err(err) => loaded.skipped.push((idx + 1, err)),
        }
    }
    Ok(loaded)
}

/// Per-line parse failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExperimentParseError {
    #[error("expected 7 whitespace-separated fields, got {0}")]
    FieldCount(usize),

    #[error("invalid start date {0:?} (expected YYYYMMDD)")]
    BadDate(String),

    #[error("invalid number for {field}: {value:?}")]
    BadNumber { field: &'static str, value: String },
}
