//! Parsing of single input records.

pub mod meteo;
pub mod pwv;

use anyhow::{anyhow, Result};
use chrono::NaiveDateTime;
use log::{debug, warn};
use thiserror::Error;

pub use meteo::MeteoReading;
pub use pwv::PwvReading;

/// Timestamp layouts found in the portal, database and chart CSV files.
const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// A parsed input record.
pub trait Reading {
    fn timestamp(&self) -> NaiveDateTime;
    fn is_valid(&self) -> bool;
}

/// Drops the readings that fail validation, with a warning naming `source`.
pub fn retain_valid<R: Reading>(readings: Vec<R>, source: &str) -> Vec<R> {
    let total = readings.len();
    let valid: Vec<R> = readings
        .into_iter()
        .filter(|r| {
            let ok = r.is_valid();
            if !ok {
                debug!("{}: dropping reading at {}", source, r.timestamp());
            }
            ok
        })
        .collect();

    if valid.len() < total {
        warn!("{}: dropped {} of {} readings", source, total - valid.len(), total);
    }

    valid
}

#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },
    #[error("invalid number `{0}`")]
    Number(String),
    #[error("invalid timestamp `{0}`")]
    Timestamp(String),
    #[error("missing field `{0}`")]
    MissingField(&'static str),
}

pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .ok_or_else(|| anyhow!(RecordError::Timestamp(s.to_string())))
}

/// Parses a measurement that may carry a unit suffix (`2.51 °C`, `80.13 %H`)
/// or a decimal comma.
pub fn parse_measurement(s: &str) -> Option<f64> {
    let cleaned: String = s
        .trim()
        .trim_end_matches(|c: char| !(c.is_ascii_digit() || c == '.' || c == ','))
        .replace(',', ".");

    cleaned
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

// -- Tests ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn should_parse_timestamps() {
        let expected = NaiveDateTime::parse_from_str("2025-01-01 02:00:00", "%Y-%m-%d %H:%M:%S").unwrap();

        assert_eq!(parse_timestamp("2025-01-01 02:00:00").unwrap(), expected);
        assert_eq!(parse_timestamp(" 2025-01-01T02:00:00 ").unwrap(), expected);
        assert_eq!(parse_timestamp("2025-01-01 02:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2025-01-01 02:00:00.000").unwrap(), expected);
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn should_parse_measurements() {
        assert_eq!(parse_measurement("2.51 °C"), Some(2.51));
        assert_eq!(parse_measurement("80,13 %H"), Some(80.13));
        assert_eq!(parse_measurement("-3.5"), Some(-3.5));
        assert_eq!(parse_measurement(""), None);
        assert_eq!(parse_measurement("NaN"), None);
        assert_eq!(parse_measurement("n/a"), None);
    }
}
