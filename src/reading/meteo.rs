//! Temperature and humidity records of the weather station log.

use chrono::NaiveDateTime;
use csv::StringRecord;

use super::{parse_measurement, parse_timestamp, Reading, RecordError};
use crate::formula;

#[derive(Debug, Clone, PartialEq)]
pub struct MeteoReading {
    pub timestamp: NaiveDateTime,
    /// Surface temperature in °C, `None` when missing or not numeric.
    pub temp: Option<f64>,
    /// Relative humidity in %, `None` when missing or not numeric.
    pub hum: Option<f64>,
}

impl MeteoReading {
    /// Builds a reading from a `ts,temp,hum` record.
    pub fn from_record(record: &StringRecord) -> Result<Self, RecordError> {
        let ts = record.get(0).ok_or(RecordError::MissingField("ts"))?;
        let timestamp = parse_timestamp(ts).map_err(|_| RecordError::Timestamp(ts.to_string()))?;

        Ok(MeteoReading {
            timestamp,
            temp: record.get(1).and_then(parse_measurement),
            hum: record.get(2).and_then(parse_measurement),
        })
    }

    /// `(temp, hum)` when both values are inside the formula domain.
    pub fn measurement(&self) -> Option<(f64, f64)> {
        match (self.temp, self.hum) {
            (Some(temp), Some(hum)) if formula::validate(temp, hum).is_ok() => Some((temp, hum)),
            _ => None,
        }
    }
}

impl Reading for MeteoReading {
    fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    fn is_valid(&self) -> bool {
        self.measurement().is_some()
    }
}

// -- Tests ----------------------------------------------------------------------------
