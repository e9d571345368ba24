//! One line of the geodesy portal IWV text files.
//!
//! Lines hold six whitespace separated fields:
//! `year month day hour minute value`, value in metres.

use chrono::{NaiveDate, NaiveDateTime};

use super::{Reading, RecordError};

#[derive(Debug, Clone, PartialEq)]
pub struct PwvReading {
    pub timestamp: NaiveDateTime,
    /// Kept verbatim so the CSV conversion does not reformat numbers.
    pub value: String,
}

impl PwvReading {
    pub fn from_line(line: &str) -> Result<Self, RecordError> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(RecordError::FieldCount {
                expected: 6,
                found: fields.len(),
            });
        }

        let number = |s: &str| -> Result<u32, RecordError> {
            s.parse::<u32>().map_err(|_| RecordError::Number(s.to_string()))
        };
        let year = fields[0]
            .parse::<i32>()
            .map_err(|_| RecordError::Number(fields[0].to_string()))?;
        let month = number(fields[1])?;
        let day = number(fields[2])?;
        let hour = number(fields[3])?;
        let minute = number(fields[4])?;

        let timestamp = NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(hour, minute, 0))
            .ok_or_else(|| RecordError::Timestamp(fields[..5].join(" ")))?;

        let value = fields[5];
        value
            .parse::<f64>()
            .map_err(|_| RecordError::Number(value.to_string()))?;

        Ok(PwvReading {
            timestamp,
            value: value.to_string(),
        })
    }

    /// CSV row as `(fecha, valor)`.
    pub fn to_row(&self) -> [String; 2] {
        [
            self.timestamp.format("%Y-%m-%d %H:%M:00").to_string(),
            self.value.clone(),
        ]
    }
}

impl Reading for PwvReading {
    fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    fn is_valid(&self) -> bool {
        self.value.parse::<f64>().map(f64::is_finite).unwrap_or(false)
    }
}

// -- Tests ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn should_parse_line() {
        let reading = PwvReading::from_line("2025  1  2  3  5  0.01259").unwrap();

        assert_eq!(
            reading.to_row(),
            ["2025-01-02 03:05:00".to_string(), "0.01259".to_string()]
        );
        assert!(reading.is_valid());
    }

    #[test]
    fn should_reject_wrong_field_count() {
        assert_eq!(
            PwvReading::from_line("YEAR MONTH DAY HOUR MIN"),
            Err(RecordError::FieldCount {
                expected: 6,
                found: 5
            })
        );
        assert!(PwvReading::from_line("").is_err());
    }

    #[test]
    fn should_reject_bad_fields() {
        assert_eq!(
            PwvReading::from_line("2025 13 01 00 00 0.01"),
            Err(RecordError::Timestamp("2025 13 01 00 00".to_string()))
        );
        assert_eq!(
            PwvReading::from_line("2025 01 01 00 00 abc"),
            Err(RecordError::Number("abc".to_string()))
        );
    }

    #[test]
    fn should_flag_non_finite_values() {
        let reading = PwvReading::from_line("2025 01 01 00 00 inf").unwrap();
        assert!(!reading.is_valid());
    }
}
