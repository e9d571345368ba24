//! `ts,temp,hum` CSV files with the weather station log.

use std::{fs::File, path::Path};

use anyhow::{Context, Result};
use log::{debug, warn};

use crate::reading::MeteoReading;

pub const METEO_HEADER: [&str; 3] = ["ts", "temp", "hum"];

/// Loads every row with a readable timestamp. Temperature and humidity are
/// kept even when invalid so the caller decides what to drop.
pub fn load_meteo(file_path: &Path) -> Result<Vec<MeteoReading>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(file_path)
        .with_context(|| format!("cannot open {}", file_path.display()))?;

    let mut readings = Vec::new();
    let mut skipped = 0;

    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        let parsed = result
            .map_err(anyhow::Error::from)
            .and_then(|record| MeteoReading::from_record(&record).map_err(anyhow::Error::from));

        match parsed {
            Ok(reading) => readings.push(reading),
            Err(e) => {
                debug!("{}:{}: {}", file_path.display(), line, e);
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        warn!("{}: skipped {} unreadable rows", file_path.display(), skipped);
    }

    Ok(readings)
}

/// Streams raw database rows into a CSV file.
pub struct MeteoWriter {
    writer: csv::Writer<File>,
    rows: usize,
}

impl MeteoWriter {
    pub fn create(file_path: &Path) -> Result<Self> {
        let mut writer = csv::Writer::from_path(file_path)
            .with_context(|| format!("cannot create {}", file_path.display()))?;
        writer.write_record(METEO_HEADER)?;

        Ok(MeteoWriter { writer, rows: 0 })
    }

    pub fn write(&mut self, ts: &str, temp: Option<&str>, hum: Option<&str>) -> Result<()> {
        self.writer
            .write_record([ts, temp.unwrap_or(""), hum.unwrap_or("")])?;
        self.rows += 1;

        Ok(())
    }

    /// Flushes the file and returns the number of rows written.
    pub fn finish(mut self) -> Result<usize> {
        self.writer.flush()?;
        Ok(self.rows)
    }
}

// -- Tests -------------------------------------------------------------------
