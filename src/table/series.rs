//! Two-column `timestamp,value` CSV files.
//!
//! Columns are read by position so that `fecha,valor`, `fecha,IWV` and
//! `Time,IWV` files load the same way.

use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, warn};

use crate::{reading::parse_timestamp, series::Series};

/// Loads a series, skipping rows that do not parse.
pub fn load_series(file_path: &Path, name: &str) -> Result<Series> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(file_path)
        .with_context(|| format!("cannot open {}", file_path.display()))?;

    let mut series = Series::new(name);
    let mut skipped = 0;

    for (idx, result) in reader.records().enumerate() {
        // header is line 1
        let line = idx + 2;
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                debug!("{}:{}: {}", file_path.display(), line, e);
                skipped += 1;
                continue;
            }
        };
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }

        let ts = record.get(0).map(parse_timestamp);
        let value = record.get(1).map(|v| v.parse::<f64>());
        match (ts, value) {
            (Some(Ok(ts)), Some(Ok(value))) if value.is_finite() => {
                if !series.insert(ts, value) {
                    debug!("{}:{}: duplicate timestamp {}", file_path.display(), line, ts);
                }
            }
            _ => {
                debug!("{}:{}: malformed row {:?}", file_path.display(), line, record);
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        warn!("{}: skipped {} malformed rows", file_path.display(), skipped);
    }

    Ok(series)
}

/// Saves a series under the given two column header.
pub fn save_series(series: &Series, header: [&str; 2], file_path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(file_path)
        .with_context(|| format!("cannot create {}", file_path.display()))?;

    writer.write_record(header)?;
    for (ts, value) in series.iter() {
        writer.write_record([ts.format("%Y-%m-%d %H:%M:%S").to_string(), value.to_string()])?;
    }
    writer.flush()?;

    Ok(())
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {

    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn should_load_by_position() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Avg_data_2025.csv");
        fs::write(
            &path,
            "fecha,IWV\n2025-01-01 02:00:00,12.59\n\nbroken\n2025-01-01 03:00:00,abc\n2025-01-01 04:00:00,13.1\n",
        )
        .unwrap();

        let series = load_series(&path, "avg").unwrap();

        assert_eq!(series.name, "avg");
        assert_eq!(series.values(), vec![12.59, 13.1]);
    }

    #[test]
    fn should_fail_on_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(load_series(&dir.path().join("nope.csv"), "x").is_err());
    }

    #[test]
    fn should_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("in.csv");
        fs::write(&source, "Time,IWV\n2025-03-01 00:00:00,7.25\n2025-03-01 01:00:00,8\n").unwrap();
        let series = load_series(&source, "s").unwrap();

        let target = dir.path().join("out.csv");
        save_series(&series, ["Time", "IWV"], &target).unwrap();

        assert_eq!(
            fs::read_to_string(&target).unwrap(),
            "Time,IWV\n2025-03-01 00:00:00,7.25\n2025-03-01 01:00:00,8\n"
        );
    }
}
