//! Save portal readings as a `fecha,valor` CSV file.

use std::path::Path;

use anyhow::{Context, Result};

use crate::reading::PwvReading;

pub fn save_pwv(readings: &[PwvReading], file_path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(file_path)
        .with_context(|| format!("cannot create {}", file_path.display()))?;

    writer.write_record(["fecha", "valor"])?;
    for reading in readings {
        writer.write_record(reading.to_row())?;
    }
    writer.flush()?;

    Ok(())
}

// -- Tests -------------------------------------------------------------------
