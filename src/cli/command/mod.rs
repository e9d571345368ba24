pub mod fetch_gnss;
pub mod fetch_meteo;
pub mod gnss;
pub mod iwv;
pub mod opacity;

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{Datelike, Local};

use crate::plot::{self, Chart};

pub use fetch_gnss::{fetch_gnss, FetchGnssArgs};
pub use fetch_meteo::{fetch_meteo, FetchMeteoArgs};
pub use gnss::{gnss, GnssArgs};
pub use iwv::{iwv, IwvArgs};
pub use opacity::{opacity, OpacityArgs};

pub fn current_year() -> i32 {
    Local::now().year()
}

pub fn humtemp_file_name(year: i32) -> String {
    format!("HumTemp_{}.csv", year)
}

pub fn avg_data_file_name(year: i32) -> String {
    format!("Avg_data_{}.csv", year)
}

pub fn computed_iwv_file_name(year: i32, h_factor: f64) -> String {
    format!("IWV_calculado_{}_hf{}.csv", year, h_factor)
}

/// Frequency as used in file names, `41.2` becomes `41p2`.
pub fn frequency_tag(freq: f64) -> String {
    freq.to_string().replace('.', "p")
}

/// Station identifier of a station CSV, the file stem up to the first `_`.
pub fn station_name(file_path: &Path) -> String {
    let stem = file_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    match stem.split_once('_') {
        Some((station, _)) => station.to_string(),
        None => stem,
    }
}

/// Renders `chart` into `file_path`, optionally opening it.
pub fn render(chart: &Chart, file_path: PathBuf, show: bool) -> Result<PathBuf> {
    chart.render(&file_path)?;
    if show {
        plot::show(&file_path);
    }

    Ok(file_path)
}

// -- Tests -------------------------------------------------------------------
