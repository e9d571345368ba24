//! Download the station IWV files of the geodesy portal and save them as CSV.
//!
//! Each remote line holds `year month day hour minute value`, the value in
//! metres. Lines with any other shape are skipped.

use std::{
    fs::{self, File},
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use clap::Args;
use log::{debug, error, info, warn};
use tempfile::TempDir;

use crate::{
    cli::create_spinner,
    config::Paths,
    download::{download_file, file_url},
    reading::{retain_valid, PwvReading},
    table::save_pwv,
};

pub const DEFAULT_BASE_URL: &str = "https://datos-geodesia.ign.es/Utilidades/compresores/IWV/";

#[derive(Args, Debug)]
pub struct FetchGnssArgs {
    /// Stations to download
    #[arg(default_values_t = ["YEB1".to_string(), "YEBE".to_string()])]
    pub stations: Vec<String>,
    /// Directory holding the `{STATION}_pwv.txt` files
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,
}

pub async fn fetch_gnss(args: &FetchGnssArgs, paths: &Paths) -> Result<Vec<PathBuf>> {
    paths.ensure_data_dir()?;
    let tmp_dir = TempDir::new()?;

    let mut saved = Vec::new();
    let mut failed = Vec::new();
    for station in &args.stations {
        match fetch_station(&args.base_url, station, tmp_dir.path(), paths).await {
            Ok(file_path) => saved.push(file_path),
            Err(e) => {
                error!("{}: {:#}", station, e);
                failed.push(station.as_str());
            }
        }
    }

    if !failed.is_empty() {
        for file_path in &saved {
            info!("File saved to `{}`", file_path.display());
        }
        return Err(anyhow!("could not fetch {}", failed.join(", ")));
    }

    Ok(saved)
}

async fn fetch_station(base_url: &str, station: &str, temp_dir: &Path, paths: &Paths) -> Result<PathBuf> {
    let file_name = format!("{}_pwv.txt", station);
    let raw_path = temp_dir.join(&file_name);

    let bar = create_spinner(format!("Downloading {}...", file_name));
    let downloaded = download_file(&file_url(base_url, &file_name), &raw_path, &bar).await;
    bar.finish_and_clear();
    debug!("{}: {} bytes", file_name, downloaded?);

    let readings = read_pwv_file(&raw_path)?;
    let csv_path = paths.data_file(&format!("{}_pwv.csv", station));
    if csv_path.exists() {
        info!("{} exists and will be overwritten", csv_path.display());
    }
    save_pwv(&readings, &csv_path)?;
    fs::remove_file(&raw_path).with_context(|| format!("cannot remove {}", raw_path.display()))?;

    info!("{}: {} readings", station, readings.len());

    Ok(csv_path)
}

/// Reads a portal text file, skipping lines that are not readings.
pub fn read_pwv_file(file_path: &Path) -> Result<Vec<PwvReading>> {
    let file = File::open(file_path).with_context(|| format!("cannot open {}", file_path.display()))?;
    let reader = BufReader::new(file);

    let mut readings = Vec::new();
    let mut skipped = 0;
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match PwvReading::from_line(&line) {
            Ok(reading) => readings.push(reading),
            Err(e) => {
                debug!("{}:{}: {}", file_path.display(), idx + 1, e);
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        warn!("{}: skipped {} malformed lines", file_path.display(), skipped);
    }

    Ok(retain_valid(readings, &file_path.display().to_string()))
}

// -- Tests -------------------------------------------------------------------
