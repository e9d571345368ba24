//! Smooth the GNSS station IWV series of a year and average the stations.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use log::{info, warn};

use crate::{
    config::Paths,
    plot::{Chart, Curve},
    series::{in_extended_year, in_year, mean_of, moving_average, Series},
    table::{load_series, save_series},
};

use super::{avg_data_file_name, current_year, render, station_name};

pub const DEFAULT_WINDOW: usize = 501;

/// Portal values are in metres.
const METRES_TO_MM: f64 = 1000.0;

#[derive(Args, Debug)]
pub struct GnssArgs {
    /// Year to analyse
    #[arg(short, long, default_value_t = current_year())]
    pub year: i32,
    /// Moving average window in samples, odd
    #[arg(short, long, default_value_t = DEFAULT_WINDOW, value_parser = parse_window)]
    pub window: usize,
    /// Station CSV files (`fecha,valor`)
    #[arg(short, long, num_args = 1.., required = true)]
    pub files: Vec<PathBuf>,
    /// Open the charts once rendered
    #[arg(long)]
    pub show: bool,
}

fn parse_window(s: &str) -> Result<usize, String> {
    let window: usize = s.parse().map_err(|_| format!("`{}` is not a window size", s))?;
    if window == 0 || window % 2 == 0 {
        return Err(format!("window must be odd and at least 1, got {}", window));
    }

    Ok(window)
}

/// Raw and smoothed target-year series of one station, in mm.
#[derive(Debug)]
pub struct StationSeries {
    pub raw: Series,
    pub smoothed: Series,
}

#[derive(Debug)]
pub struct Aggregate {
    pub stations: Vec<StationSeries>,
    /// Mean of the raw station values.
    pub raw: Series,
    /// Mean of the smoothed station values.
    pub smoothed: Series,
}

pub fn gnss(args: &GnssArgs, paths: &Paths) -> Result<Vec<PathBuf>> {
    let aggregate = aggregate_stations(&args.files, args.year, args.window)?;

    paths.ensure_data_dir()?;
    let avg_path = paths.data_file(&avg_data_file_name(args.year));
    save_series(&aggregate.smoothed, ["fecha", "IWV"], &avg_path)?;

    paths.ensure_plots_dir()?;
    let mut stations_chart = Chart::new(&format!("GNSS IWV {}", args.year), "IWV (mm)");
    for station in &aggregate.stations {
        stations_chart = stations_chart
            .with_curve(Curve::new(&format!("{} data", station.raw.name), &station.raw))
            .with_curve(Curve::new(&format!("{} moving average", station.smoothed.name), &station.smoothed));
    }
    let aggregate_chart = Chart::new(&format!("Zenith IWV {}", args.year), "IWV (mm)")
        .with_curve(Curve::new("GNSS stations mean", &aggregate.raw))
        .with_curve(Curve::new("Moving average", &aggregate.smoothed));

    let stations_png = paths.plot_file(&format!("iwv_stations_{}.png", args.year));
    let aggregate_png = paths.plot_file(&format!("iwv_aggregate_{}.png", args.year));

    Ok(vec![
        avg_path,
        render(&stations_chart, stations_png, args.show)?,
        render(&aggregate_chart, aggregate_png, args.show)?,
    ])
}

/// Loads and smooths every station file, then averages the stations.
pub fn aggregate_stations(files: &[PathBuf], year: i32, window: usize) -> Result<Aggregate> {
    let mut stations = Vec::new();
    for file in files {
        let name = station_name(file);
        let series = match load_series(file, &name) {
            Ok(series) => series.scaled(METRES_TO_MM),
            Err(e) => {
                warn!("{}: {:#}", name, e);
                continue;
            }
        };

        match smooth_station(&series, year, window) {
            Some(station) => {
                info!("{}: {} samples in {}", name, station.raw.len(), year);
                stations.push(station);
            }
            None => warn!("{}: no samples in {}", name, year),
        }
    }

    if stations.is_empty() {
        bail!("no station has data for {}", year);
    }

    let raw: Vec<Series> = stations.iter().map(|s| s.raw.clone()).collect();
    let smoothed: Vec<Series> = stations.iter().map(|s| s.smoothed.clone()).collect();

    Ok(Aggregate {
        raw: mean_of("GNSS", &raw),
        smoothed: mean_of("GNSS", &smoothed),
        stations,
    })
}

/// Target-year samples of `series` and their moving average. The average
/// also sees the days around new year so both ends of the year are
/// smoothed with real neighbours. `None` when the year has no samples.
pub fn smooth_station(series: &Series, year: i32, window: usize) -> Option<StationSeries> {
    let raw = series.filter(|ts| in_year(ts, year));
    if raw.is_empty() {
        return None;
    }

    let extended = series.filter(|ts| in_extended_year(ts, year));
    let smoothed = moving_average(&extended, window, |ts| in_year(ts, year));

    Some(StationSeries { raw, smoothed })
}

// -- Tests -------------------------------------------------------------------
