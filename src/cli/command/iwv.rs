//! Estimate the IWV from surface temperature and humidity and compare it
//! with the GNSS average of the same year.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use log::{debug, info, warn};

use crate::{
    config::Paths,
    formula::IwvMethod,
    plot::{Chart, Curve},
    reading::{retain_valid, MeteoReading},
    series::{absolute_error, Series},
    table::{load_meteo, load_series, save_series},
};

use super::{avg_data_file_name, computed_iwv_file_name, current_year, humtemp_file_name, render};

/// Water vapour scale height in metres.
pub const DEFAULT_H_FACTOR: f64 = 2000.0;

#[derive(Args, Debug)]
pub struct IwvArgs {
    /// Year to analyse
    #[arg(short, long, default_value_t = current_year())]
    pub year: i32,
    /// Water vapour scale height H in metres
    #[arg(
        short = 'H',
        long = "h-factor",
        alias = "h_factor",
        default_value_t = DEFAULT_H_FACTOR,
        value_parser = parse_h_factor
    )]
    pub h_factor: f64,
    /// IWV estimate
    #[arg(long, value_enum, default_value_t = IwvMethod::Magnus)]
    pub method: IwvMethod,
    /// Open the charts once rendered
    #[arg(long)]
    pub show: bool,
}

fn parse_h_factor(s: &str) -> Result<f64, String> {
    match s.parse::<f64>() {
        Ok(h) if h.is_finite() && h > 0.0 => Ok(h),
        _ => Err(format!("H factor must be a positive number, got `{}`", s)),
    }
}

/// Computed series and the GNSS reference it is compared with.
#[derive(Debug)]
pub struct Comparison {
    pub computed: Series,
    pub reference: Series,
    pub file_path: PathBuf,
}

pub fn iwv(args: &IwvArgs, paths: &Paths) -> Result<Vec<PathBuf>> {
    let comparison = compute(args, paths)?;

    paths.ensure_plots_dir()?;
    let mut saved = vec![comparison.file_path.clone()];
    for (chart, file_name) in charts(args, &comparison) {
        saved.push(render(&chart, paths.plot_file(&file_name), args.show)?);
    }

    Ok(saved)
}

/// Comparison chart, plus the absolute error chart when the computed and
/// GNSS series share timestamps.
pub fn charts(args: &IwvArgs, comparison: &Comparison) -> Vec<(Chart, String)> {
    let error = absolute_error("|computed - GNSS|", &comparison.computed, &comparison.reference);
    info!(
        "{} computed samples, {} shared with GNSS",
        comparison.computed.len(),
        error.len()
    );

    let tag = format!("{}_hf{}", args.year, args.h_factor);
    let mut charts = vec![(
        Chart::new(&format!("IWV {} (H = {} m)", args.year, args.h_factor), "IWV (mm)")
            .with_curve(Curve::new("Surface model", &comparison.computed))
            .with_curve(Curve::new("GNSS IWV", &comparison.reference)),
        format!("iwv_computed_vs_avg_{}.png", tag),
    )];

    if error.is_empty() {
        warn!("no timestamps shared with GNSS, skipping the error chart");
        return charts;
    }

    let errors = error.values();
    info!("mean absolute error {:.3} mm", errors.iter().sum::<f64>() / errors.len() as f64);

    charts.push((
        Chart::new(&format!("IWV absolute error {} (H = {} m)", args.year, args.h_factor), "Error (mm)")
            .with_curve(Curve::new(&error.name, &error)),
        format!("iwv_error_{}.png", tag),
    ));

    charts
}

/// Loads both inputs, computes the IWV series and saves it.
///
/// Both inputs are read before anything is written, so a missing file
/// leaves no output behind.
pub fn compute(args: &IwvArgs, paths: &Paths) -> Result<Comparison> {
    let meteo_path = paths.data_file(&humtemp_file_name(args.year));
    let reference_path = paths.data_file(&avg_data_file_name(args.year));

    let readings = load_meteo(&meteo_path)?;
    let reference = load_series(&reference_path, "GNSS IWV")?;

    let readings = retain_valid(readings, &meteo_path.display().to_string());
    let computed = compute_series(&readings, args.h_factor, args.method);
    if computed.is_empty() {
        bail!("{} has no usable rows", meteo_path.display());
    }

    paths.ensure_data_dir()?;
    let file_path = paths.data_file(&computed_iwv_file_name(args.year, args.h_factor));
    save_series(&computed, ["Time", "IWV"], &file_path)?;

    Ok(Comparison {
        computed,
        reference,
        file_path,
    })
}

/// IWV in mm for every reading with a usable measurement.
pub fn compute_series(readings: &[MeteoReading], h_factor: f64, method: IwvMethod) -> Series {
    let mut series = Series::new("IWV");
    for reading in readings {
        let Some((temp, hum)) = reading.measurement() else {
            continue;
        };
        match method.iwv(temp, hum, h_factor) {
            Ok(value) => {
                if !series.insert(reading.timestamp, value) {
                    debug!("duplicate timestamp {}", reading.timestamp);
                }
            }
            Err(e) => debug!("{}: {}", reading.timestamp, e),
        }
    }

    series
}

// -- Tests -------------------------------------------------------------------
