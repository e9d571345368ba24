//! Atmospheric opacity of IWV series, computed sample by sample with ATM.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::Args;
use log::{info, warn};

use crate::{
    atm::{AtmModel, Template},
    cli::create_progress_bar,
    config::Paths,
    plot::{Chart, Curve},
    series::{relative_deviation, Series},
    table::load_series,
};

use super::{frequency_tag, render};

#[derive(Args, Debug)]
pub struct OpacityArgs {
    /// IWV series, `time,IWV` CSV files
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
    /// Frequencies in GHz, comma separated
    #[arg(long, value_delimiter = ',', required = true)]
    pub freq: Vec<f64>,
    /// Keep one sample out of every PERIOD
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    pub period: u64,
    /// ATM executable
    #[arg(long, default_value = "./atm/atm")]
    pub atm_exec: PathBuf,
    /// ATM input template with the `%0` (IWV) and `%1` (frequency) placeholders
    #[arg(long, default_value = "./atm/input.atm")]
    pub atm_template: PathBuf,
    /// Open the charts once rendered
    #[arg(long)]
    pub show: bool,
}

/// An input series with its legend label.
#[derive(Debug)]
pub struct Source {
    pub label: String,
    pub series: Series,
}

pub async fn opacity(args: &OpacityArgs, paths: &Paths) -> Result<Vec<PathBuf>> {
    let model = prepare_model(&args.atm_exec, &args.atm_template)?;
    let sources = load_sources(&args.files, args.period as usize)?;

    paths.ensure_plots_dir()?;
    let mut saved = Vec::new();

    for &freq in &args.freq {
        let mut results = Vec::new();
        for source in &sources {
            let opacities = opacity_series(&model, source, freq).await?;
            if opacities.is_empty() {
                warn!("{}: no opacity at {} GHz", source.label, freq);
            }
            results.push(opacities);
        }

        let tag = frequency_tag(freq);
        let curves: Vec<&Series> = results.iter().filter(|s| !s.is_empty()).collect();
        if curves.is_empty() {
            warn!("nothing to plot at {} GHz", freq);
            continue;
        }

        let mut chart = Chart::new(&format!("ATM total opacity ({} GHz)", freq), "Total atmospheric opacity");
        for series in curves {
            chart = chart.with_curve(Curve::new(&series.name, series));
        }
        saved.push(render(&chart, paths.plot_file(&format!("atm_opacity_{}.png", tag)), args.show)?);

        if let [first, second] = results.as_slice() {
            let deviation = relative_deviation("Relative deviation", first, second);
            if deviation.is_empty() {
                warn!("{} and {} share no samples at {} GHz", first.name, second.name, freq);
                continue;
            }
            let chart = Chart::new(
                &format!("Relative opacity deviation between sources ({} GHz)", freq),
                "Relative deviation",
            )
            .with_curve(Curve::new(&deviation.name, &deviation));
            saved.push(render(
                &chart,
                paths.plot_file(&format!("atm_opacity_deviation_{}.png", tag)),
                args.show,
            )?);
        }
    }

    Ok(saved)
}

/// Checks the template and the executable before any model run.
pub fn prepare_model(atm_exec: &Path, atm_template: &Path) -> Result<AtmModel> {
    let template = Template::from_file(atm_template)?;
    if !atm_exec.is_file() {
        bail!("ATM executable {} not found", atm_exec.display());
    }

    Ok(AtmModel::new(atm_exec, template))
}

/// Loads every input, keeping one sample out of `period`.
pub fn load_sources(files: &[PathBuf], period: usize) -> Result<Vec<Source>> {
    let mut sources = Vec::with_capacity(files.len());
    for file in files {
        let label = legend_label(file);
        let series = load_series(file, &label)?.subsample(period);
        info!("{}: {} samples", label, series.len());

        sources.push(Source { label, series });
    }

    Ok(sources)
}

/// Legend label for an input file.
pub fn legend_label(file_path: &Path) -> String {
    let file_name = file_path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    if file_name.starts_with("Avg_data") {
        return "GNSS IWV".to_string();
    }
    if file_name.starts_with("IWV_calculado") {
        let h_factor = file_name
            .rsplit_once("_hf")
            .and_then(|(_, rest)| rest.strip_suffix(".csv"));
        if let Some(h_factor) = h_factor {
            return format!("Surface model (H = {})", h_factor);
        }
    }

    file_name
}

/// Opacity of every sample of `source`. Samples the model cannot handle are
/// reported and left out.
pub async fn opacity_series(model: &AtmModel, source: &Source, freq: f64) -> Result<Series> {
    let bar = create_progress_bar(
        source.series.len() as u64,
        format!("{} at {} GHz", source.label, freq),
    )?;

    let mut opacities = Series::new(&source.label);
    let mut skipped = 0;
    for (ts, iwv) in source.series.iter() {
        match model.opacity(iwv, freq).await {
            Ok(opacity) => {
                opacities.insert(ts, opacity);
            }
            Err(e) => {
                bar.suspend(|| warn!("{} {}: {}", source.label, ts, e));
                skipped += 1;
            }
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    if skipped > 0 {
        warn!("{}: {} of {} samples skipped at {} GHz", source.label, skipped, source.series.len(), freq);
    }

    Ok(opacities)
}

// -- Tests -------------------------------------------------------------------
