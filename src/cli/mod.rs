//! Command line interface.

pub mod command;

use std::{ffi::OsString, time::Duration};

use anyhow::{Error, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::Paths;
use command::{FetchGnssArgs, FetchMeteoArgs, GnssArgs, IwvArgs, OpacityArgs};

#[derive(Parser)]
#[command(version, about, long_about = None)]
/// Contains the commands
pub struct Cli {
    #[command(flatten)]
    pub paths: Paths,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download the GNSS station IWV files and convert them to CSV
    FetchGnss(FetchGnssArgs),
    /// Export a year of temperature and humidity from the weather database
    FetchMeteo(FetchMeteoArgs),
    /// Smooth and average the GNSS station IWV series of a year
    Gnss(GnssArgs),
    /// Compute the IWV from temperature and humidity and compare it with GNSS
    Iwv(IwvArgs),
    /// Compute the atmospheric opacity of IWV series with the ATM model
    Opacity(OpacityArgs),
}

/// Rewrites `-hf VALUE` and `-hf=VALUE` to `--h-factor`. Clap would read
/// `-hf` as `-h -f` and print the help instead.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            let replacement = match arg.to_str() {
                Some("-hf") => Some(OsString::from("--h-factor")),
                Some(s) => s
                    .strip_prefix("-hf=")
                    .map(|value| OsString::from(format!("--h-factor={}", value))),
                None => None,
            };
            replacement.unwrap_or(arg)
        })
        .collect()
}

/// Creates a spinner.
pub fn create_spinner(message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner().with_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));

    bar
}

/// Creates a progress bar.
pub fn create_progress_bar(size: u64, message: String) -> Result<ProgressBar> {
    let style = ProgressStyle::with_template("[{eta_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")
        .map_err(Error::msg)?
        .progress_chars("##-");

    Ok(ProgressBar::new(size).with_message(message).with_style(style))
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::path::PathBuf;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("yebes-iwv").chain(args.iter().copied()))
    }

    #[test]
    fn should_have_valid_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn should_parse_gnss_command() {
        let cli = parse(&["gnss", "-y", "2024", "-w", "5", "-f", "data/YEB1_pwv.csv", "data/YEBE_pwv.csv"]).unwrap();

        match cli.command {
            Commands::Gnss(args) => {
                assert_eq!(args.year, 2024);
                assert_eq!(args.window, 5);
                assert_eq!(args.files.len(), 2);
                assert!(!args.show);
            }
            _ => panic!("wrong command"),
        }
        assert_eq!(cli.paths.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn should_reject_even_window() {
        assert!(parse(&["gnss", "-w", "4", "-f", "a.csv"]).is_err());
        assert!(parse(&["gnss", "-w", "0", "-f", "a.csv"]).is_err());
    }

    #[test]
    fn should_parse_opacity_command() {
        let cli = parse(&[
            "--plots-dir",
            "out",
            "opacity",
            "data/Avg_data_2025.csv",
            "data/IWV_calculado_2025_hf2000.csv",
            "--freq",
            "41.2,43.0",
            "--period",
            "5",
        ])
        .unwrap();

        match cli.command {
            Commands::Opacity(args) => {
                assert_eq!(args.files.len(), 2);
                assert_eq!(args.freq, vec![41.2, 43.0]);
                assert_eq!(args.period, 5);
                assert_eq!(args.atm_exec, PathBuf::from("./atm/atm"));
            }
            _ => panic!("wrong command"),
        }
        assert_eq!(cli.paths.plots_dir, PathBuf::from("out"));
    }

    #[test]
    fn should_require_opacity_frequencies_and_period() {
        assert!(parse(&["opacity", "a.csv"]).is_err());
        assert!(parse(&["opacity", "a.csv", "--freq", "41.2", "--period", "0"]).is_err());
    }

    #[test]
    fn should_parse_iwv_command() {
        let cli = parse(&["iwv", "-y", "2025", "--h_factor", "1500", "--method", "dew-point"]).unwrap();

        match cli.command {
            Commands::Iwv(args) => {
                assert_eq!(args.year, 2025);
                assert_eq!(args.h_factor, 1500.0);
                assert_eq!(args.method, crate::formula::IwvMethod::DewPoint);
            }
            _ => panic!("wrong command"),
        }
        assert!(parse(&["iwv", "-H", "-5"]).is_err());
    }

    #[test]
    fn should_parse_hf_flag() {
        for argv in [
            ["yebes-iwv", "iwv", "-y", "2025", "-hf", "1500"].as_slice(),
            ["yebes-iwv", "iwv", "-y", "2025", "-hf=1500"].as_slice(),
        ] {
            let cli = Cli::try_parse_from(normalize_args(argv.iter().copied())).unwrap();

            match cli.command {
                Commands::Iwv(args) => {
                    assert_eq!(args.year, 2025);
                    assert_eq!(args.h_factor, 1500.0);
                }
                _ => panic!("wrong command"),
            }
        }
    }

    #[test]
    fn should_keep_other_arguments() {
        let args = normalize_args(["yebes-iwv", "gnss", "-f", "a_hf.csv", "-h"]);

        assert_eq!(args, vec!["yebes-iwv", "gnss", "-f", "a_hf.csv", "-h"]);
    }

    #[test]
    fn should_default_gnss_stations() {
        let cli = parse(&["fetch-gnss"]).unwrap();

        match cli.command {
            Commands::FetchGnss(args) => assert_eq!(args.stations, vec!["YEB1", "YEBE"]),
            _ => panic!("wrong command"),
        }
    }

    #[test]
    fn should_require_year_for_meteo() {
        let args = ["fetch-meteo", "--host", "h", "--user", "u", "--pwd", "p", "--db", "d"];
        assert!(parse(&args).is_err());
    }
}
