mod atm;
mod cli;
mod config;
mod db;
mod download;
mod formula;
mod plot;
mod reading;
mod series;
mod table;

use anyhow::{Error, Result};
use clap::Parser;
use cli::{command, Cli, Commands};
use env_logger::{Builder, Env, Target};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Error> {
    Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Stdout)
        .format_timestamp_secs()
        .format_module_path(false)
        .init();

    let cli = Cli::parse_from(cli::normalize_args(std::env::args_os()));
    let paths = &cli.paths;

    let saved = match &cli.command {
        Commands::FetchGnss(args) => command::fetch_gnss(args, paths).await?,
        Commands::FetchMeteo(args) => command::fetch_meteo(args, paths).await?,
        Commands::Gnss(args) => command::gnss(args, paths)?,
        Commands::Iwv(args) => command::iwv(args, paths)?,
        Commands::Opacity(args) => command::opacity(args, paths).await?,
    };

    for file_path in saved {
        println!("File saved to `{}`", file_path.display());
    }

    Ok(())
}
