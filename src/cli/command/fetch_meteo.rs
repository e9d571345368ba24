//! Export one year of the weather station log to CSV.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use log::{debug, info};
use sqlx::Connection;
use tempfile::NamedTempFile;

use crate::{
    cli::create_spinner,
    config::Paths,
    db::{connect, export_year, validate_table_name, Credentials, DEFAULT_TABLE},
    table::MeteoWriter,
};

use super::humtemp_file_name;

#[derive(Args, Debug)]
pub struct FetchMeteoArgs {
    /// Database host
    #[arg(long, env = "IWV_DB_HOST")]
    pub host: String,
    /// Database port
    #[arg(long, default_value_t = 3306)]
    pub port: u16,
    /// Database user
    #[arg(long, env = "IWV_DB_USER")]
    pub user: String,
    /// Database password
    #[arg(long, env = "IWV_DB_PASSWORD", hide_env_values = true)]
    pub pwd: String,
    /// Database name
    #[arg(long, env = "IWV_DB_NAME")]
    pub db: String,
    /// Year to export
    #[arg(short, long)]
    pub year: i32,
    /// Table with the `ts`, `temp` and `hum` columns
    #[arg(long, default_value = DEFAULT_TABLE)]
    pub table: String,
}

impl FetchMeteoArgs {
    fn credentials(&self) -> Credentials {
        Credentials {
            host: self.host.clone(),
            port: self.port,
            user: self.user.clone(),
            password: self.pwd.clone(),
            database: self.db.clone(),
        }
    }
}

pub async fn fetch_meteo(args: &FetchMeteoArgs, paths: &Paths) -> Result<Vec<PathBuf>> {
    validate_table_name(&args.table)?;

    let bar = create_spinner(format!("Connecting to {}...", args.host));
    let connection = connect(&args.credentials()).await;
    bar.finish_and_clear();
    let mut conn = connection?;

    paths.ensure_data_dir()?;
    let file_path = paths.data_file(&humtemp_file_name(args.year));
    // rows go to a sibling file until the export is known to be good
    let staged = NamedTempFile::new_in(&paths.data_dir)
        .with_context(|| format!("cannot create a file in {}", paths.data_dir.display()))?;
    let mut writer = MeteoWriter::create(staged.path())?;

    let bar = create_spinner(format!("Exporting {} from {}...", args.year, args.table));
    let exported = match export_year(&mut conn, &args.table, args.year, &mut writer).await {
        Ok(_) => writer.finish(),
        Err(e) => Err(e),
    };
    bar.finish_and_clear();

    if let Err(e) = conn.close().await {
        debug!("closing connection: {}", e);
    }

    let rows = publish(staged, exported?, &file_path)
        .with_context(|| format!("{} from table `{}`", args.year, args.table))?;
    info!("{}: {} rows", args.year, rows);

    Ok(vec![file_path])
}

/// Moves a staged export over `file_path`. An empty export is discarded and
/// any previous file is left untouched.
fn publish(staged: NamedTempFile, rows: usize, file_path: &Path) -> Result<usize> {
    if rows == 0 {
        bail!("no rows exported, keeping the existing {}", file_path.display());
    }
    staged
        .persist(file_path)
        .map_err(|e| e.error)
        .with_context(|| format!("cannot write {}", file_path.display()))?;

    Ok(rows)
}

// -- Tests -------------------------------------------------------------------
