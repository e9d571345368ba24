//! Locations of the input/output directories.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::Args;

#[derive(Args, Debug, Clone)]
pub struct Paths {
    /// Directory with the CSV inputs and outputs
    #[arg(long, global = true, env = "IWV_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,
    /// Directory where charts are written
    #[arg(long, global = true, env = "IWV_PLOTS_DIR", default_value = "plots")]
    pub plots_dir: PathBuf,
}

impl Paths {
    #[cfg(test)]
    pub fn new(data_dir: &Path, plots_dir: &Path) -> Self {
        Paths {
            data_dir: data_dir.to_path_buf(),
            plots_dir: plots_dir.to_path_buf(),
        }
    }

    pub fn data_file(&self, file_name: &str) -> PathBuf {
        self.data_dir.join(file_name)
    }

    pub fn plot_file(&self, file_name: &str) -> PathBuf {
        self.plots_dir.join(file_name)
    }

    /// Creates the data directory if needed.
    pub fn ensure_data_dir(&self) -> Result<()> {
        create(&self.data_dir)
    }

    /// Creates the plots directory if needed.
    pub fn ensure_plots_dir(&self) -> Result<()> {
        create(&self.plots_dir)
    }
}

fn create(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("cannot create directory {}", dir.display()))
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {

    use super::*;
    use tempfile::TempDir;

    #[test]
    fn should_default_to_historical_layout() {
        let paths = Paths::new(Path::new("data"), Path::new("plots"));

        assert_eq!(paths.data_file("Avg_data_2025.csv"), PathBuf::from("data/Avg_data_2025.csv"));
        assert_eq!(paths.plot_file("x.png"), PathBuf::from("plots/x.png"));
    }

    #[test]
    fn should_create_directories() {
        let dir = TempDir::new().unwrap();
        let paths = Paths::new(&dir.path().join("d/e"), &dir.path().join("p"));

        paths.ensure_data_dir().unwrap();
        paths.ensure_plots_dir().unwrap();

        assert!(paths.data_dir.is_dir());
        assert!(paths.plots_dir.is_dir());
    }
}
