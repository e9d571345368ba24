//! Driver for the external atmospheric transmission model (ATM).
//!
//! The model reads its configuration on stdin. The configuration is a
//! template where `%0` stands for the IWV in mm and `%1` for the frequency
//! in GHz; the opacity is read back from the line
//!
//! ```text
//! total atmospheric opacity    =      0.0773         0.0469
//! ```

use std::{
    path::{Path, PathBuf},
    process::Stdio,
};

use log::debug;
use thiserror::Error;
use tokio::{io::AsyncWriteExt, process::Command};

pub const IWV_TOKEN: &str = "%0";
pub const FREQ_TOKEN: &str = "%1";

const OPACITY_MARKER: &str = "total atmospheric opacity";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("cannot read template {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("template has no `{0}` placeholder")]
    MissingToken(&'static str),
}

#[derive(Debug, Error)]
pub enum AtmError {
    #[error("invalid IWV value {0}")]
    InvalidIwv(f64),
    #[error("cannot run {program}: {source}")]
    Spawn {
        program: PathBuf,
        source: std::io::Error,
    },
    #[error("model exited with {status}: {stderr}")]
    Failed { status: std::process::ExitStatus, stderr: String },
    #[error("no opacity in model output")]
    MissingOpacity,
}

/// Model configuration with the IWV and frequency placeholders.
#[derive(Debug, Clone)]
pub struct Template {
    text: String,
}

impl Template {
    /// Accepts the text only when both placeholders are present.
    pub fn new(text: String) -> Result<Self, TemplateError> {
        for token in [IWV_TOKEN, FREQ_TOKEN] {
            if !text.contains(token) {
                return Err(TemplateError::MissingToken(token));
            }
        }

        Ok(Template { text })
    }

    pub fn from_file(path: &Path) -> Result<Self, TemplateError> {
        let text = std::fs::read_to_string(path).map_err(|source| TemplateError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Template::new(text)
    }

    /// Replaces every placeholder occurrence.
    pub fn fill(&self, iwv: f64, freq: f64) -> String {
        self.text
            .replace(IWV_TOKEN, &iwv.to_string())
            .replace(FREQ_TOKEN, &freq.to_string())
    }
}

/// The model executable and the template it is fed with.
#[derive(Debug, Clone)]
pub struct AtmModel {
    program: PathBuf,
    args: Vec<String>,
    template: Template,
}

impl AtmModel {
    pub fn new(program: &Path, template: Template) -> Self {
        AtmModel {
            program: program.to_path_buf(),
            args: Vec::new(),
            template,
        }
    }

    /// Arguments passed before the model reads stdin.
    pub fn with_args(mut self, args: &[&str]) -> Self {
        self.args = args.iter().map(|a| a.to_string()).collect();
        self
    }

    /// Runs the model once and returns the total opacity.
    pub async fn opacity(&self, iwv: f64, freq: f64) -> Result<f64, AtmError> {
        if !iwv.is_finite() || iwv < 0.0 {
            return Err(AtmError::InvalidIwv(iwv));
        }
        let output = self.run(&self.template.fill(iwv, freq)).await?;

        extract_opacity(&output).ok_or(AtmError::MissingOpacity)
    }

    async fn run(&self, input: &str) -> Result<String, AtmError> {
        let spawn_error = |source: std::io::Error| AtmError::Spawn {
            program: self.program.clone(),
            source,
        };

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(spawn_error)?;

        if let Some(mut stdin) = child.stdin.take() {
            // the model may exit before reading everything
            if let Err(e) = stdin.write_all(input.as_bytes()).await {
                debug!("{}: stdin closed early: {}", self.program.display(), e);
            }
        }

        let output = child.wait_with_output().await.map_err(spawn_error)?;
        if !output.status.success() {
            return Err(AtmError::Failed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// First number after `=` on the total opacity line.
pub fn extract_opacity(output: &str) -> Option<f64> {
    output
        .lines()
        .find(|line| line.trim_start().starts_with(OPACITY_MARKER))
        .and_then(|line| line.split_once('='))
        .and_then(|(_, values)| values.split_whitespace().next())
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {

    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const OUTPUT: &str = "\
 dry opacity                  =      0.0301         0.0200
 total atmospheric opacity    =      0.0773         0.0469
";

    #[test]
    fn should_extract_opacity() {
        assert_eq!(extract_opacity(OUTPUT), Some(0.0773));
    }

    #[test]
    fn should_not_extract_from_garbage() {
        assert_eq!(extract_opacity(""), None);
        assert_eq!(extract_opacity("total atmospheric opacity\n"), None);
        assert_eq!(extract_opacity("total atmospheric opacity = n/a\n"), None);
        assert_eq!(extract_opacity("total atmospheric opacity =\n"), None);
    }

    #[test]
    fn should_fill_every_placeholder() {
        let template = Template::new("pwv %0 mm\nfreq %1 GHz\nagain %0\n".to_string()).unwrap();

        assert_eq!(
            template.fill(12.5, 41.2),
            "pwv 12.5 mm\nfreq 41.2 GHz\nagain 12.5\n"
        );
    }

    #[test]
    fn should_reject_template_without_tokens() {
        assert!(matches!(
            Template::new("freq %1".to_string()),
            Err(TemplateError::MissingToken("%0"))
        ));
        assert!(matches!(
            Template::new("pwv %0".to_string()),
            Err(TemplateError::MissingToken("%1"))
        ));
    }

    #[test]
    fn should_fail_to_read_missing_template() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Template::from_file(&dir.path().join("input.atm")),
            Err(TemplateError::Read { .. })
        ));
    }

    #[cfg(unix)]
    fn fake_model(dir: &TempDir, body: &str) -> AtmModel {
        let script = dir.path().join("atm.sh");
        fs::write(&script, body).unwrap();
        let template = Template::new("%0 %1".to_string()).unwrap();

        AtmModel::new(Path::new("/bin/sh"), template).with_args(&[script.to_str().unwrap()])
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn should_run_model() {
        let dir = TempDir::new().unwrap();
        // echoes the IWV back as the opacity
        let model = fake_model(
            &dir,
            "read iwv freq\necho \" total atmospheric opacity = $iwv 0.1\"\n",
        );

        assert_eq!(model.opacity(0.0, 41.2).await.unwrap(), 0.0);
        assert_eq!(model.opacity(7.5, 43.0).await.unwrap(), 7.5);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn should_report_model_failures() {
        let dir = TempDir::new().unwrap();

        let failing = fake_model(&dir, "echo boom >&2\nexit 3\n");
        assert!(matches!(
            failing.opacity(1.0, 41.2).await,
            Err(AtmError::Failed { .. })
        ));

        let silent = fake_model(&dir, "cat > /dev/null\necho done\n");
        assert!(matches!(
            silent.opacity(1.0, 41.2).await,
            Err(AtmError::MissingOpacity)
        ));

        assert!(matches!(
            silent.opacity(f64::NAN, 41.2).await,
            Err(AtmError::InvalidIwv(_))
        ));
    }

    #[tokio::test]
    async fn should_report_missing_executable() {
        let template = Template::new("%0 %1".to_string()).unwrap();
        let model = AtmModel::new(Path::new("./atm/does-not-exist"), template);

        assert!(matches!(
            model.opacity(1.0, 41.2).await,
            Err(AtmError::Spawn { .. })
        ));
    }
}
