//! Downloads remote data files to disk.

use std::{fs::File, io::Write, path::Path};

use anyhow::{Context, Error, Result};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};

/// Downloads `url` into `file_path`, reporting the transferred bytes on
/// `progress_bar`. Returns the number of bytes written.
pub async fn download_file(url: &str, file_path: &Path, progress_bar: &ProgressBar) -> Result<u64> {
    let response = reqwest::get(url)
        .await
        .map_err(|e| Error::msg(format!("Failed to download {}: {}", url, e)))?;

    if !response.status().is_success() {
        return Err(Error::msg(format!(
            "Failed to download {}: {}",
            url,
            response.status()
        )));
    }

    // Get content length and convert spinner to progress bar if we have size info
    let total_size = response.content_length().unwrap_or(0);
    if total_size > 0 {
        progress_bar.set_length(total_size);
        progress_bar.set_style(
            ProgressStyle::with_template("{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({percent}%) {eta}")
                .map_err(Error::msg)?
                .progress_chars("=> "),
        );
    }

    let mut file = File::create(file_path)
        .with_context(|| format!("cannot create {}", file_path.display()))?;
    let mut downloaded = 0u64;
    let mut stream = response.bytes_stream();

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| Error::msg(format!("Error reading chunk: {}", e)))?;
        file.write_all(&chunk)?;
        downloaded += chunk.len() as u64;
        progress_bar.set_position(downloaded);
    }
    file.flush()?;

    Ok(downloaded)
}

/// Joins a base URL and a file name with exactly one slash.
pub fn file_url(base_url: &str, file_name: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), file_name)
}

// -- Tests -------------------------------------------------------------------
