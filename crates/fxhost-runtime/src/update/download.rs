//! Streaming archive downloads.

use std::path::Path;

use futures_util::StreamExt;
use fxhost_core::UpdateError;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::progress::ProgressReporter;

/// Download `url` to `dest`, replacing any existing file.
///
/// Returns the number of bytes written.
pub async fn download_to_file(
    client: &Client,
    url: &str,
    dest: &Path,
    label: &str,
    progress: &dyn ProgressReporter,
) -> Result<u64, UpdateError> {
    let download_err = |reason: String| UpdateError::Download {
        url: url.to_string(),
        reason,
    };

    debug!(%url, dest = %dest.display(), "Starting download");
    let response = client
        .get(url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| download_err(e.to_string()))?;

    let total = response.content_length();
    progress.start(label, total);

    let mut file = File::create(dest).await?;
    let mut downloaded: u64 = 0;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                progress.finish_with_error("Download failed");
                return Err(download_err(e.to_string()));
            }
        };
        file.write_all(&chunk).await?;
        downloaded += chunk.len() as u64;
        progress.update(downloaded, total);
    }
    file.flush().await?;

    progress.finish(&format!("{label} complete"));
    debug!(%url, bytes = downloaded, "Download finished");
    Ok(downloaded)
}
