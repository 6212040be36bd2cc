//! Stage-then-merge installer.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use fxhost_core::{
    InstallationLayout, ReleaseDescriptor, SupportedOs, UpdateError, UpdateSettings, Updater,
};
use reqwest::Client;
use tokio::fs;
use tracing::{debug, error, info};

use super::download::download_to_file;
use super::extract::extract_archive;
use super::index::latest_release;
use super::merge::{MergeSummary, merge_tree};
use super::progress::{NoopProgress, ProgressReporter};

/// Installs server builds and the baseline data set from the remote
/// distribution endpoints.
///
/// Server builds are fetched from `platform`'s artifact index unless the
/// settings override it.
pub struct UpdatePipeline {
    client: Client,
    layout: InstallationLayout,
    endpoints: UpdateSettings,
    platform: SupportedOs,
    progress: Arc<dyn ProgressReporter>,
}

impl UpdatePipeline {
    pub fn new(layout: InstallationLayout, endpoints: UpdateSettings, platform: SupportedOs) -> Self {
        Self {
            client: Client::new(),
            layout,
            endpoints,
            platform,
            progress: Arc::new(NoopProgress),
        }
    }

    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    #[must_use]
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Newest release currently published on the index.
    pub async fn latest_remote_release(&self) -> Result<ReleaseDescriptor, UpdateError> {
        let page = self.fetch_index().await?;
        latest_release(&page)
    }

    async fn fetch_index(&self) -> Result<String, UpdateError> {
        let url = self.endpoints.index_url(self.platform);
        let index_err = |e: reqwest::Error| UpdateError::Index {
            url: url.to_string(),
            reason: e.to_string(),
        };
        self.client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(index_err)?
            .text()
            .await
            .map_err(index_err)
    }

    async fn extract(archive: PathBuf, dest: PathBuf) -> Result<usize, UpdateError> {
        tokio::task::spawn_blocking(move || extract_archive(&archive, &dest))
            .await
            .map_err(|e| UpdateError::Io(std::io::Error::other(e)))?
    }

    async fn merge(source: PathBuf, dest: PathBuf) -> Result<MergeSummary, UpdateError> {
        tokio::task::spawn_blocking(move || merge_tree(&source, &dest))
            .await
            .map_err(|e| UpdateError::Io(std::io::Error::other(e)))?
    }

    async fn download(&self, url: &str, dest: &Path, label: &str) -> Result<u64, UpdateError> {
        download_to_file(&self.client, url, dest, label, self.progress.as_ref())
            .await
            .inspect_err(|e| error!(error = %e, "Download failed"))
    }
}

#[async_trait]
impl Updater for UpdatePipeline {
    async fn update_binaries(&self) -> Result<(), UpdateError> {
        let release = self.latest_remote_release().await?;
        info!(release = %release, "Installing server build");

        fs::create_dir_all(&self.layout.updates_path).await?;

        let archive = self
            .layout
            .release_archive(&release, self.endpoints.server_archive(self.platform));
        let url = self
            .endpoints
            .release_url(self.platform, &release.version_path);
        self.download(&url, &archive, "Downloading server files")
            .await?;

        debug!("Extracting server archive");
        let staging = self.layout.release_staging_dir(&release);
        let files = Self::extract(archive, staging.clone()).await?;
        self.progress
            .message(&format!("Extracted {files} files from {}", release.version_name()));

        debug!("Extraction complete, merging into game path");
        let summary = Self::merge(staging, self.layout.game_path.clone()).await?;
        self.progress.message(&format!(
            "Installed {} files into {}",
            summary.files,
            self.layout.game_path.display()
        ));

        info!(release = %release.version_name(), "Update complete");
        Ok(())
    }

    async fn update_data(&self) -> Result<(), UpdateError> {
        debug!("Updating server-data");
        fs::create_dir_all(&self.layout.updates_path).await?;

        let staging = self.layout.data_staging_dir();
        if fs::try_exists(&staging).await? {
            debug!(staging = %staging.display(), "Server data already staged");
        } else {
            let archive = self.layout.data_archive();
            self.download(
                &self.endpoints.data_archive_url,
                &archive,
                "Downloading server data",
            )
            .await?;
            let files = Self::extract(archive, staging.clone()).await?;
            self.progress
                .message(&format!("Extracted {files} server-data files"));
        }

        fs::create_dir_all(&self.layout.data_path).await?;
        let source = staging.join(&self.endpoints.data_archive_root);
        let summary = Self::merge(source, self.layout.data_path.clone()).await?;
        self.progress.message(&format!(
            "Installed {} files into {}",
            summary.files,
            self.layout.data_path.display()
        ));

        info!(data_path = %self.layout.data_path.display(), "Server data installed");
        Ok(())
    }
}
