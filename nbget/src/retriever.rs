use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::archive;
use crate::cli::Args;
use crate::config::{prepare_output, Config, RunConfig};
use crate::error::NbGetError;
use crate::fetch::{self, Fetcher};
use crate::scratch::ScratchDir;

pub struct Retriever {
    config: RunConfig,
    fetcher: Fetcher,
}

impl Retriever {
    pub fn new(config: RunConfig) -> Result<Self> {
        let fetcher = Fetcher::new(config.timeout).context("Failed to create HTTP client")?;

        Ok(Self { config, fetcher })
    }

    /// Load the configuration file named by `args` and merge the flags into it
    pub fn from_args(args: &Args) -> Result<Self> {
        let config_path = args.config_path();
        let config = Config::load(&config_path).context("Failed to load configuration")?;

        Self::new(RunConfig::resolve(args, config))
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Download and unpack the archive. Returns the expected target directory.
    ///
    /// The temporary download directory is gone by the time this returns,
    /// whether it succeeded or not.
    pub async fn run(&mut self) -> Result<PathBuf> {
        let target = prepare_output(&mut self.config)?;

        let scratch = ScratchDir::new(self.config.temp_root.as_deref())
            .context("Failed to create temporary directory")?;

        let url = self.config.archive_url();
        tracing::info!("Retrieving {}", url);
        let archive_path = self
            .fetcher
            .download(&url, scratch.path())
            .await
            .map_err(|e| match e {
                e @ NbGetError::DownloadFailed { .. } => NbGetError::InvalidRevision {
                    revision: self.config.revision.clone(),
                    reason: e.to_string(),
                },
                other => other,
            })?;

        if let Some(expected) = &self.config.expected_sha256 {
            fetch::verify_sha256(&archive_path, expected)?;
            tracing::info!("Checksum verified for {}", archive_path.display());
        }

        tracing::info!(
            "Unpacking {} to {}",
            archive_path.display(),
            self.config.output_dir.display()
        );
        let files = archive::extract(&archive_path, &self.config.output_dir, self.config.force)?;
        tracing::debug!("Unpacked {} files", files);

        drop(scratch);

        if !target.exists() {
            tracing::warn!(
                "Archive did not contain {}; check {} for the unpacked notebooks",
                target.display(),
                self.config.output_dir.display()
            );
        }

        Ok(target)
    }
}
