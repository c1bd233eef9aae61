use clap::Parser;
use std::path::PathBuf;

use crate::config::Config;

#[derive(Parser, Debug, Clone)]
#[clap(
    name = "nbget",
    version,
    about = "Download the STAK notebooks release matching this version",
    long_about = None
)]
pub struct Args {
    /// Ignore current release and download the latest available
    #[clap(short, long)]
    pub latest: bool,

    /// Download a specific release tag or branch
    #[clap(short, long, value_name = "REV", conflicts_with = "latest")]
    pub revision: Option<String>,

    /// Directory the notebooks are unpacked into
    #[clap(short, long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Overwrite existing notebook directory
    #[clap(short, long)]
    pub force: bool,

    /// Enable verbose output
    #[clap(short, long)]
    pub verbose: bool,

    /// Expected SHA256 digest of the downloaded archive
    #[clap(long, value_name = "HEX")]
    pub sha256: Option<String>,

    /// Configuration file path
    #[clap(long, env = "NBGET_CONFIG")]
    pub config: Option<PathBuf>,
}

impl Args {
    /// Configuration file to load, falling back to the per-user default
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }
}
