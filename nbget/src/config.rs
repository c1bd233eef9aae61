use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use crate::cli::Args;
use crate::error::{NbGetError, Result};

/// Revision used by `--latest` to track the head of development
pub const LATEST_REVISION: &str = "master";

const DEFAULT_REPO_BASE: &str = "https://github.com/spacetelescope";
const DEFAULT_PROJECT: &str = "stak-notebooks";
const DEFAULT_EXTENSION: &str = ".tar.gz";

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub download: DownloadConfig,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SourceConfig {
    #[serde(default = "default_repo_base")]
    pub repo_base: String,

    #[serde(default = "default_project")]
    pub project: String,

    #[serde(default = "default_extension")]
    pub extension: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            repo_base: default_repo_base(),
            project: default_project(),
            extension: default_extension(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct DownloadConfig {
    pub timeout_secs: Option<u64>,
    pub temp_dir: Option<PathBuf>,
}

fn default_repo_base() -> String {
    DEFAULT_REPO_BASE.to_string()
}

fn default_project() -> String {
    DEFAULT_PROJECT.to_string()
}

fn default_extension() -> String {
    DEFAULT_EXTENSION.to_string()
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| NbGetError::Config {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Get the default configuration file path
    pub fn default_path() -> PathBuf {
        directories::BaseDirs::new()
            .map(|dirs| dirs.config_dir().join("nbget.toml"))
            .unwrap_or_else(|| PathBuf::from("~/.config/nbget.toml"))
    }
}

/// Everything a single run needs, resolved once up front.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub project_name: String,
    pub repo_base: String,
    pub revision: String,
    pub archive_extension: String,
    pub output_dir: PathBuf,
    pub force: bool,
    pub verbose: bool,
    pub expected_sha256: Option<String>,
    pub temp_root: Option<PathBuf>,
    pub timeout: Option<Duration>,
}

impl RunConfig {
    /// Merge the configuration file with command line arguments.
    ///
    /// The revision defaults to this tool's own version so that a given
    /// release of nbget always fetches the matching notebooks.
    pub fn resolve(args: &Args, config: Config) -> Self {
        let revision = if args.latest {
            LATEST_REVISION.to_string()
        } else {
            args.revision
                .clone()
                .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string())
        };

        Self {
            project_name: config.source.project,
            repo_base: config.source.repo_base,
            revision,
            archive_extension: config.source.extension,
            output_dir: args.output_dir.clone(),
            force: args.force,
            verbose: args.verbose,
            expected_sha256: args.sha256.clone(),
            temp_root: config.download.temp_dir,
            timeout: config.download.timeout_secs.map(Duration::from_secs),
        }
    }

    /// `<repo_base>/<project>/archive/<revision><extension>`
    pub fn archive_url(&self) -> String {
        [
            self.repo_base.trim_end_matches('/'),
            self.project_name.as_str(),
            "archive",
            &format!("{}{}", self.revision, self.archive_extension),
        ]
        .join("/")
    }

    /// Name of the directory the archive unpacks into
    pub fn target_name(&self) -> String {
        format!("{}-{}", self.project_name, self.revision)
    }

    pub fn target_dir(&self) -> PathBuf {
        self.output_dir.join(self.target_name())
    }
}

/// Create the output directory if needed and refuse to clobber an existing
/// target unless forced. Returns the absolute target path.
///
/// On success `config.output_dir` is absolute.
pub fn prepare_output(config: &mut RunConfig) -> Result<PathBuf> {
    config.output_dir = normalize_path(&std::path::absolute(&config.output_dir)?);

    if !config.output_dir.exists() {
        tracing::debug!("Creating output directory {}", config.output_dir.display());
        create_dir_all(&config.output_dir)?;
    }

    let target = config.target_dir();
    if target.exists() && !config.force {
        return Err(NbGetError::TargetExists {
            path: target.display().to_string(),
        });
    }

    Ok(target)
}

/// Fold `.` and `..` lexically, without touching the filesystem
fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();

    for component in path.components() {
        match component {
            Component::ParentDir => {
                result.pop();
            }
            Component::CurDir => {}
            other => result.push(other.as_os_str()),
        }
    }

    result
}

#[cfg(unix)]
fn create_dir_all(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(0o755)
        .create(path)
}

#[cfg(not(unix))]
fn create_dir_all(path: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(path)
}
