use thiserror::Error;

#[derive(Error, Debug)]
pub enum NbGetError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("{path} exists.\nUse --force to overwrite.")]
    TargetExists { path: String },

    #[error("Requested invalid release version: {revision}\n(Developers, use \"-l\" for latest master)\n\nReason: {reason}\n")]
    InvalidRevision { revision: String, reason: String },

    #[error("Failed to download {url}: HTTP {status} {reason}")]
    DownloadFailed {
        url: String,
        status: u16,
        reason: String,
    },

    #[error("Cannot derive an archive file name from URL '{url}'")]
    InvalidUrl { url: String },

    #[error("Configuration error at {path}: {message}")]
    Config { path: String, message: String },

    #[error("Unsupported archive format for {file}. Supported formats: tar, tar.gz, tar.bz2, tar.xz, zip")]
    UnsupportedFormat { file: String },

    #[error("Archive extraction failed for {file}: {reason}")]
    ArchiveExtraction { file: String, reason: String },

    #[error("Refusing to extract archive member '{entry}': path escapes the destination directory")]
    UnsafeEntry { entry: String },

    #[error("Checksum verification failed for {file}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        file: String,
        expected: String,
        actual: String,
    },
}

pub type Result<T> = std::result::Result<T, NbGetError>;
