use futures_util::{pin_mut, Stream, StreamExt};
use reqwest::Client;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{NbGetError, Result};

/// Largest slice handed to the writer at once
pub const CHUNK_SIZE: usize = 4096;

pub struct Fetcher {
    http_client: Client,
}

impl Fetcher {
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder().user_agent(concat!("nbget/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http_client: builder.build()?,
        })
    }

    /// Download `url` into `dest_dir`, naming the file after the last URL
    /// segment. Returns the path of the written file.
    pub async fn download(&self, url: &str, dest_dir: &Path) -> Result<PathBuf> {
        let file_name = archive_file_name(url)?;

        let response = self.http_client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NbGetError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let path = dest_dir.join(file_name);
        let mut file = fs::File::create(&path)?;
        let written = copy_chunked(response.bytes_stream(), &mut file).await?;
        file.flush()?;

        tracing::debug!("Wrote {} bytes to {}", written, path.display());
        Ok(path)
    }
}

/// Final path segment of a URL
pub fn archive_file_name(url: &str) -> Result<&str> {
    match url.rsplit_once('/') {
        Some((_, name)) if !name.is_empty() => Ok(name),
        _ => Err(NbGetError::InvalidUrl {
            url: url.to_string(),
        }),
    }
}

/// Copy a stream of byte chunks into `writer`, never writing more than
/// [`CHUNK_SIZE`] bytes per call. Returns the number of bytes written.
pub async fn copy_chunked<S, B, E, W>(stream: S, writer: &mut W) -> Result<u64>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<NbGetError>,
    W: Write,
{
    pin_mut!(stream);

    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(Into::into)?;
        for block in chunk.as_ref().chunks(CHUNK_SIZE) {
            writer.write_all(block)?;
            written += block.len() as u64;
        }
    }

    Ok(written)
}

/// Calculate SHA256 hash of a file
pub fn sha256_file(path: &Path) -> Result<String> {
    use sha2::{Digest, Sha256};

    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0; 8192];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

pub fn verify_sha256(path: &Path, expected: &str) -> Result<()> {
    let actual = sha256_file(path)?;
    tracing::debug!("SHA256 of {}: {}", path.display(), actual);

    if !actual.eq_ignore_ascii_case(expected.trim()) {
        return Err(NbGetError::ChecksumMismatch {
            file: path.display().to_string(),
            expected: expected.trim().to_string(),
            actual,
        });
    }

    Ok(())
}
