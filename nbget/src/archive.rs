use std::fs::{self, File};
use std::io::{self, BufReader, Read, Seek};
use std::path::{Component, Path};

use crate::error::{NbGetError, Result};

/// Bytes inspected when sniffing the archive format
const HEADER_LEN: u64 = 512;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    Tar(Compression),
}

/// Compression wrapped around a tar stream
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Bzip2,
    Xz,
}

impl Compression {
    fn decoder<'a, R: Read + 'a>(self, reader: R) -> Box<dyn Read + 'a> {
        match self {
            Self::None => Box::new(reader),
            Self::Gzip => Box::new(flate2::read::GzDecoder::new(reader)),
            Self::Bzip2 => Box::new(bzip2::read::BzDecoder::new(reader)),
            Self::Xz => Box::new(xz2::read::XzDecoder::new(reader)),
        }
    }
}

/// Identify an archive from its leading bytes. The file name is never
/// consulted.
pub fn detect_format(header: &[u8]) -> Option<ArchiveFormat> {
    match header {
        [0x50, 0x4B, 0x03, 0x04, ..] => Some(ArchiveFormat::Zip),
        [0x1F, 0x8B, ..] => Some(ArchiveFormat::Tar(Compression::Gzip)),
        [b'B', b'Z', b'h', ..] => Some(ArchiveFormat::Tar(Compression::Bzip2)),
        [0xFD, b'7', b'z', b'X', b'Z', 0x00, ..] => Some(ArchiveFormat::Tar(Compression::Xz)),
        _ if is_tar_header(header) => Some(ArchiveFormat::Tar(Compression::None)),
        _ => None,
    }
}

// Both POSIX ("ustar\0") and GNU ("ustar  ") magic start with "ustar"
fn is_tar_header(data: &[u8]) -> bool {
    data.len() >= 262 && data[257..262] == *b"ustar"
}

fn read_header(file: &mut File) -> io::Result<Vec<u8>> {
    let mut header = Vec::with_capacity(HEADER_LEN as usize);
    file.by_ref().take(HEADER_LEN).read_to_end(&mut header)?;
    file.rewind()?;
    Ok(header)
}

/// Extract every member of `archive_path` into `dest_dir`.
///
/// Members are unpacked into a staging directory inside `dest_dir` and only
/// moved into place once the whole archive has been read, so a failed
/// extraction leaves `dest_dir` as it was. Top-level entries that already
/// exist are replaced when `overwrite` is set.
///
/// Returns the number of regular files extracted.
pub fn extract(archive_path: &Path, dest_dir: &Path, overwrite: bool) -> Result<usize> {
    let label = archive_path.display().to_string();

    let mut file = File::open(archive_path)?;
    let header = read_header(&mut file)?;
    let format =
        detect_format(&header).ok_or_else(|| NbGetError::UnsupportedFormat { file: label.clone() })?;
    tracing::debug!("Detected {:?} archive: {}", format, label);

    let staging = tempfile::Builder::new()
        .prefix(".nbget-staging-")
        .tempdir_in(dest_dir)?;

    let unpacked = match format {
        ArchiveFormat::Zip => unpack_zip(file, staging.path()),
        ArchiveFormat::Tar(compression) => {
            unpack_tar(compression.decoder(BufReader::new(file)), staging.path())
        }
    };
    unpacked.map_err(|e| match e {
        NbGetError::Io(err) => NbGetError::ArchiveExtraction {
            file: label.clone(),
            reason: err.to_string(),
        },
        NbGetError::Zip(err) => NbGetError::ArchiveExtraction {
            file: label.clone(),
            reason: err.to_string(),
        },
        other => other,
    })?;

    let files = count_files(staging.path())?;
    promote(staging.path(), dest_dir, overwrite)?;

    tracing::debug!("Extracted {} files from {}", files, label);
    Ok(files)
}

/// Reject absolute members and members climbing out with `..`
fn check_entry_path(path: &Path) -> Result<()> {
    let escapes = path.components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });

    if escapes {
        return Err(NbGetError::UnsafeEntry {
            entry: path.display().to_string(),
        });
    }
    Ok(())
}

fn unpack_tar<R: Read>(reader: R, dest_dir: &Path) -> Result<()> {
    let mut archive = tar::Archive::new(reader);
    let mut directories = Vec::new();

    for entry in archive.entries()? {
        let mut entry = entry?;
        let path = entry.path()?.into_owned();
        check_entry_path(&path)?;

        // A read-only directory would block the members after it, so
        // directory modes are applied once every file is in place
        if entry.header().entry_type() == tar::EntryType::Directory {
            directories.push((path, entry));
            continue;
        }
        unpack_entry(&mut entry, &path, dest_dir)?;
    }

    // Children before parents
    directories.sort_by(|(a, _), (b, _)| b.cmp(a));
    for (path, mut entry) in directories {
        unpack_entry(&mut entry, &path, dest_dir)?;
    }

    Ok(())
}

fn unpack_entry<R: Read>(entry: &mut tar::Entry<'_, R>, path: &Path, dest_dir: &Path) -> Result<()> {
    // unpack_in also refuses members that would land outside through
    // symlinked parents
    if !entry.unpack_in(dest_dir)? {
        return Err(NbGetError::UnsafeEntry {
            entry: path.display().to_string(),
        });
    }
    Ok(())
}

fn unpack_zip(file: File, dest_dir: &Path) -> Result<()> {
    let mut archive = zip::ZipArchive::new(BufReader::new(file))?;
    #[cfg(unix)]
    let mut directory_modes = Vec::new();

    for i in 0..archive.len() {
        let mut member = archive.by_index(i)?;
        let relative = member
            .enclosed_name()
            .ok_or_else(|| NbGetError::UnsafeEntry {
                entry: member.name().to_string(),
            })?;
        let outpath = dest_dir.join(relative);

        if member.is_dir() {
            fs::create_dir_all(&outpath)?;
        } else {
            if let Some(parent) = outpath.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut outfile = File::create(&outpath)?;
            io::copy(&mut member, &mut outfile)?;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = member.unix_mode() {
                if member.is_dir() {
                    directory_modes.push((outpath, mode));
                } else {
                    fs::set_permissions(&outpath, fs::Permissions::from_mode(mode))?;
                }
            }
        }
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        directory_modes.sort_by(|(a, _), (b, _)| b.cmp(a));
        for (path, mode) in directory_modes {
            fs::set_permissions(&path, fs::Permissions::from_mode(mode))?;
        }
    }

    Ok(())
}

fn count_files(dir: &Path) -> Result<usize> {
    let mut files = 0;
    for entry in walkdir::WalkDir::new(dir) {
        let entry = entry.map_err(io::Error::from)?;
        if entry.file_type().is_file() {
            files += 1;
        }
    }
    Ok(files)
}

/// Move the staged top-level entries into `dest_dir`
fn promote(staging: &Path, dest_dir: &Path, overwrite: bool) -> Result<()> {
    let mut names = Vec::new();
    for entry in fs::read_dir(staging)? {
        names.push(entry?.file_name());
    }

    // Check every conflict before moving anything
    if !overwrite {
        if let Some(existing) = names
            .iter()
            .map(|name| dest_dir.join(name))
            .find(|target| target.symlink_metadata().is_ok())
        {
            return Err(NbGetError::TargetExists {
                path: existing.display().to_string(),
            });
        }
    }

    for name in names {
        let target = dest_dir.join(&name);
        if let Ok(metadata) = target.symlink_metadata() {
            tracing::info!("Replacing {}", target.display());
            if metadata.is_dir() {
                fs::remove_dir_all(&target)?;
            } else {
                fs::remove_file(&target)?;
            }
        }
        fs::rename(staging.join(&name), &target)?;
    }

    Ok(())
}
