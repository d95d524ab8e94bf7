//! Zip extraction for installer support packages.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use zip::ZipArchive;

/// Errors from unpacking a support package.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// Reading the archive or writing an entry failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The archive is corrupt or uses an unsupported feature.
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A required file is missing from the archive.
    #[error("no entry ending in '{suffix}' in {archive}")]
    EntryNotFound {
        /// Archive that was searched.
        archive: String,
        /// Path suffix that was looked for.
        suffix: String,
    },
}

/// Extract `archive_path` into `dest_dir`.
///
/// Older support packages nest their payload under a folder named like the
/// destination directory; entries whose path contains that name are written
/// straight into `dest_dir` by file name. Everything else keeps its relative
/// path. Returns the extracted file paths.
pub fn extract_flattening(archive_path: &Path, dest_dir: &Path) -> Result<Vec<PathBuf>, ArchiveError> {
    let mut archive = ZipArchive::new(File::open(archive_path)?)?;
    let dir_name = dest_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    fs::create_dir_all(dest_dir)?;
    let mut extracted = Vec::new();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        let Some(relative) = entry.enclosed_name().map(|p| p.to_path_buf()) else {
            continue;
        };

        let target = if !dir_name.is_empty() && entry.name().contains(dir_name.as_str()) {
            match relative.file_name() {
                Some(base) => dest_dir.join(base),
                None => continue,
            }
        } else {
            dest_dir.join(&relative)
        };

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&target)?;
        io::copy(&mut entry, &mut out)?;
        extracted.push(target);
    }

    debug!(archive = %archive_path.display(), files = extracted.len(), "extracted");
    Ok(extracted)
}

/// Copy the first entry whose name ends with `suffix` into `dest_dir`,
/// keeping only its file name.
pub fn extract_entry(archive_path: &Path, suffix: &str, dest_dir: &Path) -> Result<PathBuf, ArchiveError> {
    let mut archive = ZipArchive::new(File::open(archive_path)?)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() || !entry.name().ends_with(suffix) {
            continue;
        }
        let Some(base) = entry
            .enclosed_name()
            .and_then(|p| p.file_name().map(ToOwned::to_owned))
        else {
            continue;
        };

        fs::create_dir_all(dest_dir)?;
        let target = dest_dir.join(base);
        let mut out = File::create(&target)?;
        io::copy(&mut entry, &mut out)?;
        return Ok(target);
    }

    Err(ArchiveError::EntryNotFound {
        archive: archive_path.display().to_string(),
        suffix: suffix.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn make_zip(path: &Path, entries: &[(&str, &str)]) {
        let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
        for (name, body) in entries {
            if name.ends_with('/') {
                zip.add_directory(*name, SimpleFileOptions::default()).unwrap();
            } else {
                zip.start_file(*name, SimpleFileOptions::default()).unwrap();
                zip.write_all(body.as_bytes()).unwrap();
            }
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_nested_payload_is_flattened() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("core.zip");
        make_zip(
            &archive,
            &[
                ("Core/", ""),
                ("Core/Core.pimx", "pimx"),
                ("Core/bin/tool.exe", "exe"),
                ("other/readme.txt", "hi"),
            ],
        );

        let dest = tmp.path().join("packages/ADC/Core");
        let files = extract_flattening(&archive, &dest).unwrap();

        assert_eq!(files.len(), 3);
        assert_eq!(fs::read_to_string(dest.join("Core.pimx")).unwrap(), "pimx");
        assert_eq!(fs::read_to_string(dest.join("tool.exe")).unwrap(), "exe");
        assert_eq!(fs::read_to_string(dest.join("other/readme.txt")).unwrap(), "hi");
    }

    #[test]
    fn test_extract_entry_by_suffix() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("Core.pima");
        make_zip(&archive, &[("x/y/AdobePIM.dll", "dll"), ("x/other.dll", "no")]);

        let out = extract_entry(&archive, "AdobePIM.dll", &tmp.path().join("resources")).unwrap();
        assert_eq!(out, tmp.path().join("resources/AdobePIM.dll"));
        assert_eq!(fs::read_to_string(out).unwrap(), "dll");

        let missing = extract_entry(&archive, "Nope.dll", tmp.path());
        assert!(matches!(missing, Err(ArchiveError::EntryNotFound { .. })));
    }
}
