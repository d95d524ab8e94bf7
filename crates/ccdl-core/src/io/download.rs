//! Resumable package downloads.
//!
//! The remote size is read with `HEAD` first. With skip-existing enabled,
//! a local file of the same size is left alone and a shorter one is resumed
//! with a range request when the server supports it. Partial files are kept
//! on failure so the next run can pick them up.

use std::path::{Path, PathBuf};

use futures::StreamExt;
use reqwest::header::{ACCEPT_RANGES, CONTENT_LENGTH, RANGE, USER_AGENT};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::Reporter;
use crate::vendor;

/// Errors from a single file download.
#[derive(Error, Debug)]
pub enum DownloadError {
    /// Transport failure or non-success status.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Writing the destination file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file on disk does not have the size the server announced.
    #[error("{file}: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// Local file name.
        file: String,
        /// Size announced by the server.
        expected: u64,
        /// Size written.
        actual: u64,
    },

    /// The URL ends without a file name and none was given.
    #[error("cannot derive a file name from {0}")]
    NoFileName(String),
}

/// What happened to one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Local file already complete.
    Skipped {
        /// Size of the file on disk.
        size: u64,
    },
    /// Downloaded from scratch.
    Fetched {
        /// Size of the file on disk.
        size: u64,
    },
    /// Completed a partial file from `offset`.
    Resumed {
        /// Byte offset the download resumed from.
        offset: u64,
        /// Size of the file on disk.
        size: u64,
    },
}

impl DownloadOutcome {
    /// Final size of the file on disk.
    pub fn size(&self) -> u64 {
        match *self {
            Self::Skipped { size } | Self::Fetched { size } | Self::Resumed { size, .. } => size,
        }
    }

    /// Word shown in progress output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Skipped { .. } => "skipped",
            Self::Fetched { .. } => "downloaded",
            Self::Resumed { .. } => "resumed",
        }
    }
}

/// Last path segment of a URL, without query or fragment.
pub fn file_name_from_url(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    path.rsplit('/').next().filter(|name| !name.is_empty())
}

/// Request for a download operation
pub struct DownloadRequest<'a, R: Reporter + ?Sized> {
    /// HTTP client used for `HEAD` and `GET`.
    pub client: &'a Client,
    /// Source address.
    pub url: &'a str,
    /// Directory the file is written to.
    pub dest_dir: &'a Path,
    /// Local name; the last URL segment when `None`.
    pub file_name: Option<String>,
    /// Keep complete files and resume partial ones.
    pub skip_existing: bool,
    /// Progress sink.
    pub reporter: &'a R,
}

impl<'a, R: Reporter + ?Sized> DownloadRequest<'a, R> {
    /// A request that overwrites any existing file.
    pub fn new(client: &'a Client, url: &'a str, dest_dir: &'a Path, reporter: &'a R) -> Self {
        Self {
            client,
            url,
            dest_dir,
            file_name: None,
            skip_existing: false,
            reporter,
        }
    }

    /// Store under `prefix` + the URL file name.
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.file_name = file_name_from_url(self.url).map(|name| format!("{prefix}{name}"));
        self
    }

    /// Toggle skip-existing and resume.
    pub fn skip_existing(mut self, skip: bool) -> Self {
        self.skip_existing = skip;
        self
    }

    /// Destination path of this request.
    pub fn dest(&self) -> Result<PathBuf, DownloadError> {
        let name = match &self.file_name {
            Some(name) => name.as_str(),
            None => file_name_from_url(self.url)
                .ok_or_else(|| DownloadError::NoFileName(self.url.to_string()))?,
        };
        Ok(self.dest_dir.join(name))
    }

    /// Execute the download.
    pub async fn execute(self) -> Result<(PathBuf, DownloadOutcome), DownloadError> {
        let dest = self.dest()?;
        let file_name = dest
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let (total, accept_ranges) = self.remote_length().await?;
        let existing = tokio::fs::metadata(&dest).await.map(|m| m.len()).ok();

        if self.skip_existing {
            if let (Some(total), Some(existing)) = (total, existing) {
                if existing == total {
                    debug!(file = %file_name, size = total, "already complete");
                    self.reporter.done(&file_name, "skipped", Some(total));
                    return Ok((dest, DownloadOutcome::Skipped { size: total }));
                }
            }
        }

        let resume_from = match (self.skip_existing, total, existing) {
            (true, Some(total), Some(existing)) if accept_ranges && existing > 0 && existing < total => {
                Some(existing)
            }
            _ => None,
        };

        let mut request = self.client.get(self.url);
        if let Some(offset) = resume_from {
            request = request.header(RANGE, format!("bytes={offset}-"));
        }
        let response = request.send().await?.error_for_status()?;

        // servers may ignore the range and send everything
        let offset = match resume_from {
            Some(offset) if response.status() == StatusCode::PARTIAL_CONTENT => offset,
            _ => 0,
        };
        let total = total.or_else(|| response.content_length().map(|len| len + offset));

        let mut file = if offset > 0 {
            info!(file = %file_name, offset, "resuming download");
            OpenOptions::new().append(true).open(&dest).await?
        } else {
            OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&dest)
                .await?
        };

        let mut written = offset;
        self.reporter.downloading(&file_name, written, total);

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
            self.reporter.downloading(&file_name, written, total);
        }
        file.flush().await?;

        if let Some(expected) = total {
            if written != expected {
                self.reporter.failed(&file_name, "size mismatch");
                return Err(DownloadError::SizeMismatch {
                    file: file_name,
                    expected,
                    actual: written,
                });
            }
        }

        let outcome = if offset > 0 {
            DownloadOutcome::Resumed {
                offset,
                size: written,
            }
        } else {
            DownloadOutcome::Fetched { size: written }
        };
        self.reporter.done(&file_name, outcome.label(), Some(written));
        Ok((dest, outcome))
    }

    /// Remote size and range support, from a `HEAD` request.
    async fn remote_length(&self) -> Result<(Option<u64>, bool), DownloadError> {
        let head = self
            .client
            .head(self.url)
            .header(USER_AGENT, vendor::DOWNLOAD_USER_AGENT)
            .send()
            .await?;

        if !head.status().is_success() {
            debug!(url = self.url, status = %head.status(), "HEAD request failed");
            return Ok((None, false));
        }

        let length = head
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|len| *len > 0);
        let accept_ranges = head
            .headers()
            .get(ACCEPT_RANGES)
            .is_some_and(|v| v == "bytes");

        Ok((length, accept_ranges))
    }
}
