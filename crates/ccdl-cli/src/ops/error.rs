//! Errors surfaced by download operations

use ccdl_core::descriptor::DescriptorError;
use ccdl_core::io::client::FetchError;
use ccdl_core::io::download::DownloadError;
use ccdl_core::plan::PlanError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("{reason}; choose one of: {}", candidates.join(", "))]
    Unresolved { reason: String, candidates: Vec<String> },

    #[error("{0} publishes no downloadable assets")]
    NoAssets(String),

    #[error("{0} has no full installer asset")]
    NoFullInstaller(String),

    #[error("the catalog has no CDN address for {0}")]
    MissingCdn(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Failed to plan download: {0}")]
    Plan(#[from] PlanError),

    #[error("Failed to write descriptor: {0}")]
    Descriptor(#[from] DescriptorError),

    #[error("Download failed: {0}")]
    Download(#[from] DownloadError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
