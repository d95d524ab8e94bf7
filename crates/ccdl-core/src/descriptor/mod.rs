//! Installer descriptor files.
//!
//! Each builder reads a finished value (a pruned manifest, a set of
//! downloaded products, a setup feed) once and produces an [`Element`]
//! tree. Writing is a separate step so builders stay pure.

pub mod app_info;
pub mod driver;
pub mod suite;

use std::path::{Path, PathBuf};

use ccdl_schema::Manifest;
use thiserror::Error;
use tokio::fs;

use crate::io::xml::{Element, XmlError};

pub use app_info::build_application_info;
pub use driver::DriverInfo;
pub use suite::{SuiteInfo, SuiteOptions};

/// File name of the pruned manifest inside a product directory.
pub const APPLICATION_JSON: &str = "Application.json";

/// Errors from building or writing a descriptor.
#[derive(Error, Debug)]
pub enum DescriptorError {
    /// Serializing the tree failed.
    #[error(transparent)]
    Xml(#[from] XmlError),

    /// Reading inputs or writing the file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A saved `Application.json` could not be read back.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A suite directory holds no product manifests.
    #[error("no products found in {0}")]
    NoProducts(PathBuf),

    /// An input lacks a value the descriptor needs.
    #[error("{context} has no {field}")]
    MissingField {
        /// What was being read.
        context: String,
        /// Name of the missing value.
        field: &'static str,
    },
}

/// Booleans are written lower-case in every descriptor.
pub fn bool_text(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

/// Write `bytes` to `path` through a temporary sibling and a rename, so
/// readers never see a half written file.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    let temp = PathBuf::from(temp);

    fs::write(&temp, bytes).await?;
    fs::rename(&temp, path).await
}

/// Write an element tree as an XML document.
pub async fn write_document(
    path: &Path,
    root: &Element,
    standalone: Option<bool>,
) -> Result<(), DescriptorError> {
    let bytes = root.to_document(standalone)?;
    write_atomic(path, &bytes).await?;
    Ok(())
}

/// Store the pruned manifest as `<dir>/Application.json`.
pub async fn write_application_json(dir: &Path, manifest: &Manifest) -> Result<PathBuf, DescriptorError> {
    fs::create_dir_all(dir).await?;
    let path = dir.join(APPLICATION_JSON);
    write_atomic(&path, manifest.to_json()?.as_bytes()).await?;
    Ok(path)
}
