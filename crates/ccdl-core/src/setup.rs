//! Installer support packages.
//!
//! The installer bootstrapper needs a set of support packages next to it:
//! their zips are fetched into `acc_sources/`, unpacked into
//! `packages/<set>/<package>/`, described in `packages/ApplicationInfo.xml`,
//! and the PIM library is placed in `resources/`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::Reporter;
use crate::condition::OsVersion;
use crate::descriptor::app_info::{SetupFeed, build_application_info};
use crate::descriptor::{DescriptorError, write_document};
use crate::io::archive::{self, ArchiveError};
use crate::io::client::{FetchError, VendorClient};
use crate::io::download::{DownloadError, DownloadRequest};
use crate::plan::join_url;

/// Directory holding the downloaded support archives.
pub const SOURCES_DIR: &str = "acc_sources";
/// Directory the archives are unpacked into.
pub const PACKAGES_DIR: &str = "packages";
/// Directory receiving the PIM library.
pub const RESOURCES_DIR: &str = "resources";
/// Descriptor written next to the support packages.
pub const APPLICATION_INFO: &str = "ApplicationInfo.xml";

const PIM_DLL: &str = "AdobePIM.dll";
const PIM_ARCHIVE: &str = "Core.pima";

/// Errors from installer support preparation.
#[derive(Error, Debug)]
pub enum SetupError {
    /// The support feed could not be fetched.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The feed or the application descriptor was malformed.
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    /// A support archive failed to download.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// A support archive failed to unpack.
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// Creating directories or copying files failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The feed describes a different installer build.
    #[error("installer version {expected} does not match the published version {published}")]
    VersionMismatch {
        /// Version of the local installer.
        expected: String,
        /// Version announced by the feed.
        published: String,
    },

    /// A feed package has no downloadable asset.
    #[error("package {0} lists no asset")]
    NoAsset(String),

    /// A blocking unpack task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Inputs of [`run_setup`].
#[derive(Debug, Clone)]
pub struct SetupOptions {
    /// Version of the installer executable the packages are for.
    pub setup_version: String,
    /// OS version reported to the support feed.
    pub os_version: OsVersion,
    /// Root that receives `acc_sources/`, `packages/` and `resources/`.
    pub dest: PathBuf,
}

/// What [`run_setup`] produced.
#[derive(Debug, Clone)]
pub struct SetupReport {
    /// Number of support packages unpacked.
    pub packages: usize,
    /// Path of the written `ApplicationInfo.xml`.
    pub application_info: PathBuf,
    /// `None` when the PIM library could not be found.
    pub pim_dll: Option<PathBuf>,
}

/// OS version in the four-part form the feed expects (`10.0.0.19045`).
pub fn feed_os_version(os: &OsVersion) -> String {
    match os.components() {
        [major, minor, build, ..] => format!("{major}.{minor}.0.{build}"),
        _ => os.major_minor(),
    }
}

/// Fetch, unpack and describe every support package.
pub async fn run_setup<R: Reporter + ?Sized>(
    client: &VendorClient,
    options: &SetupOptions,
    reporter: &R,
) -> Result<SetupReport, SetupError> {
    let url = client
        .config()
        .setup_url(&feed_os_version(&options.os_version), &options.setup_version);
    info!(version = %options.setup_version, "fetching installer support feed");

    let feed = SetupFeed::from_element(&client.fetch_xml(&url).await?)?;
    if feed.version != options.setup_version {
        return Err(SetupError::VersionMismatch {
            expected: options.setup_version.clone(),
            published: feed.version,
        });
    }

    let sources = options.dest.join(SOURCES_DIR);
    let packages_dir = options.dest.join(PACKAGES_DIR);
    tokio::fs::create_dir_all(&sources).await?;
    tokio::fs::create_dir_all(&packages_dir).await?;

    for set in &feed.sets {
        reporter.section(&set.name);
        for package in &set.packages {
            let manifest = client
                .fetch_xml(&join_url(&feed.cdn, &package.manifest_url))
                .await?;
            let asset = manifest
                .find("asset_list/asset/asset_path")
                .map(|path| join_url(&feed.cdn, path.text()))
                .ok_or_else(|| SetupError::NoAsset(package.name.clone()))?;

            let (archive_path, outcome) = DownloadRequest::new(client.http(), &asset, &sources, reporter)
                .skip_existing(true)
                .execute()
                .await?;
            debug!(package = %package.name, outcome = outcome.label(), "support package ready");

            let target = packages_dir.join(&set.name).join(&package.name);
            reporter.extracting(&package.name, 0, None);
            let files =
                tokio::task::spawn_blocking(move || archive::extract_flattening(&archive_path, &target))
                    .await??;
            reporter.extracting(&package.name, files.len() as u64, Some(files.len() as u64));
            reporter.done(&package.name, "extracted", None);
        }
    }

    let application_info = packages_dir.join(APPLICATION_INFO);
    write_document(
        &application_info,
        &build_application_info(&feed, &options.os_version),
        None,
    )
    .await?;
    reporter.info(&format!("Created {}", application_info.display()));

    let resources = options.dest.join(RESOURCES_DIR);
    let packages_root = packages_dir.clone();
    let pim_dll = tokio::task::spawn_blocking(move || locate_pim_dll(&packages_root, &resources)).await??;
    if pim_dll.is_none() {
        warn!("{PIM_DLL} not found");
        reporter.warning(&format!(
            "Cannot find {PIM_DLL}; locate it manually or the installer won't work"
        ));
    }

    Ok(SetupReport {
        packages: feed.package_count(),
        application_info,
        pim_dll,
    })
}

/// Copy the PIM library into `resources_dir`, either straight from
/// `packages/ADC/Core/` or out of the core package archive.
pub fn locate_pim_dll(packages_dir: &Path, resources_dir: &Path) -> Result<Option<PathBuf>, SetupError> {
    let core = packages_dir.join("ADC").join("Core");
    let dll = core.join(PIM_DLL);
    let pima = core.join(PIM_ARCHIVE);

    if dll.is_file() {
        fs::create_dir_all(resources_dir)?;
        let target = resources_dir.join(PIM_DLL);
        fs::copy(&dll, &target)?;
        return Ok(Some(target));
    }
    if pima.is_file() {
        return Ok(Some(archive::extract_entry(&pima, PIM_DLL, resources_dir)?));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NullReporter;
    use crate::io::client::{Endpoints, FetchConfig};
    use ccdl_schema::Platform;
    use mockito::{Matcher, Server};
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(io::Cursor::new(Vec::new()));
        for (name, body) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_feed_os_version() {
        assert_eq!(feed_os_version(&"10.0.19045".parse().unwrap()), "10.0.0.19045");
        assert_eq!(feed_os_version(&"10.0".parse().unwrap()), "10.0.0");
    }

    #[test]
    fn test_pim_dll_from_core_dir_or_archive() {
        let tmp = TempDir::new().unwrap();
        let packages = tmp.path().join("packages");
        let resources = tmp.path().join("resources");
        let core = packages.join("ADC/Core");
        fs::create_dir_all(&core).unwrap();

        assert!(locate_pim_dll(&packages, &resources).unwrap().is_none());

        fs::write(core.join(PIM_ARCHIVE), zip_bytes(&[("bin/AdobePIM.dll", "packed")])).unwrap();
        let found = locate_pim_dll(&packages, &resources).unwrap().unwrap();
        assert_eq!(fs::read_to_string(&found).unwrap(), "packed");

        fs::write(core.join(PIM_DLL), "loose").unwrap();
        let found = locate_pim_dll(&packages, &resources).unwrap().unwrap();
        assert_eq!(found, resources.join(PIM_DLL));
        assert_eq!(fs::read_to_string(found).unwrap(), "loose");
    }

    #[tokio::test]
    async fn test_full_setup_run() {
        let mut server = Server::new_async().await;
        let base = server.url();
        let feed = format!(
            r#"<response><cdn><secure>{base}</secure></cdn>
            <application><name>CreativeCloud</name><platform>win64</platform><version>6.2.0</version>
              <packageSets><packageSet><name>ADC</name><installPath>[COMMONFILES]</installPath>
                <sequenceNumber>1</sequenceNumber>
                <packages><package><name>Core</name><sequenceNumber>1</sequenceNumber>
                  <optional>false</optional><manifestUrl>/core.xml</manifestUrl></package></packages>
              </packageSet></packageSets>
            </application></response>"#
        );
        let archive = zip_bytes(&[("Core/AdobePIM.dll", "dll"), ("Core/Core.pimx", "pimx")]);

        let _feed = server
            .mock("GET", "/core/v1/applications")
            .match_query(Matcher::Any)
            .with_body(feed)
            .create_async()
            .await;
        let _manifest = server
            .mock("GET", "/core.xml")
            .with_body("<manifest><asset_list><asset><asset_path>/Core.zip</asset_path></asset></asset_list></manifest>")
            .create_async()
            .await;
        let _head = server
            .mock("HEAD", "/Core.zip")
            .with_header("content-length", &archive.len().to_string())
            .with_body(&archive)
            .create_async()
            .await;
        let _get = server
            .mock("GET", "/Core.zip")
            .with_body(&archive)
            .create_async()
            .await;

        let config = FetchConfig::for_setup(Platform::Win64).with_endpoints(Endpoints::with_base(&base));
        let client = VendorClient::new(config).unwrap();
        let tmp = TempDir::new().unwrap();
        let options = SetupOptions {
            setup_version: "6.2.0".into(),
            os_version: "10.0.19045".parse().unwrap(),
            dest: tmp.path().to_path_buf(),
        };

        let report = run_setup(&client, &options, &NullReporter).await.unwrap();

        assert_eq!(report.packages, 1);
        assert!(tmp.path().join("acc_sources/Core.zip").is_file());
        assert!(tmp.path().join("packages/ADC/Core/Core.pimx").is_file());
        assert_eq!(report.pim_dll, Some(tmp.path().join("resources/AdobePIM.dll")));

        let info = fs::read_to_string(report.application_info).unwrap();
        assert!(info.contains("<config>10.0.0</config>"));
    }

    #[tokio::test]
    async fn test_version_mismatch_stops_early() {
        let mut server = Server::new_async().await;
        let _feed = server
            .mock("GET", "/core/v1/applications")
            .match_query(Matcher::Any)
            .with_body("<r><cdn><secure>x</secure></cdn><application><version>5.0</version></application></r>")
            .create_async()
            .await;

        let config = FetchConfig::for_setup(Platform::Win64).with_endpoints(Endpoints::with_base(&server.url()));
        let client = VendorClient::new(config).unwrap();
        let tmp = TempDir::new().unwrap();
        let options = SetupOptions {
            setup_version: "6.2.0".into(),
            os_version: "10.0".parse().unwrap(),
            dest: tmp.path().to_path_buf(),
        };

        let err = run_setup(&client, &options, &NullReporter).await.unwrap_err();
        assert!(matches!(err, SetupError::VersionMismatch { .. }));
        assert!(!tmp.path().join("packages").exists());
    }
}
