//! ccdl - offline package downloader
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! Downloads product packages from the vendor distribution API so they can
//! be installed later without a network connection, and generates the
//! descriptor files the offline installer reads.
//!
//! # Directory Layout
//!
//! ```text
//! <dest>/
//! ├── products/
//! │   ├── <CODE>-Driver.xml   # one per downloaded application
//! │   ├── SuiteInfo.xml       # written by `ccdl suite`
//! │   ├── icons/              # with --product-icons
//! │   └── <CODE>/             # Application.json + package zips
//! ├── acc_sources/            # `ccdl setup` archives
//! ├── packages/               # `ccdl setup` extracted packages
//! └── resources/              # AdobePIM.dll
//! ```

pub mod cmd;
pub mod ops;
pub mod ui;

pub use ccdl_core::USER_AGENT;

use ccdl_core::io::client::UrlVersion;
use ccdl_schema::Platform;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Default target OS version when none is given.
pub const DEFAULT_OS_VERSION: &str = "10.0.19045";

#[derive(Debug, Parser)]
#[command(name = "ccdl")]
#[command(author, version, about = "ccdl - offline package downloader")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Download products and their dependencies
    Download(DownloadArgs),
    /// Download the installer support packages
    Setup(SetupArgs),
    /// Generate SuiteInfo.xml for downloaded products
    Suite(SuiteArgs),
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Debug, Clone, Args)]
pub struct DownloadArgs {
    /// Product code(s); several codes form a batch (e.g. PHSP,ILST)
    #[arg(short = 's', long = "sap-code", value_delimiter = ',')]
    pub sap_codes: Vec<String>,

    /// Version of the product (e.g. 25.0.0)
    #[arg(short = 'v', long)]
    pub version: Option<String>,

    /// Install language(s), comma separated, or "all"
    #[arg(short = 'l', long = "install-language")]
    pub languages: Option<String>,

    /// OS language used as the default choice (e.g. en_US)
    #[arg(short = 'o', long = "os-language")]
    pub os_language: Option<String>,

    /// Application platform
    #[arg(short = 'p', long = "platform", default_value = "win64")]
    pub platform: Platform,

    /// Catalog URL version (v4, v5 or v6)
    #[arg(short = 'u', long = "url-version", default_value = "v6")]
    pub url_version: UrlVersion,

    /// Directory to download into
    #[arg(short = 'd', long = "destination", env = "CCDL_DEST")]
    pub destination: Option<PathBuf>,

    /// Authorization header value for products that require an account
    #[arg(short = 'A', long = "auth", env = "CCDL_AUTH_TOKEN", hide_env_values = true)]
    pub auth: Option<String>,

    /// Don't ask to download another product
    #[arg(short = 'n', long = "no-repeat")]
    pub no_repeat: bool,

    /// Download product icons
    #[arg(short = 'i', long = "product-icons")]
    pub product_icons: bool,

    /// Skip complete files and resume partial ones
    #[arg(short = 'x', long = "skip-existing")]
    pub skip_existing: bool,

    /// Target OS version used to evaluate package conditions
    #[arg(long = "os-version", default_value = DEFAULT_OS_VERSION)]
    pub os_version: String,

    /// Never prompt; fail when a choice is needed
    #[arg(long)]
    pub non_interactive: bool,
}

#[derive(Debug, Clone, Args)]
pub struct SetupArgs {
    /// Version of the installer executable (e.g. 6.2.0.554)
    #[arg(long = "setup-version")]
    pub setup_version: String,

    /// Installer platform
    #[arg(short = 'p', long = "platform", default_value = "win64")]
    pub platform: Platform,

    /// Target OS version
    #[arg(long = "os-version", default_value = DEFAULT_OS_VERSION)]
    pub os_version: String,

    /// Directory that receives acc_sources/, packages/ and resources/
    #[arg(short = 'd', long = "destination", env = "CCDL_DEST")]
    pub destination: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct SuiteArgs {
    /// Products directory
    #[arg(short = 'd', long = "products-dir", default_value = "./products")]
    pub products_dir: PathBuf,

    /// Suite name
    #[arg(short = 'n', long)]
    pub name: Option<String>,

    /// Suite version
    #[arg(short = 'v', long)]
    pub version: Option<String>,

    /// Never prompt; use defaults for missing values
    #[arg(long)]
    pub non_interactive: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_batch_codes_are_split() {
        let cli = Cli::parse_from(["ccdl", "download", "-s", "PHSP,ILST", "-l", "en_US", "-n"]);
        let Commands::Download(args) = cli.command else {
            panic!("expected download");
        };
        assert_eq!(args.sap_codes, vec!["PHSP", "ILST"]);
        assert_eq!(args.platform, Platform::Win64);
        assert_eq!(args.url_version, UrlVersion::V6);
        assert!(args.no_repeat);
    }

    #[test]
    fn test_invalid_platform_is_rejected() {
        assert!(Cli::try_parse_from(["ccdl", "download", "-p", "mac"]).is_err());
    }
}
