//! Setup command

use anyhow::{Context, Result};
use ccdl_core::Reporter;
use ccdl_core::condition::OsVersion;
use ccdl_core::io::client::{FetchConfig, VendorClient};
use ccdl_core::setup::{SetupOptions, run_setup};
use std::time::Instant;

use crate::SetupArgs;
use crate::ui::Output;

/// Download and unpack the installer support packages.
pub async fn setup(args: SetupArgs) -> Result<()> {
    let output = Output::new();
    let start = Instant::now();

    let os_version: OsVersion = args
        .os_version
        .parse()
        .with_context(|| format!("Invalid OS version '{}'", args.os_version))?;
    let dest = match args.destination {
        Some(dest) => dest,
        None => std::env::current_dir().context("Failed to read the current directory")?,
    };

    let client = VendorClient::new(FetchConfig::for_setup(args.platform)).context("Failed to build HTTP client")?;
    let options = SetupOptions {
        setup_version: args.setup_version,
        os_version,
        dest,
    };

    output.section(&format!("Installer support packages {}", options.setup_version));
    let report = run_setup(&client, &options, &output).await;
    let report = match report {
        Ok(report) => report,
        Err(e) => {
            output.error(&e.to_string());
            output.sync().await;
            return Err(e.into());
        }
    };

    output.success(&format!("Wrote {}", report.application_info.display()));
    if let Some(dll) = &report.pim_dll {
        output.success(&format!("Copied {}", dll.display()));
    }
    output.summary(report.packages, "unpacked", start.elapsed().as_secs_f64());
    output.sync().await;
    Ok(())
}
