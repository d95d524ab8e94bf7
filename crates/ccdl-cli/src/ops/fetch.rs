//! Executing downloads.
//!
//! Everything here reports through the context's [`Reporter`] and never
//! prompts; choices are made by the caller beforehand.
//!
//! [`Reporter`]: ccdl_core::Reporter

use ccdl_core::Plan;
use ccdl_core::assets::AssetList;
use ccdl_core::descriptor::{DriverInfo, write_application_json};
use ccdl_core::io::download::DownloadRequest;
use ccdl_core::plan::ProductPlan;
use ccdl_schema::Product;
use tracing::{debug, info};

use super::context::Context;
use super::error::CliError;
use super::prompt::{Choice, Prompt};
use crate::ui::theme::format_size;

/// Files and bytes handled by one operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    /// Files downloaded, resumed or skipped.
    pub files: usize,
    /// Their combined size on disk.
    pub bytes: u64,
}

impl Tally {
    fn add(&mut self, size: u64) {
        self.files += 1;
        self.bytes += size;
    }
}

impl std::ops::AddAssign for Tally {
    fn add_assign(&mut self, other: Self) {
        self.files += other.files;
        self.bytes += other.bytes;
    }
}

/// Name shown while downloading a product.
fn display_name(product: &ProductPlan) -> String {
    if let Some(name) = product.manifest.display_name() {
        return name.to_string();
    }
    match product.manifest.text("FamilyName") {
        Some(family) => format!("Adobe {family}"),
        None => product.code.clone(),
    }
}

async fn execute_product(ctx: &Context, product: &ProductPlan) -> Result<Tally, CliError> {
    let dir = ctx.product_dir(&product.code);
    ctx.reporter.section(&format!("{} {}", product.code, product.version));

    for relaxed in &product.relaxed {
        ctx.reporter
            .warning(&format!("{}: unreadable condition ignored ({})", relaxed.package, relaxed.error));
    }

    write_application_json(&dir, &product.manifest).await?;
    if product.is_application {
        let driver = DriverInfo::from_manifest(&product.manifest)?;
        let path = driver.write(&ctx.products_dir).await?;
        debug!(path = %path.display(), "wrote driver");
    }

    ctx.reporter.info(&format!(
        "Downloading packages for {}, version-{} ({} core, {} other)",
        display_name(product),
        product.version,
        product.core_count,
        product.other_count
    ));

    let mut tally = Tally::default();
    for url in &product.urls {
        let (_, outcome) = DownloadRequest::new(ctx.client.http(), url, &dir, ctx.reporter.as_ref())
            .skip_existing(ctx.skip_existing)
            .execute()
            .await?;
        tally.add(outcome.size());
    }
    Ok(tally)
}

/// Download every package of `plan`, writing each product's
/// `Application.json` and, for applications, its driver file.
pub async fn execute_plan(ctx: &Context, plan: &Plan) -> Result<Tally, CliError> {
    info!(products = plan.products.len(), packages = plan.total_packages(), "executing plan");

    let mut tally = Tally::default();
    for product in &plan.products {
        tally += execute_product(ctx, product).await?;
    }
    for warning in &plan.warnings {
        ctx.reporter.warning(&warning.to_string());
    }

    let install: u64 = plan.products.iter().map(|p| p.install_size).sum();
    ctx.reporter
        .info(&format!("Install size after extraction: {}", format_size(install)));
    Ok(tally)
}

/// Pick an asset: the full installer in batch mode, otherwise ask with
/// the full installer preselected. Returns an index into `list.assets`.
pub fn choose_asset(
    code: &str,
    list: &AssetList,
    batch: bool,
    prompt: &mut dyn Prompt,
) -> Result<usize, CliError> {
    if list.is_empty() {
        return Err(CliError::NoAssets(code.to_string()));
    }
    let full = list.full_installer();
    if batch {
        return full.ok_or_else(|| CliError::NoFullInstaller(code.to_string()));
    }

    let choices: Vec<Choice> = list
        .assets
        .iter()
        .enumerate()
        .map(|(idx, asset)| {
            let size = asset.size.map(format_size).unwrap_or_default();
            Choice::new((idx + 1).to_string(), format!("{} {size}", asset.describe()).trim_end().to_string())
        })
        .collect();
    let default = full.map(|idx| (idx + 1).to_string());

    loop {
        let Some(answer) = prompt.ask("Please choose a package", &choices, default.as_deref())? else {
            return Err(CliError::Unresolved {
                reason: format!("{code} publishes several packages"),
                candidates: choices.into_iter().map(|c| c.value).collect(),
            });
        };
        if let Some(idx) = answer.parse::<usize>().ok().filter(|n| (1..=list.len()).contains(n)) {
            return Ok(idx - 1);
        }
    }
}

/// Download one asset of `code` from `cdn`.
pub async fn download_asset(
    ctx: &Context,
    code: &str,
    list: &AssetList,
    idx: usize,
    cdn: &str,
) -> Result<Tally, CliError> {
    let Some(asset) = list.assets.get(idx) else {
        return Err(CliError::NoAssets(code.to_string()));
    };
    let url = AssetList::url_of(asset, cdn);
    let dir = ctx.product_dir(code);
    tokio::fs::create_dir_all(&dir).await?;

    ctx.reporter.section(&format!("{code} {}", asset.describe()));
    let (_, outcome) = DownloadRequest::new(ctx.client.http(), &url, &dir, ctx.reporter.as_ref())
        .skip_existing(ctx.skip_existing)
        .execute()
        .await?;

    let mut tally = Tally::default();
    tally.add(outcome.size());
    Ok(tally)
}

/// Download the icons of `product` into `products/icons`.
pub async fn download_icons(ctx: &Context, product: &Product) -> Result<Tally, CliError> {
    let dir = ctx.products_dir.join("icons");
    tokio::fs::create_dir_all(&dir).await?;

    let prefix = product.code.to_ascii_lowercase();
    let mut tally = Tally::default();
    for url in &product.icons {
        let (_, outcome) = DownloadRequest::new(ctx.client.http(), url, &dir, ctx.reporter.as_ref())
            .with_prefix(&prefix)
            .skip_existing(ctx.skip_existing)
            .execute()
            .await?;
        tally.add(outcome.size());
    }
    Ok(tally)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::prompt::{NoPrompt, ScriptedPrompt};
    use ccdl_core::NullReporter;
    use ccdl_core::assets::Asset;
    use ccdl_core::condition::OsVersion;
    use ccdl_core::io::client::{FetchConfig, UrlVersion, VendorClient};
    use ccdl_schema::{Manifest, PackageKind, PackageRecord, Platform};
    use mockito::Server;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn context(products_dir: &std::path::Path) -> Context {
        let client = VendorClient::new(FetchConfig::new(Platform::Win64, UrlVersion::V6, None)).unwrap();
        Context::new(
            client,
            products_dir.to_path_buf(),
            "10.0.19045".parse::<OsVersion>().unwrap(),
            Arc::new(NullReporter),
        )
    }

    fn assets() -> AssetList {
        AssetList {
            assets: vec![
                Asset {
                    path: "/a/update.msp".into(),
                    size: Some(10),
                    base_version: Some("24.001".into()),
                },
                Asset {
                    path: "/a/full.zip".into(),
                    size: Some(100),
                    base_version: None,
                },
            ],
        }
    }

    #[test]
    fn test_batch_takes_full_installer() {
        assert_eq!(choose_asset("APRO", &assets(), true, &mut NoPrompt).unwrap(), 1);

        let updates_only = AssetList {
            assets: vec![assets().assets[0].clone()],
        };
        assert!(matches!(
            choose_asset("APRO", &updates_only, true, &mut NoPrompt),
            Err(CliError::NoFullInstaller(_))
        ));
        assert!(matches!(
            choose_asset("APRO", &AssetList::default(), false, &mut NoPrompt),
            Err(CliError::NoAssets(_))
        ));
    }

    #[test]
    fn test_interactive_choice_retries_invalid_input() {
        let mut prompt = ScriptedPrompt::new(["7", "x", "1"]);
        assert_eq!(choose_asset("APRO", &assets(), false, &mut prompt).unwrap(), 0);
        assert_eq!(prompt.asked.len(), 3);

        let mut prompt = ScriptedPrompt::new([""]);
        assert_eq!(choose_asset("APRO", &assets(), false, &mut prompt).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_execute_plan_writes_manifest_and_packages() {
        let mut server = Server::new_async().await;
        let mut mocks = Vec::new();
        for (path, body) in [("/p/core.zip", "core!"), ("/p/lang.zip", "lang")] {
            let length = body.len().to_string();
            mocks.push(
                server
                    .mock("HEAD", path)
                    .with_header("content-length", &length)
                    .with_body(body)
                    .create_async()
                    .await,
            );
            mocks.push(server.mock("GET", path).with_body(body).create_async().await);
        }

        let tmp = TempDir::new().unwrap();
        let ctx = context(tmp.path());
        let manifest = Manifest::new(
            "COSY",
            vec![
                PackageRecord::new("core", "/p/core.zip", PackageKind::Core),
                PackageRecord::new("lang", "/p/lang.zip", PackageKind::Other),
            ],
        );
        let plan = Plan {
            products: vec![ProductPlan {
                code: "COSY".into(),
                version: "4.0".into(),
                is_application: false,
                manifest,
                urls: vec![
                    format!("{}/p/core.zip", server.url()),
                    format!("{}/p/lang.zip", server.url()),
                ],
                core_count: 1,
                other_count: 1,
                install_size: 0,
                relaxed: Vec::new(),
            }],
            warnings: Vec::new(),
        };

        let tally = execute_plan(&ctx, &plan).await.unwrap();
        assert_eq!(tally, Tally { files: 2, bytes: 9 });

        let dir = tmp.path().join("COSY");
        assert!(dir.join("Application.json").exists());
        assert_eq!(std::fs::read_to_string(dir.join("core.zip")).unwrap(), "core!");
        assert_eq!(std::fs::read_to_string(dir.join("lang.zip")).unwrap(), "lang");
        assert!(!tmp.path().join("COSY-Driver.xml").exists());
    }

    #[tokio::test]
    async fn test_icons_are_prefixed_with_code() {
        let mut server = Server::new_async().await;
        let _head = server
            .mock("HEAD", "/icons/48.png")
            .with_header("content-length", "3")
            .with_body("png")
            .create_async()
            .await;
        let _get = server.mock("GET", "/icons/48.png").with_body("png").create_async().await;

        let tmp = TempDir::new().unwrap();
        let ctx = context(tmp.path());
        let mut product = Product::new("PHSP", "Photoshop", ccdl_schema::ProductKind::Application);
        product.icons = vec![format!("{}/icons/48.png", server.url())];

        let tally = download_icons(&ctx, &product).await.unwrap();
        assert_eq!(tally.files, 1);
        assert!(tmp.path().join("icons/phsp48.png").exists());
    }
}
