//! Download command

use anyhow::{Context as _, Result};
use ccdl_core::assets::{fetch_asset_list, uses_asset_list};
use ccdl_core::condition::OsVersion;
use ccdl_core::io::client::{FetchConfig, VendorClient};
use ccdl_core::{Reporter, build_plan};
use ccdl_schema::{Catalog, PartialSelection, Selection};
use std::sync::Arc;
use std::time::Instant;

use crate::DownloadArgs;
use crate::ops::fetch::{self, Tally};
use crate::ops::prompt::{self, Prompt};
use crate::ops::{CliError, Context, select};
use crate::ui::{Output, Theme};

const PRODUCTS_DIR: &str = "products";

/// Download one resolved selection with everything it depends on.
async fn download_selection(
    ctx: &Context,
    output: &Output,
    catalog: &Catalog,
    selection: &Selection,
    batch: bool,
    icons: bool,
    prompt: &mut dyn Prompt,
) -> Result<Tally, CliError> {
    let mut tally = Tally::default();
    let Some(product) = catalog.product(&selection.product_code) else {
        return Err(CliError::Unresolved {
            reason: format!("unknown product code '{}'", selection.product_code),
            candidates: Vec::new(),
        });
    };

    if icons && !product.icons.is_empty() {
        tally += fetch::download_icons(ctx, product).await?;
    }

    let entry = product.version(&selection.version);
    if let Some(entry) = entry.filter(|e| uses_asset_list(e)) {
        let cdn = catalog
            .cdn
            .as_deref()
            .ok_or_else(|| CliError::MissingCdn(product.code.clone()))?;
        let list = fetch_asset_list(&ctx.client, cdn, entry).await?;

        output.sync().await;
        let idx = fetch::choose_asset(&product.code, &list, batch, prompt)?;
        tally += fetch::download_asset(ctx, &product.code, &list, idx, cdn).await?;
        return Ok(tally);
    }

    let plan = build_plan(&ctx.client, catalog, selection, &ctx.os_version).await?;
    tally += fetch::execute_plan(ctx, &plan).await?;
    Ok(tally)
}

/// Download products chosen on the command line or interactively.
pub async fn download(args: DownloadArgs) -> Result<()> {
    let output = Output::new();
    let theme = Theme::default();
    let mut prompt = prompt::for_session(args.non_interactive, theme.layout.choice_width);

    let os_version: OsVersion = args
        .os_version
        .parse()
        .with_context(|| format!("Invalid OS version '{}'", args.os_version))?;
    let os_language = select::os_language(args.os_language.as_deref());
    let dest = match &args.destination {
        Some(dest) => dest.clone(),
        None => std::env::current_dir().context("Failed to read the current directory")?,
    };

    let config = FetchConfig::new(args.platform, args.url_version, args.auth.clone());
    let client = VendorClient::new(config).context("Failed to build HTTP client")?;

    output.section("Product catalog");
    let catalog = client.fetch_catalog().await?;
    output.info(&format!(
        "Found {} applications for {}",
        catalog.applications().count(),
        args.platform
    ));

    let ctx = Context::new(
        client,
        dest.join(PRODUCTS_DIR),
        os_version,
        Arc::new(output.clone()),
    )
    .skip_existing(args.skip_existing);

    let mut codes = args.sap_codes.clone();
    loop {
        let start = Instant::now();
        let batch = codes.len() > 1;
        let requests: Vec<Option<String>> = if codes.is_empty() {
            vec![None]
        } else {
            codes.iter().cloned().map(Some).collect()
        };

        let mut tally = Tally::default();
        for code in requests {
            let hints = PartialSelection {
                product: code,
                version: if batch { None } else { args.version.clone() },
                platform: Some(args.platform),
                languages: args.languages.clone(),
            };

            output.sync().await;
            let selection = select::choose(&catalog, hints, prompt.as_mut(), os_language.as_deref(), batch)?;
            output.info(&format!(
                "Selected {} {} ({})",
                selection.product_code, selection.version, selection.languages
            ));

            let result =
                download_selection(&ctx, &output, &catalog, &selection, batch, args.product_icons, prompt.as_mut())
                    .await;
            match result {
                Ok(done) => tally += done,
                Err(e) => {
                    output.error(&e.to_string());
                    output.sync().await;
                    return Err(e.into());
                }
            }
        }
        output.summary(tally.files, "downloaded", start.elapsed().as_secs_f64());

        codes.clear();
        if args.no_repeat {
            break;
        }
        output.sync().await;
        if prompt.confirm("Do you want to download another package", false)? != Some(true) {
            break;
        }
    }

    output.sync().await;
    Ok(())
}
