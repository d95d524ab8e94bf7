//! Suite command

use anyhow::{Context, Result};
use ccdl_core::Reporter;
use ccdl_core::descriptor::{SuiteInfo, SuiteOptions};

use crate::SuiteArgs;
use crate::ops::prompt::{self, Prompt};
use crate::ui::{Output, Theme};

fn ask_or_default(prompt: &mut dyn Prompt, question: &str, given: Option<String>, default: &str) -> Result<String> {
    if let Some(value) = given.filter(|v| !v.trim().is_empty()) {
        return Ok(value);
    }
    let answer = prompt.ask(question, &[], Some(default))?;
    Ok(answer.unwrap_or_else(|| default.to_string()))
}

/// Generate `SuiteInfo.xml` for the products already downloaded.
pub async fn suite(args: SuiteArgs) -> Result<()> {
    let output = Output::new();
    let theme = Theme::default();
    let mut prompt = prompt::for_session(args.non_interactive, theme.layout.choice_width);
    let defaults = SuiteOptions::default();

    output.sync().await;
    let options = SuiteOptions {
        name: ask_or_default(prompt.as_mut(), "Suite name", args.name, &defaults.name)?,
        version: ask_or_default(prompt.as_mut(), "Suite version", args.version, &defaults.version)?,
    };

    output.section(&format!("Suite {} {}", options.name, options.version));
    let products_dir = args.products_dir;
    let suite = SuiteInfo::scan(&products_dir, options)
        .with_context(|| format!("Failed to scan {}", products_dir.display()))?;
    for product in &suite.products {
        output.plain(format!("  {:<8} {:<12} {}", product.code, product.base_version, product.name));
    }

    let path = suite.write(&products_dir).await.context("Failed to write SuiteInfo.xml")?;
    output.success(&format!("Wrote {} ({} products)", path.display(), suite.products.len()));
    output.sync().await;
    Ok(())
}
