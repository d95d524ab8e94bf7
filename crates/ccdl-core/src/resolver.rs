//! Selection resolution.
//!
//! Turns user hints into a concrete [`Selection`]. The resolver never
//! prompts and never guesses: when a hint is missing or invalid it returns
//! [`NeedsUserChoice`] with the candidates the caller may offer instead.

use ccdl_schema::locale::{ALL_LANGUAGES, canonicalize};
use ccdl_schema::{Catalog, LanguageSet, PartialSelection, Product, Selection, VersionEntry};
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Which part of the selection needs a decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChoiceReason {
    /// No product code was given.
    MissingProduct,
    /// The product code is not a known application.
    UnknownProductCode(String),
    /// The product has no version with a manifest.
    NoUsableVersion(String),
    /// The requested version does not exist or cannot be downloaded.
    UnsupportedVersion(String),
    /// No language was given.
    MissingLanguage,
    /// Some requested languages are not offered by the product.
    UnsupportedLanguage(Vec<String>),
}

impl fmt::Display for ChoiceReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingProduct => write!(f, "no product selected"),
            Self::UnknownProductCode(code) => write!(f, "unknown product code '{code}'"),
            Self::NoUsableVersion(code) => write!(f, "no downloadable version of '{code}'"),
            Self::UnsupportedVersion(version) => write!(f, "version '{version}' is not available"),
            Self::MissingLanguage => write!(f, "no language selected"),
            Self::UnsupportedLanguage(tokens) => {
                write!(f, "unsupported language(s): {}", tokens.join(", "))
            }
        }
    }
}

/// Hints were insufficient; the caller must pick from `candidates`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct NeedsUserChoice {
    /// What is missing or wrong.
    pub reason: ChoiceReason,
    /// Acceptable values, in display order.
    pub candidates: Vec<String>,
    /// Value to preselect, when there is an obvious one.
    pub default: Option<String>,
}

impl NeedsUserChoice {
    fn new(reason: ChoiceReason, candidates: Vec<String>, default: Option<String>) -> Self {
        Self {
            reason,
            candidates,
            default,
        }
    }

    /// Whether the choice concerns the product code.
    pub fn is_product(&self) -> bool {
        matches!(
            self.reason,
            ChoiceReason::MissingProduct
                | ChoiceReason::UnknownProductCode(_)
                | ChoiceReason::NoUsableVersion(_)
        )
    }

    /// Whether the choice concerns the version.
    pub fn is_version(&self) -> bool {
        matches!(self.reason, ChoiceReason::UnsupportedVersion(_))
    }

    /// Whether the choice concerns the languages.
    pub fn is_language(&self) -> bool {
        matches!(
            self.reason,
            ChoiceReason::MissingLanguage | ChoiceReason::UnsupportedLanguage(_)
        )
    }
}

/// Resolve hints against the catalog.
///
/// # Errors
///
/// Returns [`NeedsUserChoice`] for the first hint that cannot be honored,
/// checked in order product, version, languages.
pub fn resolve(catalog: &Catalog, hints: &PartialSelection) -> Result<Selection, NeedsUserChoice> {
    let product = resolve_product(catalog, hints.product.as_deref())?;
    let entry = resolve_version(product, hints.version.as_deref())?;
    let platform = hints.platform.unwrap_or_default();
    let languages = resolve_languages(entry, hints.languages.as_deref())?;

    debug!(code = %product.code, version = %entry.version, %platform, %languages, "resolved selection");

    Ok(Selection {
        product_code: product.code.clone(),
        version: entry.version.clone(),
        platform,
        languages,
    })
}

fn application_codes(catalog: &Catalog) -> Vec<String> {
    catalog.applications().map(|p| p.code.clone()).collect()
}

fn resolve_product<'a>(catalog: &'a Catalog, code: Option<&str>) -> Result<&'a Product, NeedsUserChoice> {
    let code = match code.map(str::trim) {
        Some(code) if !code.is_empty() => code,
        _ => {
            return Err(NeedsUserChoice::new(
                ChoiceReason::MissingProduct,
                application_codes(catalog),
                None,
            ));
        }
    };

    let product = catalog
        .product(code)
        .filter(|p| p.is_application())
        .ok_or_else(|| {
            NeedsUserChoice::new(
                ChoiceReason::UnknownProductCode(code.to_string()),
                application_codes(catalog),
                None,
            )
        })?;

    if product.latest().is_none() {
        return Err(NeedsUserChoice::new(
            ChoiceReason::NoUsableVersion(product.code.clone()),
            application_codes(catalog),
            None,
        ));
    }

    Ok(product)
}

fn resolve_version<'a>(product: &'a Product, version: Option<&str>) -> Result<&'a VersionEntry, NeedsUserChoice> {
    let latest = product.latest().ok_or_else(|| {
        NeedsUserChoice::new(ChoiceReason::NoUsableVersion(product.code.clone()), Vec::new(), None)
    })?;

    let version = match version.map(str::trim) {
        None | Some("" | "latest") => return Ok(latest),
        Some(version) => version,
    };

    product
        .version(version)
        .filter(|v| v.is_usable())
        .ok_or_else(|| {
            NeedsUserChoice::new(
                ChoiceReason::UnsupportedVersion(version.to_string()),
                product.usable_versions().map(|v| v.version.clone()).collect(),
                Some(latest.version.clone()),
            )
        })
}

fn language_candidates(entry: &VersionEntry) -> Vec<String> {
    let mut candidates: Vec<String> = entry
        .supported_languages
        .iter()
        .filter(|language| canonicalize(language) != ALL_LANGUAGES)
        .cloned()
        .collect();
    candidates.push("all".to_string());
    candidates
}

fn resolve_languages(entry: &VersionEntry, request: Option<&str>) -> Result<LanguageSet, NeedsUserChoice> {
    let request = LanguageSet::from_request(request.unwrap_or_default());
    if request.is_empty() {
        return Err(NeedsUserChoice::new(
            ChoiceReason::MissingLanguage,
            language_candidates(entry),
            None,
        ));
    }
    if request.is_all() {
        return Ok(request);
    }

    // builds that publish no language list cannot be checked
    if entry.supported_languages.is_empty() {
        return Ok(request);
    }

    // a published `mul` stands beside the concrete locales, it does not replace them
    let supported = |token: &str| {
        entry
            .supported_languages
            .iter()
            .any(|language| canonicalize(language) == token)
    };
    let unsupported: Vec<String> = request
        .iter()
        .filter(|token| !supported(*token) && *token != ALL_LANGUAGES)
        .map(String::from)
        .collect();

    if unsupported.is_empty() {
        Ok(request)
    } else {
        Err(NeedsUserChoice::new(
            ChoiceReason::UnsupportedLanguage(unsupported),
            language_candidates(entry),
            None,
        ))
    }
}
