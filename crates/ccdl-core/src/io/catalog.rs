//! Products feed → [`Catalog`] adapter.
//!
//! This is the boundary where the feed's locale spellings are brought into
//! canonical form; nothing past this point sees raw tokens.

use ccdl_schema::locale::canonicalize;
use ccdl_schema::{Catalog, Platform, Product, ProductKind, VersionEntry};
use tracing::{debug, trace};

use crate::io::client::UrlVersion;
use crate::io::xml::Element;
use crate::vendor;

/// Request parameters that shape how the feed is read.
#[derive(Debug, Clone, Copy)]
pub struct CatalogOptions {
    /// Platform requested for applications.
    pub platform: Platform,
    /// URL schema the feed was fetched with.
    pub url_version: UrlVersion,
}

fn downloadable(platform: &Element) -> bool {
    platform.children_named("languageSet").any(|set| {
        set.attr("packageType")
            .is_some_and(|kind| vendor::DOWNLOADABLE_PACKAGE_TYPES.contains(&kind))
    })
}

fn version_of(language_set: &Element) -> Option<String> {
    language_set
        .attr("productVersion")
        .map(str::to_string)
        .or_else(|| {
            language_set
                .descendants("appVersion")
                .first()
                .map(|e| e.text().to_string())
        })
        .filter(|v| !v.is_empty())
}

fn locales_of(language_set: &Element) -> Vec<String> {
    language_set
        .find_all("locales/locale")
        .into_iter()
        .filter_map(|l| l.attr("name"))
        .map(canonicalize)
        .collect()
}

/// Build a catalog from the parsed feed.
pub fn parse_catalog(root: &Element, options: &CatalogOptions) -> Catalog {
    let allowed = options.platform.allowed();
    let mut catalog = Catalog {
        cdn: root
            .descendants("cdn")
            .into_iter()
            .find_map(|cdn| cdn.child("secure"))
            .map(|secure| secure.text().to_string()),
        ..Catalog::default()
    };

    for channel in root.descendants("channel") {
        let kind = if channel.attr("name") == Some(vendor::APPLICATION_CHANNEL) {
            ProductKind::Application
        } else {
            ProductKind::Dependency
        };

        for product in channel.find_all("products/product") {
            let Some(code) = product.attr("id") else {
                continue;
            };
            let display_name = product.child_text("displayName").unwrap_or(code);
            let icons: Vec<String> = product
                .find_all("productIcons/icon")
                .into_iter()
                .map(|icon| icon.text().to_string())
                .filter(|url| !url.is_empty())
                .collect();

            for platform in product.find_all("platforms/platform") {
                let Some(platform_id) = platform.attr("id").and_then(|id| id.parse::<Platform>().ok())
                else {
                    continue;
                };
                if !allowed.contains(&platform_id) {
                    continue;
                }
                if kind == ProductKind::Application && platform_id != options.platform {
                    continue;
                }
                if !downloadable(platform) {
                    continue;
                }

                let key = code.to_ascii_uppercase();
                for language_set in platform.children_named("languageSet") {
                    let Some(version) = version_of(language_set) else {
                        if options.url_version >= UrlVersion::V5 {
                            trace!(code, "language set without version, dropping product");
                            catalog.products.remove(&key);
                        }
                        continue;
                    };

                    let entry = VersionEntry {
                        code: code.to_string(),
                        display_name: display_name.to_string(),
                        platform: platform_id,
                        version,
                        supported_languages: locales_of(language_set),
                        build_id: language_set.attr("buildGuid").map(str::to_string),
                        manifest_url: language_set
                            .descendants("manifestURL")
                            .first()
                            .map(|e| e.text().to_string()),
                    };

                    let product = catalog.products.entry(key.clone()).or_insert_with(|| {
                        let mut product = Product::new(code, display_name, kind);
                        product.icons.clone_from(&icons);
                        product
                    });
                    product.upsert_version(entry);
                }
            }
        }
    }

    debug!(products = catalog.products.len(), cdn = ?catalog.cdn, "parsed catalog feed");
    catalog
}
