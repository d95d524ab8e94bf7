//! Product catalog model.
//!
//! The catalog is fetched once per run and treated as read-only. Products are
//! keyed by their short upper-case code; each product keeps its versions in
//! publication order, which is what "latest" is derived from.

use crate::platform::Platform;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Whether a catalog product is a user-facing application or only a
/// dependency of one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    /// Listed in the application channel; selectable by the user.
    #[default]
    Application,
    /// Shared component pulled in through manifest dependencies.
    Dependency,
}

/// One published version of a product on one platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionEntry {
    /// Product code this version belongs to.
    pub code: String,
    /// Display name of the product.
    pub display_name: String,
    /// Platform of this build.
    pub platform: Platform,
    /// Version string as published (e.g. `25.0.0.37`).
    pub version: String,
    /// Canonical locale tokens supported by this build.
    pub supported_languages: Vec<String>,
    /// Build identifier used to request the JSON manifest.
    pub build_id: Option<String>,
    /// Relative reference to an XML asset-list manifest.
    pub manifest_url: Option<String>,
}

impl VersionEntry {
    /// An entry without any way to fetch its manifest cannot be downloaded.
    pub fn is_usable(&self) -> bool {
        self.build_id.is_some() || self.manifest_url.is_some()
    }

    /// Whether this entry is downloaded through an asset list rather than a
    /// package manifest.
    pub fn uses_asset_list(&self) -> bool {
        self.build_id.is_none() && self.manifest_url.is_some()
    }
}

/// A catalog product with its ordered versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Short product code, e.g. `PHSP`.
    pub code: String,
    /// Display name.
    pub display_name: String,
    /// Application or dependency.
    pub kind: ProductKind,
    /// Versions in catalog publication order.
    pub versions: Vec<VersionEntry>,
    /// Icon URLs advertised for the product.
    #[serde(default)]
    pub icons: Vec<String>,
}

impl Product {
    /// Create a product without versions.
    pub fn new(code: impl Into<String>, display_name: impl Into<String>, kind: ProductKind) -> Self {
        Self {
            code: code.into(),
            display_name: display_name.into(),
            kind,
            versions: Vec::new(),
            icons: Vec::new(),
        }
    }

    /// Whether this is a user-facing application.
    pub fn is_application(&self) -> bool {
        self.kind == ProductKind::Application
    }

    /// Insert a version, replacing an existing entry with the same version
    /// string in place so publication order is kept.
    pub fn upsert_version(&mut self, entry: VersionEntry) {
        if let Some(existing) = self.versions.iter_mut().find(|v| v.version == entry.version) {
            *existing = entry;
        } else {
            self.versions.push(entry);
        }
    }

    /// Look up a version by its exact string.
    pub fn version(&self, version: &str) -> Option<&VersionEntry> {
        self.versions.iter().find(|v| v.version == version)
    }

    /// The last usable entry in publication order.
    ///
    /// Trailing entries without a build identifier or manifest reference
    /// are ordinary catalog noise and are skipped.
    pub fn latest(&self) -> Option<&VersionEntry> {
        self.versions.iter().rev().find(|v| v.is_usable())
    }

    /// The first usable entry in publication order.
    pub fn first_usable(&self) -> Option<&VersionEntry> {
        self.versions.iter().find(|v| v.is_usable())
    }

    /// Usable versions, newest first.
    pub fn usable_versions(&self) -> impl Iterator<Item = &VersionEntry> {
        self.versions.iter().rev().filter(|v| v.is_usable())
    }
}

/// The full product catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// Products keyed by code.
    pub products: BTreeMap<String, Product>,
    /// Secure CDN base URL advertised by the catalog.
    pub cdn: Option<String>,
}

impl Catalog {
    /// Find a product by code (case-insensitive).
    pub fn product(&self, code: &str) -> Option<&Product> {
        self.products.get(&code.trim().to_ascii_uppercase())
    }

    /// Applications that have at least one usable version, sorted by code.
    pub fn applications(&self) -> impl Iterator<Item = &Product> {
        self.products
            .values()
            .filter(|p| p.is_application() && p.latest().is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(version: &str, build_id: Option<&str>) -> VersionEntry {
        VersionEntry {
            code: "PHSP".into(),
            display_name: "Photoshop".into(),
            platform: Platform::Win64,
            version: version.into(),
            supported_languages: vec!["en_US".into()],
            build_id: build_id.map(String::from),
            manifest_url: None,
        }
    }

    #[test]
    fn test_latest_skips_unusable_trailing_entries() {
        let mut product = Product::new("PHSP", "Photoshop", ProductKind::Application);
        product.upsert_version(entry("24.0", Some("a")));
        product.upsert_version(entry("25.0", Some("b")));
        product.upsert_version(entry("26.0", None));

        assert_eq!(product.latest().unwrap().version, "25.0");
        assert_eq!(product.first_usable().unwrap().version, "24.0");
        let usable: Vec<_> = product.usable_versions().map(|v| v.version.as_str()).collect();
        assert_eq!(usable, vec!["25.0", "24.0"]);
    }

    #[test]
    fn test_latest_none_when_nothing_usable() {
        let mut product = Product::new("PHSP", "Photoshop", ProductKind::Application);
        product.upsert_version(entry("26.0", None));
        assert!(product.latest().is_none());
    }

    #[test]
    fn test_upsert_keeps_position() {
        let mut product = Product::new("PHSP", "Photoshop", ProductKind::Application);
        product.upsert_version(entry("24.0", Some("a")));
        product.upsert_version(entry("25.0", Some("b")));
        product.upsert_version(entry("24.0", Some("c")));

        assert_eq!(product.versions.len(), 2);
        assert_eq!(product.versions[0].build_id.as_deref(), Some("c"));
    }

    #[test]
    fn test_catalog_lookup_is_case_insensitive() {
        let mut catalog = Catalog::default();
        catalog.products.insert(
            "PHSP".into(),
            Product::new("PHSP", "Photoshop", ProductKind::Application),
        );
        assert!(catalog.product("phsp").is_some());
        assert!(catalog.product("ILST").is_none());
    }
}
