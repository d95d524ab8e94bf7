//! Asset-list manifests.
//!
//! Some products publish an XML list of installer assets instead of a
//! package manifest. One asset is the full installer; the rest are update
//! packages for a given base version.

use ccdl_schema::VersionEntry;

use crate::io::client::{FetchError, VendorClient};
use crate::io::download::file_name_from_url;
use crate::io::xml::Element;
use crate::plan::join_url;
use crate::vendor;

/// Whether `entry` is downloaded through an asset list.
pub fn uses_asset_list(entry: &VersionEntry) -> bool {
    entry.uses_asset_list()
        || vendor::ASSET_LIST_PRODUCTS
            .iter()
            .any(|code| code.eq_ignore_ascii_case(&entry.code))
}

/// One downloadable asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Path relative to the CDN base.
    pub path: String,
    /// Size in bytes when published.
    pub size: Option<u64>,
    /// Version an update package applies to; `None` for the full installer.
    pub base_version: Option<String>,
}

impl Asset {
    /// File name of the asset.
    pub fn name(&self) -> &str {
        file_name_from_url(&self.path).unwrap_or(self.path.as_str())
    }

    /// True when the asset installs from scratch.
    pub fn is_full_installer(&self) -> bool {
        self.base_version.is_none()
    }

    /// Human readable kind, as listed to the user.
    pub fn describe(&self) -> String {
        match &self.base_version {
            None => "Full Installer".to_string(),
            Some(base) => format!("Update package for version {base}"),
        }
    }
}

/// Assets published for one product version, in manifest order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetList {
    /// Entries in manifest order.
    pub assets: Vec<Asset>,
}

impl AssetList {
    /// Read `asset_list/asset` entries from a parsed manifest.
    pub fn from_element(root: &Element) -> Self {
        let assets = root
            .find_all("asset_list/asset")
            .into_iter()
            .filter_map(|asset| {
                let path = asset.child_text("asset_path")?.to_string();
                Some(Asset {
                    path,
                    size: asset.child_text("asset_size").and_then(|s| s.parse().ok()),
                    base_version: asset
                        .descendants("baseVersion")
                        .first()
                        .map(|e| e.text().to_string())
                        .filter(|v| !v.is_empty()),
                })
            })
            .collect();
        Self { assets }
    }

    /// Index of the full installer. With several, the last one wins.
    pub fn full_installer(&self) -> Option<usize> {
        self.assets.iter().rposition(Asset::is_full_installer)
    }

    /// True when nothing was published.
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Number of assets.
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Absolute download URL of `asset`.
    pub fn url_of(asset: &Asset, cdn: &str) -> String {
        join_url(cdn, &asset.path)
    }
}

/// Fetch the asset list of `entry` from `cdn`.
pub async fn fetch_asset_list(
    client: &VendorClient,
    cdn: &str,
    entry: &VersionEntry,
) -> Result<AssetList, FetchError> {
    let reference = entry.manifest_url.as_deref().unwrap_or_default();
    let root = client.fetch_xml(&join_url(cdn, reference)).await?;
    Ok(AssetList::from_element(&root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccdl_schema::Platform;

    const LIST: &str = r#"<manifest>
  <asset_list>
    <asset>
      <asset_path>https://cdn.example.com/AcrobatDCUpd2400120.msp</asset_path>
      <asset_size>1200</asset_size>
      <patch><baseVersion>24.001.20000</baseVersion></patch>
    </asset>
    <asset>
      <asset_path>https://cdn.example.com/Acrobat_DC_Web_x64_WWMUI.zip</asset_path>
      <asset_size>90000</asset_size>
    </asset>
  </asset_list>
</manifest>"#;

    fn entry(code: &str, build_id: Option<&str>, manifest_url: Option<&str>) -> VersionEntry {
        VersionEntry {
            code: code.into(),
            display_name: code.into(),
            platform: Platform::Win64,
            version: "1.0".into(),
            supported_languages: Vec::new(),
            build_id: build_id.map(Into::into),
            manifest_url: manifest_url.map(Into::into),
        }
    }

    #[test]
    fn test_parse_asset_list() {
        let list = AssetList::from_element(&Element::parse_str(LIST).unwrap());

        assert_eq!(list.len(), 2);
        assert_eq!(list.assets[0].name(), "AcrobatDCUpd2400120.msp");
        assert_eq!(list.assets[0].base_version.as_deref(), Some("24.001.20000"));
        assert_eq!(list.assets[0].describe(), "Update package for version 24.001.20000");
        assert_eq!(list.assets[1].size, Some(90000));
        assert_eq!(list.full_installer(), Some(1));
        assert_eq!(list.assets[1].describe(), "Full Installer");
    }

    #[test]
    fn test_asset_list_products() {
        assert!(uses_asset_list(&entry("APRO", Some("guid"), None)));
        assert!(uses_asset_list(&entry("XYZ", None, Some("/x/manifest.xml"))));
        assert!(!uses_asset_list(&entry("PHSP", Some("guid"), Some("/x"))));
    }

    #[test]
    fn test_relative_asset_paths_are_joined() {
        let asset = Asset {
            path: "/APRO/setup.zip".into(),
            size: None,
            base_version: None,
        };
        assert_eq!(AssetList::url_of(&asset, "https://cdn/"), "https://cdn/APRO/setup.zip");
    }
}
