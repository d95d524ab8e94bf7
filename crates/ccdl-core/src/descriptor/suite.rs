//! `SuiteInfo.xml`: groups every downloaded application into one
//! suite-style installer.

use std::fs;
use std::path::{Path, PathBuf};

use ccdl_schema::Manifest;
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::{APPLICATION_JSON, DescriptorError, bool_text, write_document};
use crate::io::xml::Element;
use crate::vendor;

/// Suite descriptor file name.
pub const SUITE_FILE: &str = "SuiteInfo.xml";

/// Icon prefix of the suite itself.
const SUITE_ICON: &str = "cloud";

/// Enterprise-only product, see the driver descriptor.
const ENTERPRISE_PRODUCT: &str = "LTRM";

/// Suite-level values shown by the installer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteOptions {
    /// Suite display name.
    pub name: String,
    /// Suite version.
    pub version: String,
}

impl Default for SuiteOptions {
    fn default() -> Self {
        Self {
            name: "Adobe Creative Cloud".to_string(),
            version: "1.0".to_string(),
        }
    }
}

/// A dependency entry of a suite product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteDependency {
    /// SAP code.
    pub code: String,
    /// Required base version.
    pub base_version: String,
    /// Install size of the dependency, 0 when it was not downloaded.
    pub install_size: u64,
}

/// One downloaded application of the suite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteProduct {
    /// Display name.
    pub name: String,
    /// SAP code.
    pub code: String,
    /// Exact product build.
    pub codex_version: String,
    /// Marketing version.
    pub base_version: String,
    /// Platform id from the manifest.
    pub platform: String,
    /// Sum of the package extract sizes.
    pub install_size: u64,
    /// `None` when the manifest has no `Dependencies` key.
    pub dependencies: Option<Vec<SuiteDependency>>,
}

/// Contents of `SuiteInfo.xml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteInfo {
    /// Suite name and version.
    pub options: SuiteOptions,
    /// Directory the `EsdDirectory` entries are rooted at, as given.
    pub esd_root: String,
    /// Union of supported locales, first-seen order, without `mul`.
    pub locales: Vec<String>,
    /// Applications ordered by directory name.
    pub products: Vec<SuiteProduct>,
}

fn read_manifest(path: &Path) -> Result<Manifest, DescriptorError> {
    Ok(Manifest::from_json(&fs::read_to_string(path)?)?)
}

fn icons(prefix: &str) -> Element {
    let prefix = prefix.to_ascii_lowercase();
    Element::new("Icons").with_children(vendor::ICON_SIZES.iter().map(|size| {
        Element::new(format!("Size{size}")).with_child(Element::text_node(
            "path",
            format!("./resources/icons/{prefix}{size}.png"),
        ))
    }))
}

fn text_or_empty(manifest: &Manifest, key: &str) -> String {
    manifest.text(key).unwrap_or_default()
}

impl SuiteInfo {
    /// Collect every installable application below `products_dir`.
    ///
    /// A manifest qualifies when it has add/remove information and is not
    /// flagged as a standalone component.
    pub fn scan(products_dir: &Path, options: SuiteOptions) -> Result<Self, DescriptorError> {
        let esd_root = products_dir.display().to_string().trim_end_matches(['/', '\\']).to_string();
        let mut suite = Self {
            options,
            esd_root,
            locales: Vec::new(),
            products: Vec::new(),
        };

        let manifests = WalkDir::new(products_dir)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file() && entry.file_name() == APPLICATION_JSON);

        for entry in manifests {
            let manifest = read_manifest(entry.path())?;
            if !manifest.has_add_remove_info() || manifest.is_sti() != Some(false) {
                debug!(path = %entry.path().display(), "not a suite product");
                continue;
            }

            for locale in manifest.supported_locales() {
                if locale != "mul" && !suite.locales.iter().any(|l| l == locale) {
                    suite.locales.push(locale.to_string());
                }
            }

            let dependencies = manifest.dependencies.as_ref().map(|list| {
                list.dependencies
                    .iter()
                    .map(|d| SuiteDependency {
                        code: d.code.clone(),
                        base_version: d.base_version.clone().unwrap_or_default(),
                        install_size: dependency_size(products_dir, &d.code),
                    })
                    .collect()
            });

            suite.products.push(SuiteProduct {
                name: manifest
                    .display_name()
                    .map_or_else(|| manifest.sap_code.clone(), str::to_string),
                code: manifest.sap_code.clone(),
                codex_version: text_or_empty(&manifest, "CodexVersion"),
                base_version: text_or_empty(&manifest, "BaseVersion"),
                platform: text_or_empty(&manifest, "Platform"),
                install_size: manifest.install_size(),
                dependencies,
            });
        }

        if suite.products.is_empty() {
            return Err(DescriptorError::NoProducts(products_dir.to_path_buf()));
        }
        Ok(suite)
    }

    fn esd_directory(&self, code: &str) -> String {
        format!("{}/{code}", self.esd_root)
    }

    fn product_element(&self, product: &SuiteProduct) -> Element {
        let mut hd_data = Element::new("HDData").with_children([
            Element::text_node("SAPCode", &product.code),
            Element::text_node("CodexVersion", &product.codex_version),
            Element::text_node("BaseVersion", &product.base_version),
            Element::text_node("Platform", &product.platform),
            Element::text_node("EsdDirectory", self.esd_directory(&product.code)),
            Element::text_node("InstallSize", product.install_size.to_string()),
        ]);

        if let Some(dependencies) = &product.dependencies {
            hd_data.push(Element::new("Dependencies").with_children(dependencies.iter().map(|d| {
                Element::new("Dependency").with_children([
                    Element::text_node("SAPCode", &d.code),
                    Element::text_node("BaseVersion", &d.base_version),
                    Element::text_node("EsdDirectory", self.esd_directory(&d.code)),
                    Element::text_node("InstallSize", d.install_size.to_string()),
                ])
            })));
        }

        let mut install_data = Element::new("InstallData").with_child(hd_data);
        if product.code == ENTERPRISE_PRODUCT {
            install_data.push(
                Element::new("RequestInfo")
                    .with_child(Element::text_node("IsEnterpriseDeployment", bool_text(true))),
            );
        }

        Element::new("ProductInfo").with_children([
            Element::text_node("Name", &product.name),
            Element::text_node("InstallerType", "HD"),
            Element::text_node("HideProductLaunch", bool_text(true)),
            icons(&product.code),
            install_data,
        ])
    }

    /// Build the `SuiteInfo` tree.
    pub fn to_element(&self) -> Element {
        Element::new("SuiteInfo").with_children([
            Element::text_node("SuiteName", &self.options.name),
            Element::text_node("CodexVersion", &self.options.version),
            Element::new("SupportedLanguages").with_children(
                self.locales
                    .iter()
                    .map(|locale| Element::text_node("Locale", locale)),
            ),
            Element::text_node("IsNonCCSuite", bool_text(false)),
            Element::text_node("IsAAMRequired", bool_text(false)),
            Element::text_node("IsCCDRequired", bool_text(false)),
            icons(SUITE_ICON),
            Element::new("ProductInfos")
                .with_children(self.products.iter().map(|p| self.product_element(p))),
        ])
    }

    /// Write `SuiteInfo.xml` into `products_dir`.
    pub async fn write(&self, products_dir: &Path) -> Result<PathBuf, DescriptorError> {
        let path = products_dir.join(SUITE_FILE);
        write_document(&path, &self.to_element(), Some(true)).await?;
        Ok(path)
    }
}

fn dependency_size(products_dir: &Path, code: &str) -> u64 {
    let path = products_dir.join(code).join(APPLICATION_JSON);
    match read_manifest(&path) {
        Ok(manifest) => manifest.install_size(),
        Err(e) => {
            warn!(dependency = code, error = %e, "cannot read dependency manifest, assuming size 0");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn product(dir: &Path, code: &str, json: &str) {
        let product_dir = dir.join(code);
        fs::create_dir_all(&product_dir).unwrap();
        fs::write(product_dir.join(APPLICATION_JSON), json).unwrap();
    }

    fn fixture() -> TempDir {
        let tmp = TempDir::new().unwrap();
        product(
            tmp.path(),
            "PHSP",
            r#"{"SAPCode": "PHSP", "IsSTI": false, "CodexVersion": "26.0", "BaseVersion": "26.0",
                "Platform": "win64",
                "AddRemoveInfo": {"DisplayName": {"Language": [{"locale": "en_US", "value": "Photoshop 2025"}]}},
                "SupportedLanguages": {"Language": [{"locale": "en_US"}, {"locale": "mul"}, {"locale": "fr_FR"}]},
                "Packages": {"Package": [
                    {"PackageName": "a", "Path": "/a.zip", "ExtractSize": 100},
                    {"PackageName": "b", "Path": "/b.zip", "ExtractSize": "20"}]},
                "Dependencies": {"Dependency": [{"SAPCode": "COSY", "BaseVersion": "4.0"}]}}"#,
        );
        product(
            tmp.path(),
            "COSY",
            r#"{"SAPCode": "COSY", "IsSTI": true,
                "AddRemoveInfo": {"DisplayName": {"Language": [{"locale": "mul", "value": "CoreSync"}]}},
                "Packages": {"Package": [{"PackageName": "c", "Path": "/c.zip", "ExtractSize": 7}]}}"#,
        );
        tmp
    }

    #[test]
    fn test_scan_selects_applications() {
        let tmp = fixture();
        let suite = SuiteInfo::scan(tmp.path(), SuiteOptions::default()).unwrap();

        assert_eq!(suite.products.len(), 1);
        let phsp = &suite.products[0];
        assert_eq!(phsp.name, "Photoshop 2025");
        assert_eq!(phsp.install_size, 120);
        assert_eq!(phsp.dependencies.as_ref().unwrap()[0].install_size, 7);
        assert_eq!(suite.locales, vec!["en_US", "fr_FR"]);
    }

    #[test]
    fn test_suite_document_layout() {
        let tmp = fixture();
        let suite = SuiteInfo::scan(
            tmp.path(),
            SuiteOptions {
                name: "Design".into(),
                version: "2.0".into(),
            },
        )
        .unwrap();
        let root = suite.to_element();

        let order: Vec<_> = root.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            order,
            vec![
                "SuiteName",
                "CodexVersion",
                "SupportedLanguages",
                "IsNonCCSuite",
                "IsAAMRequired",
                "IsCCDRequired",
                "Icons",
                "ProductInfos"
            ]
        );
        assert_eq!(root.child_text("SuiteName"), Some("Design"));
        assert_eq!(root.find("Icons/Size32x32/path").unwrap().text(), "./resources/icons/cloud32x32.png");

        let hd = root.find("ProductInfos/ProductInfo/InstallData/HDData").unwrap();
        assert_eq!(hd.child_text("InstallSize"), Some("120"));
        assert_eq!(
            hd.child_text("EsdDirectory").unwrap(),
            format!("{}/PHSP", suite.esd_root)
        );
        assert_eq!(
            root.find("ProductInfos/ProductInfo/Icons/Size20x19/path").unwrap().text(),
            "./resources/icons/phsp20x19.png"
        );
    }

    #[tokio::test]
    async fn test_written_standalone() {
        let tmp = fixture();
        let suite = SuiteInfo::scan(tmp.path(), SuiteOptions::default()).unwrap();
        let path = suite.write(tmp.path()).await.unwrap();

        let text = fs::read_to_string(path).unwrap();
        assert!(text.contains("standalone=\"yes\""));
        assert!(text.contains("<SuiteName>Adobe Creative Cloud</SuiteName>"));
    }

    #[test]
    fn test_empty_directory_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let err = SuiteInfo::scan(tmp.path(), SuiteOptions::default()).unwrap_err();
        assert!(matches!(err, DescriptorError::NoProducts(_)));
    }
}
