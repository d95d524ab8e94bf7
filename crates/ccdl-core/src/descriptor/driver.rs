//! `<CODE>-Driver.xml`: tells the installer which product to install
//! first and where its packages live.

use std::path::{Path, PathBuf};

use ccdl_schema::Manifest;

use super::{DescriptorError, bool_text, write_document};
use crate::io::xml::Element;

/// Product that is always deployed in enterprise mode.
const ENTERPRISE_PRODUCT: &str = "LTRM";

/// A product the driven product depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverDependency {
    /// SAP code.
    pub code: String,
    /// Required base version, empty when unpublished.
    pub base_version: String,
}

/// Driver descriptor contents, taken from a pruned manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverInfo {
    /// Display name with the vendor prefix.
    pub name: String,
    /// SAP code.
    pub code: String,
    /// Exact product build.
    pub codex_version: String,
    /// Marketing version.
    pub base_version: String,
    /// Platform id from the manifest.
    pub platform: String,
    /// `None` when the manifest has no `Dependencies` key.
    pub dependencies: Option<Vec<DriverDependency>>,
    /// `(IsNonCCProduct, IsNglEnabled)`, published by newer catalogs only.
    pub licensing: Option<(String, bool)>,
    /// Locales the product supports.
    pub languages: Vec<String>,
    /// `(MinimumSupportedClientVersion, HDBuilderVersion)`.
    pub client_versions: Option<(String, String)>,
}

fn required(manifest: &Manifest, field: &'static str) -> Result<String, DescriptorError> {
    manifest.text(field).ok_or_else(|| DescriptorError::MissingField {
        context: format!("manifest of {}", manifest.sap_code),
        field,
    })
}

fn esd_directory(code: &str) -> String {
    format!("./{code}")
}

impl DriverInfo {
    /// Collect the descriptor fields of a pruned manifest.
    pub fn from_manifest(manifest: &Manifest) -> Result<Self, DescriptorError> {
        let licensing = match (manifest.text("IsNonCCProduct"), manifest.has("IsNglEnabled")) {
            (Some(non_cc), true) => Some((non_cc, manifest.has("NglLicensingInfo"))),
            _ => None,
        };
        let client_versions = manifest
            .text("MinimumSupportedClientVersion")
            .zip(manifest.text("HDBuilderVersion"));

        Ok(Self {
            name: format!("Adobe {}", required(manifest, "Name")?),
            code: manifest.sap_code.clone(),
            codex_version: required(manifest, "CodexVersion")?,
            base_version: required(manifest, "BaseVersion")?,
            platform: required(manifest, "Platform")?,
            dependencies: manifest.dependencies.as_ref().map(|list| {
                list.dependencies
                    .iter()
                    .map(|d| DriverDependency {
                        code: d.code.clone(),
                        base_version: d.base_version.clone().unwrap_or_default(),
                    })
                    .collect()
            }),
            licensing,
            languages: manifest
                .supported_locales()
                .into_iter()
                .map(str::to_string)
                .collect(),
            client_versions,
        })
    }

    /// Whether the descriptor asks for an enterprise deployment.
    pub fn is_enterprise(&self) -> bool {
        self.code == ENTERPRISE_PRODUCT
    }

    /// `<CODE>-Driver.xml`
    pub fn file_name(&self) -> String {
        format!("{}-Driver.xml", self.code)
    }

    /// Build the `DriverInfo` tree.
    pub fn to_element(&self) -> Element {
        let mut product = Element::new("ProductInfo").with_children([
            Element::text_node("Name", &self.name),
            Element::text_node("SAPCode", &self.code),
            Element::text_node("CodexVersion", &self.codex_version),
            Element::text_node("BaseVersion", &self.base_version),
            Element::text_node("Platform", &self.platform),
            Element::text_node("EsdDirectory", esd_directory(&self.code)),
        ]);

        if let Some(dependencies) = &self.dependencies {
            product.push(Element::new("Dependencies").with_children(dependencies.iter().map(|d| {
                Element::new("Dependency").with_children([
                    Element::text_node("SAPCode", &d.code),
                    Element::text_node("BaseVersion", &d.base_version),
                    Element::text_node("EsdDirectory", esd_directory(&d.code)),
                ])
            })));
        }

        if let Some((non_cc, ngl)) = &self.licensing {
            product.push(Element::text_node("IsNonCCProduct", non_cc));
            product.push(Element::text_node("IsNglEnabled", bool_text(*ngl)));
        }

        product.push(
            Element::new("SupportedLanguages").with_children(
                self.languages
                    .iter()
                    .map(|locale| Element::new("Language").with_attr("locale", locale)),
            ),
        );

        if let Some((minimum, builder)) = &self.client_versions {
            product.push(Element::text_node("MinimumSupportedClientVersion", minimum));
            product.push(Element::text_node("HDBuilderVersion", builder));
        }

        let mut root = Element::new("DriverInfo").with_child(product);
        if self.is_enterprise() {
            root.push(
                Element::new("RequestInfo")
                    .with_child(Element::text_node("IsEnterpriseDeployment", bool_text(true))),
            );
        }
        root
    }

    /// Write the descriptor into `products_dir`.
    pub async fn write(&self, products_dir: &Path) -> Result<PathBuf, DescriptorError> {
        let path = products_dir.join(self.file_name());
        write_document(&path, &self.to_element(), None).await?;
        Ok(path)
    }
}
