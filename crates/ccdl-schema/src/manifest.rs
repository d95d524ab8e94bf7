//! Product manifest (`Application.json`) model.
//!
//! Only the parts the filter and pruner reason about are typed. Every other
//! key is carried through `extra` untouched so the pruned manifest can be
//! written back for the installer without losing data.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key under which locale-keyed lists are stored everywhere in a manifest.
pub const LOCALE_LIST_KEY: &str = "Language";

/// Coarse package classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageKind {
    /// Always required by the product.
    Core,
    /// Optional or targeted package (language packs, platform extras).
    Other,
}

/// One installable package file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageRecord {
    /// Unique package name within the manifest.
    #[serde(rename = "PackageName")]
    pub name: String,
    /// Download path relative to the manifest CDN.
    #[serde(rename = "Path")]
    pub path: String,
    /// Raw package type (`core`, `non-core`, ...).
    #[serde(rename = "Type", default, skip_serializing_if = "Option::is_none")]
    pub kind_raw: Option<String>,
    /// Boolean condition over OS processor family, OS version and language.
    #[serde(rename = "Condition", default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    /// Extracted size in bytes, published either as number or string.
    #[serde(rename = "ExtractSize", default, skip_serializing_if = "Option::is_none")]
    pub extract_size_raw: Option<Value>,
    /// Remaining keys, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PackageRecord {
    /// Create a bare record; mostly useful for tests and tooling.
    pub fn new(name: impl Into<String>, path: impl Into<String>, kind: PackageKind) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind_raw: Some(
                match kind {
                    PackageKind::Core => "core",
                    PackageKind::Other => "non-core",
                }
                .to_string(),
            ),
            condition: None,
            extract_size_raw: None,
            extra: Map::new(),
        }
    }

    /// Attach a condition expression.
    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    /// Attach an extracted size.
    pub fn with_extract_size(mut self, size: u64) -> Self {
        self.extract_size_raw = Some(Value::from(size));
        self
    }

    /// `Core` when the type is `core` (any casing), `Other` otherwise.
    pub fn kind(&self) -> PackageKind {
        match self.kind_raw.as_deref() {
            Some(kind) if kind.eq_ignore_ascii_case("core") => PackageKind::Core,
            _ => PackageKind::Other,
        }
    }

    /// Extracted size in bytes; unparseable or missing sizes count as zero.
    pub fn extract_size(&self) -> u64 {
        match &self.extract_size_raw {
            Some(Value::Number(n)) => n.as_u64().unwrap_or_default(),
            Some(Value::String(s)) => s.trim().parse().unwrap_or_default(),
            _ => 0,
        }
    }
}

/// `{"Package": [...]}` wrapper.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageList {
    /// Packages in manifest order.
    #[serde(rename = "Package", default)]
    pub packages: Vec<PackageRecord>,
    /// Remaining keys, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `{"ReferencePackage": [...]}` wrapper.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferencePackages {
    /// Names of the packages a module installs.
    #[serde(rename = "ReferencePackage", default)]
    pub names: Vec<String>,
}

/// A user-visible module grouping one or more packages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleRecord {
    /// Packages referenced by this module.
    #[serde(rename = "ReferencePackages", default)]
    pub reference_packages: ReferencePackages,
    /// Remaining keys (id, display names, ...), preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ModuleRecord {
    /// Create a module referencing the given package names.
    pub fn new<I, S>(id: &str, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut extra = Map::new();
        extra.insert("Id".to_string(), Value::from(id));
        Self {
            reference_packages: ReferencePackages {
                names: names.into_iter().map(Into::into).collect(),
            },
            extra,
        }
    }

    /// Module id, when present.
    pub fn id(&self) -> Option<&str> {
        self.extra.get("Id").and_then(Value::as_str)
    }
}

/// `{"Module": [...]}` wrapper.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleList {
    /// Modules in manifest order.
    #[serde(rename = "Module", default)]
    pub modules: Vec<ModuleRecord>,
    /// Remaining keys, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Another product that must be downloaded alongside this one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    /// Product code of the dependency.
    #[serde(rename = "SAPCode")]
    pub code: String,
    /// Base version required by the dependent product.
    #[serde(rename = "BaseVersion", default, skip_serializing_if = "Option::is_none")]
    pub base_version: Option<String>,
    /// Remaining keys, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Dependency {
    /// Create a dependency entry.
    pub fn new(code: impl Into<String>, base_version: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            base_version: Some(base_version.into()),
            extra: Map::new(),
        }
    }
}

/// `{"Dependency": [...]}` wrapper.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyList {
    /// Dependencies in manifest order.
    #[serde(rename = "Dependency", default)]
    pub dependencies: Vec<Dependency>,
}

/// One entry of a locale-keyed list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocaleEntry {
    /// Locale token as published (`en_US`, `mul`).
    pub locale: String,
    /// Localized value and any other keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LocaleEntry {
    /// Entry without a value, as used by supported-language lists.
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            extra: Map::new(),
        }
    }

    /// Localized text, when present.
    pub fn value(&self) -> Option<&str> {
        self.extra.get("value").and_then(Value::as_str)
    }
}

/// `{"Language": [...]}` wrapper.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalizedList {
    /// Entries, one per published locale.
    #[serde(rename = "Language", default)]
    pub entries: Vec<LocaleEntry>,
}

/// A product manifest as served by the vendor API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Product code.
    #[serde(rename = "SAPCode")]
    pub sap_code: String,
    /// Installable packages.
    #[serde(rename = "Packages", default)]
    pub packages: PackageList,
    /// Module groupings, when the product defines any.
    #[serde(rename = "Modules", default, skip_serializing_if = "Option::is_none")]
    pub modules: Option<ModuleList>,
    /// Products this one depends on.
    #[serde(rename = "Dependencies", default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<DependencyList>,
    /// Locales the product can be installed in.
    #[serde(rename = "SupportedLanguages", default, skip_serializing_if = "Option::is_none")]
    pub supported_languages: Option<LocalizedList>,
    /// Every other key, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Manifest {
    /// Create a manifest with the given packages and nothing else.
    pub fn new(sap_code: impl Into<String>, packages: Vec<PackageRecord>) -> Self {
        Self {
            sap_code: sap_code.into(),
            packages: PackageList {
                packages,
                extra: Map::new(),
            },
            modules: None,
            dependencies: None,
            supported_languages: None,
            extra: Map::new(),
        }
    }

    /// Parse a manifest from JSON text.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Serialize the manifest as compact JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Packages in manifest order.
    pub fn package_records(&self) -> &[PackageRecord] {
        &self.packages.packages
    }

    /// Dependencies in manifest order.
    pub fn dependency_list(&self) -> &[Dependency] {
        self.dependencies
            .as_ref()
            .map(|d| d.dependencies.as_slice())
            .unwrap_or_default()
    }

    /// Sum of `ExtractSize` over all packages.
    pub fn install_size(&self) -> u64 {
        self.package_records()
            .iter()
            .map(PackageRecord::extract_size)
            .sum()
    }

    /// Top-level key rendered as text (strings verbatim, numbers and
    /// booleans formatted).
    pub fn text(&self, key: &str) -> Option<String> {
        match self.extra.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Whether a top-level key is present at all.
    pub fn has(&self, key: &str) -> bool {
        self.extra.contains_key(key)
    }

    /// Secure CDN base URL for package paths.
    pub fn cdn(&self) -> Option<&str> {
        self.extra
            .get("Cdn")
            .and_then(|cdn| cdn.get("Secure"))
            .and_then(Value::as_str)
    }

    /// Whether the product is flagged as a standalone installer component.
    pub fn is_sti(&self) -> Option<bool> {
        self.extra.get("IsSTI").and_then(Value::as_bool)
    }

    /// Add/remove programs display name (first localized entry).
    pub fn display_name(&self) -> Option<&str> {
        self.extra
            .get("AddRemoveInfo")?
            .get("DisplayName")?
            .get(LOCALE_LIST_KEY)?
            .as_array()?
            .first()?
            .get("value")?
            .as_str()
    }

    /// Whether the manifest carries add/remove programs information.
    pub fn has_add_remove_info(&self) -> bool {
        self.extra
            .get("AddRemoveInfo")
            .is_some_and(|v| !v.is_null())
    }

    /// Supported locale tokens as published.
    pub fn supported_locales(&self) -> Vec<&str> {
        self.supported_languages
            .iter()
            .flat_map(|list| list.entries.iter())
            .map(|entry| entry.locale.as_str())
            .collect()
    }
}
