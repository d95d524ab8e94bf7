//! Shared types for ccdl: the product catalog, package manifests, platforms,
//! locales and user selections.

pub mod catalog;
pub mod locale;
pub mod manifest;
pub mod platform;
pub mod selection;

// Re-exports
pub use catalog::{Catalog, Product, ProductKind, VersionEntry};
pub use locale::{ALL_LANGUAGES, LanguageSet};
pub use manifest::{
    Dependency, LocaleEntry, Manifest, ModuleRecord, PackageKind, PackageRecord,
};
pub use platform::{Platform, UnknownPlatform};
pub use selection::{PartialSelection, Selection};
