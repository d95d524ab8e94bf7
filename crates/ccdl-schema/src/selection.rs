//! What the user asked for, and what it resolved to.

use crate::locale::LanguageSet;
use crate::platform::Platform;
use serde::{Deserialize, Serialize};

/// User hints, any of which may be missing or invalid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialSelection {
    /// Requested product code.
    pub product: Option<String>,
    /// Requested version; `None` means latest.
    pub version: Option<String>,
    /// Requested platform; `None` means the 64-bit default.
    pub platform: Option<Platform>,
    /// Raw comma separated language request (`en_US,fr_FR`, `all`).
    pub languages: Option<String>,
}

/// A fully resolved selection: the input of the package filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    /// Product code present in the catalog.
    pub product_code: String,
    /// Exact version string present in the catalog.
    pub version: String,
    /// Target platform.
    pub platform: Platform,
    /// Non-empty set of canonical locales, or the all-languages marker.
    pub languages: LanguageSet,
}

impl std::fmt::Display for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} ({}, {})",
            self.product_code, self.version, self.platform, self.languages
        )
    }
}
