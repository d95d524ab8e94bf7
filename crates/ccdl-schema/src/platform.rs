//! Target platforms published in the product catalog.
//!
//! The catalog tags every language set with a platform id (`win32`, `win64`,
//! `winarm64`). The platform picked by the user also decides which processor
//! family conditions in a manifest are evaluated against.
//!
//! # Example
//!
//! ```
//! use ccdl_schema::Platform;
//!
//! let platform: Platform = "win64".parse().unwrap();
//! assert_eq!(platform.processor_family(), "64-bit");
//! assert_eq!(platform.allowed(), vec![Platform::Win64, Platform::Win32]);
//! ```

/// Windows platform flavor of a product build.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
    Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// 32-bit x86 build.
    Win32,
    /// 64-bit x86 build (default).
    #[default]
    Win64,
    /// 64-bit ARM build.
    WinArm64,
}

impl Platform {
    /// Every platform, in the order they are offered to the user.
    pub const ALL: [Platform; 3] = [Self::Win32, Self::Win64, Self::WinArm64];

    /// Catalog id of the platform.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Win32 => "win32",
            Self::Win64 => "win64",
            Self::WinArm64 => "winarm64",
        }
    }

    /// Human readable label used in prompts.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Win32 => "32 Bit Windows",
            Self::Win64 => "64 Bit Windows",
            Self::WinArm64 => "Windows ARM",
        }
    }

    /// Value compared against `[OSProcessorFamily]` condition terms.
    pub fn processor_family(&self) -> &'static str {
        match self {
            Self::Win32 => "32-bit",
            Self::Win64 | Self::WinArm64 => "64-bit",
        }
    }

    /// Catalog platforms whose entries may be used for this selection.
    ///
    /// A 64-bit selection also admits 32-bit entries, since several shared
    /// components are only published as 32-bit builds.
    pub fn allowed(&self) -> Vec<Platform> {
        match self {
            Self::Win64 => vec![Self::Win64, Self::Win32],
            other => vec![*other],
        }
    }

    /// Comma separated platform filter for the catalog request.
    pub fn catalog_filter(&self) -> String {
        self.allowed()
            .iter()
            .map(Platform::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A platform id outside `win32`, `win64` and `winarm64`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown platform '{0}' (expected win32, win64 or winarm64)")]
pub struct UnknownPlatform(pub String);

impl std::str::FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "win32" => Ok(Self::Win32),
            "win64" => Ok(Self::Win64),
            "winarm64" => Ok(Self::WinArm64),
            _ => Err(UnknownPlatform(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("WIN32".parse::<Platform>().unwrap(), Platform::Win32);
        assert_eq!("winarm64".parse::<Platform>().unwrap(), Platform::WinArm64);
        assert_eq!(
            "osx10-64".parse::<Platform>(),
            Err(UnknownPlatform("osx10-64".into()))
        );
        assert_eq!(
            UnknownPlatform("mac".into()).to_string(),
            "unknown platform 'mac' (expected win32, win64 or winarm64)"
        );
    }

    #[test]
    fn test_catalog_filter() {
        assert_eq!(Platform::Win64.catalog_filter(), "win64,win32");
        assert_eq!(Platform::Win32.catalog_filter(), "win32");
        assert_eq!(Platform::WinArm64.catalog_filter(), "winarm64");
    }

    #[test]
    fn test_processor_family() {
        assert_eq!(Platform::Win32.processor_family(), "32-bit");
        assert_eq!(Platform::WinArm64.processor_family(), "64-bit");
    }
}
