//! Package filtering.
//!
//! Reduces a manifest's package list to the packages needed for one
//! selection. Each record is decided on its own, in input order:
//!
//! 1. a record with a condition is kept when the condition holds, or when
//!    the condition cannot be parsed (fail-open),
//! 2. an unconditioned non-core language pack (`<app>-esl_lp_<code>`) is kept
//!    when its embedded language is selected,
//! 3. anything else is kept unconditionally.

use crate::condition::{Condition, ConditionParseError, EvalContext, OsVersion};
use ccdl_schema::locale::{self, ALL_LANGUAGES};
use ccdl_schema::{LanguageSet, PackageKind, PackageRecord, Selection};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Name infix marking a per-language pack.
pub const LANGUAGE_PACK_INFIX: &str = "-esl_lp_";

/// Everything the filter needs to know about the target machine.
#[derive(Debug, Clone, Copy)]
pub struct FilterContext<'a> {
    /// Resolved selection.
    pub selection: &'a Selection,
    /// Target OS version.
    pub os_version: &'a OsVersion,
}

impl<'a> FilterContext<'a> {
    /// Build a context.
    pub fn new(selection: &'a Selection, os_version: &'a OsVersion) -> Self {
        Self {
            selection,
            os_version,
        }
    }

    fn eval_context(&self) -> EvalContext<'a> {
        EvalContext {
            processor_family: self.selection.platform.processor_family(),
            os_version: self.os_version,
            languages: &self.selection.languages,
        }
    }
}

/// A package kept only because its condition could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelaxedCondition {
    /// Package name.
    pub package: String,
    /// Why the condition was rejected.
    pub error: ConditionParseError,
}

/// Result of filtering one manifest.
#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    /// Retained packages, in input order.
    pub retained: Vec<PackageRecord>,
    /// Relative download paths of the retained packages, in the same order.
    pub urls: Vec<String>,
    /// Number of retained `core` packages.
    pub core_count: usize,
    /// Number of retained packages of any other type.
    pub other_count: usize,
    /// Packages whose targeting was relaxed to "always include".
    pub relaxed: Vec<RelaxedCondition>,
}

impl FilterOutcome {
    /// Names of the retained packages.
    pub fn retained_names(&self) -> HashSet<&str> {
        self.retained.iter().map(|p| p.name.as_str()).collect()
    }

    /// Sum of `ExtractSize` over the retained packages.
    pub fn install_size(&self) -> u64 {
        self.retained.iter().map(PackageRecord::extract_size).sum()
    }
}

/// Language code embedded in a language-pack name (`PPRO-esl_lp_fr` → `fr`).
pub fn language_pack_code(name: &str) -> Option<&str> {
    let idx = name.find(LANGUAGE_PACK_INFIX)?;
    let code = &name[idx + LANGUAGE_PACK_INFIX.len()..];
    (!code.is_empty()).then_some(code)
}

/// Whether a language pack for `code` is wanted by the selected languages.
///
/// Matching happens on the primary language subtag, so the `fr` pack serves
/// both `fr_FR` and `fr_CA`. Individual Chinese languages (`cmn`, `yue`) are
/// wanted by any `zh_*` selection.
pub fn language_pack_wanted(code: &str, languages: &LanguageSet) -> bool {
    if languages.is_all() {
        return true;
    }

    let canonical = locale::canonicalize(code);
    if canonical == ALL_LANGUAGES || languages.contains(&canonical) {
        return true;
    }

    let pack_primary = locale::primary_subtag(&canonical);
    languages.iter().any(|selected| {
        let primary = locale::primary_subtag(selected);
        primary == pack_primary || locale::macrolanguage_covers(&primary, &pack_primary)
    })
}

/// Filter `packages` for the given context.
pub fn filter(packages: &[PackageRecord], ctx: &FilterContext<'_>) -> FilterOutcome {
    let eval = ctx.eval_context();
    let mut outcome = FilterOutcome::default();

    for package in packages {
        let keep = match package.condition.as_deref() {
            Some(expr) => match Condition::parse(expr) {
                Ok(condition) => condition.evaluate(&eval),
                Err(error) => {
                    warn!(package = %package.name, condition = expr, %error, "unparseable condition, keeping package");
                    outcome.relaxed.push(RelaxedCondition {
                        package: package.name.clone(),
                        error,
                    });
                    true
                }
            },
            None => match language_pack_code(&package.name) {
                Some(code) if package.kind() == PackageKind::Other => {
                    language_pack_wanted(code, &ctx.selection.languages)
                }
                _ => true,
            },
        };

        if !keep {
            debug!(package = %package.name, "dropped");
            continue;
        }

        match package.kind() {
            PackageKind::Core => outcome.core_count += 1,
            PackageKind::Other => outcome.other_count += 1,
        }
        outcome.urls.push(package.path.clone());
        outcome.retained.push(package.clone());
    }

    debug!(
        core = outcome.core_count,
        other = outcome.other_count,
        total = packages.len(),
        "filtered packages"
    );

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccdl_schema::Platform;

    fn selection(platform: Platform, languages: &str) -> Selection {
        Selection {
            product_code: "PPRO".into(),
            version: "25.0".into(),
            platform,
            languages: LanguageSet::from_request(languages),
        }
    }

    fn run(packages: &[PackageRecord], sel: &Selection, os: &str) -> FilterOutcome {
        let os: OsVersion = os.parse().unwrap();
        filter(packages, &FilterContext::new(sel, &os))
    }

    fn names(outcome: &FilterOutcome) -> Vec<&str> {
        outcome.retained.iter().map(|p| p.name.as_str()).collect()
    }

    fn language_pack_manifest() -> Vec<PackageRecord> {
        vec![
            PackageRecord::new("core1", "/core1.zip", PackageKind::Core),
            PackageRecord::new("lp-esl_lp_fr", "/fr.zip", PackageKind::Other),
            PackageRecord::new("lp-esl_lp_de", "/de.zip", PackageKind::Other),
        ]
    }

    #[test]
    fn test_language_packs_follow_selection() {
        let outcome = run(
            &language_pack_manifest(),
            &selection(Platform::Win64, "fr_FR"),
            "10.0",
        );
        assert_eq!(names(&outcome), vec!["core1", "lp-esl_lp_fr"]);
        assert_eq!(outcome.urls, vec!["/core1.zip", "/fr.zip"]);
        assert_eq!(outcome.core_count, 1);
        assert_eq!(outcome.other_count, 1);
    }

    #[test]
    fn test_all_languages_keeps_every_pack() {
        let outcome = run(
            &language_pack_manifest(),
            &selection(Platform::Win64, "all"),
            "10.0",
        );
        assert_eq!(names(&outcome), vec!["core1", "lp-esl_lp_fr", "lp-esl_lp_de"]);
    }

    #[test]
    fn test_processor_family_condition() {
        let packages = vec![
            PackageRecord::new("x64", "/x64.zip", PackageKind::Other)
                .with_condition("[OSProcessorFamily] == 64-bit"),
        ];

        let outcome = run(&packages, &selection(Platform::Win32, "en_US"), "10.0");
        assert!(outcome.retained.is_empty());

        let outcome = run(&packages, &selection(Platform::Win64, "en_US"), "10.0");
        assert_eq!(names(&outcome), vec!["x64"]);
    }

    #[test]
    fn test_and_condition_with_failing_os_term() {
        let packages = vec![
            PackageRecord::new("modern", "/m.zip", PackageKind::Other)
                .with_condition("[OSVersion] >= 10.0 && [installLanguage] == en_US"),
        ];
        let outcome = run(&packages, &selection(Platform::Win64, "en_US"), "6.1");
        assert!(outcome.retained.is_empty());
    }

    #[test]
    fn test_unparseable_condition_fails_open() {
        let packages = vec![
            PackageRecord::new("odd", "/odd.zip", PackageKind::Core)
                .with_condition("[GPUVendor] == nvidia"),
            PackageRecord::new("mixed", "/mixed.zip", PackageKind::Core).with_condition(
                "[OSVersion] >= 10 && [installLanguage] == en_US || [OSProcessorFamily] == 32-bit",
            ),
        ];
        let outcome = run(&packages, &selection(Platform::Win64, "en_US"), "10.0");
        assert_eq!(names(&outcome), vec!["odd", "mixed"]);
        assert_eq!(outcome.relaxed.len(), 2);
        assert!(matches!(
            outcome.relaxed[1].error,
            ConditionParseError::MixedOperators(_)
        ));
    }

    #[test]
    fn test_chinese_selection_covers_individual_languages() {
        let packages = vec![
            PackageRecord::new("PPRO-esl_lp_cmn", "/cmn.zip", PackageKind::Other),
            PackageRecord::new("PPRO-esl_lp_yue", "/yue.zip", PackageKind::Other),
            PackageRecord::new("PPRO-esl_lp_ja", "/ja.zip", PackageKind::Other),
        ];
        let outcome = run(&packages, &selection(Platform::Win64, "zh_CN"), "10.0");
        assert_eq!(names(&outcome), vec!["PPRO-esl_lp_cmn", "PPRO-esl_lp_yue"]);
    }

    #[test]
    fn test_core_language_pack_name_is_not_special() {
        let packages = vec![PackageRecord::new(
            "shared-esl_lp_de",
            "/shared.zip",
            PackageKind::Core,
        )];
        let outcome = run(&packages, &selection(Platform::Win64, "fr_FR"), "10.0");
        assert_eq!(names(&outcome), vec!["shared-esl_lp_de"]);
    }

    #[test]
    fn test_output_is_subsequence_of_input() {
        let packages: Vec<PackageRecord> = (0..12)
            .map(|i| {
                let record = PackageRecord::new(format!("p{i}"), format!("/p{i}.zip"), PackageKind::Other);
                if i % 3 == 0 {
                    record.with_condition("[OSProcessorFamily] == 32-bit")
                } else {
                    record
                }
            })
            .collect();

        let outcome = run(&packages, &selection(Platform::Win64, "en_US"), "10.0");
        let mut input = packages.iter().map(|p| p.name.as_str());
        for kept in names(&outcome) {
            assert!(input.any(|name| name == kept), "{kept} out of order");
        }
        assert_eq!(outcome.retained.len(), 8);
    }

    #[test]
    fn test_install_size_sums_retained() {
        let packages = vec![
            PackageRecord::new("a", "/a", PackageKind::Core).with_extract_size(10),
            PackageRecord::new("b", "/b", PackageKind::Other)
                .with_extract_size(5)
                .with_condition("[OSProcessorFamily] == 32-bit"),
            PackageRecord::new("c", "/c", PackageKind::Other).with_extract_size(7),
        ];
        let outcome = run(&packages, &selection(Platform::Win64, "en_US"), "10.0");
        assert_eq!(outcome.install_size(), 17);
        assert!(outcome.retained_names().contains("c"));
    }

    #[test]
    fn test_language_pack_code() {
        assert_eq!(language_pack_code("PPRO-esl_lp_fr"), Some("fr"));
        assert_eq!(language_pack_code("PPRO-esl_lp_"), None);
        assert_eq!(language_pack_code("PPRO-core"), None);
    }
}
