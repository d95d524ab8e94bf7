//! Interactive selection.
//!
//! Feeds hints to the resolver and, whenever it asks for a decision,
//! turns the answer into a new hint and tries again.

use ccdl_core::{NeedsUserChoice, resolve};
use ccdl_schema::locale::canonicalize;
use ccdl_schema::{Catalog, PartialSelection, Selection};
use tracing::debug;

use super::error::CliError;
use super::prompt::{Choice, Prompt};

/// Environment variables consulted for the OS language, in order.
const LOCALE_VARS: &[&str] = &["LC_ALL", "LC_MESSAGES", "LANG"];

/// Canonical OS language: the explicit value, else the process locale.
pub fn os_language(explicit: Option<&str>) -> Option<String> {
    if let Some(explicit) = explicit.map(str::trim).filter(|l| !l.is_empty()) {
        return Some(canonicalize(explicit));
    }
    LOCALE_VARS
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find_map(|value| locale_from_env(&value))
}

/// `en_US.UTF-8@euro` → `en_US`; `C` and `POSIX` carry no language.
fn locale_from_env(value: &str) -> Option<String> {
    let base = value.split(['.', '@']).next().unwrap_or_default().trim();
    if base.is_empty() || base == "C" || base == "POSIX" {
        return None;
    }
    Some(canonicalize(base))
}

fn default_choice(need: &NeedsUserChoice, os_language: Option<&str>) -> Option<String> {
    if need.is_language() {
        let os_match = os_language.filter(|lang| need.candidates.iter().any(|c| c == lang));
        return Some(os_match.unwrap_or("all").to_string());
    }
    need.default.clone()
}

fn question(need: &NeedsUserChoice) -> &'static str {
    if need.is_product() {
        "Please enter the product code"
    } else if need.is_version() {
        "Please enter the desired version"
    } else {
        "Please enter the desired install language"
    }
}

fn choices(catalog: &Catalog, need: &NeedsUserChoice) -> Vec<Choice> {
    need.candidates
        .iter()
        .map(|candidate| match catalog.product(candidate) {
            Some(product) if need.is_product() => Choice::new(candidate.clone(), product.display_name.clone()),
            _ => Choice::bare(candidate.clone()),
        })
        .collect()
}

/// Replace the unsupported tokens of `current` with `answer`.
fn merge_languages(current: Option<&str>, unsupported: &[String], answer: &str) -> String {
    let mut kept: Vec<&str> = current
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .filter(|token| !unsupported.contains(&canonicalize(token)))
        .collect();
    kept.push(answer.trim());
    kept.join(",")
}

fn apply(hints: &mut PartialSelection, need: &NeedsUserChoice, answer: String) {
    use ccdl_core::ChoiceReason;

    match &need.reason {
        ChoiceReason::MissingProduct | ChoiceReason::UnknownProductCode(_) | ChoiceReason::NoUsableVersion(_) => {
            hints.product = Some(answer);
            hints.version = None;
        }
        ChoiceReason::UnsupportedVersion(_) => hints.version = Some(answer),
        ChoiceReason::MissingLanguage => hints.languages = Some(answer),
        ChoiceReason::UnsupportedLanguage(unsupported) => {
            hints.languages = Some(merge_languages(hints.languages.as_deref(), unsupported, &answer));
        }
    }
}

/// Resolve `hints`, asking the user whenever a decision is needed.
///
/// With `accept_defaults`, questions that have a default are answered with
/// it silently; batch runs use this so only a missing product code prompts.
///
/// # Errors
///
/// [`CliError::Unresolved`] when a question cannot be answered.
pub fn choose(
    catalog: &Catalog,
    mut hints: PartialSelection,
    prompt: &mut dyn Prompt,
    os_language: Option<&str>,
    accept_defaults: bool,
) -> Result<Selection, CliError> {
    let mut last_defaulted = None;
    loop {
        let need = match resolve(catalog, &hints) {
            Ok(selection) => return Ok(selection),
            Err(need) => need,
        };
        debug!(reason = %need.reason, "selection needs a decision");

        // a default that was just rejected is not applied twice
        let retry = last_defaulted.as_ref() == Some(&need.reason);
        let default = default_choice(&need, os_language);
        let answer = match default {
            Some(default) if accept_defaults && !retry => {
                last_defaulted = Some(need.reason.clone());
                Some(default)
            }
            default => {
                let question = format!("{}. {}", capitalize(&need.reason.to_string()), question(&need));
                prompt.ask(&question, &choices(catalog, &need), default.as_deref())?
            }
        };

        let Some(answer) = answer.filter(|a| !a.trim().is_empty()) else {
            return Err(CliError::Unresolved {
                reason: need.reason.to_string(),
                candidates: need.candidates,
            });
        };
        apply(&mut hints, &need, answer.trim().to_string());
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::prompt::{NoPrompt, ScriptedPrompt};
    use ccdl_schema::{Platform, Product, ProductKind, VersionEntry};

    fn entry(version: &str, build: &str) -> VersionEntry {
        VersionEntry {
            code: "PHSP".into(),
            display_name: "Photoshop".into(),
            platform: Platform::Win64,
            version: version.into(),
            supported_languages: vec!["en_US".into(), "fr_FR".into()],
            build_id: Some(build.into()),
            manifest_url: None,
        }
    }

    fn catalog() -> Catalog {
        let mut catalog = Catalog::default();
        let mut phsp = Product::new("PHSP", "Photoshop", ProductKind::Application);
        phsp.upsert_version(entry("25.0", "b25"));
        phsp.upsert_version(entry("26.0", "b26"));
        catalog.products.insert("PHSP".into(), phsp);
        catalog
    }

    fn hints(product: Option<&str>, version: Option<&str>, languages: Option<&str>) -> PartialSelection {
        PartialSelection {
            product: product.map(String::from),
            version: version.map(String::from),
            platform: Some(Platform::Win64),
            languages: languages.map(String::from),
        }
    }

    #[test]
    fn test_locale_from_env() {
        assert_eq!(locale_from_env("en_US.UTF-8").as_deref(), Some("en_US"));
        assert_eq!(locale_from_env("de_DE@euro").as_deref(), Some("de_DE"));
        assert_eq!(locale_from_env("C.UTF-8"), None);
        assert_eq!(locale_from_env("POSIX"), None);
    }

    #[test]
    fn test_explicit_os_language_is_canonicalized() {
        assert_eq!(os_language(Some("FR-fr")).as_deref(), Some("fr_FR"));
    }

    #[test]
    fn test_complete_hints_need_no_prompt() {
        let selection = choose(&catalog(), hints(Some("phsp"), None, Some("en_US")), &mut NoPrompt, None, false).unwrap();
        assert_eq!(selection.product_code, "PHSP");
        assert_eq!(selection.version, "26.0");
    }

    #[test]
    fn test_missing_answers_are_reported() {
        let err = choose(&catalog(), hints(None, None, None), &mut NoPrompt, None, false).unwrap_err();
        let CliError::Unresolved { reason, candidates } = err else {
            panic!("expected unresolved");
        };
        assert_eq!(reason, "no product selected");
        assert_eq!(candidates, vec!["PHSP"]);
    }

    #[test]
    fn test_answers_fill_each_hint() {
        let mut prompt = ScriptedPrompt::new(["PHSP", ""]);
        let selection = choose(
            &catalog(),
            hints(None, Some("1.0"), None),
            &mut prompt,
            Some("fr_FR"),
            false,
        )
        .unwrap();

        // product answer resets the version hint, so the latest is used
        assert_eq!(selection.version, "26.0");
        assert!(selection.languages.contains("fr_FR"));
        assert_eq!(prompt.asked.len(), 2);
    }

    #[test]
    fn test_unsupported_version_prompts_with_latest_default() {
        let mut prompt = ScriptedPrompt::new(["", "en_US"]);
        let selection = choose(&catalog(), hints(Some("PHSP"), Some("9.9"), None), &mut prompt, None, false).unwrap();
        assert_eq!(selection.version, "26.0");
        assert!(selection.languages.contains("en_US"));
    }

    #[test]
    fn test_unsupported_language_is_replaced() {
        let mut prompt = ScriptedPrompt::new(["fr_FR"]);
        let selection = choose(
            &catalog(),
            hints(Some("PHSP"), None, Some("en_US,xx_XX")),
            &mut prompt,
            None,
            false,
        )
        .unwrap();
        assert!(selection.languages.contains("en_US"));
        assert!(selection.languages.contains("fr_FR"));
        assert!(!selection.languages.contains("xx_XX"));
    }

    #[test]
    fn test_accept_defaults_falls_back_to_all_languages() {
        let selection = choose(&catalog(), hints(Some("PHSP"), None, None), &mut NoPrompt, Some("ja_JP"), true).unwrap();
        assert!(selection.languages.is_all());
    }

    #[test]
    fn test_batch_accepts_os_language_beside_mul() {
        let mut catalog = catalog();
        let mut ilst = Product::new("ILST", "Illustrator", ProductKind::Application);
        let mut multi = entry("29.0", "i29");
        multi.code = "ILST".into();
        multi.supported_languages = vec!["en_US".into(), "fr_FR".into(), "mul".into()];
        ilst.upsert_version(multi);
        catalog.products.insert("ILST".into(), ilst);

        let selection = choose(&catalog, hints(Some("ILST"), None, None), &mut NoPrompt, Some("en_US"), true).unwrap();
        assert!(selection.languages.contains("en_US"));
        assert!(!selection.languages.is_all());
    }

    #[test]
    fn test_batch_replaces_unsupported_language_with_default() {
        let selection = choose(
            &catalog(),
            hints(Some("PHSP"), None, Some("xx_XX")),
            &mut NoPrompt,
            Some("en_US"),
            true,
        )
        .unwrap();
        assert!(selection.languages.contains("en_US"));
        assert!(!selection.languages.contains("xx_XX"));
    }

    #[test]
    fn test_merge_languages() {
        assert_eq!(merge_languages(Some("en_US, XX-xx"), &["xx_XX".into()], "de_DE"), "en_US,de_DE");
        assert_eq!(merge_languages(None, &[], "all"), "all");
    }
}
