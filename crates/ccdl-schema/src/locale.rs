//! Locale token normalization and matching.
//!
//! The catalog, manifests and users spell locales differently (`en_US`,
//! `EN-us`, `mul`, `ALL`, `cmn`). Every token is brought to one canonical
//! form before it is compared:
//!
//! - region locales become `ll_CC` (lower-case language, upper-case region),
//! - two-letter language codes become lower-case,
//! - three-letter language codes become title-case (`Cmn`),
//! - `all` and `mul` (any casing) collapse into [`ALL_LANGUAGES`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Marker for "every language". Multi-language packages carry it as locale.
pub const ALL_LANGUAGES: &str = "mul";

/// Macrolanguages whose language packs are published under individual codes.
const MACROLANGUAGES: &[(&str, &[&str])] = &[("zh", &["cmn", "yue"])];

static REGION_LOCALE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z]{2})[-_ ]?([A-Za-z]{2})$").expect("static regex is valid")
});

static LANGUAGE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]{2,3}$").expect("static regex is valid"));

/// Bring a locale token into its canonical form.
///
/// Unknown shapes are returned trimmed but otherwise untouched, so the
/// function never loses information.
///
/// # Example
///
/// ```
/// use ccdl_schema::locale::canonicalize;
///
/// assert_eq!(canonicalize("EN-us"), "en_US");
/// assert_eq!(canonicalize("ALL"), "mul");
/// assert_eq!(canonicalize("cmn"), "Cmn");
/// ```
pub fn canonicalize(token: &str) -> String {
    let token = token.trim();

    if token.eq_ignore_ascii_case("all") || token.eq_ignore_ascii_case(ALL_LANGUAGES) {
        return ALL_LANGUAGES.to_string();
    }

    if let Some(caps) = REGION_LOCALE.captures(token) {
        return format!(
            "{}_{}",
            caps[1].to_ascii_lowercase(),
            caps[2].to_ascii_uppercase()
        );
    }

    if LANGUAGE_CODE.is_match(token) {
        return if token.len() == 2 {
            token.to_ascii_lowercase()
        } else {
            title_case(token)
        };
    }

    token.to_string()
}

fn title_case(token: &str) -> String {
    let lower = token.to_ascii_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Lower-case primary language subtag of a token (`fr_FR` → `fr`).
pub fn primary_subtag(token: &str) -> String {
    let canonical = canonicalize(token);
    canonical
        .split('_')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

/// Whether `code` is one of the individual languages grouped under the
/// macrolanguage `primary` (e.g. `cmn` under `zh`).
pub fn macrolanguage_covers(primary: &str, code: &str) -> bool {
    let code = code.to_ascii_lowercase();
    MACROLANGUAGES
        .iter()
        .any(|(macro_code, members)| *macro_code == primary && members.contains(&code.as_str()))
}

/// Whether a candidate locale is satisfied by the selected languages.
///
/// True when every language is selected, when the candidate is selected
/// literally, or when the candidate is the multi-language marker and at
/// least one concrete language was requested.
pub fn matches(candidate: &str, selected: &LanguageSet) -> bool {
    let candidate = canonicalize(candidate);
    selected.is_all()
        || selected.contains(&candidate)
        || (candidate == ALL_LANGUAGES && !selected.is_empty())
}

/// A canonical set of requested languages.
///
/// Inserting the all-languages marker absorbs every other entry; once the
/// set means "all", concrete locales are no longer recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageSet(BTreeSet<String>);

impl LanguageSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// The set meaning "every language".
    pub fn all() -> Self {
        let mut set = BTreeSet::new();
        set.insert(ALL_LANGUAGES.to_string());
        Self(set)
    }

    /// Parse a comma separated request such as `en_US,fr_FR` or `all`.
    pub fn from_request(request: &str) -> Self {
        request
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .collect()
    }

    /// Add a token, canonicalizing it first.
    pub fn insert(&mut self, token: &str) {
        if self.is_all() {
            return;
        }
        let canonical = canonicalize(token);
        if canonical == ALL_LANGUAGES {
            *self = Self::all();
        } else {
            self.0.insert(canonical);
        }
    }

    /// Whether the set stands for every language.
    pub fn is_all(&self) -> bool {
        self.0.contains(ALL_LANGUAGES)
    }

    /// Whether the canonical form of `token` is in the set.
    pub fn contains(&self, token: &str) -> bool {
        self.0.contains(&canonicalize(token))
    }

    /// Whether nothing has been selected.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over the canonical tokens in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<S> for LanguageSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for token in iter {
            set.insert(token.as_ref());
        }
        set
    }
}

impl fmt::Display for LanguageSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_all() {
            return write!(f, "all");
        }
        let joined = self.iter().collect::<Vec<_>>().join(",");
        write!(f, "{joined}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_region_locales() {
        assert_eq!(canonicalize("en_US"), "en_US");
        assert_eq!(canonicalize("EN_us"), "en_US");
        assert_eq!(canonicalize("fr-fr"), "fr_FR");
        assert_eq!(canonicalize("deDE"), "de_DE");
        assert_eq!(canonicalize(" ja_JP "), "ja_JP");
    }

    #[test]
    fn test_canonicalize_short_codes() {
        assert_eq!(canonicalize("FR"), "fr");
        assert_eq!(canonicalize("yue"), "Yue");
        assert_eq!(canonicalize("CMN"), "Cmn");
    }

    #[test]
    fn test_all_and_mul_are_interchangeable() {
        for token in ["all", "ALL", "All", "mul", "MUL"] {
            assert_eq!(canonicalize(token), ALL_LANGUAGES, "token {token}");
        }
    }

    #[test]
    fn test_canonicalize_is_idempotent() {
        for token in [
            "en_US", "EN-us", "fr", "FR", "cmn", "Yue", "all", "mul", "zh_Hant_TW", "", "x",
        ] {
            let once = canonicalize(token);
            assert_eq!(canonicalize(&once), once, "token {token:?}");
        }
    }

    #[test]
    fn test_unknown_shapes_are_preserved() {
        assert_eq!(canonicalize("zh_Hant_TW"), "zh_Hant_TW");
        assert_eq!(canonicalize("x"), "x");
    }

    #[test]
    fn test_matches_all_selection() {
        let all = LanguageSet::all();
        for candidate in ["en_US", "fr", "mul", "Cmn", "anything"] {
            assert!(matches(candidate, &all), "candidate {candidate}");
        }
    }

    #[test]
    fn test_matches_concrete_selection() {
        let selected = LanguageSet::from_request("fr_FR,de_de");
        assert!(matches("fr_FR", &selected));
        assert!(matches("DE-de", &selected));
        assert!(matches("mul", &selected));
        assert!(!matches("en_US", &selected));
    }

    #[test]
    fn test_mul_does_not_match_empty_selection() {
        assert!(!matches("mul", &LanguageSet::new()));
    }

    #[test]
    fn test_all_absorbs_other_tokens() {
        let set = LanguageSet::from_request("en_US,all,fr_FR");
        assert!(set.is_all());
        assert_eq!(set.len(), 1);
        assert_eq!(set.to_string(), "all");

        let mut set = LanguageSet::all();
        set.insert("de_DE");
        assert_eq!(set, LanguageSet::all());
    }

    #[test]
    fn test_primary_subtag_and_macrolanguages() {
        assert_eq!(primary_subtag("zh_CN"), "zh");
        assert_eq!(primary_subtag("FR"), "fr");
        assert!(macrolanguage_covers("zh", "cmn"));
        assert!(macrolanguage_covers("zh", "YUE"));
        assert!(!macrolanguage_covers("fr", "cmn"));
    }
}
