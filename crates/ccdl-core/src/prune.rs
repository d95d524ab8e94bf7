//! Manifest pruning.
//!
//! After filtering, the secondary structures of a manifest are rebuilt so
//! they agree with the retained packages: modules without any retained
//! package disappear, and every locale-keyed list is narrowed to the
//! selected languages. Dependencies are left alone; they name other
//! products and are planned on their own.

use crate::filter::FilterOutcome;
use ccdl_schema::locale::{self, ALL_LANGUAGES};
use ccdl_schema::manifest::{LOCALE_LIST_KEY, LocaleEntry, PackageList};
use ccdl_schema::{LanguageSet, Manifest};
use serde_json::{Map, Value};

/// Produce the manifest subset matching a filter outcome.
pub fn prune(manifest: &Manifest, outcome: &FilterOutcome, languages: &LanguageSet) -> Manifest {
    let mut pruned = manifest.clone();
    pruned.packages = PackageList {
        packages: outcome.retained.clone(),
        extra: manifest.packages.extra.clone(),
    };

    let retained = outcome.retained_names();
    if let Some(modules) = pruned.modules.as_mut() {
        modules.modules.retain(|module| {
            module
                .reference_packages
                .names
                .iter()
                .any(|name| retained.contains(name.as_str()))
        });
    }

    if languages.is_all() {
        return pruned;
    }

    if let Some(supported) = pruned.supported_languages.as_mut() {
        let entries = std::mem::take(&mut supported.entries);
        supported.entries = narrow(entries, |e: &LocaleEntry| Some(e.locale.as_str()), languages);
    }

    narrow_map(&mut pruned.extra, languages);
    narrow_map(&mut pruned.packages.extra, languages);
    for package in &mut pruned.packages.packages {
        narrow_map(&mut package.extra, languages);
    }
    if let Some(modules) = pruned.modules.as_mut() {
        for module in &mut modules.modules {
            narrow_map(&mut module.extra, languages);
        }
    }

    pruned
}

/// Narrow a locale-keyed list.
///
/// Keeps the entries whose locale is selected. When none is, keeps the
/// `mul` entry, and when that is missing too, the first entry, so a
/// non-empty list never becomes empty.
fn narrow<T, F>(entries: Vec<T>, locale_of: F, languages: &LanguageSet) -> Vec<T>
where
    F: Fn(&T) -> Option<&str>,
{
    if entries.is_empty() || languages.is_all() {
        return entries;
    }

    let selected = entries
        .iter()
        .map(|e| locale_of(e).is_some_and(|l| languages.contains(l)))
        .collect::<Vec<_>>();
    if selected.iter().any(|s| *s) {
        return entries
            .into_iter()
            .zip(selected)
            .filter_map(|(entry, keep)| keep.then_some(entry))
            .collect();
    }

    let fallback = entries
        .iter()
        .position(|e| locale_of(e).is_some_and(|l| locale::canonicalize(l) == ALL_LANGUAGES))
        .unwrap_or(0);
    entries.into_iter().skip(fallback).take(1).collect()
}

fn entry_locale(value: &Value) -> Option<&str> {
    value.get("locale").and_then(Value::as_str)
}

fn narrow_map(map: &mut Map<String, Value>, languages: &LanguageSet) {
    for (key, value) in map.iter_mut() {
        if key == LOCALE_LIST_KEY {
            if let Value::Array(items) = value {
                if items.iter().all(|item| entry_locale(item).is_some()) {
                    let entries = std::mem::take(items);
                    *items = narrow(entries, entry_locale, languages);
                    continue;
                }
            }
        }
        narrow_value(value, languages);
    }
}

fn narrow_value(value: &mut Value, languages: &LanguageSet) {
    match value {
        Value::Object(map) => narrow_map(map, languages),
        Value::Array(items) => {
            for item in items {
                narrow_value(item, languages);
            }
        }
        _ => {}
    }
}
