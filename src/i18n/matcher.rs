//! Locale negotiation from an `Accept-Language` style preference header.
//!
//! Matching runs in two explicit passes over the preferences, highest quality
//! first: an exact tag match anywhere in the list beats any language-only
//! match, and only when neither pass finds anything does the catalog's
//! default locale win.

use crate::i18n::{Locale, LocaleCatalog};
use tracing::debug;

/// One parsed `tag;q=value` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Preference {
    pub locale: Locale,
    /// Quality in `(0, 1]`; zero-quality entries never make it into a list
    pub quality: f32,
}

/// Client preferences ordered by descending quality, ties in header order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreferenceList {
    preferences: Vec<Preference>,
}

impl PreferenceList {
    /// Parse a raw preference header.
    ///
    /// Malformed entries (bad tags, wildcards, unparsable or out-of-range
    /// quality values) are skipped, as are entries with `q=0`. A completely
    /// malformed header yields an empty list rather than an error.
    pub fn parse(header: &str) -> Self {
        let mut preferences: Vec<Preference> = header
            .split(',')
            .filter_map(|entry| {
                let parsed = parse_entry(entry);
                if parsed.is_none() && !entry.trim().is_empty() {
                    debug!("Skipping preference entry {:?}", entry.trim());
                }
                parsed
            })
            .filter(|pref| pref.quality > 0.0)
            .collect();

        // Stable sort keeps header order among equal qualities
        preferences.sort_by(|a, b| b.quality.total_cmp(&a.quality));

        Self { preferences }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Preference> {
        self.preferences.iter()
    }

    pub fn len(&self) -> usize {
        self.preferences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.preferences.is_empty()
    }
}

fn parse_entry(entry: &str) -> Option<Preference> {
    let mut parts = entry.split(';');
    let locale = Locale::parse(parts.next()?)?;

    let mut quality = 1.0;
    for param in parts {
        let (key, value) = param.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("q") {
            quality = value.trim().parse::<f32>().ok()?;
            if !(0.0..=1.0).contains(&quality) {
                return None;
            }
        }
    }

    Some(Preference { locale, quality })
}

/// Picks the best available locale for a preference list.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocaleMatcher;

impl LocaleMatcher {
    /// Negotiate a locale.
    ///
    /// 1. First preference whose exact tag is in the catalog.
    /// 2. First preference sharing a primary language with a catalog locale.
    ///    A bare-language catalog entry ("fr") is preferred over regional
    ///    ones; among regional ones the lowest tag wins.
    /// 3. The catalog's default locale.
    pub fn negotiate(preferences: &PreferenceList, catalog: &LocaleCatalog) -> Locale {
        if let Some(exact) = preferences
            .iter()
            .find(|pref| catalog.contains(&pref.locale))
        {
            return exact.locale.clone();
        }

        let available = catalog.locales();
        for pref in preferences.iter() {
            let mut same_language = available
                .iter()
                .filter(|candidate| candidate.same_language(&pref.locale));

            let bare = same_language
                .clone()
                .find(|candidate| candidate.region().is_none());
            if let Some(found) = bare.or_else(|| same_language.next()) {
                debug!(
                    "No exact locale for {}, matched {} by language",
                    pref.locale, found
                );
                return (*found).clone();
            }
        }

        catalog.default_locale().clone()
    }

    /// Parse a raw header and negotiate in one step.
    pub fn negotiate_header(header: &str, catalog: &LocaleCatalog) -> Locale {
        Self::negotiate(&PreferenceList::parse(header), catalog)
    }
}
