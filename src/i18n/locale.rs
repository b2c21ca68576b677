//! Locale type: a parsed, normalized language tag.
//!
//! Tags are normalized once when parsed (`fr_fr`, `FR-fr` and `fr-FR` are the
//! same locale), so every map keyed by `Locale` agrees on identity.

use crate::error::Error;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use unic_langid::LanguageIdentifier;

/// A language identifier with an optional script and region.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locale {
    id: LanguageIdentifier,
    /// Canonical `lang[-Script][-REGION]` form, cached for cheap borrowing
    tag: String,
}

impl Locale {
    /// Parse a language tag, accepting `-` or `_` as separator in any case.
    ///
    /// # Returns
    /// * `Some(Locale)` for a well-formed tag with a real language subtag
    /// * `None` for malformed tags, the `*` wildcard and `und`
    pub fn parse(tag: &str) -> Option<Locale> {
        let tag = tag.trim();
        if tag.is_empty() || tag == "*" {
            return None;
        }

        let id: LanguageIdentifier = tag.parse().ok()?;
        if id.language.as_str() == "und" {
            return None;
        }

        let tag = id.to_string();
        Some(Locale { id, tag })
    }

    /// The canonical tag (e.g. "en-US").
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The primary language subtag (e.g. "en" for "en-US").
    pub fn language(&self) -> &str {
        self.id.language.as_str()
    }

    /// The region subtag, if any (e.g. "US" for "en-US").
    pub fn region(&self) -> Option<&str> {
        self.id.region.as_ref().map(|r| r.as_str())
    }

    /// Check whether both locales share a primary language subtag.
    pub fn same_language(&self, other: &Locale) -> bool {
        self.language() == other.language()
    }

    /// The underlying identifier, for callers that speak `unic-langid`.
    pub fn identifier(&self) -> &LanguageIdentifier {
        &self.id
    }
}

impl FromStr for Locale {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Locale::parse(s).ok_or_else(|| Error::Config(format!("invalid locale tag '{}'", s)))
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag)
    }
}

impl PartialOrd for Locale {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Locale {
    fn cmp(&self, other: &Self) -> Ordering {
        self.tag.cmp(&other.tag)
    }
}
