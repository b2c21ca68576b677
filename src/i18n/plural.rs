//! Plural category selection.
//!
//! A plural rule is a plain function from a count to a CLDR category. Rules
//! are picked per locale: an exact-tag override wins, then a per-language
//! rule, then the English-like one/other rule.

use crate::i18n::Locale;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

/// A grammatical plural bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluralCategory {
    Zero,
    One,
    Two,
    Few,
    Many,
    Other,
}

impl PluralCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PluralCategory::Zero => "zero",
            PluralCategory::One => "one",
            PluralCategory::Two => "two",
            PluralCategory::Few => "few",
            PluralCategory::Many => "many",
            PluralCategory::Other => "other",
        }
    }
}

impl fmt::Display for PluralCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a count to its plural category.
pub type PluralRule = fn(u64) -> PluralCategory;

/// English and most Germanic/Romance languages: 1 is singular.
pub fn one_other(n: u64) -> PluralCategory {
    if n == 1 {
        PluralCategory::One
    } else {
        PluralCategory::Other
    }
}

/// French and Brazilian Portuguese: 0 and 1 are singular.
pub fn zero_or_one(n: u64) -> PluralCategory {
    if n <= 1 {
        PluralCategory::One
    } else {
        PluralCategory::Other
    }
}

/// Languages without grammatical number.
pub fn no_plural(_n: u64) -> PluralCategory {
    PluralCategory::Other
}

/// Russian, Ukrainian, Belarusian and the Serbo-Croatian family.
pub fn east_slavic(n: u64) -> PluralCategory {
    let (n10, n100) = (n % 10, n % 100);
    if n10 == 1 && n100 != 11 {
        PluralCategory::One
    } else if (2..=4).contains(&n10) && !(12..=14).contains(&n100) {
        PluralCategory::Few
    } else {
        PluralCategory::Many
    }
}

pub fn polish(n: u64) -> PluralCategory {
    let (n10, n100) = (n % 10, n % 100);
    if n == 1 {
        PluralCategory::One
    } else if (2..=4).contains(&n10) && !(12..=14).contains(&n100) {
        PluralCategory::Few
    } else {
        PluralCategory::Many
    }
}

/// Czech and Slovak.
pub fn west_slavic(n: u64) -> PluralCategory {
    match n {
        1 => PluralCategory::One,
        2..=4 => PluralCategory::Few,
        _ => PluralCategory::Other,
    }
}

pub fn arabic(n: u64) -> PluralCategory {
    let n100 = n % 100;
    match n {
        0 => PluralCategory::Zero,
        1 => PluralCategory::One,
        2 => PluralCategory::Two,
        _ if (3..=10).contains(&n100) => PluralCategory::Few,
        _ if (11..=99).contains(&n100) => PluralCategory::Many,
        _ => PluralCategory::Other,
    }
}

/// Registry of plural rules keyed by exact tag or primary language.
#[derive(Debug, Clone)]
pub struct PluralRules {
    by_tag: HashMap<String, PluralRule>,
    by_language: HashMap<String, PluralRule>,
    fallback: PluralRule,
}

impl PluralRules {
    /// An empty registry where every locale uses `fallback`.
    pub fn with_fallback(fallback: PluralRule) -> Self {
        Self {
            by_tag: HashMap::new(),
            by_language: HashMap::new(),
            fallback,
        }
    }

    /// Register a rule for every locale of a primary language (e.g. "fr").
    pub fn with_language(mut self, language: &str, rule: PluralRule) -> Self {
        self.by_language.insert(language.to_ascii_lowercase(), rule);
        self
    }

    /// Register a rule for one exact tag (e.g. "pt-BR"); beats language rules.
    pub fn with_tag(mut self, locale: &Locale, rule: PluralRule) -> Self {
        self.by_tag.insert(locale.tag().to_string(), rule);
        self
    }

    /// Pick the rule for a locale.
    pub fn rule_for(&self, locale: &Locale) -> PluralRule {
        self.by_tag
            .get(locale.tag())
            .or_else(|| self.by_language.get(locale.language()))
            .copied()
            .unwrap_or(self.fallback)
    }

    /// Select the plural category of `count` for `locale`.
    pub fn category(&self, locale: &Locale, count: u64) -> PluralCategory {
        (self.rule_for(locale))(count)
    }
}

impl Default for PluralRules {
    fn default() -> Self {
        let mut rules = Self::with_fallback(one_other)
            .with_language("fr", zero_or_one)
            .with_language("pl", polish)
            .with_language("cs", west_slavic)
            .with_language("sk", west_slavic)
            .with_language("ar", arabic);

        for lang in ["ja", "zh", "ko", "vi", "th", "id", "ms", "tr"] {
            rules = rules.with_language(lang, no_plural);
        }
        for lang in ["ru", "uk", "be", "sr", "hr", "bs"] {
            rules = rules.with_language(lang, east_slavic);
        }

        // Brazilian Portuguese counts zero as singular, European Portuguese does not
        rules.by_tag.insert("pt-BR".to_string(), zero_or_one);
        rules
    }
}
