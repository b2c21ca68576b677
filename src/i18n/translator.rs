//! Per-request translation facade.
//!
//! A `Translator` is bound to one negotiated locale. Lookups try that locale's
//! messages, then the catalog default's, then give up and return the key
//! itself, so a missing translation shows up as a visible label instead of a
//! failed response.

use crate::i18n::{Locale, LocaleCatalog, MessageEntry, MessageSet, PluralCategory, PluralRules};
use chrono::NaiveDate;
use regex::{Captures, Regex};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Variable name `translate_plural` fills with the count.
pub const COUNT_VAR: &str = "count";

static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();

/// Named values substituted into `{placeholder}` tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vars {
    values: BTreeMap<String, String>,
}

impl Vars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value, builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl ToString) {
        self.values.insert(name.into(), value.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Layer `other` over these values; its names win on conflict.
    pub fn merge(mut self, other: Vars) -> Self {
        self.values.extend(other.values);
        self
    }

    /// Flatten a JSON object into variables.
    ///
    /// Nested objects become dotted names (`user.name`); arrays and nulls are
    /// skipped.
    pub fn from_json(data: &Map<String, Value>) -> Self {
        let mut vars = Vars::new();
        flatten_into(&mut vars, "", data);
        vars
    }
}

fn flatten_into(vars: &mut Vars, prefix: &str, data: &Map<String, Value>) {
    for (key, value) in data {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            Value::String(s) => vars.insert(name, s),
            Value::Number(n) => vars.insert(name, n),
            Value::Bool(b) => vars.insert(name, b),
            Value::Object(inner) => flatten_into(vars, &name, inner),
            Value::Array(_) | Value::Null => {}
        }
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for Vars {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut vars = Vars::new();
        for (name, value) in iter {
            vars.insert(name, value);
        }
        vars
    }
}

/// Substitute `{name}` tokens from `vars`; unknown tokens stay verbatim.
pub fn interpolate(template: &str, vars: &Vars) -> String {
    let regex = PLACEHOLDER_REGEX
        .get_or_init(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_.\-]*)\}").unwrap());

    regex
        .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
            Some(value) => value.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Translation helpers bound to one negotiated locale.
#[derive(Debug, Clone)]
pub struct Translator {
    locale: Locale,
    catalog: Arc<LocaleCatalog>,
    plural_rules: Arc<PluralRules>,
}

impl Translator {
    pub fn new(locale: Locale, catalog: Arc<LocaleCatalog>, plural_rules: Arc<PluralRules>) -> Self {
        Self {
            locale,
            catalog,
            plural_rules,
        }
    }

    /// The locale negotiated for this request.
    pub fn current_locale(&self) -> &Locale {
        &self.locale
    }

    /// Check whether `key` is translated in this locale or the default.
    pub fn has(&self, key: &str) -> bool {
        self.candidates().any(|set| set.contains(key))
    }

    /// Translate `key`, interpolating `vars`.
    ///
    /// Plural entries render their `other` form. Never fails: an unknown key
    /// comes back unchanged.
    pub fn translate(&self, key: &str, vars: &Vars) -> String {
        match self.find(key, PluralCategory::Other) {
            Some(text) => interpolate(text, vars),
            None => self.missing(key),
        }
    }

    /// Translate a count-dependent message.
    ///
    /// The plural category comes from the bound locale's rule and is looked
    /// up in the default locale's entry too on a miss. `count` is exposed to
    /// the text as `{count}`.
    pub fn translate_plural(&self, key: &str, count: u64, vars: &Vars) -> String {
        let category = self.plural_rules.category(&self.locale, count);
        match self.find(key, category) {
            Some(text) => {
                let vars = vars.clone().with(COUNT_VAR, count);
                interpolate(text, &vars)
            }
            None => self.missing(key),
        }
    }

    /// Format a number with this locale's grouping and decimal separators.
    pub fn format_number(&self, value: f64, decimals: usize) -> String {
        if !value.is_finite() {
            return value.to_string();
        }

        let (group, decimal) = separators(&self.locale);
        let formatted = format!("{:.*}", decimals, value.abs());
        let (int_part, frac_part) = match formatted.split_once('.') {
            Some((int_part, frac_part)) => (int_part, Some(frac_part)),
            None => (formatted.as_str(), None),
        };

        let mut out = String::new();
        if value.is_sign_negative() && formatted.chars().any(|c| c != '0' && c != '.') {
            out.push('-');
        }
        for (i, digit) in int_part.chars().enumerate() {
            if i > 0 && (int_part.len() - i) % 3 == 0 {
                out.push_str(group);
            }
            out.push(digit);
        }
        if let Some(frac_part) = frac_part {
            out.push(decimal);
            out.push_str(frac_part);
        }
        out
    }

    /// Format a date in this locale's usual numeric order.
    pub fn format_date(&self, date: NaiveDate) -> String {
        let pattern = match (self.locale.language(), self.locale.region()) {
            ("en", None) | ("en", Some("US")) => "%m/%d/%Y",
            ("en", _) | ("fr", _) | ("es", _) | ("it", _) | ("pt", _) => "%d/%m/%Y",
            ("de", _) | ("ru", _) | ("pl", _) | ("cs", _) => "%d.%m.%Y",
            ("ja", _) | ("zh", _) | ("ko", _) => "%Y/%m/%d",
            _ => "%Y-%m-%d",
        };
        date.format(pattern).to_string()
    }

    /// The bound locale's messages (if loaded), then the default's.
    fn candidates(&self) -> impl Iterator<Item = &MessageSet> {
        let own = self.catalog.lookup(&self.locale);
        let fallback = (self.catalog.default_locale() != &self.locale)
            .then(|| self.catalog.default_set());
        own.into_iter().chain(fallback)
    }

    fn find(&self, key: &str, category: PluralCategory) -> Option<&str> {
        self.candidates().find_map(|set| {
            set.get(key)
                .and_then(|entry: &MessageEntry| entry.for_category(category))
        })
    }

    fn missing(&self, key: &str) -> String {
        debug!("Missing translation for '{}' in {}", key, self.locale);
        key.to_string()
    }
}

fn separators(locale: &Locale) -> (&'static str, char) {
    match locale.language() {
        "fr" => ("\u{202F}", ','),
        "de" | "es" | "it" | "pt" | "nl" | "id" | "tr" | "da" => (".", ','),
        "ru" | "uk" | "pl" | "cs" | "sk" | "sv" | "fi" | "nb" => ("\u{00A0}", ','),
        _ => (",", '.'),
    }
}
