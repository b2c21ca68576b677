//! Internationalization (i18n): locale negotiation and translation.
//!
//! # Architecture
//!
//! - `locale`: Normalized `Locale` value type, the key of every per-locale map
//! - `catalog`: Message sets loaded from locale files, plus the default locale
//! - `matcher`: `Accept-Language` parsing and two-pass locale negotiation
//! - `plural`: Plural categories and per-locale plural rules
//! - `translator`: Per-request lookup, interpolation, pluralization and formatting
//! - `middleware`: Axum middleware publishing a `Translator` per request
//!
//! # Example
//!
//! ```rust,ignore
//! use polyglot_views::i18n::{I18n, Vars};
//! use polyglot_views::store::DirStore;
//!
//! let i18n = I18n::load(&DirStore::new("locales"), "en-US")?;
//! let translator = i18n.translator_for(Some("fr-CA,fr;q=0.8"));
//! let text = translator.translate_plural("people", 5, &Vars::new());
//! ```

mod catalog;
mod locale;
mod matcher;
mod middleware;
mod plural;
mod translator;

pub use catalog::{LocaleCatalog, MessageEntry, MessageSet};
pub use locale::Locale;
pub use matcher::{LocaleMatcher, Preference, PreferenceList};
pub use middleware::{localized_name, negotiate, I18n};
pub use plural::{PluralCategory, PluralRule, PluralRules};
pub use translator::{interpolate, Translator, Vars, COUNT_VAR};

/// Built-in plural rule functions, for registering on [`PluralRules`].
pub mod plural_rules {
    pub use super::plural::{
        arabic, east_slavic, no_plural, one_other, polish, west_slavic, zero_or_one,
    };
}
