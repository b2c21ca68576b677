//! Locale catalog: every translation message set, keyed by parsed locale.
//!
//! The catalog is built once at startup from a content store of JSON locale
//! files and is read-only afterwards, so it can be shared freely between
//! requests.
//!
//! # File format
//!
//! The locale tag is the last dot-separated segment of the file stem, so
//! `fr.json` and `all.fr.json` both feed `fr`. Two shapes are accepted:
//!
//! ```json
//! { "greeting": "Hello, {name}!", "people": { "one": "one person", "other": "{count} people" } }
//! ```
//!
//! ```json
//! [ { "id": "greeting", "translation": "Hello, {name}!" } ]
//! ```

use crate::error::{Error, Result};
use crate::i18n::{Locale, PluralCategory};
use crate::store::ContentStore;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

/// A single translation: plain text, or one text per plural category.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum MessageEntry {
    Text(String),
    Plural(BTreeMap<PluralCategory, String>),
}

impl MessageEntry {
    /// Pick the text for a plural category.
    ///
    /// Plain entries ignore the category. Plural entries missing the requested
    /// category fall back to `other`.
    pub fn for_category(&self, category: PluralCategory) -> Option<&str> {
        match self {
            MessageEntry::Text(text) => Some(text),
            MessageEntry::Plural(forms) => forms
                .get(&category)
                .or_else(|| forms.get(&PluralCategory::Other))
                .map(String::as_str),
        }
    }
}

/// All translations for one locale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageSet {
    messages: HashMap<String, MessageEntry>,
}

impl MessageSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry, builder style.
    pub fn with(mut self, key: impl Into<String>, entry: MessageEntry) -> Self {
        self.insert(key, entry);
        self
    }

    /// Insert an entry, returning the one it replaced.
    pub fn insert(&mut self, key: impl Into<String>, entry: MessageEntry) -> Option<MessageEntry> {
        self.messages.insert(key.into(), entry)
    }

    pub fn get(&self, key: &str) -> Option<&MessageEntry> {
        self.messages.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.messages.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Parse one locale file body.
    pub fn from_json(bytes: &[u8]) -> std::result::Result<MessageSet, serde_json::Error> {
        let file: LocaleFile = serde_json::from_slice(bytes)?;
        let messages = match file {
            LocaleFile::Map(messages) => messages,
            LocaleFile::List(list) => list
                .into_iter()
                .map(|message| (message.id, message.translation))
                .collect(),
        };
        Ok(MessageSet { messages })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LocaleFile {
    Map(HashMap<String, MessageEntry>),
    List(Vec<ListedMessage>),
}

#[derive(Deserialize)]
struct ListedMessage {
    id: String,
    translation: MessageEntry,
}

/// Message sets for every available locale plus the designated default.
#[derive(Debug, Clone)]
pub struct LocaleCatalog {
    sets: HashMap<Locale, MessageSet>,
    default_locale: Locale,
}

impl LocaleCatalog {
    /// Build a catalog from already-parsed message sets.
    ///
    /// # Errors
    /// `Error::Config` if `default_locale` has no message set.
    pub fn new(sets: HashMap<Locale, MessageSet>, default_locale: Locale) -> Result<Self> {
        if !sets.contains_key(&default_locale) {
            return Err(Error::Config(format!(
                "default locale '{}' has no locale file (available: {})",
                default_locale,
                join_tags(sets.keys())
            )));
        }
        Ok(Self {
            sets,
            default_locale,
        })
    }

    /// Load every `.json` locale file from a content store.
    ///
    /// # Arguments
    /// * `store` - Store holding the locale files
    /// * `default_locale` - Tag of the last-resort locale; must be among the loaded files
    ///
    /// # Errors
    /// * `Error::CatalogLoad` naming the file when the store is unreadable,
    ///   a file name is not a locale tag, or a file is not valid JSON
    /// * `Error::Config` when the default tag is invalid or was not loaded
    pub fn load(store: &dyn ContentStore, default_locale: &str) -> Result<Self> {
        let default_locale: Locale = default_locale.parse()?;

        let files = store.list_files().map_err(|e| Error::CatalogLoad {
            file: "<locale source>".to_string(),
            message: e.to_string(),
        })?;

        let mut sets: HashMap<Locale, MessageSet> = HashMap::new();
        for file in &files {
            let Some(tag) = locale_tag_for(file) else {
                debug!("Skipping non-locale file {}", file);
                continue;
            };

            let locale = Locale::parse(tag).ok_or_else(|| Error::CatalogLoad {
                file: file.clone(),
                message: format!("'{}' is not a locale tag", tag),
            })?;

            let bytes = store.read_file(file).map_err(|e| Error::CatalogLoad {
                file: file.clone(),
                message: e.to_string(),
            })?;
            let parsed = MessageSet::from_json(&bytes).map_err(|e| Error::CatalogLoad {
                file: file.clone(),
                message: e.to_string(),
            })?;

            let set = sets.entry(locale.clone()).or_default();
            for (key, entry) in parsed.messages {
                if set.insert(key.clone(), entry).is_some() {
                    warn!("Locale {}: key '{}' redefined by {}", locale, key, file);
                }
            }
        }

        let catalog = Self::new(sets, default_locale)?;
        info!(
            "Loaded {} locales ({}), default {}",
            catalog.sets.len(),
            join_tags(catalog.sets.keys()),
            catalog.default_locale
        );
        Ok(catalog)
    }

    /// Exact-tag lookup. No fallback happens here.
    pub fn lookup(&self, locale: &Locale) -> Option<&MessageSet> {
        self.sets.get(locale)
    }

    pub fn default_locale(&self) -> &Locale {
        &self.default_locale
    }

    pub fn default_set(&self) -> &MessageSet {
        // Presence is checked in `new`, the only constructor.
        &self.sets[&self.default_locale]
    }

    /// Every available locale, sorted by tag.
    pub fn locales(&self) -> Vec<&Locale> {
        let mut locales: Vec<_> = self.sets.keys().collect();
        locales.sort();
        locales
    }

    pub fn contains(&self, locale: &Locale) -> bool {
        self.sets.contains_key(locale)
    }
}

/// Extract the locale tag from a locale file path, or `None` for non-JSON files.
fn locale_tag_for(path: &str) -> Option<&str> {
    let file_name = path.rsplit('/').next()?;
    let stem = file_name.strip_suffix(".json")?;
    stem.rsplit('.').next().filter(|tag| !tag.is_empty())
}

fn join_tags<'a>(locales: impl Iterator<Item = &'a Locale>) -> String {
    let mut tags: Vec<_> = locales.map(Locale::tag).collect();
    tags.sort_unstable();
    tags.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn locale(tag: &str) -> Locale {
        Locale::parse(tag).unwrap()
    }

    fn sample_store() -> MemoryStore {
        MemoryStore::new()
            .with_file(
                "en-US.json",
                r#"{"greeting": "Hello, World!", "people": {"one": "Hello, alone!", "other": "Hello, {count} people!"}}"#,
            )
            .with_file(
                "fr.json",
                r#"[{"id": "greeting", "translation": "Bonjour à tous !"}]"#,
            )
            .with_file("README.md", "not a locale")
    }

    // ==================== File Name Tests ====================

    #[test]
    fn test_locale_tag_for_plain_file() {
        assert_eq!(locale_tag_for("fr.json"), Some("fr"));
        assert_eq!(locale_tag_for("nested/en-US.json"), Some("en-US"));
    }

    #[test]
    fn test_locale_tag_for_prefixed_file() {
        assert_eq!(locale_tag_for("all.en-US.json"), Some("en-US"));
    }

    #[test]
    fn test_locale_tag_for_non_json() {
        assert_eq!(locale_tag_for("fr.yaml"), None);
        assert_eq!(locale_tag_for(".json"), None);
    }

    // ==================== Parsing Tests ====================

    #[test]
    fn test_from_json_map_shape() {
        let set = MessageSet::from_json(br#"{"a": "A", "b": {"one": "1", "other": "n"}}"#)
            .expect("Should parse");
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("a"), Some(&MessageEntry::Text("A".to_string())));
        assert!(matches!(set.get("b"), Some(MessageEntry::Plural(_))));
    }

    #[test]
    fn test_from_json_list_shape() {
        let set = MessageSet::from_json(
            br#"[{"id": "a", "translation": "A"}, {"id": "b", "translation": {"other": "n"}}]"#,
        )
        .expect("Should parse");
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_from_json_rejects_unknown_category() {
        assert!(MessageSet::from_json(br#"{"a": {"plenty": "x"}}"#).is_err());
    }

    #[test]
    fn test_entry_for_category_falls_back_to_other() {
        let entry: MessageEntry = serde_json::from_str(r#"{"one": "1", "other": "n"}"#).unwrap();
        assert_eq!(entry.for_category(PluralCategory::One), Some("1"));
        assert_eq!(entry.for_category(PluralCategory::Few), Some("n"));

        let text = MessageEntry::Text("t".to_string());
        assert_eq!(text.for_category(PluralCategory::Few), Some("t"));
    }

    // ==================== Load Tests ====================

    #[test]
    fn test_load_indexes_locales() {
        let catalog = LocaleCatalog::load(&sample_store(), "en-US").expect("Should load");

        assert_eq!(catalog.default_locale(), &locale("en-US"));
        let tags: Vec<_> = catalog.locales().iter().map(|l| l.tag()).collect();
        assert_eq!(tags, vec!["en-US", "fr"]);
        assert!(catalog.lookup(&locale("fr")).unwrap().contains("greeting"));
        assert!(catalog.default_set().contains("people"));
    }

    #[test]
    fn test_load_normalizes_tags() {
        let store = MemoryStore::new().with_file("en_us.json", r#"{"a": "A"}"#);
        let catalog = LocaleCatalog::load(&store, "EN-us").expect("Should load");
        assert!(catalog.contains(&locale("en-US")));
    }

    #[test]
    fn test_load_merges_files_of_one_locale() {
        let store = MemoryStore::new()
            .with_file("a.fr.json", r#"{"a": "A", "shared": "first"}"#)
            .with_file("b.fr.json", r#"{"b": "B", "shared": "second"}"#);
        let catalog = LocaleCatalog::load(&store, "fr").expect("Should load");

        let set = catalog.default_set();
        assert_eq!(set.len(), 3);
        assert_eq!(
            set.get("shared"),
            Some(&MessageEntry::Text("second".to_string()))
        );
    }

    #[test]
    fn test_lookup_is_exact_only() {
        let catalog = LocaleCatalog::load(&sample_store(), "en-US").unwrap();
        assert!(catalog.lookup(&locale("fr-FR")).is_none());
        assert!(catalog.lookup(&locale("en")).is_none());
    }

    #[test]
    fn test_load_missing_default_is_config_error() {
        let result = LocaleCatalog::load(&sample_store(), "de");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_load_invalid_default_tag_is_config_error() {
        let result = LocaleCatalog::load(&sample_store(), "not a tag");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_load_empty_source_is_config_error() {
        let result = LocaleCatalog::load(&MemoryStore::new(), "en-US");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_load_bad_syntax_reports_file() {
        let store = sample_store().with_file("de.json", "{ not json");
        let err = LocaleCatalog::load(&store, "en-US").unwrap_err();

        match err {
            Error::CatalogLoad { file, .. } => assert_eq!(file, "de.json"),
            other => panic!("Expected CatalogLoad, got {:?}", other),
        }
    }

    #[test]
    fn test_load_bad_file_name_reports_file() {
        let store = sample_store().with_file("not_a_locale!.json", "{}");
        let err = LocaleCatalog::load(&store, "en-US").unwrap_err();
        assert!(matches!(err, Error::CatalogLoad { ref file, .. } if file == "not_a_locale!.json"));
    }

    #[test]
    fn test_new_requires_default() {
        let mut sets = HashMap::new();
        sets.insert(locale("fr"), MessageSet::new());
        assert!(LocaleCatalog::new(sets.clone(), locale("en")).is_err());
        assert!(LocaleCatalog::new(sets, locale("fr")).is_ok());
    }
}
