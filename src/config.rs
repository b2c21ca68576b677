use anyhow::{Context, Result};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    // Locales
    pub locales_dir: PathBuf,
    pub default_locale: String,

    // Views
    pub templates_dir: PathBuf,
    pub localized_views: bool,

    // Assets
    pub assets_dir: PathBuf,
    /// `None` disables fingerprint lookup entirely
    pub asset_manifest: Option<String>,
    pub asset_prefix: String,

    // Server
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            // Locales
            locales_dir: std::env::var("LOCALES_DIR")
                .unwrap_or_else(|_| "locales".to_string())
                .into(),
            default_locale: {
                let tag = std::env::var("DEFAULT_LOCALE").unwrap_or_else(|_| "en-US".to_string());
                crate::i18n::Locale::parse(&tag)
                    .with_context(|| format!("DEFAULT_LOCALE '{}' is not a valid locale tag", tag))?
                    .to_string()
            },

            // Views
            templates_dir: std::env::var("TEMPLATES_DIR")
                .unwrap_or_else(|_| "templates".to_string())
                .into(),
            localized_views: std::env::var("LOCALIZED_VIEWS")
                .ok()
                .and_then(|v| parse_bool(&v))
                .unwrap_or(false),

            // Assets (an empty ASSET_MANIFEST disables the manifest)
            assets_dir: std::env::var("ASSETS_DIR")
                .unwrap_or_else(|_| "public/assets".to_string())
                .into(),
            asset_manifest: match std::env::var("ASSET_MANIFEST") {
                Ok(value) if value.trim().is_empty() => None,
                Ok(value) => Some(value),
                Err(_) => Some(crate::render::DEFAULT_MANIFEST_FILE.to_string()),
            },
            asset_prefix: std::env::var("ASSET_PREFIX")
                .unwrap_or_else(|_| crate::render::DEFAULT_ASSET_PREFIX.to_string()),

            // Server
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 8] = [
        "LOCALES_DIR",
        "DEFAULT_LOCALE",
        "TEMPLATES_DIR",
        "LOCALIZED_VIEWS",
        "ASSETS_DIR",
        "ASSET_MANIFEST",
        "ASSET_PREFIX",
        "PORT",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    // ==================== Defaults Tests ====================

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        let config = Config::from_env().expect("Defaults should load");

        assert_eq!(config.locales_dir, PathBuf::from("locales"));
        assert_eq!(config.default_locale, "en-US");
        assert_eq!(config.templates_dir, PathBuf::from("templates"));
        assert!(!config.localized_views);
        assert_eq!(config.assets_dir, PathBuf::from("public/assets"));
        assert_eq!(config.asset_manifest.as_deref(), Some("manifest.json"));
        assert_eq!(config.asset_prefix, "/assets/");
        assert_eq!(config.port, 3000);
    }

    // ==================== Override Tests ====================

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        std::env::set_var("DEFAULT_LOCALE", "fr");
        std::env::set_var("LOCALIZED_VIEWS", "true");
        std::env::set_var("ASSET_PREFIX", "https://cdn.example.com/");
        std::env::set_var("PORT", "8080");

        let config = Config::from_env().expect("Overrides should load");
        clear_env();

        assert_eq!(config.default_locale, "fr");
        assert!(config.localized_views);
        assert_eq!(config.asset_prefix, "https://cdn.example.com/");
        assert_eq!(config.port, 8080);
    }

    #[test]
    #[serial]
    fn test_empty_manifest_disables_it() {
        clear_env();
        std::env::set_var("ASSET_MANIFEST", "");
        let config = Config::from_env().expect("Should load");
        clear_env();

        assert_eq!(config.asset_manifest, None);
    }

    // ==================== Invalid Value Tests ====================

    #[test]
    #[serial]
    fn test_invalid_values_fall_back_to_defaults() {
        clear_env();
        std::env::set_var("PORT", "eighty");
        std::env::set_var("LOCALIZED_VIEWS", "maybe");
        let config = Config::from_env().expect("Should load");
        clear_env();

        assert_eq!(config.port, 3000);
        assert!(!config.localized_views);
    }

    #[test]
    #[serial]
    fn test_invalid_default_locale_is_an_error() {
        clear_env();
        std::env::set_var("DEFAULT_LOCALE", "*");
        let err = Config::from_env().unwrap_err();
        clear_env();

        assert!(err.to_string().contains("DEFAULT_LOCALE"));
    }

    #[test]
    #[serial]
    fn test_default_locale_is_normalized() {
        clear_env();
        std::env::set_var("DEFAULT_LOCALE", "fr_fr");
        let config = Config::from_env().expect("Should load");
        clear_env();

        assert_eq!(config.default_locale, "fr-FR");
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" on "), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("2"), None);
    }
}
