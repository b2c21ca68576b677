//! Error types shared by the i18n and rendering layers.
//!
//! Startup failures (`Config`, `CatalogLoad`) are fatal; everything else is a
//! per-request failure surfaced to the caller as a failed render. A missing
//! translation key is deliberately not represented here.

use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Startup misconfiguration, e.g. a default locale with no locale file.
    #[error("configuration error: {0}")]
    Config(String),

    /// A locale file could not be read or parsed.
    #[error("failed to load locale file {file}: {message}")]
    CatalogLoad { file: String, message: String },

    /// The asset manifest exists but is not a flat JSON string map.
    /// Once raised it is returned by every later asset lookup.
    #[error("{file} is not correct: {message}")]
    ManifestCorrupt { file: String, message: String },

    #[error("could not find template {0}")]
    TemplateNotFound(String),

    /// Partials included each other deeper than the renderer allows.
    #[error("partial {name} exceeded the maximum inclusion depth of {depth}")]
    PartialDepthExceeded { name: String, depth: usize },

    /// The content store failed; `not_found` distinguishes a missing path.
    #[error("content store error for {path}: {message}")]
    Store {
        path: String,
        message: String,
        not_found: bool,
    },

    #[error("render error: {0}")]
    Render(String),
}

impl Error {
    /// Build the error a content store returns for a path it does not hold.
    pub fn not_found(path: impl Into<String>) -> Self {
        Error::Store {
            path: path.into(),
            message: "file not found".to_string(),
            not_found: true,
        }
    }

    /// Build a content store error for anything other than a missing path.
    pub fn store(path: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Store {
            path: path.into(),
            message: message.into(),
            not_found: false,
        }
    }

    /// Check whether this error reports a path missing from a content store.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::Store {
                not_found: true,
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_flagged() {
        let err = Error::not_found("index.html");
        assert!(err.is_not_found());
        assert!(err.to_string().contains("index.html"));
    }

    #[test]
    fn test_store_error_is_not_not_found() {
        let err = Error::store("index.html", "permission denied");
        assert!(!err.is_not_found());
        assert!(!Error::TemplateNotFound("x".to_string()).is_not_found());
    }

    #[test]
    fn test_manifest_corrupt_message_names_file() {
        let err = Error::ManifestCorrupt {
            file: "manifest.json".to_string(),
            message: "expected value at line 1 column 1".to_string(),
        };
        assert!(err.to_string().contains("manifest.json is not correct"));
    }

    #[test]
    fn test_catalog_load_message_names_file() {
        let err = Error::CatalogLoad {
            file: "fr.json".to_string(),
            message: "trailing comma".to_string(),
        };
        assert!(err.to_string().contains("fr.json"));
    }
}
