//! Template lookup: suffix overrides, localized candidates and partials.

use crate::error::{Error, Result};
use crate::store::ContentStore;
use std::sync::Arc;
use tracing::debug;

/// A resolved template: the stored name that matched and its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub name: String,
    pub content: String,
}

/// Resolves template names against a content store.
#[derive(Clone)]
pub struct TemplateResolver {
    store: Arc<dyn ContentStore>,
    partial_extension: String,
}

impl TemplateResolver {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self {
            store,
            partial_extension: "html".to_string(),
        }
    }

    /// Extension assumed for partial references written without one.
    pub fn with_partial_extension(mut self, extension: impl Into<String>) -> Self {
        self.partial_extension = extension.into().trim_start_matches('.').to_string();
        self
    }

    /// Resolve `name`, preferring suffixed variants.
    ///
    /// Each suffix is tried in order (`page.html` + `alt` is `page_alt.html`),
    /// then the bare name.
    ///
    /// # Errors
    /// `Error::TemplateNotFound` naming `name` when no candidate exists.
    pub fn resolve(&self, name: &str, suffixes: &[String]) -> Result<Template> {
        self.resolve_any(&[name.to_string()], suffixes)
    }

    /// Resolve the first of several names (e.g. a localized variant, then the
    /// plain name), applying suffixes to each before moving on.
    pub fn resolve_any(&self, names: &[String], suffixes: &[String]) -> Result<Template> {
        for name in names {
            let candidates = suffixes
                .iter()
                .map(|suffix| with_suffix(name, suffix))
                .chain(std::iter::once(name.clone()));
            for candidate in candidates {
                if let Some(template) = self.read(&candidate)? {
                    return Ok(template);
                }
            }
            debug!("Template {} not found, trying next candidate", name);
        }

        let requested = names.last().cloned().unwrap_or_default();
        Err(Error::TemplateNotFound(requested))
    }

    /// Resolve a partial reference to its underscore-prefixed file.
    ///
    /// `foo`, `foo.html` and `_foo.html` all resolve to `_foo.html`;
    /// `shared/foo` resolves to `shared/_foo.html`.
    ///
    /// # Errors
    /// `Error::TemplateNotFound` naming the partial reference.
    pub fn resolve_partial(&self, reference: &str) -> Result<Template> {
        let reference = reference.trim().trim_start_matches('/');
        let (dir, file) = match reference.rsplit_once('/') {
            Some((dir, file)) => (format!("{}/", dir), file),
            None => (String::new(), reference),
        };
        let file = if file.starts_with('_') {
            file.to_string()
        } else {
            format!("_{}", file)
        };

        let mut candidates = Vec::with_capacity(2);
        if has_extension(&file) {
            candidates.push(format!("{}{}", dir, file));
        } else {
            candidates.push(format!("{}{}.{}", dir, file, self.partial_extension));
            candidates.push(format!("{}{}", dir, file));
        }

        for candidate in &candidates {
            if let Some(template) = self.read(candidate)? {
                return Ok(template);
            }
        }
        Err(Error::TemplateNotFound(format!("partial {}", reference)))
    }

    /// Read one stored name; `Ok(None)` when it is absent.
    fn read(&self, name: &str) -> Result<Option<Template>> {
        match self.store.read_file(name) {
            Ok(bytes) => {
                let content = String::from_utf8(bytes).map_err(|_| {
                    Error::Render(format!("template {} is not valid UTF-8", name))
                })?;
                Ok(Some(Template {
                    name: name.to_string(),
                    content,
                }))
            }
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl std::fmt::Debug for TemplateResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateResolver")
            .field("partial_extension", &self.partial_extension)
            .finish()
    }
}

/// Insert `_suffix` before the extension of the last path segment.
pub fn with_suffix(name: &str, suffix: &str) -> String {
    let (dir, file) = match name.rsplit_once('/') {
        Some((dir, file)) => (Some(dir), file),
        None => (None, name),
    };
    let file = match file.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}_{}.{}", stem, suffix, ext),
        _ => format!("{}_{}", file, suffix),
    };
    match dir {
        Some(dir) => format!("{}/{}", dir, file),
        None => file,
    }
}

fn has_extension(file: &str) -> bool {
    matches!(file.rsplit_once('.'), Some((stem, ext)) if !stem.is_empty() && !ext.is_empty())
}
