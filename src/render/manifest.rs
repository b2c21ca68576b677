//! Asset fingerprint manifest.
//!
//! The manifest is a flat JSON object mapping logical asset paths to their
//! fingerprinted names. It is read lazily on the first lookup and the outcome
//! of that single read, good or bad, is what every later lookup sees until
//! [`AssetManifest::invalidate`] is called.

use crate::error::{Error, Result};
use crate::store::ContentStore;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};
use tracing::{info, warn};

pub const DEFAULT_MANIFEST_FILE: &str = "manifest.json";
pub const DEFAULT_ASSET_PREFIX: &str = "/assets/";

/// `None` means no manifest file: every path maps to itself.
type Loaded = Result<Option<Arc<HashMap<String, String>>>>;

pub struct AssetManifest {
    store: Option<Arc<dyn ContentStore>>,
    file: String,
    prefix: String,
    /// Swapped wholesale on invalidation so in-flight readers keep their cell
    cell: RwLock<Arc<OnceLock<Loaded>>>,
}

impl AssetManifest {
    /// A manifest read from `file` inside `store`.
    pub fn new(store: Arc<dyn ContentStore>, file: impl Into<String>) -> Self {
        Self {
            store: Some(store),
            file: file.into(),
            prefix: DEFAULT_ASSET_PREFIX.to_string(),
            cell: RwLock::new(Arc::new(OnceLock::new())),
        }
    }

    /// No manifest configured: every asset resolves to itself.
    pub fn disabled() -> Self {
        Self {
            store: None,
            file: String::new(),
            prefix: DEFAULT_ASSET_PREFIX.to_string(),
            cell: RwLock::new(Arc::new(OnceLock::new())),
        }
    }

    /// Set the public mount prefix used by [`asset_path`](Self::asset_path).
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Map a logical asset path to its fingerprinted path.
    ///
    /// Paths missing from the manifest, or every path when there is no
    /// manifest file, come back unchanged. A leading `/` is ignored only when
    /// matching manifest keys.
    ///
    /// # Errors
    /// `Error::ManifestCorrupt` on every call once the manifest failed to parse.
    pub fn resolve(&self, logical_path: &str) -> Result<String> {
        let key = logical_path.trim_start_matches('/');
        let mapped = self.loaded()?.and_then(|map| map.get(key).cloned());
        Ok(mapped.unwrap_or_else(|| logical_path.to_string()))
    }

    /// Resolve a logical path and mount it under the public prefix.
    pub fn asset_path(&self, logical_path: &str) -> Result<String> {
        let resolved = self.resolve(logical_path)?;
        Ok(format!(
            "{}/{}",
            self.prefix.trim_end_matches('/'),
            resolved.trim_start_matches('/')
        ))
    }

    /// Forget the cached load; the next lookup reads the manifest again.
    pub fn invalidate(&self) {
        let mut cell = self.cell.write().unwrap_or_else(|e| e.into_inner());
        *cell = Arc::new(OnceLock::new());
    }

    fn loaded(&self) -> Loaded {
        let cell = Arc::clone(&self.cell.read().unwrap_or_else(|e| e.into_inner()));
        cell.get_or_init(|| self.load()).clone()
    }

    fn load(&self) -> Loaded {
        let Some(store) = &self.store else {
            return Ok(None);
        };

        let bytes = match store.read_file(&self.file) {
            Ok(bytes) => bytes,
            Err(e) if e.is_not_found() => {
                info!("No asset manifest at {}, serving assets unfingerprinted", self.file);
                return Ok(None);
            }
            Err(e) => {
                warn!("Failed to read asset manifest {}: {}", self.file, e);
                return Err(e);
            }
        };

        match serde_json::from_slice::<HashMap<String, String>>(&bytes) {
            Ok(map) => {
                info!("Loaded asset manifest {} ({} entries)", self.file, map.len());
                let map = map
                    .into_iter()
                    .map(|(key, value)| (key.trim_start_matches('/').to_string(), value))
                    .collect();
                Ok(Some(Arc::new(map)))
            }
            Err(e) => {
                warn!("Asset manifest {} is corrupt: {}", self.file, e);
                Err(Error::ManifestCorrupt {
                    file: self.file.clone(),
                    message: e.to_string(),
                })
            }
        }
    }
}

impl std::fmt::Debug for AssetManifest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetManifest")
            .field("file", &self.file)
            .field("prefix", &self.prefix)
            .field("enabled", &self.store.is_some())
            .finish()
    }
}
