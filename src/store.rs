//! Content stores: where locale files, templates and asset manifests come from.
//!
//! The rest of the crate only sees the [`ContentStore`] trait, so the bytes can
//! come from a directory on disk, an embedded bundle or anything else that can
//! answer "read this path" and "list your paths".

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// A read-only source of files addressed by `/`-separated relative paths.
pub trait ContentStore: Send + Sync {
    /// Read the full contents of `path`.
    ///
    /// A missing path must be reported with [`Error::not_found`] so callers can
    /// tell "absent" apart from "broken".
    fn read_file(&self, path: &str) -> Result<Vec<u8>>;

    /// List every path held by the store.
    fn list_files(&self) -> Result<Vec<String>>;

    /// Check whether `path` exists.
    fn exists(&self, path: &str) -> bool {
        self.read_file(path).is_ok()
    }
}

/// A store rooted at a directory on disk.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a store path onto the filesystem, refusing anything that would
    /// escape the root directory.
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        for component in relative.components() {
            match component {
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(Error::store(path, "path escapes the store root"));
                }
                _ => {}
            }
        }
        Ok(self.root.join(relative))
    }
}

impl ContentStore for DirStore {
    fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.resolve(path)?;
        if full_path.is_dir() {
            return Err(Error::not_found(path));
        }
        fs::read(&full_path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::not_found(path),
            _ => Error::store(path, e.to_string()),
        })
    }

    fn list_files(&self) -> Result<Vec<String>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(true) {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(&self.root).display().to_string();
                Error::store(path, e.to_string())
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .map_err(|e| Error::store(entry.path().display().to_string(), e.to_string()))?;
            let parts: Vec<_> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect();
            files.push(parts.join("/"));
        }
        files.sort();
        Ok(files)
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).map(|p| p.is_file()).unwrap_or(false)
    }
}

/// An in-memory store, for embedded bundles and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, builder style.
    pub fn with_file(mut self, path: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        self.insert(path, contents);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, contents: impl Into<Vec<u8>>) {
        let path = path.into();
        self.files
            .insert(path.trim_start_matches('/').to_string(), contents.into());
    }
}

impl ContentStore for MemoryStore {
    fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        self.files
            .get(path.trim_start_matches('/'))
            .cloned()
            .ok_or_else(|| Error::not_found(path))
    }

    fn list_files(&self) -> Result<Vec<String>> {
        Ok(self.files.keys().cloned().collect())
    }

    fn exists(&self, path: &str) -> bool {
        self.files.contains_key(path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // ==================== MemoryStore Tests ====================

    #[test]
    fn test_memory_store_read_and_list() {
        let store = MemoryStore::new()
            .with_file("b.html", "B")
            .with_file("a/a.html", "A");

        assert_eq!(store.read_file("b.html").unwrap(), b"B");
        assert_eq!(store.list_files().unwrap(), vec!["a/a.html", "b.html"]);
    }

    #[test]
    fn test_memory_store_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store.read_file("nope.html").unwrap_err();
        assert!(err.is_not_found());
        assert!(!store.exists("nope.html"));
    }

    #[test]
    fn test_memory_store_ignores_leading_slash() {
        let store = MemoryStore::new().with_file("/manifest.json", "{}");
        assert!(store.exists("manifest.json"));
        assert!(store.exists("/manifest.json"));
    }

    // ==================== DirStore Tests ====================

    #[test]
    fn test_dir_store_lists_recursively() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        fs::create_dir_all(temp_dir.path().join("nested")).unwrap();
        fs::write(temp_dir.path().join("index.html"), "index").unwrap();
        fs::write(temp_dir.path().join("nested/_foo.html"), "foo").unwrap();

        let store = DirStore::new(temp_dir.path());
        assert_eq!(
            store.list_files().unwrap(),
            vec!["index.html", "nested/_foo.html"]
        );
        assert_eq!(store.read_file("nested/_foo.html").unwrap(), b"foo");
    }

    #[cfg(unix)]
    #[test]
    fn test_dir_store_lists_through_symlinked_directories() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let shared = TempDir::new().expect("Failed to create temp dir");
        fs::write(shared.path().join("_nav.html"), "nav").unwrap();
        fs::write(temp_dir.path().join("index.html"), "index").unwrap();
        std::os::unix::fs::symlink(shared.path(), temp_dir.path().join("shared")).unwrap();

        let store = DirStore::new(temp_dir.path());
        assert_eq!(
            store.list_files().unwrap(),
            vec!["index.html", "shared/_nav.html"]
        );
        assert_eq!(store.read_file("shared/_nav.html").unwrap(), b"nav");
    }

    #[test]
    fn test_dir_store_missing_root_is_an_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = DirStore::new(temp_dir.path().join("absent"));

        let err = store.list_files().unwrap_err();
        assert!(matches!(err, Error::Store { .. }));
    }

    #[test]
    fn test_dir_store_missing_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = DirStore::new(temp_dir.path());

        let err = store.read_file("missing.html").unwrap_err();
        assert!(err.is_not_found());
        assert!(!store.exists("missing.html"));
    }

    #[test]
    fn test_dir_store_rejects_traversal() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = DirStore::new(temp_dir.path());

        let err = store.read_file("../etc/passwd").unwrap_err();
        assert!(!err.is_not_found());
        assert!(!store.exists("../etc/passwd"));
    }

    #[test]
    fn test_dir_store_directory_is_not_a_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        fs::create_dir_all(temp_dir.path().join("partials")).unwrap();
        let store = DirStore::new(temp_dir.path());

        assert!(store.read_file("partials").unwrap_err().is_not_found());
        assert!(!store.exists("partials"));
    }
}
