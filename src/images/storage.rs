//! File storage backends for source images and derived artifacts.
//!
//! Files are addressed by relative storage names (`images/cat.jpg`,
//! `cache/images/cat_thumbnail.jpg`). A backend reads, writes, and deletes
//! byte content by name and resolves names to public URLs.

use std::collections::BTreeMap;
use std::path::PathBuf;

use parking_lot::RwLock;
use thumbforge_common::paths::{join_name, split_name, validate_storage_name};
use thumbforge_common::{Error, Result};

/// Byte-content storage addressed by relative names.
pub trait Storage: Send + Sync {
    /// Read the full content of a stored file.
    fn open(&self, name: &str) -> Result<Vec<u8>>;

    /// Write content under `name`, replacing any existing file.
    ///
    /// Returns the name the content was stored under.
    fn save(&self, name: &str, content: &[u8]) -> Result<String>;

    /// Delete a stored file. Deleting a missing file is not an error.
    fn delete(&self, name: &str) -> Result<()>;

    /// Whether a file is stored under `name`.
    fn exists(&self, name: &str) -> Result<bool>;

    /// Public URL for a stored name.
    fn url(&self, name: &str) -> String;

    /// A name based on `name` that is not taken yet.
    ///
    /// `images/cat.jpg` becomes `images/cat_1.jpg`, `images/cat_2.jpg`, ...
    fn available_name(&self, name: &str) -> Result<String> {
        validate_storage_name(name)?;
        if !self.exists(name)? {
            return Ok(name.to_string());
        }

        let parts = split_name(name);
        for n in 1.. {
            let file = if parts.extension.is_empty() {
                format!("{}_{}", parts.stem, n)
            } else {
                format!("{}_{}.{}", parts.stem, n, parts.extension)
            };
            let candidate = join_name(&[parts.dir, &file]);
            if !self.exists(&candidate)? {
                return Ok(candidate);
            }
        }
        unreachable!("unbounded range always yields a free name")
    }
}

fn join_url(base_url: &str, name: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), name)
}

/// Filesystem storage rooted at a directory.
///
/// A file named `a/b.jpg` lives at `{root}/a/b.jpg` and is served at
/// `{base_url}/a/b.jpg`.
pub struct FileSystemStorage {
    root: PathBuf,
    base_url: String,
}

impl FileSystemStorage {
    /// Create a new `FileSystemStorage` rooted at `root`.
    pub fn new(root: PathBuf, base_url: impl Into<String>) -> Self {
        Self {
            root,
            base_url: base_url.into(),
        }
    }

    /// Get the filesystem path for a storage name.
    pub fn path(&self, name: &str) -> Result<PathBuf> {
        validate_storage_name(name)?;
        Ok(self.root.join(name))
    }
}

impl Storage for FileSystemStorage {
    fn open(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.path(name)?;
        std::fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::not_found(format!("stored file {}", name)),
            _ => Error::Io(e),
        })
    }

    fn save(&self, name: &str, content: &[u8]) -> Result<String> {
        let path = self.path(name)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, content)?;
        tracing::trace!("Wrote {} bytes to {}", content.len(), path.display());
        Ok(name.to_string())
    }

    fn delete(&self, name: &str) -> Result<()> {
        let path = self.path(name)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Io(e)),
        }
    }

    fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.path(name)?.is_file())
    }

    fn url(&self, name: &str) -> String {
        join_url(&self.base_url, name)
    }
}

/// In-memory storage, for tests and embedding.
#[derive(Default)]
pub struct MemoryStorage {
    files: RwLock<BTreeMap<String, Vec<u8>>>,
    base_url: String,
}

impl MemoryStorage {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            files: RwLock::new(BTreeMap::new()),
            base_url: base_url.into(),
        }
    }

    /// Names of all stored files, sorted.
    pub fn names(&self) -> Vec<String> {
        self.files.read().keys().cloned().collect()
    }

    /// Names stored under a prefix such as `cache/`.
    pub fn names_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.files
            .read()
            .keys()
            .filter(|name| name.starts_with(prefix))
            .cloned()
            .collect()
    }
}

impl Storage for MemoryStorage {
    fn open(&self, name: &str) -> Result<Vec<u8>> {
        self.files
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("stored file {}", name)))
    }

    fn save(&self, name: &str, content: &[u8]) -> Result<String> {
        validate_storage_name(name)?;
        self.files.write().insert(name.to_string(), content.to_vec());
        Ok(name.to_string())
    }

    fn delete(&self, name: &str) -> Result<()> {
        self.files.write().remove(name);
        Ok(())
    }

    fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.files.read().contains_key(name))
    }

    fn url(&self, name: &str) -> String {
        join_url(&self.base_url, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filesystem_save_open_delete() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileSystemStorage::new(dir.path().to_path_buf(), "/media/");

        let stored = storage.save("images/2024/cat.jpg", b"bytes").unwrap();
        assert_eq!(stored, "images/2024/cat.jpg");
        assert!(storage.exists("images/2024/cat.jpg").unwrap());
        assert!(dir.path().join("images/2024/cat.jpg").is_file());
        assert_eq!(storage.open("images/2024/cat.jpg").unwrap(), b"bytes");

        storage.delete("images/2024/cat.jpg").unwrap();
        assert!(!storage.exists("images/2024/cat.jpg").unwrap());
        // Deleting again is a no-op.
        storage.delete("images/2024/cat.jpg").unwrap();
    }

    #[test]
    fn test_filesystem_save_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileSystemStorage::new(dir.path().to_path_buf(), "/media");

        storage.save("a.png", b"one").unwrap();
        storage.save("a.png", b"two").unwrap();
        assert_eq!(storage.open("a.png").unwrap(), b"two");
    }

    #[test]
    fn test_filesystem_open_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileSystemStorage::new(dir.path().to_path_buf(), "/media");
        assert!(matches!(storage.open("nope.jpg"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_filesystem_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileSystemStorage::new(dir.path().to_path_buf(), "/media");
        assert!(storage.save("../escape.jpg", b"x").is_err());
        assert!(storage.path("/etc/passwd").is_err());
    }

    #[test]
    fn test_url_joins_base() {
        let storage = FileSystemStorage::new(PathBuf::from("/srv/media"), "/media/");
        assert_eq!(storage.url("cache/a_thumb.jpg"), "/media/cache/a_thumb.jpg");

        let storage = MemoryStorage::new("https://cdn.example.com/m");
        assert_eq!(storage.url("a.jpg"), "https://cdn.example.com/m/a.jpg");
    }

    #[test]
    fn test_available_name_appends_counter() {
        let storage = MemoryStorage::new("/media");
        assert_eq!(storage.available_name("images/cat.jpg").unwrap(), "images/cat.jpg");

        storage.save("images/cat.jpg", b"1").unwrap();
        assert_eq!(storage.available_name("images/cat.jpg").unwrap(), "images/cat_1.jpg");

        storage.save("images/cat_1.jpg", b"2").unwrap();
        assert_eq!(storage.available_name("images/cat.jpg").unwrap(), "images/cat_2.jpg");

        storage.save("README", b"3").unwrap();
        assert_eq!(storage.available_name("README").unwrap(), "README_1");
    }

    #[test]
    fn test_memory_storage_prefix_listing() {
        let storage = MemoryStorage::new("/media");
        storage.save("images/a.jpg", b"a").unwrap();
        storage.save("cache/images/a_thumb.jpg", b"t").unwrap();

        assert_eq!(storage.names().len(), 2);
        assert_eq!(
            storage.names_with_prefix("cache/"),
            vec!["cache/images/a_thumb.jpg".to_string()]
        );

        storage.delete("cache/images/a_thumb.jpg").unwrap();
        assert!(storage.names_with_prefix("cache/").is_empty());
    }
}
