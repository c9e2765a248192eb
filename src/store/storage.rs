//! Key-value storage backends for persisted store snapshots.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::StoreError;

/// String key-value storage with the shape of the browser's `localStorage`.
pub trait StateStorage {
    /// Read the value stored under `key`, if any.
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove the value under `key`. Removing a missing key is not an error.
    fn remove_item(&mut self, key: &str) -> Result<(), StoreError>;
}

/// Volatile in-memory storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl MemoryStorage {
    /// Create an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl StateStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StoreError> {
        self.items.remove(key);
        Ok(())
    }
}

impl<S: StateStorage + ?Sized> StateStorage for Box<S> {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get_item(key)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StoreError> {
        (**self).remove_item(key)
    }
}

/// File-backed storage: one `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    directory: PathBuf,
}

impl FileStorage {
    /// Use the given directory (created on first write).
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Default state directory under the platform data dir.
    /// Returns None on WASM (no filesystem access).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn default_directory() -> Option<PathBuf> {
        if let Some(data_dir) = dirs::data_dir() {
            Some(data_dir.join("xdental").join("state"))
        } else {
            dirs::home_dir().map(|home| home.join(".local").join("share").join("xdental").join("state"))
        }
    }

    /// Directory holding the state files.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// File for `key`. Bytes other than ASCII alphanumerics and `-` are
    /// written as `_xx` hex escapes, so distinct keys never share a file.
    fn path_for(&self, key: &str) -> PathBuf {
        let mut file_name = String::with_capacity(key.len());
        for byte in key.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' {
                file_name.push(char::from(byte));
            } else {
                file_name.push_str(&format!("_{:02x}", byte));
            }
        }
        self.directory.join(format!("{}.json", file_name))
    }
}

impl StateStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No state file at {:?}", path);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.directory)?;
        let path = self.path_for(key);
        std::fs::write(&path, value)?;
        log::trace!("Wrote state file {:?}", path);
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StoreError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Browser `localStorage` (WASM only).
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

#[cfg(target_arch = "wasm32")]
impl LocalStorage {
    fn storage() -> Result<web_sys::Storage, StoreError> {
        let window =
            web_sys::window().ok_or_else(|| StoreError::storage("No window object available"))?;
        window
            .local_storage()
            .map_err(|e| StoreError::storage(format!("localStorage access error: {:?}", e)))?
            .ok_or_else(|| StoreError::storage("localStorage not available"))
    }
}

#[cfg(target_arch = "wasm32")]
impl StateStorage for LocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Self::storage()?
            .get_item(key)
            .map_err(|e| StoreError::storage(format!("Failed to read from localStorage: {:?}", e)))
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|e| StoreError::storage(format!("Failed to save to localStorage: {:?}", e)))
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StoreError> {
        Self::storage()?
            .remove_item(key)
            .map_err(|e| StoreError::storage(format!("Failed to remove from localStorage: {:?}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage() {
        let mut storage = MemoryStorage::new();
        assert_eq!(storage.get_item("a").unwrap(), None);

        storage.set_item("a", "1").unwrap();
        storage.set_item("a", "2").unwrap();
        assert_eq!(storage.get_item("a").unwrap().as_deref(), Some("2"));
        assert_eq!(storage.len(), 1);

        storage.remove_item("a").unwrap();
        storage.remove_item("a").unwrap();
        assert!(storage.is_empty());
    }

    #[test]
    fn test_file_storage_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path().join("nested"));

        assert_eq!(storage.get_item("image-storage").unwrap(), None);
        storage.set_item("image-storage", "{\"a\":1}").unwrap();
        assert_eq!(
            storage.get_item("image-storage").unwrap().as_deref(),
            Some("{\"a\":1}")
        );
        assert!(dir.path().join("nested").join("image-storage.json").exists());

        storage.remove_item("image-storage").unwrap();
        assert_eq!(storage.get_item("image-storage").unwrap(), None);
        storage.remove_item("image-storage").unwrap();
    }

    #[test]
    fn test_file_storage_escapes_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path());
        storage.set_item("../escape", "x").unwrap();
        assert!(dir.path().join("_2e_2e_2fescape.json").exists());

        storage.set_item("a.b", "dot").unwrap();
        storage.set_item("a_b", "underscore").unwrap();
        assert_eq!(storage.get_item("a.b").unwrap().as_deref(), Some("dot"));
        assert_eq!(storage.get_item("a_b").unwrap().as_deref(), Some("underscore"));

        storage.set_item("xdental-layout", "GRID").unwrap();
        assert!(dir.path().join("xdental-layout.json").exists());
    }
}
