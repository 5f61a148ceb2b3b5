//! File-backed key-value storage.
//!
//! Each key is one file inside a state directory, named after the key.
//! Writes go to a temporary file first and are renamed into place, so a
//! crash mid-write leaves the previous value intact.

use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use bazaar_core::{KeyValueStore, StorageError};
use tracing::debug;

/// Durable storage in a directory on disk.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    dir: PathBuf,
}

impl DirectoryStore {
    /// Open (and create if needed) the state directory.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(map_io)?;
        debug!(dir = %dir.display(), "Opened state directory");
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));

        if valid {
            Ok(self.dir.join(key))
        } else {
            Err(StorageError::Unavailable(format!("invalid storage key '{key}'")))
        }
    }
}

impl KeyValueStore for DirectoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)?) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(map_io(e)),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let tmp = self.dir.join(format!(".{key}.tmp"));

        fs::write(&tmp, value).map_err(map_io)?;
        fs::rename(&tmp, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            map_io(e)
        })
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)?) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(map_io(e)),
            _ => Ok(()),
        }
    }
}

fn map_io(error: io::Error) -> StorageError {
    if error.kind() == ErrorKind::StorageFull {
        StorageError::QuotaExceeded
    } else {
        StorageError::Io(error)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bazaar_core::storage::CART_KEY;

    use super::*;

    #[test]
    fn test_set_get_remove() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DirectoryStore::open(dir.path()).unwrap();

        assert_eq!(store.get(CART_KEY).unwrap(), None);

        store.set(CART_KEY, r#"{"items":[]}"#).unwrap();
        assert_eq!(store.get(CART_KEY).unwrap().as_deref(), Some(r#"{"items":[]}"#));
        assert!(dir.path().join("cart").is_file());

        store.remove(CART_KEY).unwrap();
        assert_eq!(store.get(CART_KEY).unwrap(), None);
    }

    #[test]
    fn test_remove_missing_key_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DirectoryStore::open(dir.path()).unwrap();

        assert!(store.remove("token").is_ok());
    }

    #[test]
    fn test_overwrite_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DirectoryStore::open(dir.path()).unwrap();

        store.set("token", "first").unwrap();
        store.set("token", "second").unwrap();

        assert_eq!(store.get("token").unwrap().as_deref(), Some("second"));
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec!["token"]);
    }

    #[test]
    fn test_creates_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");

        let mut store = DirectoryStore::open(&nested).unwrap();
        store.set("token", "abc").unwrap();

        assert!(nested.join("token").is_file());
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DirectoryStore::open(dir.path()).unwrap();

        assert!(matches!(store.get("../escape"), Err(StorageError::Unavailable(_))));
        assert!(matches!(store.set(".hidden", "x"), Err(StorageError::Unavailable(_))));
        assert!(matches!(store.remove(""), Err(StorageError::Unavailable(_))));
    }

    #[test]
    fn test_clones_see_the_same_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = DirectoryStore::open(dir.path()).unwrap();
        let reader = writer.clone();

        writer.set("token", "abc").unwrap();

        assert_eq!(reader.get("token").unwrap().as_deref(), Some("abc"));
    }
}
