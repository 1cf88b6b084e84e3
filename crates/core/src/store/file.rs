//! File-backed key-value store.
//!
//! Layout: `<root>/<key>.json`, one value per file. Writes go through a temporary file in
//! the same directory followed by a rename, so a reader never observes a half-written value.

use super::{validate_key, KeyValueStore, StoreResult};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const VALUE_EXTENSION: &str = "json";

#[derive(Clone, Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Opens (creating if needed) a store rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`super::StoreError::Io`] if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.{VALUE_EXTENSION}"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        validate_key(key)?;
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        validate_key(key)?;
        let target = self.path_for(key);
        let tmp = self.root.join(format!(".{key}.tmp"));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &target)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        validate_key(key)?;
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(VALUE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if validate_key(stem).is_ok() {
                    keys.push(stem.to_owned());
                }
            }
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_root() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("nested").join("store");
        let store = FileStore::open(&root).unwrap();
        assert!(store.root().is_dir());
    }

    #[test]
    fn test_values_persist_across_instances() {
        let temp = TempDir::new().unwrap();

        let store = FileStore::open(temp.path()).unwrap();
        store.set("resq_notifications", "[]").unwrap();

        let reopened = FileStore::open(temp.path()).unwrap();
        assert_eq!(
            reopened.get("resq_notifications").unwrap().as_deref(),
            Some("[]")
        );
        assert!(temp.path().join("resq_notifications.json").is_file());
    }

    #[test]
    fn test_missing_key_reads_as_none() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::open(temp.path()).unwrap();
        assert_eq!(store.get("absent").unwrap(), None);
        store.remove("absent").unwrap();
    }

    #[test]
    fn test_keys_ignores_foreign_files() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::open(temp.path()).unwrap();
        store.set("hospital_request_REQ001", "{}").unwrap();
        store.set("hospital_request_REQ002", "{}").unwrap();
        fs::write(temp.path().join("README.txt"), "hello").unwrap();
        fs::create_dir(temp.path().join("sub.json")).unwrap();

        let mut keys = store.keys().unwrap();
        keys.sort();
        assert_eq!(
            keys,
            vec!["hospital_request_REQ001", "hospital_request_REQ002"]
        );
    }

    #[test]
    fn test_overwrite_replaces_value() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::open(temp.path()).unwrap();
        store.set("k", "one").unwrap();
        store.set("k", "two").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("two"));
        assert!(!temp.path().join(".k.tmp").exists());
    }
}
