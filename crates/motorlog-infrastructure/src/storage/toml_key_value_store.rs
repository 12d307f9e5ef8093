//! Key/value entries persisted in a single TOML document.

use motorlog_core::error::Result;
use motorlog_core::storage::KeyValueStore;
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::atomic_toml::AtomicTomlFile;

/// [`KeyValueStore`] backed by an [`AtomicTomlFile`].
///
/// Every `set` is a locked read-modify-write, so concurrent writers from
/// other processes cannot lose each other's keys.
pub struct TomlKeyValueStore {
    file: AtomicTomlFile<BTreeMap<String, String>>,
}

impl TomlKeyValueStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            file: AtomicTomlFile::new(path),
        }
    }
}

impl KeyValueStore for TomlKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .file
            .load()?
            .and_then(|mut entries| entries.remove(key)))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.file.update(BTreeMap::new(), |entries| {
            entries.insert(key.to_string(), value.to_string());
            Ok(())
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.file.update(BTreeMap::new(), |entries| {
            entries.remove(key);
            Ok(())
        })
    }
}
