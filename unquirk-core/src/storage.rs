use anyhow::Result;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Storage abstraction for profile definitions.
///
/// One entry per profile; the entry name is the profile's store key.
/// Implementations return raw JSON text — parsing and compilation are
/// the loader's job, so a corrupt entry never takes down the store.
pub trait ProfileStore: Send + Sync {
    /// Names of every entry in the store, in no guaranteed order.
    /// Callers that need determinism must sort.
    fn list_entries(&self) -> Result<Vec<String>>;

    /// Raw content of the named entry, or None if it does not exist.
    fn read_entry(&self, name: &str) -> Result<Option<String>>;
}

/// File-based store: a directory of `<name>.json` files, one per profile.
pub struct FileStore {
    rules_dir: PathBuf,
}

impl FileStore {
    pub fn new(rules_dir: impl Into<PathBuf>) -> Self {
        Self {
            rules_dir: rules_dir.into(),
        }
    }

    fn entry_path(&self, name: &str) -> PathBuf {
        self.rules_dir.join(format!("{name}.json"))
    }
}

impl ProfileStore for FileStore {
    fn list_entries(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        if !self.rules_dir.is_dir() {
            return Ok(names);
        }
        for entry in fs::read_dir(&self.rules_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        Ok(names)
    }

    fn read_entry(&self, name: &str) -> Result<Option<String>> {
        let path = self.entry_path(name);
        if Path::new(&path).exists() {
            Ok(Some(fs::read_to_string(path)?))
        } else {
            Ok(None)
        }
    }
}

/// In-memory store for tests and embedding without a rules directory.
#[derive(Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, content: &str) {
        self.entries.insert(name.to_string(), content.to_string());
    }
}

impl ProfileStore for MemoryStore {
    fn list_entries(&self) -> Result<Vec<String>> {
        Ok(self.entries.keys().cloned().collect())
    }

    fn read_entry(&self, name: &str) -> Result<Option<String>> {
        Ok(self.entries.get(name).cloned())
    }
}
