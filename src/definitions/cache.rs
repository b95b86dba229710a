//! Persistent `symbol -> definition` store.
//!
//! A cached definition is trusted only while the file it points into is
//! unchanged; every entry records the BLAKE3 digest of that file at the
//! time it was added. Entries never expire on their own.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::definitions::file_of_definition;
use crate::error::Result;
use crate::hashing::file_digest;

/// Store for expensive-to-compute definitions.
pub trait DefinitionCache {
    /// Include or update the definition of a symbol.
    fn add(&mut self, symbol: &str, definition: &str);

    /// Definition of a symbol, `None` when unknown.
    fn get(&self, symbol: &str) -> Option<String>;

    /// Whether the stored definition can no longer be trusted.
    fn is_invalidated(&self, symbol: &str) -> bool;

    /// Persist pending changes.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Process-local cache, nothing survives the run.
#[derive(Debug, Default, Clone)]
pub struct MemoryDefinitionCache {
    entries: HashMap<String, String>,
}

impl MemoryDefinitionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl DefinitionCache for MemoryDefinitionCache {
    fn add(&mut self, symbol: &str, definition: &str) {
        self.entries.insert(symbol.to_string(), definition.to_string());
    }

    fn get(&self, symbol: &str) -> Option<String> {
        self.entries.get(symbol).cloned()
    }

    fn is_invalidated(&self, symbol: &str) -> bool {
        !self.entries.contains_key(symbol)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CacheEntry {
    definition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    digest: Option<String>,
}

/// JSON-file backed cache. Open once per run, [`flush`](DefinitionCache::flush) at the end.
#[derive(Debug)]
pub struct JsonDefinitionCache {
    path: PathBuf,
    core_dir: PathBuf,
    entries: BTreeMap<String, CacheEntry>,
    dirty: bool,
}

impl JsonDefinitionCache {
    /// Open the cache at `path`; definitions are resolved against `core_dir`.
    ///
    /// A missing file gives an empty cache. An unreadable one is discarded
    /// with a warning and rebuilt on the next flush.
    pub fn open(path: impl Into<PathBuf>, core_dir: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let text = std::fs::read_to_string(&path)?;
            match serde_json::from_str::<BTreeMap<String, CacheEntry>>(&text) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Discarding unreadable definition cache");
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };
        debug!(path = %path.display(), entries = entries.len(), "Opened definition cache");
        Ok(Self {
            path,
            core_dir: core_dir.into(),
            entries,
            dirty: false,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn digest_of(&self, definition: &str) -> Option<String> {
        if definition.is_empty() {
            return None;
        }
        file_digest(&self.core_dir.join(file_of_definition(definition)))
    }
}

impl DefinitionCache for JsonDefinitionCache {
    fn add(&mut self, symbol: &str, definition: &str) {
        let entry = CacheEntry {
            definition: definition.to_string(),
            digest: self.digest_of(definition),
        };
        self.entries.insert(symbol.to_string(), entry);
        self.dirty = true;
    }

    fn get(&self, symbol: &str) -> Option<String> {
        self.entries.get(symbol).map(|entry| entry.definition.clone())
    }

    fn is_invalidated(&self, symbol: &str) -> bool {
        let Some(entry) = self.entries.get(symbol) else {
            return true;
        };
        // Misses are always searched again
        if entry.definition.is_empty() {
            return true;
        }
        match (&entry.digest, self.digest_of(&entry.definition)) {
            (Some(stored), Some(current)) => *stored != current,
            _ => true,
        }
    }

    fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let text = serde_json::to_string_pretty(&self.entries)?;
        let tmp_path = self.path.with_extension("tmp");
        std::fs::write(&tmp_path, text)?;
        std::fs::rename(&tmp_path, &self.path)?;
        self.dirty = false;
        info!(path = %self.path.display(), entries = self.entries.len(), "Saved definition cache");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_round_trip() {
        let mut cache = MemoryDefinitionCache::new();
        cache.add("sym", "f.c:10");
        assert_eq!(cache.get("sym").as_deref(), Some("f.c:10"));
        assert_eq!(cache.get("unknown_sym"), None);
        assert!(!cache.is_invalidated("sym"));
        assert!(cache.is_invalidated("unknown_sym"));
    }

    #[test]
    fn test_json_round_trip_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("f.c"), "int f(void) { return 0; }\n").unwrap();
        let cache_path = dir.path().join("cache/DEFINITIONS_CACHE.json");

        let mut cache = JsonDefinitionCache::open(&cache_path, dir.path()).unwrap();
        assert!(cache.is_empty());
        cache.add("sym", "f.c:10");
        assert_eq!(cache.get("sym").as_deref(), Some("f.c:10"));
        assert_eq!(cache.get("unknown_sym"), None);
        cache.flush().unwrap();

        let reopened = JsonDefinitionCache::open(&cache_path, dir.path()).unwrap();
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.get("sym").as_deref(), Some("f.c:10"));
        assert!(!reopened.is_invalidated("sym"));
    }

    #[test]
    fn test_changed_file_invalidates() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("f.c");
        std::fs::write(&source, "int f(void);\n").unwrap();

        let mut cache = JsonDefinitionCache::open(dir.path().join("c.json"), dir.path()).unwrap();
        cache.add("f", "f.c:1");
        assert!(!cache.is_invalidated("f"));

        std::fs::write(&source, "\nint f(void);\n").unwrap();
        assert!(cache.is_invalidated("f"));

        std::fs::remove_file(&source).unwrap();
        assert!(cache.is_invalidated("f"));
    }

    #[test]
    fn test_empty_definition_is_always_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = JsonDefinitionCache::open(dir.path().join("c.json"), dir.path()).unwrap();
        cache.add("missing", "");
        assert_eq!(cache.get("missing").as_deref(), Some(""));
        assert!(cache.is_invalidated("missing"));
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.json");
        std::fs::write(&path, "{ not json").unwrap();
        let cache = JsonDefinitionCache::open(&path, dir.path()).unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_flush_without_changes_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.json");
        let mut cache = JsonDefinitionCache::open(&path, dir.path()).unwrap();
        cache.flush().unwrap();
        assert!(!path.exists());
    }
}
