//! Catalog registry: a named, ordered list of OPDS root URLs.
//!
//! The registry itself is plain data; persistence goes through an
//! injected [`RegistryStore`] owned by the caller, never through
//! process-wide state.

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

use serde::Deserialize;

/// One registered catalog.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CatalogSource {
    pub name: String,
    pub url: String,
}

/// Ordered list of catalog sources with unique names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogRegistry {
    entries: Vec<CatalogSource>,
}

impl CatalogRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<CatalogSource>) -> Self {
        let mut registry = Self::new();
        for entry in entries {
            registry.add(entry.name, entry.url);
        }
        registry
    }

    /// Entries in insertion order.
    pub fn list(&self) -> &[CatalogSource] {
        &self.entries
    }

    /// Add a catalog. Names are unique: adding an existing name replaces
    /// its URL in place (last write wins) without changing its position.
    pub fn add(&mut self, name: impl Into<String>, url: impl Into<String>) {
        let name = name.into();
        let url = url.into();
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(existing) => existing.url = url,
            None => self.entries.push(CatalogSource { name, url }),
        }
    }

    /// Remove a catalog by name. Returns whether an entry was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.name != name);
        self.entries.len() != before
    }
}

/// Storage backend for a [`CatalogRegistry`]. The caller owns the store
/// and decides when to load and save.
pub trait RegistryStore {
    fn load(&self) -> io::Result<CatalogRegistry>;
    fn save(&self, registry: &CatalogRegistry) -> io::Result<()>;
}

/// File-backed store using a JSON array of `[name, url]` pairs.
///
/// Loading also accepts `{"name": ..., "url": ...}` entries and, for
/// legacy files, a top-level object of name-to-url mappings; saving
/// always writes the pair form.
#[derive(Debug, Clone)]
pub struct JsonRegistryStore {
    path: PathBuf,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredEntry {
    Pair(String, String),
    Source(CatalogSource),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredRegistry {
    Entries(Vec<StoredEntry>),
    // Legacy object form; JSON objects carry no order, so these load
    // sorted by name.
    Map(BTreeMap<String, String>),
}

impl JsonRegistryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl RegistryStore for JsonRegistryStore {
    /// A missing file loads as an empty registry; a present but
    /// unparseable file is an error.
    fn load(&self) -> io::Result<CatalogRegistry> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(CatalogRegistry::new());
            }
            Err(e) => return Err(e),
        };

        let stored: StoredRegistry = serde_json::from_slice(&bytes)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let entries = match stored {
            StoredRegistry::Entries(entries) => entries
                .into_iter()
                .map(|entry| match entry {
                    StoredEntry::Pair(name, url) => CatalogSource { name, url },
                    StoredEntry::Source(source) => source,
                })
                .collect(),
            StoredRegistry::Map(map) => map
                .into_iter()
                .map(|(name, url)| CatalogSource { name, url })
                .collect(),
        };

        Ok(CatalogRegistry::from_entries(entries))
    }

    fn save(&self, registry: &CatalogRegistry) -> io::Result<()> {
        let pairs: Vec<(&str, &str)> = registry
            .list()
            .iter()
            .map(|e| (e.name.as_str(), e.url.as_str()))
            .collect();
        let json = serde_json::to_vec_pretty(&pairs)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        std::fs::write(&self.path, json)
    }
}
