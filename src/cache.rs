//! Memoized catalog loading keyed on the identity of the input source.

use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;

use crate::catalog::{CatalogError, SchemaCatalog};

/// Identity of a catalog source. A changed key forces a reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKey {
    File {
        path: PathBuf,
        len: u64,
        modified: Option<SystemTime>,
    },
    Inline(u64),
}

impl SourceKey {
    pub fn for_file(path: &Path) -> Result<Self, CatalogError> {
        let meta = fs::metadata(path)?;
        Ok(SourceKey::File {
            path: path.to_path_buf(),
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }

    pub fn for_text(text: &str) -> Self {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        SourceKey::Inline(hasher.finish())
    }
}

#[derive(Debug, Default)]
pub struct CatalogCache {
    entry: Option<(SourceKey, SchemaCatalog)>,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_load_file(&mut self, path: &Path) -> Result<&SchemaCatalog, CatalogError> {
        let key = SourceKey::for_file(path)?;
        self.get_or_load(key, || SchemaCatalog::load_path(path))
    }

    pub fn get_or_load_text(&mut self, text: &str) -> Result<&SchemaCatalog, CatalogError> {
        self.get_or_load(SourceKey::for_text(text), || SchemaCatalog::from_csv_str(text))
    }

    pub fn key(&self) -> Option<&SourceKey> {
        self.entry.as_ref().map(|(key, _)| key)
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    fn get_or_load(
        &mut self,
        key: SourceKey,
        load: impl FnOnce() -> Result<SchemaCatalog, CatalogError>,
    ) -> Result<&SchemaCatalog, CatalogError> {
        match self.entry.take() {
            Some((cached, catalog)) if cached == key => {
                debug!(key = ?cached, "catalog cache hit");
                Ok(&self.entry.insert((cached, catalog)).1)
            }
            _ => {
                debug!(?key, "catalog cache miss");
                // A failed load leaves the cache empty rather than stale.
                let catalog = load()?;
                Ok(&self.entry.insert((key, catalog)).1)
            }
        }
    }
}
