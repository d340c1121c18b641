//! On-disk catalog backing the media index.
//!
//! One JSON document per index root:
//!   <root>/.media-index.json
//! Every entry ever registered is listed with its lifecycle status.
//! Registration happens before pixel data is written, so an interrupted
//! write leaves a visible `Pending` record rather than an untracked file.

use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::Path;

use super::StoreError;

/// Catalog file name, relative to the index root.
pub const CATALOG_FILE: &str = ".media-index.json";

/// Lifecycle of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryStatus {
    /// Registered; pixel data not yet fully on disk.
    Pending,
    /// Pixel data written and flushed.
    Stored,
}

/// One registered media item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub mime: String,
    pub category: String,
    pub status: EntryStatus,
    pub created_at: String,
}

/// The whole catalog, (de)serialized as a single JSON document.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Read the catalog under `root`. A missing file is an empty catalog;
    /// an unparseable one is dropped and rebuilt from scratch.
    pub fn load(root: &Path) -> Result<Self, StoreError> {
        let path = root.join(CATALOG_FILE);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(StoreError::StorageUnavailable(format!(
                    "catalog {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(catalog) => Ok(catalog),
            Err(e) => {
                log::warn!(
                    "[MEDIA] Catalog {} unreadable, rebuilding: {}",
                    path.display(),
                    e
                );
                Ok(Self::default())
            }
        }
    }

    /// Persist the catalog under `root`, replacing the previous version
    /// via temp file + rename.
    pub fn save(&self, root: &Path) -> Result<(), StoreError> {
        let path = root.join(CATALOG_FILE);
        let tmp = root.join(format!("{}.tmp", CATALOG_FILE));
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| StoreError::WriteError(format!("encode catalog: {}", e)))?;
        std::fs::write(&tmp, json)
            .map_err(|e| StoreError::WriteError(format!("write catalog: {}", e)))?;
        std::fs::rename(&tmp, &path)
            .map_err(|e| StoreError::WriteError(format!("replace catalog: {}", e)))?;
        Ok(())
    }

    pub fn register(&mut self, entry: CatalogEntry) {
        self.entries.push(entry);
    }

    /// Flip the status of the named entry. Returns false when the name is
    /// not in the catalog.
    pub fn set_status(&mut self, name: &str, status: EntryStatus) -> bool {
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => {
                entry.status = status;
                true
            }
            None => false,
        }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn entry(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}
