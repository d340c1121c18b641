//! Shared media gallery — register first, write second.
//!
//! A device photo index mimicked over a plain directory tree:
//!   <root>/Screenshots/SCREENSHOT_20240131_093000.png
//!   <root>/.media-index.json
//!
//! Entries become visible to other programs the moment they are
//! registered, before any pixel data lands. A write that fails after
//! registration leaves a visible `Pending` entry behind; those orphans
//! are kept, not rolled back.

mod catalog;

pub use catalog::{Catalog, CatalogEntry, EntryStatus, CATALOG_FILE};

use crate::capture::RasterImage;
use image::ImageFormat;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

/// MIME type every capture is stored under.
pub const PNG_MIME: &str = "image/png";

/// Category (subdirectory of the index root) screen captures are filed
/// under.
pub const SCREENSHOT_CATEGORY: &str = "Screenshots";

#[derive(Debug, Error)]
pub enum StoreError {
    /// The index root cannot be resolved, created, or read.
    #[error("Media storage unavailable: {0}")]
    StorageUnavailable(String),
    /// An entry's bytes could not be written out or read back.
    #[error("Media entry I/O failed: {0}")]
    WriteError(String),
}

/// Durable handle to a registered media entry.
#[derive(Debug, Clone)]
pub struct ImageReference {
    name: String,
    path: PathBuf,
    mime: String,
}

impl ImageReference {
    /// Display name, e.g. `SCREENSHOT_20240131_093000.png`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolvable location of the pixel data.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }
}

/// Filesystem-backed media index rooted at the pictures directory.
#[derive(Debug, Clone)]
pub struct MediaIndex {
    root: PathBuf,
}

impl MediaIndex {
    /// Open the index at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .map_err(|e| StoreError::StorageUnavailable(format!("{}: {}", root.display(), e)))?;
        log::info!("[MEDIA] Index open at {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Register an entry before its bytes exist. The entry shows up in
    /// the catalog immediately, with `Pending` status.
    pub fn register_pending(
        &self,
        name: &str,
        mime: &str,
        category: &str,
    ) -> Result<ImageReference, StoreError> {
        let dir = self.root.join(category);
        std::fs::create_dir_all(&dir)
            .map_err(|e| StoreError::WriteError(format!("create {}: {}", dir.display(), e)))?;

        let mut catalog = Catalog::load(&self.root)?;
        catalog.register(CatalogEntry {
            name: name.to_string(),
            mime: mime.to_string(),
            category: category.to_string(),
            status: EntryStatus::Pending,
            created_at: chrono::Local::now().to_rfc3339(),
        });
        catalog.save(&self.root)?;

        Ok(ImageReference {
            name: name.to_string(),
            path: dir.join(name),
            mime: mime.to_string(),
        })
    }

    /// Open the destination of a registered entry for writing.
    pub fn open_write(&self, reference: &ImageReference) -> Result<BufWriter<File>, StoreError> {
        let file = File::create(reference.path()).map_err(|e| {
            StoreError::WriteError(format!("{}: {}", reference.path().display(), e))
        })?;
        Ok(BufWriter::new(file))
    }

    /// Mark a registered entry as fully written.
    pub fn mark_stored(&self, reference: &ImageReference) -> Result<(), StoreError> {
        let mut catalog = Catalog::load(&self.root)?;
        if !catalog.set_status(reference.name(), EntryStatus::Stored) {
            return Err(StoreError::WriteError(format!(
                "entry {} vanished from the catalog",
                reference.name()
            )));
        }
        catalog.save(&self.root)
    }

    /// Store a raster as a lossless PNG under the screenshots category.
    ///
    /// Registration precedes the write; a failure past that point leaves
    /// the entry behind as a visible Pending orphan.
    pub fn store(
        &self,
        image: RasterImage,
        suggested_name: Option<&str>,
    ) -> Result<ImageReference, StoreError> {
        let start = Instant::now();
        let name = match suggested_name {
            Some(name) => name.to_string(),
            None => timestamped_name("SCREENSHOT"),
        };
        let reference = self.register_pending(&name, PNG_MIME, SCREENSHOT_CATEGORY)?;

        let mut out = self.open_write(&reference)?;
        image
            .into_rgba8()
            .write_to(&mut out, ImageFormat::Png)
            .map_err(|e| {
                log::warn!("[MEDIA] Write failed, {} stays pending: {}", name, e);
                StoreError::WriteError(format!("encode {}: {}", name, e))
            })?;
        out.flush().map_err(|e| {
            log::warn!("[MEDIA] Flush failed, {} stays pending: {}", name, e);
            StoreError::WriteError(format!("flush {}: {}", name, e))
        })?;
        self.mark_stored(&reference)?;

        log::info!(
            "[MEDIA] Stored {} in {}ms",
            reference.name(),
            start.elapsed().as_millis()
        );
        Ok(reference)
    }

    /// Read a stored entry back, pixel for pixel.
    pub fn load(&self, reference: &ImageReference) -> Result<RasterImage, StoreError> {
        let bytes = std::fs::read(reference.path()).map_err(|e| {
            StoreError::WriteError(format!("read {}: {}", reference.path().display(), e))
        })?;
        let decoded = image::load_from_memory(&bytes)
            .map_err(|e| StoreError::WriteError(format!("decode {}: {}", reference.name(), e)))?;
        Ok(RasterImage::from_rgba8(decoded.to_rgba8()))
    }

    /// Current catalog contents.
    pub fn entries(&self) -> Result<Vec<CatalogEntry>, StoreError> {
        Ok(Catalog::load(&self.root)?.entries().to_vec())
    }
}

/// `PREFIX_yyyymmdd_hhmmss.png` display name from the local clock.
/// Best-effort uniqueness only; two captures in the same second collide.
pub fn timestamped_name(prefix: &str) -> String {
    format!(
        "{}_{}.png",
        prefix,
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    )
}
