//! Printing — job descriptors, the two-phase adapter, and spoolers.
//!
//! The flow mirrors a platform print service: the spooler calls the
//! adapter's layout phase (repeatable while attributes change), then its
//! write phase, then hands the rendered document to the host. Every
//! outcome is a tagged variant; there is no exception-by-convention path.

mod adapter;
mod document;
mod spooler;

pub use adapter::{LayoutOutcome, PagedImageAdapter, WriteOutcome, DOCUMENT_NAME};
pub use spooler::{JobHandle, PdfDirSpooler, PrintSpooler, SystemSpooler};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

use crate::gallery::ImageReference;

#[derive(Debug, Error)]
pub enum PrintError {
    /// No way to hand a document to the host.
    #[error("Print spooler unavailable: {0}")]
    PrintUnavailable(String),
    /// The spooler cancelled layout before a document was declared.
    #[error("Print layout cancelled")]
    LayoutCancelled,
    #[error("Print layout failed: {0}")]
    LayoutFailed(String),
    #[error("Print write failed: {0}")]
    WriteFailed(String),
}

/// Spooler-side attributes, compared across layout passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrintAttributes {
    pub dpi: u32,
    pub color: ColorMode,
}

impl Default for PrintAttributes {
    fn default() -> Self {
        Self {
            dpi: 300,
            color: ColorMode::Monochrome,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Monochrome,
    Color,
}

/// Inclusive page interval requested by the spooler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

impl PageRange {
    /// Every page of any document.
    pub const ALL: PageRange = PageRange {
        start: 0,
        end: u32::MAX,
    };

    pub fn contains(&self, page: u32) -> bool {
        self.start <= page && page <= self.end
    }
}

/// Everything needed to print one stored capture.
#[derive(Debug, Clone)]
pub struct PrintJob {
    pub name: String,
    /// Always 1 for a screen capture.
    pub page_count: u32,
    /// Pixel dimensions of the raster; the page is sized to match.
    pub page_size: (u32, u32),
    pub source: ImageReference,
}

/// Declared by a successful layout pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInfo {
    pub name: String,
    pub page_count: u32,
    pub page_size: (u32, u32),
}

/// Cooperative cancellation flag. Layout checks it once at phase entry;
/// a write in flight is never interrupted.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal(Arc<AtomicBool>);

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
