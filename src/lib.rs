//! snapprint — capture the screen, desaturate it, file it, print it.
//!
//! One pipeline with swappable seams:
//! - Screen mirroring (capture/): authorization plus frame polling
//! - Grayscale transform (grayscale)
//! - Shared media gallery (gallery/): register first, write second
//! - Print path (print/): two-phase page adapter, PDF rendering, spoolers
//! - Orchestrator (pipeline) tying the steps together
//!
//! Host detection (platform), environment-driven knobs (config), user
//! notices (notify) and the trigger-surface handle (trigger) round it out.

pub mod capture;
pub mod config;
pub mod gallery;
pub mod grayscale;
pub mod notify;
pub mod pipeline;
pub mod platform;
pub mod print;
pub mod trigger;

pub use capture::{CaptureError, DisplayMirror, MirrorSession, RasterImage, RawFrame, ScreenMirror};
pub use config::Config;
pub use gallery::{ImageReference, MediaIndex, StoreError};
pub use pipeline::{Pipeline, PipelineError, PipelineReport};
pub use print::{PagedImageAdapter, PrintAttributes, PrintError, PrintJob, PrintSpooler};
