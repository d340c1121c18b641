//! Screen capture domain — public API.
//!
//! `ScreenMirror` is the seam over the platform's screen-mirroring
//! facility. Authorizing yields a `MirrorSession`, the single-use capture
//! token: it borrows the mirror mutably, so a second authorization cannot
//! be obtained while one is live, and dropping it releases the underlying
//! handle. Frame polling is non-blocking; the pipeline owns the one grace
//! delay between probes.

mod display;
mod frame;

pub use display::DisplayMirror;
pub use frame::{RasterImage, RawFrame, BYTES_PER_PIXEL};

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// Mirroring consent was refused or the compositor is unreachable.
    #[error("Screen capture permission denied: {0}")]
    PermissionDenied(String),

    /// The mirroring surface produced no frame within the grace period.
    #[error("No frame available from the mirroring surface")]
    NoFrameAvailable,

    /// The backend delivered a buffer inconsistent with its geometry.
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),
}

/// The platform screen-mirroring facility.
pub trait ScreenMirror: Send {
    /// Request mirroring authorization and attach to the display.
    ///
    /// At most one session exists per mirror at a time; the borrow makes
    /// release-before-reacquire a compile-time property.
    fn authorize(&mut self) -> Result<Box<dyn MirrorSession + '_>, CaptureError>;
}

/// A live, authorized mirroring session.
///
/// Dropping the session revokes the authorization and releases the
/// platform handle.
pub trait MirrorSession: Send {
    /// Probe for a frame without blocking.
    ///
    /// `Ok(None)` means no frame has materialized yet; the caller decides
    /// whether to wait and probe again. Errors are terminal for the
    /// session.
    fn poll_frame(&mut self) -> Result<Option<RawFrame>, CaptureError>;
}
