//! The floating trigger surface.
//!
//! Only visibility matters to the pipeline: the trigger is hidden while
//! a capture is in flight so it cannot photograph itself, and restored
//! unconditionally afterwards.

/// Visibility handle for the persistent trigger.
pub trait TriggerSurface: Send + Sync {
    fn set_hidden(&self, hidden: bool);
}

/// Stand-in for hosts without a trigger UI.
pub struct NoopTrigger;

impl TriggerSurface for NoopTrigger {
    fn set_hidden(&self, _hidden: bool) {}
}
