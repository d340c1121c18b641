//! User-facing notices.
//!
//! One short transient message per event, in the spirit of a phone
//! toast. The pipeline emits exactly one notice per failure and at most
//! two on success (saved, then printing).

/// Sink for short user-facing messages.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Writes notices to the log. The default headless sink.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        log::info!("[NOTICE] {}", message);
    }
}
