//! Runtime configuration from the environment.
//!
//! Every knob has an in-code default; `SNAPPRINT_*` variables override
//! them, optionally supplied through a `.env` file. A value that fails
//! to parse falls back to the default with a warning instead of
//! aborting.

use serde::Serialize;
use std::path::PathBuf;

/// Tunables for one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Delay before the second (final) frame probe, in milliseconds.
    pub frame_grace_ms: u64,
    /// How long teardown waits for the print job, in milliseconds.
    pub job_grace_ms: u64,
    /// Overrides the detected pictures directory.
    pub output_dir: Option<PathBuf>,
    /// File-name prefix for stored captures.
    pub file_prefix: String,
    /// Job name shown by the host spooler.
    pub job_name: String,
    /// Printer queue; `None` prints to the host default.
    pub printer: Option<String>,
    /// When set, print jobs become PDF files in this directory instead
    /// of going to the host spooler.
    pub spool_to_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            frame_grace_ms: default_frame_grace_ms(),
            job_grace_ms: default_job_grace_ms(),
            output_dir: None,
            file_prefix: default_file_prefix(),
            job_name: default_job_name(),
            printer: None,
            spool_to_dir: None,
        }
    }
}

fn default_frame_grace_ms() -> u64 {
    500
}
fn default_job_grace_ms() -> u64 {
    10_000
}
fn default_file_prefix() -> String {
    "SCREENSHOT".into()
}
fn default_job_name() -> String {
    "Screenshot Print".into()
}

impl Config {
    /// Read configuration from the process environment, after loading a
    /// `.env` file if one exists.
    pub fn from_env() -> Self {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                log::warn!("Ignoring unreadable .env: {}", e);
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    // Injectable variable source, so tests never race over the real
    // process environment.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            frame_grace_ms: parse_ms(&lookup, "SNAPPRINT_FRAME_GRACE_MS", defaults.frame_grace_ms),
            job_grace_ms: parse_ms(&lookup, "SNAPPRINT_JOB_GRACE_MS", defaults.job_grace_ms),
            output_dir: lookup("SNAPPRINT_OUTPUT_DIR").map(PathBuf::from),
            file_prefix: lookup("SNAPPRINT_FILE_PREFIX")
                .filter(|prefix| !prefix.is_empty())
                .unwrap_or(defaults.file_prefix),
            job_name: lookup("SNAPPRINT_JOB_NAME")
                .filter(|name| !name.is_empty())
                .unwrap_or(defaults.job_name),
            printer: lookup("SNAPPRINT_PRINTER").filter(|printer| !printer.is_empty()),
            spool_to_dir: lookup("SNAPPRINT_SPOOL_DIR").map(PathBuf::from),
        }
    }
}

fn parse_ms(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> u64 {
    match lookup(key) {
        Some(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                log::warn!("{} is not a number ({:?}), using {}", key, raw, default);
                default
            }
        },
        None => default,
    }
}
