//! Host capability lookup, resolved once at startup.
//!
//! Components consult this snapshot instead of probing the host at use
//! time: the pictures directory and the spooler command are decided here
//! and nowhere else.

use std::path::PathBuf;

/// Host spooler dialects a document can be piped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpoolerKind {
    Lp,
    Lpr,
}

impl SpoolerKind {
    /// Command-line arguments for a job read from stdin.
    pub fn args(&self, title: &str, printer: Option<&str>) -> Vec<String> {
        let mut args = Vec::new();
        match self {
            SpoolerKind::Lp => {
                args.push("-t".to_string());
                args.push(title.to_string());
                if let Some(printer) = printer {
                    args.push("-d".to_string());
                    args.push(printer.to_string());
                }
            }
            SpoolerKind::Lpr => {
                args.push("-T".to_string());
                args.push(title.to_string());
                if let Some(printer) = printer {
                    args.push("-P".to_string());
                    args.push(printer.to_string());
                }
            }
        }
        args
    }
}

/// A spooler command found on the PATH.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpoolerCommand {
    pub path: PathBuf,
    pub kind: SpoolerKind,
}

/// What the host offers, probed once.
#[derive(Debug, Clone)]
pub struct Capabilities {
    pub pictures_dir: PathBuf,
    pub spooler: Option<SpoolerCommand>,
}

impl Capabilities {
    /// Probe the host. `lp` wins over `lpr` when both are present.
    pub fn detect() -> Self {
        let pictures_dir = dirs::picture_dir().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("Pictures")
        });

        let spooler = which::which("lp")
            .ok()
            .map(|path| SpoolerCommand {
                path,
                kind: SpoolerKind::Lp,
            })
            .or_else(|| {
                which::which("lpr").ok().map(|path| SpoolerCommand {
                    path,
                    kind: SpoolerKind::Lpr,
                })
            });

        match &spooler {
            Some(cmd) => log::info!("[HOST] Spooler command: {}", cmd.path.display()),
            None => log::warn!("[HOST] No print spooler command on PATH"),
        }
        log::info!("[HOST] Pictures directory: {}", pictures_dir.display());

        Self {
            pictures_dir,
            spooler,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lp_args_read_from_stdin_with_title() {
        let args = SpoolerKind::Lp.args("Screenshot Print", None);
        assert_eq!(args, vec!["-t", "Screenshot Print"]);
    }

    #[test]
    fn lp_args_select_the_requested_queue() {
        let args = SpoolerKind::Lp.args("Screenshot Print", Some("office"));
        assert_eq!(args, vec!["-t", "Screenshot Print", "-d", "office"]);
    }

    #[test]
    fn lpr_args_use_the_bsd_flags() {
        let args = SpoolerKind::Lpr.args("Screenshot Print", Some("office"));
        assert_eq!(args, vec!["-T", "Screenshot Print", "-P", "office"]);
    }

    #[test]
    fn detect_always_resolves_a_pictures_dir() {
        let caps = Capabilities::detect();
        assert!(!caps.pictures_dir.as_os_str().is_empty());
    }
}
