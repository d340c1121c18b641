//! Spooler backends — who drives the adapter and where the document goes.
//!
//! `submit` is fire-and-forget: it hands the adapter to a background task
//! and returns a handle immediately. The task runs layout then write and
//! reports through the handle; callers may wait on it, bound the wait
//! with a timeout, or walk away.

use super::{
    CancelSignal, LayoutOutcome, PagedImageAdapter, PageRange, PrintAttributes, PrintError,
    WriteOutcome,
};
use crate::platform::SpoolerCommand;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::sync::oneshot;

/// Hands rendered documents to a print destination.
pub trait PrintSpooler: Send + Sync {
    fn submit(
        &self,
        adapter: PagedImageAdapter,
        attrs: &PrintAttributes,
    ) -> Result<JobHandle, PrintError>;
}

/// Completion handle for a submitted job.
pub struct JobHandle {
    done: oneshot::Receiver<Result<(), PrintError>>,
}

impl JobHandle {
    fn pair() -> (oneshot::Sender<Result<(), PrintError>>, JobHandle) {
        let (tx, rx) = oneshot::channel();
        (tx, JobHandle { done: rx })
    }

    /// Wait for the job to finish. A task that died without reporting
    /// counts as a failed write.
    pub async fn wait(self) -> Result<(), PrintError> {
        match self.done.await {
            Ok(result) => result,
            Err(_) => Err(PrintError::WriteFailed(
                "print task ended without reporting".into(),
            )),
        }
    }
}

/// Run both adapter phases, collecting the document into memory.
fn drive_to_document(
    adapter: &mut PagedImageAdapter,
    attrs: &PrintAttributes,
) -> Result<Vec<u8>, PrintError> {
    match adapter.layout(None, attrs, &CancelSignal::new()) {
        LayoutOutcome::Done { info, .. } => {
            log::info!(
                "[PRINT] Laid out {} as {} page(s) at {}x{}",
                info.name,
                info.page_count,
                info.page_size.0,
                info.page_size.1
            );
        }
        LayoutOutcome::Cancelled => return Err(PrintError::LayoutCancelled),
        LayoutOutcome::Failed(reason) => return Err(PrintError::LayoutFailed(reason)),
    }

    let mut document = Vec::new();
    match adapter.write(&[PageRange::ALL], &mut document) {
        WriteOutcome::Done { .. } => Ok(document),
        WriteOutcome::Failed(reason) => Err(PrintError::WriteFailed(reason)),
    }
}

/// Pipes the rendered document into the host spooler command.
pub struct SystemSpooler {
    command: SpoolerCommand,
    printer: Option<String>,
}

impl SystemSpooler {
    /// `printer` selects a queue; `None` uses the host default.
    pub fn new(command: SpoolerCommand, printer: Option<String>) -> Self {
        Self { command, printer }
    }

    async fn pipe_to_command(
        command: &SpoolerCommand,
        printer: Option<&str>,
        title: &str,
        document: &[u8],
    ) -> Result<(), PrintError> {
        let args = command.kind.args(title, printer);
        log::info!(
            "[PRINT] Spooling {} bytes via {} {}",
            document.len(),
            command.path.display(),
            args.join(" ")
        );

        let mut child = tokio::process::Command::new(&command.path)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                PrintError::WriteFailed(format!("start {}: {}", command.path.display(), e))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| PrintError::WriteFailed("spooler stdin unavailable".into()))?;
        stdin
            .write_all(document)
            .await
            .map_err(|e| PrintError::WriteFailed(format!("feed spooler: {}", e)))?;
        // Closing stdin tells the command the document is complete.
        drop(stdin);

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| PrintError::WriteFailed(format!("await spooler: {}", e)))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PrintError::WriteFailed(format!(
                "{} exited with {}: {}",
                command.path.display(),
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

impl PrintSpooler for SystemSpooler {
    fn submit(
        &self,
        mut adapter: PagedImageAdapter,
        attrs: &PrintAttributes,
    ) -> Result<JobHandle, PrintError> {
        let (report, handle) = JobHandle::pair();
        let command = self.command.clone();
        let printer = self.printer.clone();
        let attrs = *attrs;

        tokio::spawn(async move {
            let title = adapter.job().name.clone();
            let result = match drive_to_document(&mut adapter, &attrs) {
                Ok(document) => {
                    Self::pipe_to_command(&command, printer.as_deref(), &title, &document).await
                }
                Err(e) => Err(e),
            };
            match &result {
                Ok(()) => log::info!("[PRINT] Job '{}' accepted by the host spooler", title),
                Err(e) => log::error!("[PRINT] Job '{}' failed: {}", title, e),
            }
            let _ = report.send(result);
        });
        Ok(handle)
    }
}

/// The "save as PDF" destination: drives the adapter into a file.
pub struct PdfDirSpooler {
    dir: PathBuf,
}

impl PdfDirSpooler {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl PrintSpooler for PdfDirSpooler {
    fn submit(
        &self,
        mut adapter: PagedImageAdapter,
        attrs: &PrintAttributes,
    ) -> Result<JobHandle, PrintError> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| PrintError::PrintUnavailable(format!("{}: {}", self.dir.display(), e)))?;

        let (report, handle) = JobHandle::pair();
        let dest = self.dir.join(pdf_name(adapter.job().source.name()));
        let attrs = *attrs;

        tokio::spawn(async move {
            let title = adapter.job().name.clone();
            let result = drive_to_document(&mut adapter, &attrs).and_then(|document| {
                std::fs::write(&dest, &document)
                    .map_err(|e| PrintError::WriteFailed(format!("{}: {}", dest.display(), e)))
            });
            match &result {
                Ok(()) => log::info!("[PRINT] Job '{}' saved to {}", title, dest.display()),
                Err(e) => log::error!("[PRINT] Job '{}' failed: {}", title, e),
            }
            let _ = report.send(result);
        });
        Ok(handle)
    }
}

/// `SCREENSHOT_x.png` becomes `SCREENSHOT_x.pdf`.
fn pdf_name(source_name: &str) -> String {
    let stem = Path::new(source_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("screenshot_print");
    format!("{}.pdf", stem)
}
