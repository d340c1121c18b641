//! The capture-to-print pipeline.
//!
//! One press, one run: authorize the mirror, grab a frame, desaturate,
//! store it in the gallery, hand the page to the spooler, then wait out
//! a short grace period before releasing the mirror. Any step failure
//! aborts the rest of the run and surfaces exactly one notice; resource
//! release happens on every exit path.

use crate::capture::{CaptureError, DisplayMirror, MirrorSession, ScreenMirror};
use crate::config::Config;
use crate::gallery::{timestamped_name, ImageReference, MediaIndex, StoreError};
use crate::grayscale::to_grayscale;
use crate::notify::{LogNotifier, Notifier};
use crate::platform::Capabilities;
use crate::print::{
    JobHandle, PagedImageAdapter, PdfDirSpooler, PrintAttributes, PrintError, PrintJob,
    PrintSpooler, SystemSpooler,
};
use crate::trigger::{NoopTrigger, TriggerSurface};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Any way a run can abort.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    Capture(#[from] CaptureError),

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Print(#[from] PrintError),
}

/// What a successful run produced.
#[derive(Debug)]
pub struct PipelineReport {
    /// The stored grayscale capture.
    pub image: ImageReference,
    /// Captured frame dimensions, which are also the page size.
    pub page_size: (u32, u32),
    /// Whether the spooler reported the job done within the grace
    /// period. `false` means the job was still queued (or failed) when
    /// the mirror was released, not that printing failed outright.
    pub job_completed: bool,
}

/// Orchestrates one capture-to-print run over injected seams.
pub struct Pipeline {
    mirror: Box<dyn ScreenMirror>,
    index: MediaIndex,
    spooler: Option<Arc<dyn PrintSpooler>>,
    notifier: Arc<dyn Notifier>,
    trigger: Arc<dyn TriggerSurface>,
    config: Config,
}

impl Pipeline {
    /// Fully injected constructor; every seam can be swapped.
    pub fn new(
        mirror: Box<dyn ScreenMirror>,
        index: MediaIndex,
        spooler: Option<Arc<dyn PrintSpooler>>,
        notifier: Arc<dyn Notifier>,
        trigger: Arc<dyn TriggerSurface>,
        config: Config,
    ) -> Self {
        Self {
            mirror,
            index,
            spooler,
            notifier,
            trigger,
            config,
        }
    }

    /// Wires the pipeline for this host: the real display mirror, the
    /// detected pictures directory and spooler command, log-backed
    /// notices, and no trigger UI.
    pub fn from_host(config: Config) -> Result<Self, PipelineError> {
        let caps = Capabilities::detect();

        let root = config
            .output_dir
            .clone()
            .unwrap_or_else(|| caps.pictures_dir.clone());
        let index = MediaIndex::open(root)?;

        let spooler: Option<Arc<dyn PrintSpooler>> = match &config.spool_to_dir {
            Some(dir) => Some(Arc::new(PdfDirSpooler::new(dir)) as Arc<dyn PrintSpooler>),
            None => caps.spooler.map(|command| {
                Arc::new(SystemSpooler::new(command, config.printer.clone()))
                    as Arc<dyn PrintSpooler>
            }),
        };

        Ok(Self::new(
            Box::new(DisplayMirror::new()),
            index,
            spooler,
            Arc::new(LogNotifier),
            Arc::new(NoopTrigger),
            config,
        ))
    }

    /// Runs the whole pipeline once. Failures are reported to the user
    /// through the notifier, exactly one notice per failed run, and
    /// returned to the caller as well.
    pub async fn run_once(&mut self) -> Result<PipelineReport, PipelineError> {
        let started = Instant::now();
        log::info!("[PIPELINE] Capture-to-print run starting");

        let outcome = self.drive().await;

        match &outcome {
            Ok(report) => log::info!(
                "[PIPELINE] Run finished in {}ms ({})",
                started.elapsed().as_millis(),
                report.image.name()
            ),
            Err(e) => {
                log::error!("[PIPELINE] Run failed: {}", e);
                self.notifier.notify(notice_for(e));
            }
        }
        outcome
    }

    async fn drive(&mut self) -> Result<PipelineReport, PipelineError> {
        // Step 1: authorize mirroring. The session token is the only
        // way to poll frames and frees the single-holder mirror when it
        // drops, so release cannot be forgotten on any path below.
        let mut session = self.mirror.authorize()?;

        // Step 2: hide the trigger so it cannot end up in its own
        // screenshot. Restored below whether the capture works or not.
        self.trigger.set_hidden(true);
        let staged = capture_and_submit(
            session.as_mut(),
            &self.index,
            self.spooler.as_deref(),
            self.notifier.as_ref(),
            &self.config,
        )
        .await;
        self.trigger.set_hidden(false);
        let (image, page_size, handle) = staged?;

        // Step 7: the spooler owns the job now. Hold the mirror open
        // for a fixed grace period so the job can pull the document,
        // then release regardless; a slow spooler loses the race.
        let grace = Duration::from_millis(self.config.job_grace_ms);
        let job_completed = match tokio::time::timeout(grace, handle.wait()).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                log::warn!("[PIPELINE] Print job failed after submission: {}", e);
                false
            }
            Err(_) => {
                log::info!(
                    "[PIPELINE] Job still queued after {}ms, releasing the mirror anyway",
                    grace.as_millis()
                );
                false
            }
        };
        drop(session);

        Ok(PipelineReport {
            image,
            page_size,
            job_completed,
        })
    }
}

/// Steps 3 through 6: frame to stored image to submitted job. Split out
/// so the trigger restore in `drive` wraps every early return.
async fn capture_and_submit(
    session: &mut dyn MirrorSession,
    index: &MediaIndex,
    spooler: Option<&dyn PrintSpooler>,
    notifier: &dyn Notifier,
    config: &Config,
) -> Result<(ImageReference, (u32, u32), JobHandle), PipelineError> {
    // Step 3: acquire a frame. The first poll right after attach often
    // comes up empty, so give the compositor one fixed grace period and
    // poll once more; this is a single retry delay, not a polling loop.
    let frame = match session.poll_frame()? {
        Some(frame) => frame,
        None => {
            log::debug!(
                "[PIPELINE] No frame on first poll, waiting {}ms",
                config.frame_grace_ms
            );
            tokio::time::sleep(Duration::from_millis(config.frame_grace_ms)).await;
            session.poll_frame()?.ok_or(CaptureError::NoFrameAvailable)?
        }
    };

    let raster = frame.into_raster()?;
    let page_size = raster.dimensions();
    log::info!(
        "[PIPELINE] Captured a {}x{} frame",
        page_size.0,
        page_size.1
    );

    // Step 4: desaturate.
    let gray = to_grayscale(raster);

    // Step 5: persist. The gallery registers the entry before writing
    // bytes, so the capture is visible to other programs immediately.
    let name = timestamped_name(&config.file_prefix);
    let image = index.store(gray, Some(&name))?;
    notifier.notify("Screenshot saved in black and white.");

    // Step 6: submit the one-page job. Submission is fire-and-forget;
    // the spooler drives the adapter from here.
    let spooler = spooler.ok_or_else(|| {
        PrintError::PrintUnavailable("no spooler command on this host".to_string())
    })?;
    let job = PrintJob {
        name: config.job_name.clone(),
        page_count: 1,
        page_size,
        source: image.clone(),
    };
    let adapter = PagedImageAdapter::new(job, index.clone());
    let handle = spooler.submit(adapter, &PrintAttributes::default())?;
    notifier.notify("Printing screenshot...");

    Ok((image, page_size, handle))
}

/// The one short transient notice a failed run surfaces to the user.
fn notice_for(error: &PipelineError) -> &'static str {
    match error {
        PipelineError::Capture(CaptureError::PermissionDenied(_)) => {
            "Screen capture permission denied."
        }
        PipelineError::Capture(CaptureError::NoFrameAvailable) => "Failed to capture image.",
        PipelineError::Capture(CaptureError::MalformedFrame(_)) => "Error capturing screenshot.",
        PipelineError::Store(_) => "Error capturing screenshot.",
        PipelineError::Print(PrintError::PrintUnavailable(_)) => {
            "Printing not available on this device."
        }
        PipelineError::Print(_) => "Failed to print screenshot.",
    }
}
