//! Two-phase print adapter: layout declares the document, write renders it.
//!
//! The spooler owns the call order. Layout may repeat while attributes
//! change; write happens at most once; afterwards the adapter is spent.
//! Phase misuse and cancellation come back as tagged outcomes, never
//! panics — the spooler decides what a dead job means.

use super::document;
use super::{CancelSignal, DocumentInfo, PageRange, PrintAttributes, PrintJob};
use crate::capture::RasterImage;
use crate::gallery::MediaIndex;
use std::io::Write;
use std::time::Instant;

/// Name the adapter declares for the rendered document.
pub const DOCUMENT_NAME: &str = "screenshot_print.pdf";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutOutcome {
    /// A document was declared; `changed` reports whether the attributes
    /// differ from the previous layout pass.
    Done { info: DocumentInfo, changed: bool },
    /// The cancel signal was set when layout began.
    Cancelled,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The document reached the sink; `pages` names what was written.
    Done { pages: Vec<PageRange> },
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Created,
    LayoutDone,
    Finished,
}

/// Prints one stored capture as a single page at native resolution.
///
/// The backing image is loaded lazily at the first uncancelled layout
/// pass, so a job cancelled up front never touches storage.
pub struct PagedImageAdapter {
    job: PrintJob,
    index: MediaIndex,
    raster: Option<RasterImage>,
    phase: Phase,
}

impl PagedImageAdapter {
    pub fn new(job: PrintJob, index: MediaIndex) -> Self {
        Self {
            job,
            index,
            raster: None,
            phase: Phase::Created,
        }
    }

    pub fn job(&self) -> &PrintJob {
        &self.job
    }

    /// Layout pass. `old_attrs` is `None` on the first call.
    pub fn layout(
        &mut self,
        old_attrs: Option<&PrintAttributes>,
        new_attrs: &PrintAttributes,
        cancel: &CancelSignal,
    ) -> LayoutOutcome {
        if self.phase == Phase::Finished {
            return LayoutOutcome::Failed("layout requested after the document was written".into());
        }
        if cancel.is_cancelled() {
            log::info!(
                "[PRINT] Layout cancelled before {} was loaded",
                self.job.source.name()
            );
            return LayoutOutcome::Cancelled;
        }

        if self.raster.is_none() {
            let raster = match self.index.load(&self.job.source) {
                Ok(raster) => raster,
                Err(e) => return LayoutOutcome::Failed(e.to_string()),
            };
            if raster.dimensions() != self.job.page_size {
                let (rw, rh) = raster.dimensions();
                let (jw, jh) = self.job.page_size;
                return LayoutOutcome::Failed(format!(
                    "stored image is {}x{} but the job declares {}x{}",
                    rw, rh, jw, jh
                ));
            }
            self.raster = Some(raster);
        }

        let changed = old_attrs.map(|old| old != new_attrs).unwrap_or(true);
        self.phase = Phase::LayoutDone;
        LayoutOutcome::Done {
            info: DocumentInfo {
                name: DOCUMENT_NAME.to_string(),
                page_count: self.job.page_count,
                page_size: self.job.page_size,
            },
            changed,
        }
    }

    /// Write pass. Renders the page and flushes it fully into `sink`.
    pub fn write(&mut self, ranges: &[PageRange], sink: &mut dyn Write) -> WriteOutcome {
        match self.phase {
            Phase::Created => return WriteOutcome::Failed("write requested before layout".into()),
            Phase::Finished => return WriteOutcome::Failed("write requested twice".into()),
            Phase::LayoutDone => {}
        }
        // One attempt only, success or not.
        self.phase = Phase::Finished;

        if !ranges.iter().any(|r| r.contains(0)) {
            return WriteOutcome::Failed("requested ranges exclude the only page".into());
        }

        let raster = match &self.raster {
            Some(raster) => raster,
            None => return WriteOutcome::Failed("no laid-out image to write".into()),
        };

        let start = Instant::now();
        let pdf = match document::render_single_page(raster) {
            Ok(pdf) => pdf,
            Err(reason) => return WriteOutcome::Failed(reason),
        };
        if let Err(e) = sink.write_all(&pdf).and_then(|_| sink.flush()) {
            return WriteOutcome::Failed(format!("deliver document: {}", e));
        }

        log::info!(
            "[PRINT] Wrote {} ({} bytes) in {}ms",
            DOCUMENT_NAME,
            pdf.len(),
            start.elapsed().as_millis()
        );
        WriteOutcome::Done {
            pages: vec![PageRange { start: 0, end: 0 }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gallery::{PNG_MIME, SCREENSHOT_CATEGORY};
    use image::RgbaImage;
    use lopdf::Document;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_temp_dir() -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock error")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("snapprint-adapter-test-{nanos}"));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    fn gradient(width: u32, height: u32) -> RasterImage {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            image::Rgba([(x * 9 % 256) as u8, (y * 7 % 256) as u8, 31, 255])
        });
        RasterImage::from_rgba8(img)
    }

    fn stored_adapter(width: u32, height: u32) -> (PagedImageAdapter, std::path::PathBuf) {
        let dir = unique_temp_dir();
        let index = MediaIndex::open(&dir).expect("open index");
        let reference = index
            .store(gradient(width, height), Some("job.png"))
            .expect("store");
        let job = PrintJob {
            name: "Screenshot Print".to_string(),
            page_count: 1,
            page_size: (width, height),
            source: reference,
        };
        (PagedImageAdapter::new(job, index), dir)
    }

    struct FailingSink;

    impl Write for FailingSink {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "sink closed",
            ))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    // ── Layout ──

    #[test]
    fn preset_cancel_wins_before_the_backing_load() {
        // Register without ever writing bytes: any load attempt would fail,
        // so a Cancelled outcome proves the image was never touched.
        let dir = unique_temp_dir();
        let index = MediaIndex::open(&dir).expect("open index");
        let reference = index
            .register_pending("ghost.png", PNG_MIME, SCREENSHOT_CATEGORY)
            .expect("register");
        let job = PrintJob {
            name: "Screenshot Print".to_string(),
            page_count: 1,
            page_size: (8, 8),
            source: reference,
        };
        let mut adapter = PagedImageAdapter::new(job, index);

        let cancel = CancelSignal::new();
        cancel.cancel();
        let outcome = adapter.layout(None, &PrintAttributes::default(), &cancel);
        assert_eq!(outcome, LayoutOutcome::Cancelled);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn missing_backing_bytes_fail_layout() {
        let dir = unique_temp_dir();
        let index = MediaIndex::open(&dir).expect("open index");
        let reference = index
            .register_pending("ghost.png", PNG_MIME, SCREENSHOT_CATEGORY)
            .expect("register");
        let job = PrintJob {
            name: "Screenshot Print".to_string(),
            page_count: 1,
            page_size: (8, 8),
            source: reference,
        };
        let mut adapter = PagedImageAdapter::new(job, index);

        let outcome = adapter.layout(None, &PrintAttributes::default(), &CancelSignal::new());
        assert!(matches!(outcome, LayoutOutcome::Failed(_)));
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn layout_declares_one_page_at_native_size() {
        let (mut adapter, dir) = stored_adapter(21, 13);
        let attrs = PrintAttributes::default();

        match adapter.layout(None, &attrs, &CancelSignal::new()) {
            LayoutOutcome::Done { info, changed } => {
                assert_eq!(info.name, DOCUMENT_NAME);
                assert_eq!(info.page_count, 1);
                assert_eq!(info.page_size, (21, 13));
                assert!(changed);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn relayout_reports_changed_only_when_attributes_differ() {
        let (mut adapter, dir) = stored_adapter(6, 6);
        let attrs = PrintAttributes::default();
        let cancel = CancelSignal::new();

        adapter.layout(None, &attrs, &cancel);
        match adapter.layout(Some(&attrs), &attrs, &cancel) {
            LayoutOutcome::Done { changed, .. } => assert!(!changed),
            other => panic!("unexpected outcome: {:?}", other),
        }

        let color = PrintAttributes {
            color: crate::print::ColorMode::Color,
            ..attrs
        };
        match adapter.layout(Some(&attrs), &color, &cancel) {
            LayoutOutcome::Done { changed, .. } => assert!(changed),
            other => panic!("unexpected outcome: {:?}", other),
        }
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn page_size_mismatch_fails_layout() {
        let dir = unique_temp_dir();
        let index = MediaIndex::open(&dir).expect("open index");
        let reference = index
            .store(gradient(4, 4), Some("small.png"))
            .expect("store");
        let job = PrintJob {
            name: "Screenshot Print".to_string(),
            page_count: 1,
            page_size: (5, 5),
            source: reference,
        };
        let mut adapter = PagedImageAdapter::new(job, index);

        let outcome = adapter.layout(None, &PrintAttributes::default(), &CancelSignal::new());
        match outcome {
            LayoutOutcome::Failed(reason) => assert!(reason.contains("4x4")),
            other => panic!("unexpected outcome: {:?}", other),
        }
        let _ = std::fs::remove_dir_all(dir);
    }

    // ── Write ──

    #[test]
    fn write_before_layout_is_rejected() {
        let (mut adapter, dir) = stored_adapter(6, 6);
        let mut sink = Vec::new();
        let outcome = adapter.write(&[PageRange::ALL], &mut sink);
        assert!(matches!(outcome, WriteOutcome::Failed(_)));
        assert!(sink.is_empty());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn write_streams_a_parseable_one_page_pdf() {
        let (mut adapter, dir) = stored_adapter(10, 20);
        adapter.layout(None, &PrintAttributes::default(), &CancelSignal::new());

        let mut sink = Vec::new();
        match adapter.write(&[PageRange::ALL], &mut sink) {
            WriteOutcome::Done { pages } => {
                assert_eq!(pages, vec![PageRange { start: 0, end: 0 }]);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        let doc = Document::load_mem(&sink).expect("parseable PDF");
        assert_eq!(doc.get_pages().len(), 1);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn second_write_is_rejected() {
        let (mut adapter, dir) = stored_adapter(6, 6);
        adapter.layout(None, &PrintAttributes::default(), &CancelSignal::new());

        let mut sink = Vec::new();
        adapter.write(&[PageRange::ALL], &mut sink);
        let outcome = adapter.write(&[PageRange::ALL], &mut Vec::new());
        assert!(matches!(outcome, WriteOutcome::Failed(_)));
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn ranges_excluding_the_page_are_rejected() {
        let (mut adapter, dir) = stored_adapter(6, 6);
        adapter.layout(None, &PrintAttributes::default(), &CancelSignal::new());

        let later_pages = PageRange { start: 1, end: 3 };
        let outcome = adapter.write(&[later_pages], &mut Vec::new());
        match outcome {
            WriteOutcome::Failed(reason) => assert!(reason.contains("exclude")),
            other => panic!("unexpected outcome: {:?}", other),
        }
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn failing_sink_surfaces_the_cause() {
        let (mut adapter, dir) = stored_adapter(6, 6);
        adapter.layout(None, &PrintAttributes::default(), &CancelSignal::new());

        let outcome = adapter.write(&[PageRange::ALL], &mut FailingSink);
        match outcome {
            WriteOutcome::Failed(reason) => assert!(reason.contains("deliver document")),
            other => panic!("unexpected outcome: {:?}", other),
        }
        let _ = std::fs::remove_dir_all(dir);
    }
}
