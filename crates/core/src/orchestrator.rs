//! Export orchestration.
//!
//! The orchestrator owns the content, the photo slot and one backend per
//! [`ExportStrategy`]. Raster exports (PDF and image) are serialized by a
//! busy flag: a request that arrives while another raster export is running
//! is rejected, not queued. Print hand-offs bypass the flag.

use crate::asset::PhotoSlot;
use crate::config::ExportConfig;
use crate::content::CvContent;
use crate::error::ExportError;
use crate::export::{
    Artifact, ExportBackend, ExportStrategy, ExportTarget, PdfBackend, PngBackend, PrintBackend,
};
use crate::layout::{render, RenderMode, RenderTree};
use crate::preload::wait_for_images;
use crate::raster::{EngineHandle, EngineRasterizer, Rasterizer};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, info_span, Instrument};
use uuid::Uuid;

/// Receives user-facing failure notices.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Notifier that reports through the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        error!("{}", message);
    }
}

/// Result of one export request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// The backend produced a file.
    Completed(Artifact),
    /// Another raster export was in progress.
    Rejected,
    /// The export failed; the notifier has been told why.
    Failed(String),
}

impl ExportOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, ExportOutcome::Completed(_))
    }

    pub fn artifact(&self) -> Option<&Artifact> {
        match self {
            ExportOutcome::Completed(artifact) => Some(artifact),
            _ => None,
        }
    }
}

/// Export counters since the orchestrator was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrchestratorStats {
    pub completed: usize,
    pub failed: usize,
    pub rejected: usize,
}

/// Holds the busy flag for the lifetime of one raster export.
struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Coordinates rendering, preloading and the export backends.
pub struct ExportOrchestrator {
    content: Arc<CvContent>,
    photo: PhotoSlot,
    config: ExportConfig,
    pdf: Arc<dyn ExportBackend>,
    image: Arc<dyn ExportBackend>,
    print: Arc<dyn ExportBackend>,
    notifier: Arc<dyn Notifier>,
    busy: AtomicBool,
    completed: AtomicUsize,
    failed: AtomicUsize,
    rejected: AtomicUsize,
}

impl std::fmt::Debug for ExportOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportOrchestrator")
            .field("name", &self.content.name)
            .field("has_photo", &self.photo.current().is_some())
            .field("busy", &self.is_busy())
            .field("stats", &self.stats())
            .finish()
    }
}

impl ExportOrchestrator {
    /// Create an orchestrator with the default backends, all sharing one
    /// rasterizer on `engine`.
    pub fn new(content: CvContent, config: ExportConfig, engine: EngineHandle) -> Self {
        let rasterizer: Arc<dyn Rasterizer> = Arc::new(EngineRasterizer::new(engine));
        Self {
            content: Arc::new(content),
            photo: PhotoSlot::new(),
            config,
            pdf: Arc::new(PdfBackend::new(Arc::clone(&rasterizer))),
            image: Arc::new(PngBackend::new(rasterizer)),
            print: Arc::new(PrintBackend::new()),
            notifier: Arc::new(LogNotifier),
            busy: AtomicBool::new(false),
            completed: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            rejected: AtomicUsize::new(0),
        }
    }

    /// Share an existing photo slot.
    pub fn with_photo_slot(mut self, photo: PhotoSlot) -> Self {
        self.photo = photo;
        self
    }

    /// Replace the failure notifier.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Replace the backend registered for `backend.strategy()`.
    pub fn with_backend(mut self, backend: Arc<dyn ExportBackend>) -> Self {
        match backend.strategy() {
            ExportStrategy::Pdf => self.pdf = backend,
            ExportStrategy::Image => self.image = backend,
            ExportStrategy::Print => self.print = backend,
        }
        self
    }

    pub fn content(&self) -> &CvContent {
        &self.content
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// The photo slot; setting a photo here affects later renders.
    pub fn photo(&self) -> &PhotoSlot {
        &self.photo
    }

    /// Whether a raster export is in progress.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> OrchestratorStats {
        OrchestratorStats {
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }

    /// The live on-screen view: one flowing page with the current photo.
    pub fn render_preview(&self) -> RenderTree {
        let photo = self.photo.current();
        render(&self.content, photo.as_ref(), RenderMode::Preview, &self.config)
    }

    /// Export the paginated document as a PDF.
    pub async fn export_pdf(&self) -> ExportOutcome {
        self.export_raster(ExportStrategy::Pdf).await
    }

    /// Export the paginated document as a single PNG.
    pub async fn export_image(&self) -> ExportOutcome {
        self.export_raster(ExportStrategy::Image).await
    }

    /// Hand the preview document to the host print pipeline.
    ///
    /// Not gated by the busy flag, so it may run alongside a raster export.
    pub async fn export_via_print(&self) -> ExportOutcome {
        let job_id = Uuid::new_v4();
        let span = info_span!("export", job = %job_id, strategy = %ExportStrategy::Print);
        async {
            let target = ExportTarget::new(self.render_preview(), self.content.name.clone());
            let result = self.print.render(&target, &self.config).await;
            self.finish(ExportStrategy::Print, result)
        }
        .instrument(span)
        .await
    }

    /// Run an export with the strategy's backend.
    pub async fn export(&self, strategy: ExportStrategy) -> ExportOutcome {
        match strategy {
            ExportStrategy::Print => self.export_via_print().await,
            raster => self.export_raster(raster).await,
        }
    }

    async fn export_raster(&self, strategy: ExportStrategy) -> ExportOutcome {
        let Some(_guard) = BusyGuard::acquire(&self.busy) else {
            debug!("{} export rejected: another export is in progress", strategy);
            self.rejected.fetch_add(1, Ordering::Relaxed);
            return ExportOutcome::Rejected;
        };

        let job_id = Uuid::new_v4();
        let span = info_span!("export", job = %job_id, strategy = %strategy);
        async {
            let start = Instant::now();
            let photo = self.photo.current();
            let tree = render(&self.content, photo.as_ref(), RenderMode::Export, &self.config);

            let report = wait_for_images(&tree).await;
            debug!(
                "Preloaded {} image(s), {} failed",
                report.total, report.failed
            );

            if !self.config.settle_delay.is_zero() {
                tokio::time::sleep(self.config.settle_delay).await;
            }

            let backend = match strategy {
                ExportStrategy::Pdf => &self.pdf,
                ExportStrategy::Image => &self.image,
                ExportStrategy::Print => &self.print,
            };
            let target = ExportTarget::new(tree, self.content.name.clone());
            let result = backend.render(&target, &self.config).await;
            debug!("{} export finished in {:?}", strategy, start.elapsed());
            self.finish(strategy, result)
        }
        .instrument(span)
        .await
    }

    fn finish(
        &self,
        strategy: ExportStrategy,
        result: Result<Artifact, ExportError>,
    ) -> ExportOutcome {
        match result {
            Ok(artifact) => {
                info!("{} export written to {:?}", strategy, artifact.path);
                self.completed.fetch_add(1, Ordering::Relaxed);
                ExportOutcome::Completed(artifact)
            }
            Err(e) => {
                let message = format!("{} export failed: {}", strategy, e);
                self.notifier.notify(&message);
                self.failed.fetch_add(1, Ordering::Relaxed);
                ExportOutcome::Failed(message)
            }
        }
    }
}
