//! # cv-export-core
//!
//! Renders a two-page A4 CV from structured content and exports it.
//!
//! The pipeline:
//!
//! - **layout** turns [`CvContent`] into a [`RenderTree`], either one
//!   flowing preview page or two fixed A4 page blocks for export
//! - **preload** waits until every image the tree references has decoded
//! - **raster** shapes text with cosmic-text and paints the tree to pixels
//! - **export** writes a PDF (one JPEG per page), a PNG, or hands an HTML
//!   document to the host's print command
//! - **orchestrator** ties it together and rejects overlapping raster exports
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cv_export_core::{CvContent, EngineHandle, ExportConfig, ExportOrchestrator, ExportOutcome};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ExportConfig::default().output_dir("./out");
//!     let engine = EngineHandle::spawn(config.fonts.clone());
//!     engine.wait_ready().await?;
//!
//!     let orchestrator = ExportOrchestrator::new(CvContent::sample(), config, engine);
//!     if let ExportOutcome::Completed(artifact) = orchestrator.export_pdf().await {
//!         println!("Wrote {} pages to {:?}", artifact.pages, artifact.path);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Reviewing an exported PDF
//!
//! ```rust,no_run
//! use cv_export_core::review::{score, PdfScanner};
//! use cv_export_core::CvContent;
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let scanner = PdfScanner::new()?;
//!     let ink = scanner.scan(Path::new("out/cv.pdf"))?;
//!     for category in score(&CvContent::sample(), Some(&ink), "cv.pdf") {
//!         println!("{:?}: {}", category.category, category.score);
//!     }
//!     Ok(())
//! }
//! ```

pub mod asset;
pub mod config;
pub mod content;
pub mod error;
pub mod export;
pub mod html;
pub mod layout;
pub mod orchestrator;
pub mod preload;
pub mod raster;
pub mod review;

// Re-export main types for convenience
pub use asset::{ImageAsset, LoadState, PhotoSlot, ProfileAsset};
pub use config::{
    ExportConfig, FontConfig, Labels, OutputConfig, PageGeometry, PrintConfig, RasterConfig,
};
pub use content::{Contact, CvContent, Degree, Job, Skills};
pub use error::{ExportError, Result};
pub use export::{Artifact, ExportBackend, ExportStrategy, ExportTarget};
pub use layout::{render, PaginationPolicy, RenderMode, RenderTree};
pub use orchestrator::{ExportOrchestrator, ExportOutcome, LogNotifier, Notifier, OrchestratorStats};
pub use preload::{wait_for_images, PreloadReport};
pub use raster::{EngineHandle, EngineRasterizer, EngineState, RasterOutput, Rasterizer};

/// Initialize the library's logging.
/// Call this once at application startup if you want to see logs.
pub fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();
}
