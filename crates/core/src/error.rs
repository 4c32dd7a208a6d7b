//! Error types for CV rendering and export.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the cv-export library.
#[derive(Error, Debug)]
pub enum ExportError {
    /// The raster engine is still loading its fonts.
    #[error("Rendering engine is not ready yet, try again in a moment")]
    EngineNotReady,

    /// The raster engine failed to initialize.
    #[error("Rendering engine failed to initialize: {0}")]
    EngineFailed(String),

    /// Rasterizing the render target failed.
    #[error("Rasterization failed: {0}")]
    RasterizationFailed(String),

    /// The render target would exceed the canvas size limit.
    #[error("Canvas of {width}x{height} pixels exceeds the {limit} pixel limit")]
    CanvasTooLarge { width: u32, height: u32, limit: u32 },

    /// PDF assembly failed.
    #[error("PDF encoding failed: {0}")]
    PdfEncodingError(String),

    /// JPEG encoding of a page slice failed.
    #[error("JPEG encoding failed: {0}")]
    JpegEncodingError(String),

    /// PNG encoding failed.
    #[error("PNG encoding failed: {0}")]
    PngEncodingError(String),

    /// No print or open command is available on this host.
    #[error("No print command found. Configure print.command or install xdg-open/lp")]
    PrintCommandNotFound,

    /// The print command exited unsuccessfully.
    #[error("Print command '{}' failed: {message}", .command.display())]
    PrintFailed { command: PathBuf, message: String },

    /// The print command did not return in time.
    #[error("Print command timed out after {timeout_secs} seconds")]
    PrintTimeout { timeout_secs: u64 },

    /// Output directory or file could not be written.
    #[error("Failed to write output '{}': {message}", .path.display())]
    OutputDirError { path: PathBuf, message: String },

    /// CV content could not be loaded.
    #[error("Failed to load CV content: {0}")]
    ContentLoad(String),

    /// An image asset could not be read.
    #[error("Failed to load image asset: {0}")]
    AssetLoad(String),

    /// Pdfium library error.
    #[error("Pdfium error: {0}")]
    PdfiumError(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for convenience.
pub type Result<T> = std::result::Result<T, ExportError>;

impl From<tokio::task::JoinError> for ExportError {
    fn from(err: tokio::task::JoinError) -> Self {
        ExportError::RasterizationFailed(format!("worker task failed: {}", err))
    }
}
