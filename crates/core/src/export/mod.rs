//! Export backends.
//!
//! Every backend takes the same render target and produces one file. The
//! orchestrator picks a backend by [`ExportStrategy`] and treats them all
//! alike.

pub mod pdf;
pub mod png;
pub mod print;

pub use self::pdf::PdfBackend;
pub use self::png::PngBackend;
pub use self::print::PrintBackend;

use crate::config::ExportConfig;
use crate::error::{ExportError, Result};
use crate::layout::RenderTree;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Output format of an export.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportStrategy {
    Pdf,
    Image,
    Print,
}

impl fmt::Display for ExportStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportStrategy::Pdf => write!(f, "PDF"),
            ExportStrategy::Image => write!(f, "Image"),
            ExportStrategy::Print => write!(f, "Print"),
        }
    }
}

/// What a backend renders: a tree plus document metadata.
#[derive(Debug, Clone)]
pub struct ExportTarget {
    pub tree: RenderTree,
    /// Document title, normally the person's name.
    pub title: String,
}

impl ExportTarget {
    pub fn new(tree: RenderTree, title: impl Into<String>) -> Self {
        Self {
            tree,
            title: title.into(),
        }
    }
}

/// A file produced by an export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub strategy: ExportStrategy,
    pub path: PathBuf,
    /// File size in bytes.
    pub bytes: usize,
    /// Number of pages (1 for a single image).
    pub pages: usize,
    /// Raster dimensions in pixels, for raster outputs.
    pub dimensions: Option<(u32, u32)>,
}

/// A way of turning a render target into a file.
pub trait ExportBackend: Send + Sync {
    fn strategy(&self) -> ExportStrategy;

    fn render<'a>(
        &'a self,
        target: &'a ExportTarget,
        config: &'a ExportConfig,
    ) -> BoxFuture<'a, Result<Artifact>>;
}

/// Write `data` to `path`, creating the parent directory if needed.
pub(crate) async fn write_output(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ExportError::OutputDirError {
                path: parent.to_path_buf(),
                message: e.to_string(),
            })?;
    }
    tokio::fs::write(path, data)
        .await
        .map_err(|e| ExportError::OutputDirError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    debug!("Wrote {} bytes to {:?}", data.len(), path);
    Ok(())
}
