//! Rasterize the first page of an existing PDF with pdfium.

use super::ink::InkStats;
use crate::error::{ExportError, Result};
use image::RgbaImage;
use pdfium_render::prelude::*;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Pixels per PDF point used for the scan.
pub const SCAN_SCALE: f32 = 1.5;

/// Reads PDFs through a bound pdfium library.
pub struct PdfScanner {
    pdfium: Pdfium,
}

impl PdfScanner {
    /// Bind pdfium from the working directory, the usual library
    /// directories, or the system loader path, in that order.
    pub fn new() -> Result<Self> {
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("/usr/lib"))
            })
            .or_else(|_| {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                    "/usr/local/lib",
                ))
            })
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| {
                ExportError::PdfiumError(format!("Failed to load pdfium library: {}", e))
            })?;

        debug!("Bound pdfium for PDF review");
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }

    /// Render page 1 of the PDF at `path`.
    pub fn render_first_page(&self, path: &Path) -> Result<RgbaImage> {
        let document = self
            .pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| ExportError::PdfiumError(format!("Failed to load PDF: {}", e)))?;
        render_page_one(&document)
    }

    /// Render page 1 of an in-memory PDF.
    pub fn render_first_page_bytes(&self, data: &[u8]) -> Result<RgbaImage> {
        let document = self
            .pdfium
            .load_pdf_from_byte_slice(data, None)
            .map_err(|e| ExportError::PdfiumError(format!("Failed to load PDF: {}", e)))?;
        render_page_one(&document)
    }

    /// Measure ink density and margins on page 1 of the PDF at `path`.
    pub fn scan(&self, path: &Path) -> Result<InkStats> {
        let start = Instant::now();
        let image = self.render_first_page(path)?;
        let stats = InkStats::scan(&image);
        info!(
            "Scanned {:?}: density {:.3}, margins {:.1}mm top / {:.1}mm left in {:?}",
            path,
            stats.density,
            stats.top_margin_mm,
            stats.left_margin_mm,
            start.elapsed()
        );
        Ok(stats)
    }
}

fn render_page_one(document: &PdfDocument<'_>) -> Result<RgbaImage> {
    let page = document
        .pages()
        .first()
        .map_err(|e| ExportError::PdfiumError(format!("PDF has no first page: {}", e)))?;

    let width = (page.width().value * SCAN_SCALE) as i32;
    let height = (page.height().value * SCAN_SCALE) as i32;
    let render_config = PdfRenderConfig::new()
        .set_target_width(width)
        .set_target_height(height)
        .rotate_if_landscape(PdfPageRenderRotation::None, false);

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| ExportError::PdfiumError(format!("Failed to render page 1: {}", e)))?;

    debug!("Rendered review page at {}x{}", width, height);
    Ok(bitmap.as_image().into_rgba8())
}
