//! PDF backend: rasterize, slice into pages, embed each page as a JPEG.
//!
//! The document is one image per page, so text in the output is not
//! selectable. Page blocks are cut at the tree's page-break markers; a block
//! taller than one page is cut again at page height and spills onto extra
//! pages.

use super::{write_output, Artifact, ExportBackend, ExportStrategy, ExportTarget};
use crate::config::{ExportConfig, PageGeometry};
use crate::error::{ExportError, Result};
use crate::raster::{RasterOutput, Rasterizer};
use futures::future::BoxFuture;
use image::codecs::jpeg::JpegEncoder;
use image::{imageops, DynamicImage, RgbaImage};
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref, TextStr};
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Rows of slack before a page block counts as overflowing.
const OVERFLOW_TOLERANCE: u32 = 2;

/// One JPEG-encoded page image.
#[derive(Debug, Clone)]
pub struct JpegPage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Writes `cv.pdf` from a rasterized export tree.
pub struct PdfBackend {
    rasterizer: Arc<dyn Rasterizer>,
}

impl PdfBackend {
    pub fn new(rasterizer: Arc<dyn Rasterizer>) -> Self {
        Self { rasterizer }
    }

    async fn export(&self, target: &ExportTarget, config: &ExportConfig) -> Result<Artifact> {
        let start = Instant::now();
        let scale = config.raster.scale;
        let tree = target.tree.clone();
        let rasterizer = Arc::clone(&self.rasterizer);
        let raster =
            tokio::task::spawn_blocking(move || rasterizer.rasterize(&tree, scale)).await??;

        let page_px = (target.tree.page_height * scale).round() as u32;
        let slices = slice_pages(&raster, page_px);
        debug!(
            "Cut {}x{} raster into {} page slice(s)",
            raster.image.width(),
            raster.image.height(),
            slices.len()
        );

        let quality = config.raster.jpeg_quality;
        let threads = config.raster.encode_threads;
        let pages = tokio::task::spawn_blocking(move || {
            encode_slices(&raster.image, &slices, quality, threads)
        })
        .await??;

        let data = assemble_pdf(&pages, &config.page, &target.title)?;
        let path = config.output.pdf_path();
        write_output(&path, &data).await?;

        info!(
            "PDF export wrote {} page(s), {} bytes to {:?} in {:?}",
            pages.len(),
            data.len(),
            path,
            start.elapsed()
        );
        Ok(Artifact {
            strategy: ExportStrategy::Pdf,
            path,
            bytes: data.len(),
            pages: pages.len(),
            dimensions: Some((
                pages.first().map(|p| p.width).unwrap_or(0),
                pages.first().map(|p| p.height).unwrap_or(0),
            )),
        })
    }
}

impl ExportBackend for PdfBackend {
    fn strategy(&self) -> ExportStrategy {
        ExportStrategy::Pdf
    }

    fn render<'a>(
        &'a self,
        target: &'a ExportTarget,
        config: &'a ExportConfig,
    ) -> BoxFuture<'a, Result<Artifact>> {
        Box::pin(self.export(target, config))
    }
}

/// Row ranges of each output page: one per page block, plus extra slices for
/// blocks taller than `page_px`.
pub fn slice_pages(raster: &RasterOutput, page_px: u32) -> Vec<(u32, u32)> {
    let page_px = page_px.max(1);
    let mut slices = Vec::new();

    for (index, (start, end)) in raster.page_spans().into_iter().enumerate() {
        let height = end - start;
        if height <= page_px + OVERFLOW_TOLERANCE {
            slices.push((start, end));
            continue;
        }

        let extra = (height - 1) / page_px;
        warn!(
            "Page block {} is {} px tall (page is {} px), spilling onto {} extra page(s)",
            index + 1,
            height,
            page_px,
            extra
        );
        let mut y = start;
        while y < end {
            let next = (y + page_px).min(end);
            slices.push((y, next));
            y = next;
        }
    }

    slices
}

/// JPEG-encode each slice in parallel.
pub fn encode_slices(
    image: &RgbaImage,
    slices: &[(u32, u32)],
    quality: u8,
    threads: usize,
) -> Result<Vec<JpegPage>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .build()
        .map_err(|e| ExportError::InvalidConfig(format!("Failed to create thread pool: {}", e)))?;

    pool.install(|| {
        slices
            .par_iter()
            .map(|&(start, end)| encode_jpeg(image, start, end, quality))
            .collect()
    })
}

fn encode_jpeg(image: &RgbaImage, start: u32, end: u32, quality: u8) -> Result<JpegPage> {
    let width = image.width();
    let height = end.saturating_sub(start);
    let slice = imageops::crop_imm(image, 0, start, width, height).to_image();
    let rgb = DynamicImage::ImageRgba8(slice).to_rgb8();

    let mut data = Vec::new();
    JpegEncoder::new_with_quality(&mut data, quality)
        .encode_image(&rgb)
        .map_err(|e| ExportError::JpegEncodingError(e.to_string()))?;

    Ok(JpegPage {
        data,
        width,
        height,
    })
}

/// Build a PDF with one A4 page per image, each image placed at the top of
/// the page at full content width.
pub fn assemble_pdf(pages: &[JpegPage], geometry: &PageGeometry, title: &str) -> Result<Vec<u8>> {
    if pages.is_empty() {
        return Err(ExportError::PdfEncodingError(
            "no pages to write".to_string(),
        ));
    }

    let page_w = PageGeometry::mm_to_pt(geometry.width_mm);
    let page_h = PageGeometry::mm_to_pt(geometry.height_mm);
    let margin = PageGeometry::mm_to_pt(geometry.margin_mm);
    let content_w = page_w - 2.0 * margin;

    let catalog_id = Ref::new(1);
    let tree_id = Ref::new(2);
    let info_id = Ref::new(3);
    let page_ids: Vec<Ref> = (0..pages.len()).map(|i| Ref::new(4 + 3 * i as i32)).collect();

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(tree_id);
    pdf.pages(tree_id)
        .kids(page_ids.iter().copied())
        .count(pages.len() as i32);

    let image_name = Name(b"Im1");
    for (page, &page_id) in pages.iter().zip(&page_ids) {
        let image_id = Ref::new(page_id.get() + 1);
        let content_id = Ref::new(page_id.get() + 2);

        let mut pdf_page = pdf.page(page_id);
        pdf_page.media_box(Rect::new(0.0, 0.0, page_w, page_h));
        pdf_page.parent(tree_id);
        pdf_page.contents(content_id);
        pdf_page.resources().x_objects().pair(image_name, image_id);
        pdf_page.finish();

        let mut image = pdf.image_xobject(image_id, &page.data);
        image.filter(Filter::DctDecode);
        image.width(page.width as i32);
        image.height(page.height as i32);
        image.color_space().device_rgb();
        image.bits_per_component(8);
        image.finish();

        let draw_h = content_w * page.height as f32 / page.width.max(1) as f32;
        let mut content = Content::new();
        content.save_state();
        content.transform([content_w, 0.0, 0.0, draw_h, margin, page_h - margin - draw_h]);
        content.x_object(image_name);
        content.restore_state();
        pdf.stream(content_id, &content.finish());
    }

    pdf.document_info(info_id)
        .title(TextStr(title))
        .producer(TextStr("cv-export"));

    Ok(pdf.finish())
}
