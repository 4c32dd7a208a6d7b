//! PNG backend: the whole export target as one lossless image.

use super::{write_output, Artifact, ExportBackend, ExportStrategy, ExportTarget};
use crate::config::ExportConfig;
use crate::error::{ExportError, Result};
use crate::raster::Rasterizer;
use futures::future::BoxFuture;
use image::RgbaImage;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Writes `cv.png` from a rasterized export tree.
pub struct PngBackend {
    rasterizer: Arc<dyn Rasterizer>,
}

impl PngBackend {
    pub fn new(rasterizer: Arc<dyn Rasterizer>) -> Self {
        Self { rasterizer }
    }

    async fn export(&self, target: &ExportTarget, config: &ExportConfig) -> Result<Artifact> {
        let start = Instant::now();
        let scale = config.raster.scale;
        let level = config.raster.png_compression;
        let tree = target.tree.clone();
        let rasterizer = Arc::clone(&self.rasterizer);

        let (data, width, height) = tokio::task::spawn_blocking(move || {
            let raster = rasterizer.rasterize(&tree, scale)?;
            let (width, height) = raster.image.dimensions();
            encode_png(&raster.image, level).map(|data| (data, width, height))
        })
        .await??;

        let path = config.output.image_path();
        write_output(&path, &data).await?;

        info!(
            "Image export wrote {}x{} px, {} bytes to {:?} in {:?}",
            width,
            height,
            data.len(),
            path,
            start.elapsed()
        );
        Ok(Artifact {
            strategy: ExportStrategy::Image,
            path,
            bytes: data.len(),
            pages: 1,
            dimensions: Some((width, height)),
        })
    }
}

impl ExportBackend for PngBackend {
    fn strategy(&self) -> ExportStrategy {
        ExportStrategy::Image
    }

    fn render<'a>(
        &'a self,
        target: &'a ExportTarget,
        config: &'a ExportConfig,
    ) -> BoxFuture<'a, Result<Artifact>> {
        Box::pin(self.export(target, config))
    }
}

fn compression_for(level: u8) -> ::png::Compression {
    match level {
        0..=2 => ::png::Compression::Fast,
        3..=6 => ::png::Compression::Default,
        _ => ::png::Compression::Best,
    }
}

/// Encode an RGBA image as PNG. `level` is 0-9; higher is smaller and slower.
pub fn encode_png(image: &RgbaImage, level: u8) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();

    let mut encoder = ::png::Encoder::new(&mut buffer, image.width(), image.height());
    encoder.set_color(::png::ColorType::Rgba);
    encoder.set_depth(::png::BitDepth::Eight);
    encoder.set_compression(compression_for(level));

    let mut writer = encoder.write_header().map_err(|e| {
        ExportError::PngEncodingError(format!("Failed to write PNG header: {}", e))
    })?;

    writer.write_image_data(image.as_raw()).map_err(|e| {
        ExportError::PngEncodingError(format!("Failed to write PNG data: {}", e))
    })?;

    writer
        .finish()
        .map_err(|e| ExportError::PngEncodingError(format!("Failed to finish PNG: {}", e)))?;

    Ok(buffer)
}
