//! Rasterization of render trees into RGBA bitmaps.

pub mod engine;
pub mod flow;
pub mod paint;
pub mod text;

pub use engine::{Engine, EngineHandle, EngineState};

use crate::error::{ExportError, Result};
use crate::layout::{Color, RenderTree};
use image::RgbaImage;
use paint::Canvas;
use std::time::Instant;
use tracing::{debug, info};

/// Largest canvas side the rasterizer will allocate, in pixels.
pub const MAX_CANVAS_DIMENSION: u32 = 32767;

/// A rasterized tree.
#[derive(Debug, Clone)]
pub struct RasterOutput {
    pub image: RgbaImage,
    /// Rows at which each page after the first begins.
    pub page_breaks: Vec<u32>,
}

impl RasterOutput {
    /// Row ranges `[start, end)` of each page block, in order.
    pub fn page_spans(&self) -> Vec<(u32, u32)> {
        let mut bounds = vec![0];
        bounds.extend(
            self.page_breaks
                .iter()
                .copied()
                .filter(|&b| b > 0 && b < self.image.height()),
        );
        bounds.push(self.image.height());
        bounds
            .windows(2)
            .filter(|w| w[1] > w[0])
            .map(|w| (w[0], w[1]))
            .collect()
    }
}

/// Turns a render tree into pixels.
pub trait Rasterizer: Send + Sync {
    /// Rasterize `tree` at `scale` device pixels per CSS pixel.
    fn rasterize(&self, tree: &RenderTree, scale: f32) -> Result<RasterOutput>;
}

/// The default rasterizer: cosmic-text shaping and an in-memory canvas.
#[derive(Debug, Clone)]
pub struct EngineRasterizer {
    engine: EngineHandle,
}

impl EngineRasterizer {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &EngineHandle {
        &self.engine
    }
}

impl Rasterizer for EngineRasterizer {
    fn rasterize(&self, tree: &RenderTree, scale: f32) -> Result<RasterOutput> {
        let engine = self.engine.get()?;
        let start = Instant::now();
        let mut text = engine.text();

        let list = flow::layout(tree, &mut text, scale);
        debug!(
            "Laid out {} tree: {}x{} px, {} draw commands",
            tree.mode,
            list.width,
            list.height,
            list.commands.len()
        );

        if list.width == 0 || list.height == 0 {
            return Err(ExportError::RasterizationFailed(
                "render tree has no area".to_string(),
            ));
        }
        if list.width > MAX_CANVAS_DIMENSION || list.height > MAX_CANVAS_DIMENSION {
            return Err(ExportError::CanvasTooLarge {
                width: list.width,
                height: list.height,
                limit: MAX_CANVAS_DIMENSION,
            });
        }

        let mut canvas = Canvas::new(list.width, list.height, Color::WHITE);
        canvas.execute(&list.commands, &mut text);

        info!(
            "Rasterized {}x{} px in {:?}",
            list.width,
            list.height,
            start.elapsed()
        );
        Ok(RasterOutput {
            image: canvas.into_image(),
            page_breaks: list.page_breaks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExportConfig;
    use crate::content::CvContent;
    use crate::layout::{render, RenderMode};

    fn output(height: u32, breaks: Vec<u32>) -> RasterOutput {
        RasterOutput {
            image: RgbaImage::new(1, height),
            page_breaks: breaks,
        }
    }

    // ========== RasterOutput tests ==========

    #[test]
    fn test_page_spans_without_breaks() {
        assert_eq!(output(100, vec![]).page_spans(), vec![(0, 100)]);
    }

    #[test]
    fn test_page_spans_split_at_breaks() {
        assert_eq!(
            output(300, vec![100, 250]).page_spans(),
            vec![(0, 100), (100, 250), (250, 300)]
        );
    }

    #[test]
    fn test_page_spans_ignore_degenerate_breaks() {
        assert_eq!(
            output(100, vec![0, 50, 50, 100, 400]).page_spans(),
            vec![(0, 50), (50, 100)]
        );
    }

    // ========== EngineRasterizer tests ==========

    #[test]
    fn test_not_ready_engine_is_reported() {
        let rasterizer = EngineRasterizer::new(EngineHandle::with_state(EngineState::Loading));
        let tree = render(
            &CvContent::sample(),
            None,
            RenderMode::Export,
            &ExportConfig::default(),
        );
        assert!(matches!(
            rasterizer.rasterize(&tree, 2.0),
            Err(ExportError::EngineNotReady)
        ));
    }

    #[test]
    fn test_canvas_limit_enforced() {
        let Ok(engine) = Engine::load(&ExportConfig::default().fonts) else {
            return;
        };
        let rasterizer = EngineRasterizer::new(EngineHandle::ready(engine));
        let tree = render(
            &CvContent::sample(),
            None,
            RenderMode::Export,
            &ExportConfig::default(),
        );
        // Two A4 pages at scale 8 are about 18000 px tall; scale 20 overflows.
        assert!(matches!(
            rasterizer.rasterize(&tree, 20.0),
            Err(ExportError::CanvasTooLarge { limit: 32767, .. })
        ));
    }

    #[test]
    fn test_rasterize_export_tree() {
        let Ok(engine) = Engine::load(&ExportConfig::default().fonts) else {
            return;
        };
        let rasterizer = EngineRasterizer::new(EngineHandle::ready(engine));
        let tree = render(
            &CvContent::sample(),
            None,
            RenderMode::Export,
            &ExportConfig::default(),
        );
        let output = rasterizer.rasterize(&tree, 1.0).unwrap();

        assert_eq!(output.image.width(), 794);
        assert_eq!(output.page_breaks.len(), 1);
        assert_eq!(output.page_spans().len(), 2);
        // Accent bar across the top of the first page.
        assert_eq!(output.image.get_pixel(400, 2).0, [30, 41, 59, 255]);
    }
}
