//! Display list and the pixel canvas that executes it.

use super::text::{ShapedText, TextEngine};
use crate::layout::Color;
use image::{imageops, Rgba, RgbaImage};
use std::sync::Arc;

/// One drawing operation in device pixels.
#[derive(Debug)]
pub enum DrawCommand {
    /// Draw a filled rectangle
    FillRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Color,
    },

    /// Draw shaped text with its top-left corner at (x, y)
    Text { x: f32, y: f32, text: ShapedText },

    /// Draw a bitmap scaled to cover the box
    Image {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        bitmap: Arc<RgbaImage>,
    },

    /// Draw a bitmap stretched over the box
    Stretch {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        bitmap: Arc<RgbaImage>,
    },
}

/// RGBA pixel canvas.
pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    /// Create a canvas filled with `background`.
    pub fn new(width: u32, height: u32, background: Color) -> Self {
        let fill = Rgba([background.r, background.g, background.b, background.a]);
        Self {
            image: RgbaImage::from_pixel(width, height, fill),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Consume the canvas, returning its pixels.
    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Execute a display list in order.
    pub fn execute(&mut self, commands: &[DrawCommand], text: &mut TextEngine) {
        for command in commands {
            match command {
                DrawCommand::FillRect {
                    x,
                    y,
                    width,
                    height,
                    color,
                } => self.fill_rect(*x, *y, *width, *height, *color),
                DrawCommand::Text { x, y, text: shaped } => {
                    let (ox, oy) = (x.round() as i32, y.round() as i32);
                    text.draw(shaped, |gx, gy, w, h, color| {
                        self.blend_span(ox + gx, oy + gy, w, h, color);
                    });
                }
                DrawCommand::Image {
                    x,
                    y,
                    width,
                    height,
                    bitmap,
                } => self.draw_cover(bitmap, *x, *y, *width, *height),
                DrawCommand::Stretch {
                    x,
                    y,
                    width,
                    height,
                    bitmap,
                } => self.draw_stretch(bitmap, *x, *y, *width, *height),
            }
        }
    }

    /// Fill a rectangle, blending by the colour's alpha. Coordinates are
    /// rounded to whole pixels and clipped to the canvas.
    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color) {
        let x0 = x.round() as i32;
        let y0 = y.round() as i32;
        let x1 = (x + width).round() as i32;
        let y1 = (y + height).round() as i32;
        self.blend_span(x0, y0, (x1 - x0).max(0) as u32, (y1 - y0).max(0) as u32, color);
    }

    fn blend_span(&mut self, x: i32, y: i32, w: u32, h: u32, color: Color) {
        if color.a == 0 || w == 0 || h == 0 {
            return;
        }
        let (cw, ch) = (self.image.width() as i64, self.image.height() as i64);
        let x0 = (x as i64).clamp(0, cw);
        let y0 = (y as i64).clamp(0, ch);
        let x1 = (x as i64 + w as i64).clamp(0, cw);
        let y1 = (y as i64 + h as i64).clamp(0, ch);

        for py in y0..y1 {
            for px in x0..x1 {
                let pixel = self.image.get_pixel_mut(px as u32, py as u32);
                blend(pixel, color);
            }
        }
    }

    /// Draw `bitmap` scaled to cover the box, cropping the overflow evenly.
    ///
    /// The crop is taken from the source before scaling, so no intermediate
    /// image is ever larger than the source or the box.
    pub fn draw_cover(&mut self, bitmap: &RgbaImage, x: f32, y: f32, width: f32, height: f32) {
        let (tw, th) = (width.round().max(1.0) as u32, height.round().max(1.0) as u32);
        let Some((cx, cy, cw, ch)) = cover_crop(bitmap.width(), bitmap.height(), tw, th) else {
            return;
        };
        let region = imageops::crop_imm(bitmap, cx, cy, cw, ch).to_image();
        let scaled = imageops::resize(&region, tw, th, imageops::FilterType::Triangle);
        self.composite(&scaled, x.round() as i64, y.round() as i64);
    }

    /// Draw `bitmap` stretched to exactly fill the box.
    pub fn draw_stretch(&mut self, bitmap: &RgbaImage, x: f32, y: f32, width: f32, height: f32) {
        let (tw, th) = (width.round().max(1.0) as u32, height.round().max(1.0) as u32);
        if bitmap.width() == 0 || bitmap.height() == 0 {
            return;
        }
        let scaled = imageops::resize(bitmap, tw, th, imageops::FilterType::Triangle);
        self.composite(&scaled, x.round() as i64, y.round() as i64);
    }

    fn composite(&mut self, source: &RgbaImage, x: i64, y: i64) {
        for (sx, sy, pixel) in source.enumerate_pixels() {
            let px = x + sx as i64;
            let py = y + sy as i64;
            if px < 0 || py < 0 || px >= self.image.width() as i64 || py >= self.image.height() as i64 {
                continue;
            }
            let [r, g, b, a] = pixel.0;
            blend(
                self.image.get_pixel_mut(px as u32, py as u32),
                Color::rgba(r, g, b, a),
            );
        }
    }
}

/// Centred region of a `bw`x`bh` source with the aspect ratio of a
/// `tw`x`th` box, as (x, y, width, height). None for an empty source.
fn cover_crop(bw: u32, bh: u32, tw: u32, th: u32) -> Option<(u32, u32, u32, u32)> {
    if bw == 0 || bh == 0 || tw == 0 || th == 0 {
        return None;
    }
    // Compare bw/bh with tw/th without dividing.
    let (cw, ch) = if bw as u64 * th as u64 > bh as u64 * tw as u64 {
        let cw = (bh as f64 * tw as f64 / th as f64).round() as u32;
        (cw.clamp(1, bw), bh)
    } else {
        let ch = (bw as f64 * th as f64 / tw as f64).round() as u32;
        (bw, ch.clamp(1, bh))
    };
    Some(((bw - cw) / 2, (bh - ch) / 2, cw, ch))
}

/// Source-over blend onto an opaque destination.
fn blend(dst: &mut Rgba<u8>, src: Color) {
    match src.a {
        0 => {}
        255 => *dst = Rgba([src.r, src.g, src.b, 255]),
        a => {
            let a = a as u32;
            let inv = 255 - a;
            let mix = |s: u8, d: u8| ((s as u32 * a + d as u32 * inv + 127) / 255) as u8;
            *dst = Rgba([
                mix(src.r, dst[0]),
                mix(src.g, dst[1]),
                mix(src.b, dst[2]),
                255,
            ]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INK: Color = Color::rgb(0, 0, 0);

    // ========== Canvas tests ==========

    #[test]
    fn test_new_canvas_is_filled() {
        let canvas = Canvas::new(4, 3, Color::WHITE);
        assert_eq!(canvas.width(), 4);
        assert_eq!(canvas.height(), 3);
        let image = canvas.into_image();
        assert!(image.pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn test_fill_rect_opaque() {
        let mut canvas = Canvas::new(10, 10, Color::WHITE);
        canvas.fill_rect(2.0, 3.0, 4.0, 2.0, INK);
        let image = canvas.into_image();

        assert_eq!(image.get_pixel(2, 3).0, [0, 0, 0, 255]);
        assert_eq!(image.get_pixel(5, 4).0, [0, 0, 0, 255]);
        assert_eq!(image.get_pixel(6, 4).0, [255, 255, 255, 255]);
        assert_eq!(image.get_pixel(2, 5).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_fill_rect_blends_alpha() {
        let mut canvas = Canvas::new(1, 1, Color::WHITE);
        canvas.fill_rect(0.0, 0.0, 1.0, 1.0, Color::rgba(0, 0, 0, 128));
        let pixel = canvas.into_image().get_pixel(0, 0).0;
        assert_eq!(pixel, [127, 127, 127, 255]);
    }

    #[test]
    fn test_fill_rect_clips_to_canvas() {
        let mut canvas = Canvas::new(4, 4, Color::WHITE);
        canvas.fill_rect(-10.0, -10.0, 12.0, 100.0, INK);
        let image = canvas.into_image();
        assert_eq!(image.get_pixel(1, 3).0, [0, 0, 0, 255]);
        assert_eq!(image.get_pixel(2, 0).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_transparent_fill_is_noop() {
        let mut canvas = Canvas::new(2, 2, Color::WHITE);
        canvas.fill_rect(0.0, 0.0, 2.0, 2.0, Color::rgba(0, 0, 0, 0));
        assert!(canvas.into_image().pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn test_draw_cover_fills_box() {
        let bitmap = RgbaImage::from_pixel(10, 40, Rgba([200, 0, 0, 255]));
        let mut canvas = Canvas::new(20, 20, Color::WHITE);
        canvas.draw_cover(&bitmap, 5.0, 5.0, 10.0, 10.0);
        let image = canvas.into_image();

        assert_eq!(image.get_pixel(5, 5).0, [200, 0, 0, 255]);
        assert_eq!(image.get_pixel(14, 14).0, [200, 0, 0, 255]);
        assert_eq!(image.get_pixel(15, 15).0, [255, 255, 255, 255]);
        assert_eq!(image.get_pixel(4, 5).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_draw_cover_keeps_centre_of_tall_source() {
        let mut bitmap = RgbaImage::from_pixel(10, 40, Rgba([200, 0, 0, 255]));
        for y in 20..40 {
            for x in 0..10 {
                bitmap.put_pixel(x, y, Rgba([0, 0, 200, 255]));
            }
        }
        let mut canvas = Canvas::new(10, 10, Color::WHITE);
        canvas.draw_cover(&bitmap, 0.0, 0.0, 10.0, 10.0);
        let image = canvas.into_image();

        assert_eq!(image.get_pixel(5, 0).0, [200, 0, 0, 255]);
        assert_eq!(image.get_pixel(5, 9).0, [0, 0, 200, 255]);
    }

    #[test]
    fn test_draw_cover_sliver_photo_stays_small() {
        // A 1x5000 photo in the 240x300 photo box used at scale 2.
        let bitmap = RgbaImage::from_pixel(1, 5000, Rgba([10, 120, 60, 255]));
        let mut canvas = Canvas::new(260, 320, Color::WHITE);

        let start = std::time::Instant::now();
        canvas.draw_cover(&bitmap, 10.0, 10.0, 240.0, 300.0);
        assert!(start.elapsed() < std::time::Duration::from_secs(5));

        let image = canvas.into_image();
        assert_eq!(image.get_pixel(10, 10).0, [10, 120, 60, 255]);
        assert_eq!(image.get_pixel(249, 309).0, [10, 120, 60, 255]);
        assert_eq!(image.get_pixel(250, 310).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_cover_crop_regions() {
        assert_eq!(cover_crop(1, 5000, 240, 300), Some((0, 2499, 1, 1)));
        assert_eq!(cover_crop(400, 100, 100, 100), Some((150, 0, 100, 100)));
        assert_eq!(cover_crop(10, 40, 10, 10), Some((0, 15, 10, 10)));
        assert_eq!(cover_crop(0, 10, 10, 10), None);
    }

    #[test]
    fn test_draw_stretch_fills_box() {
        let bitmap = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 90, 255]));
        let mut canvas = Canvas::new(8, 8, Color::WHITE);
        canvas.draw_stretch(&bitmap, 0.0, 0.0, 8.0, 4.0);
        let image = canvas.into_image();
        assert_eq!(image.get_pixel(7, 3).0, [0, 0, 90, 255]);
        assert_eq!(image.get_pixel(7, 4).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_execute_runs_commands_in_order() {
        let Some(mut text) = super::super::text::tests::system_engine() else {
            return;
        };
        let mut canvas = Canvas::new(4, 4, Color::WHITE);
        let commands = vec![
            DrawCommand::FillRect {
                x: 0.0,
                y: 0.0,
                width: 4.0,
                height: 4.0,
                color: INK,
            },
            DrawCommand::FillRect {
                x: 0.0,
                y: 0.0,
                width: 2.0,
                height: 4.0,
                color: Color::WHITE,
            },
        ];
        canvas.execute(&commands, &mut text);
        let image = canvas.into_image();
        assert_eq!(image.get_pixel(0, 0).0, [255, 255, 255, 255]);
        assert_eq!(image.get_pixel(3, 0).0, [0, 0, 0, 255]);
    }
}
