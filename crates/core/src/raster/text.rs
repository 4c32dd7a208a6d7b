//! Text shaping and glyph rasterization using cosmic-text.
//!
//! Text is shaped and line-broken at device resolution, so a paragraph laid
//! out at scale 2 wraps exactly as it would at scale 1 with twice the pixels.

use crate::config::FontConfig;
use crate::error::{ExportError, Result};
use crate::layout::{Color, TextAlign, TextStyle};
use cosmic_text::{
    fontdb, Align, Attrs, Buffer, Family, FontSystem, Metrics, Shaping, Style, SwashCache, Weight,
};
use tracing::{debug, info};

const LOCALE: &str = "en-US";

/// A paragraph shaped and wrapped to a fixed width.
#[derive(Debug)]
pub struct ShapedText {
    buffer: Buffer,
    /// Number of wrapped lines.
    pub lines: usize,
    /// Widest line in device pixels.
    pub width: f32,
    /// Total height in device pixels.
    pub height: f32,
    pub color: Color,
}

/// Font database plus glyph cache.
pub struct TextEngine {
    font_system: FontSystem,
    swash_cache: SwashCache,
    family: Option<String>,
}

impl std::fmt::Debug for TextEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextEngine")
            .field("faces", &self.face_count())
            .field("family", &self.family)
            .finish()
    }
}

impl TextEngine {
    /// Load fonts according to `fonts`. Fails when no usable face is found.
    pub fn load(fonts: &FontConfig) -> Result<Self> {
        let mut db = fontdb::Database::new();
        if fonts.load_system_fonts {
            db.load_system_fonts();
        }
        for dir in &fonts.font_dirs {
            debug!("Loading fonts from {:?}", dir);
            db.load_fonts_dir(dir);
        }
        if db.is_empty() {
            return Err(ExportError::EngineFailed(
                "no fonts found; install system fonts or set fonts.font_dirs".to_string(),
            ));
        }

        info!("Font database ready with {} face(s)", db.len());
        Ok(Self {
            font_system: FontSystem::new_with_locale_and_db(LOCALE.to_string(), db),
            swash_cache: SwashCache::new(),
            family: fonts.family.clone(),
        })
    }

    /// Number of font faces available.
    pub fn face_count(&self) -> usize {
        self.font_system.db().len()
    }

    /// Shape `text` at `scale`, wrapping to `max_width` device pixels.
    pub fn shape(&mut self, text: &str, style: &TextStyle, scale: f32, max_width: f32) -> ShapedText {
        let font_size = style.size * scale;
        let line_height = font_size * style.line_height;
        let metrics = Metrics::new(font_size, line_height);

        let mut buffer = Buffer::new(&mut self.font_system, metrics);
        buffer.set_size(&mut self.font_system, Some(max_width.max(1.0)), None);

        let family = match self.family.as_deref() {
            Some(name) => Family::Name(name),
            None => Family::SansSerif,
        };
        let attrs = Attrs::new()
            .family(family)
            .weight(if style.bold { Weight::BOLD } else { Weight::NORMAL })
            .style(if style.italic { Style::Italic } else { Style::Normal });

        buffer.set_text(&mut self.font_system, text, attrs, Shaping::Advanced);
        let align = match style.align {
            TextAlign::Left => Align::Left,
            TextAlign::Center => Align::Center,
            TextAlign::Right => Align::Right,
            TextAlign::Justify => Align::Justified,
        };
        for line in buffer.lines.iter_mut() {
            line.set_align(Some(align));
        }
        buffer.shape_until_scroll(&mut self.font_system, true);

        let mut lines = 0;
        let mut width = 0.0f32;
        for run in buffer.layout_runs() {
            lines += 1;
            width = width.max(run.line_w);
        }

        ShapedText {
            buffer,
            lines,
            width,
            height: lines as f32 * line_height,
            color: style.color,
        }
    }

    /// Rasterize shaped text, handing every covered pixel span to `paint`
    /// with its colour and coverage.
    pub fn draw(&mut self, shaped: &ShapedText, mut paint: impl FnMut(i32, i32, u32, u32, Color)) {
        let base = cosmic_text::Color::rgba(
            shaped.color.r,
            shaped.color.g,
            shaped.color.b,
            shaped.color.a,
        );
        shaped.buffer.draw(
            &mut self.font_system,
            &mut self.swash_cache,
            base,
            |x, y, w, h, color| {
                paint(x, y, w, h, Color::rgba(color.r(), color.g(), color.b(), color.a()));
            },
        );
    }
}
