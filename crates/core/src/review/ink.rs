//! Ink density and margin measurement on a rasterized page.

use image::RgbaImage;
use rayon::prelude::*;
use serde::Serialize;

/// A channel value below this counts as ink.
const INK_THRESHOLD: u8 = 250;

/// Width of an A4 page in millimetres, the basis for pixel to mm conversion.
const A4_WIDTH_MM: f32 = 210.0;

/// What the scanner saw on one page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InkStats {
    /// Fraction of non-white pixels, 0.0 to 1.0.
    pub density: f32,
    /// Distance from the top edge to the first inked row.
    pub top_margin_mm: f32,
    /// Distance from the left edge to the first inked column.
    pub left_margin_mm: f32,
}

#[derive(Clone, Copy)]
struct RowScan {
    ink: usize,
    first_row: Option<usize>,
    first_col: Option<usize>,
}

impl RowScan {
    const EMPTY: RowScan = RowScan {
        ink: 0,
        first_row: None,
        first_col: None,
    };

    fn merge(self, other: RowScan) -> RowScan {
        RowScan {
            ink: self.ink + other.ink,
            first_row: min_opt(self.first_row, other.first_row),
            first_col: min_opt(self.first_col, other.first_col),
        }
    }
}

fn min_opt(a: Option<usize>, b: Option<usize>) -> Option<usize> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

impl InkStats {
    /// Scan a page image. The page is assumed to be A4 wide; a blank page
    /// reports margins equal to its full height and width.
    pub fn scan(image: &RgbaImage) -> InkStats {
        let (width, height) = (image.width() as usize, image.height() as usize);
        if width == 0 || height == 0 {
            return InkStats {
                density: 0.0,
                top_margin_mm: 0.0,
                left_margin_mm: 0.0,
            };
        }

        let scan = image
            .as_raw()
            .par_chunks(width * 4)
            .enumerate()
            .map(|(y, row)| {
                let mut ink = 0;
                let mut first_col = None;
                for (x, px) in row.chunks_exact(4).enumerate() {
                    if px[..3].iter().any(|&c| c < INK_THRESHOLD) {
                        ink += 1;
                        first_col.get_or_insert(x);
                    }
                }
                RowScan {
                    ink,
                    first_row: (ink > 0).then_some(y),
                    first_col,
                }
            })
            .reduce(|| RowScan::EMPTY, RowScan::merge);

        let px_per_mm = width as f32 / A4_WIDTH_MM;
        InkStats {
            density: scan.ink as f32 / (width * height) as f32,
            top_margin_mm: scan.first_row.unwrap_or(height) as f32 / px_per_mm,
            left_margin_mm: scan.first_col.unwrap_or(width) as f32 / px_per_mm,
        }
    }
}
