//! Render tree produced by the document renderer.
//!
//! The tree is the crate's equivalent of a styled DOM: it fixes structure,
//! styling and page blocks, while line breaking and glyph placement are left
//! to whoever paints it (the raster engine or a browser reading the HTML).
//! Lengths are CSS pixels.

use super::pagination::{ContentRef, PageBlock};
use super::RenderMode;
use crate::asset::{AssetOrigin, ImageAsset};
use std::sync::Arc;

/// 8-bit RGBA colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const SLATE_50: Color = Color::rgb(248, 250, 252);
    pub const SLATE_100: Color = Color::rgb(241, 245, 249);
    pub const SLATE_200: Color = Color::rgb(226, 232, 240);
    pub const SLATE_300: Color = Color::rgb(203, 213, 225);
    pub const SLATE_400: Color = Color::rgb(148, 163, 184);
    pub const SLATE_500: Color = Color::rgb(100, 116, 139);
    pub const SLATE_600: Color = Color::rgb(71, 85, 105);
    pub const SLATE_700: Color = Color::rgb(51, 65, 85);
    pub const SLATE_800: Color = Color::rgb(30, 41, 59);
    pub const SLATE_900: Color = Color::rgb(15, 23, 42);
    pub const BLUE_600: Color = Color::rgb(37, 99, 235);
    pub const BLUE_700: Color = Color::rgb(29, 78, 216);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Build from an `(r, g, b)` tuple as stored in configuration.
    pub fn from_tuple((r, g, b): (u8, u8, u8)) -> Self {
        Self::rgb(r, g, b)
    }

    /// CSS colour string.
    pub fn to_css(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!(
                "rgba({}, {}, {}, {:.3})",
                self.r,
                self.g,
                self.b,
                self.a as f32 / 255.0
            )
        }
    }
}

/// Box edge lengths.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Edges {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Edges {
    pub const ZERO: Edges = Edges {
        top: 0.0,
        right: 0.0,
        bottom: 0.0,
        left: 0.0,
    };

    pub fn all(v: f32) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn top(v: f32) -> Self {
        Self { top: v, ..Self::ZERO }
    }

    pub fn bottom(v: f32) -> Self {
        Self {
            bottom: v,
            ..Self::ZERO
        }
    }

    pub fn left(v: f32) -> Self {
        Self { left: v, ..Self::ZERO }
    }

    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }
}

/// Horizontal text alignment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl TextAlign {
    pub fn to_css(self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
            TextAlign::Justify => "justify",
        }
    }
}

/// Text style information.
#[derive(Clone, Debug, PartialEq)]
pub struct TextStyle {
    /// Font size in CSS pixels
    pub size: f32,
    pub bold: bool,
    pub italic: bool,
    pub color: Color,
    /// Line height as a multiple of the font size
    pub line_height: f32,
    /// Render the text uppercased
    pub uppercase: bool,
    pub align: TextAlign,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            size: 14.0,
            bold: false,
            italic: false,
            color: Color::SLATE_700,
            line_height: 1.5,
            uppercase: false,
            align: TextAlign::Left,
        }
    }
}

impl TextStyle {
    pub fn new(size: f32) -> Self {
        Self {
            size,
            ..Default::default()
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn line_height(mut self, line_height: f32) -> Self {
        self.line_height = line_height;
        self
    }

    pub fn uppercase(mut self) -> Self {
        self.uppercase = true;
        self
    }

    pub fn align(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }
}

/// A solid border line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Border {
    pub width: f32,
    pub color: Color,
}

impl Border {
    pub fn new(width: f32, color: Color) -> Self {
        Self { width, color }
    }
}

/// Box styling for blocks.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BoxStyle {
    pub padding: Edges,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub background: Option<Color>,
    pub border_top: Option<Border>,
    pub border_bottom: Option<Border>,
    pub border_left: Option<Border>,
    /// Keep the block on one printed page when the host paginates.
    pub avoid_break: bool,
}

/// Reference to an image asset from the tree.
///
/// Two references are equal when they point at the same asset, or at the
/// same file on disk.
#[derive(Clone, Debug)]
pub struct ImageRef(pub Arc<ImageAsset>);

impl ImageRef {
    pub fn asset(&self) -> &Arc<ImageAsset> {
        &self.0
    }
}

impl PartialEq for ImageRef {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.0, &other.0) {
            return true;
        }
        match (self.0.origin(), other.0.origin()) {
            (AssetOrigin::File(a), AssetOrigin::File(b)) => a == b,
            _ => false,
        }
    }
}

/// One page-sized canvas.
#[derive(Clone, Debug, PartialEq)]
pub struct PageNode {
    /// Index of the page block this page renders.
    pub index: usize,
    pub width: f32,
    /// Set in export mode: the page never renders shorter than this.
    pub min_height: Option<f32>,
    pub padding: Edges,
    pub background: Color,
    pub background_image: Option<ImageRef>,
    /// Decorative bar across the top edge.
    pub accent: Option<Border>,
    pub children: Vec<Node>,
}

/// Vertical stack of children.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockNode {
    pub tag: Option<ContentRef>,
    pub style: BoxStyle,
    pub children: Vec<Node>,
}

/// A column inside a [`RowNode`], sized in twelfths of the row width.
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    pub span: u8,
    pub children: Vec<Node>,
}

/// Horizontal arrangement of columns.
#[derive(Clone, Debug, PartialEq)]
pub struct RowNode {
    pub gap: f32,
    pub columns: Vec<Column>,
}

impl RowNode {
    /// Total span of all columns.
    pub fn total_span(&self) -> u32 {
        self.columns.iter().map(|c| c.span as u32).sum::<u32>().max(1)
    }
}

/// A paragraph of text.
#[derive(Clone, Debug, PartialEq)]
pub struct TextNode {
    pub text: String,
    pub style: TextStyle,
}

impl TextNode {
    /// Text as displayed, after any case transform.
    pub fn display_text(&self) -> String {
        if self.style.uppercase {
            self.text.to_uppercase()
        } else {
            self.text.clone()
        }
    }
}

/// An embedded image, drawn to cover its box.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageNode {
    pub image: ImageRef,
    pub width: f32,
    pub height: f32,
}

/// Stand-in box shown when no photo is set.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaceholderNode {
    pub label: String,
    pub width: f32,
    pub height: f32,
    pub background: Color,
    pub color: Color,
}

/// Horizontal rule.
#[derive(Clone, Debug, PartialEq)]
pub struct RuleNode {
    pub thickness: f32,
    pub color: Color,
}

/// Render tree node.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Page(PageNode),
    Block(BlockNode),
    Row(RowNode),
    Text(TextNode),
    Image(ImageNode),
    Placeholder(PlaceholderNode),
    Rule(RuleNode),
    /// Explicit page boundary between two export pages.
    PageBreak,
}

impl Node {
    /// Visit this node and all descendants depth first.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Node)) {
        f(self);
        let children: &'a [Node] = match self {
            Node::Page(page) => &page.children,
            Node::Block(block) => &block.children,
            Node::Row(row) => {
                for column in &row.columns {
                    for child in &column.children {
                        child.walk(&mut *f);
                    }
                }
                return;
            }
            _ => return,
        };
        for child in children {
            child.walk(&mut *f);
        }
    }
}

/// Output of the document renderer.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderTree {
    pub mode: RenderMode,
    /// Page width in CSS pixels.
    pub width: f32,
    /// Page height in CSS pixels.
    pub page_height: f32,
    /// Page blocks this tree was built from.
    pub blocks: Vec<PageBlock>,
    /// Top-level nodes: pages separated by page breaks.
    pub root: Vec<Node>,
}

impl RenderTree {
    /// Visit every node in document order.
    pub fn walk<'a>(&'a self, mut f: impl FnMut(&'a Node)) {
        for node in &self.root {
            node.walk(&mut f);
        }
    }

    /// Number of page canvases.
    pub fn page_count(&self) -> usize {
        self.root
            .iter()
            .filter(|n| matches!(n, Node::Page(_)))
            .count()
    }

    /// Number of explicit page-break markers.
    pub fn page_break_count(&self) -> usize {
        self.root
            .iter()
            .filter(|n| matches!(n, Node::PageBreak))
            .count()
    }

    /// Content tags in document order.
    pub fn tags(&self) -> Vec<ContentRef> {
        let mut tags = Vec::new();
        self.walk(|node| {
            if let Node::Block(BlockNode { tag: Some(tag), .. }) = node {
                tags.push(*tag);
            }
        });
        tags
    }

    /// Every image the tree references: image nodes and page backgrounds.
    pub fn images(&self) -> Vec<ImageRef> {
        let mut images = Vec::new();
        self.walk(|node| match node {
            Node::Image(image) => images.push(image.image.clone()),
            Node::Page(PageNode {
                background_image: Some(bg),
                ..
            }) => images.push(bg.clone()),
            _ => {}
        });
        images
    }

    /// Whether any placeholder node is present.
    pub fn has_placeholder(&self) -> bool {
        let mut found = false;
        self.walk(|node| {
            if matches!(node, Node::Placeholder(_)) {
                found = true;
            }
        });
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_to_css() {
        assert_eq!(Color::rgb(0, 0, 0).to_css(), "#000000");
        assert_eq!(Color::SLATE_800.to_css(), "#1e293b");
        assert_eq!(Color::rgba(0, 0, 0, 0).to_css(), "rgba(0, 0, 0, 0.000)");
    }

    #[test]
    fn test_edges_horizontal() {
        let edges = Edges {
            top: 1.0,
            right: 2.0,
            bottom: 3.0,
            left: 4.0,
        };
        assert_eq!(edges.horizontal(), 6.0);
    }

    #[test]
    fn test_text_style_builder() {
        let style = TextStyle::new(12.0)
            .bold()
            .italic()
            .uppercase()
            .color(Color::BLUE_700)
            .align(TextAlign::Right);
        assert!(style.bold && style.italic && style.uppercase);
        assert_eq!(style.color, Color::BLUE_700);
        assert_eq!(style.align, TextAlign::Right);
    }

    #[test]
    fn test_display_text_uppercase() {
        let node = TextNode {
            text: "Jordan Avery".to_string(),
            style: TextStyle::new(36.0).uppercase(),
        };
        assert_eq!(node.display_text(), "JORDAN AVERY");
    }

    #[test]
    fn test_image_ref_equality() {
        let a = Arc::new(ImageAsset::from_bytes(vec![1, 2, 3]));
        let b = Arc::new(ImageAsset::from_bytes(vec![1, 2, 3]));
        assert_eq!(ImageRef(Arc::clone(&a)), ImageRef(Arc::clone(&a)));
        assert_ne!(ImageRef(a), ImageRef(b));

        let f1 = Arc::new(ImageAsset::file_backed("/tmp/bg.png"));
        let f2 = Arc::new(ImageAsset::file_backed("/tmp/bg.png"));
        assert_eq!(ImageRef(f1), ImageRef(f2));
    }

    #[test]
    fn test_row_total_span_never_zero() {
        let row = RowNode {
            gap: 0.0,
            columns: vec![],
        };
        assert_eq!(row.total_span(), 1);
    }
}
