//! Lays a render tree out in device pixels and emits a display list.
//!
//! Blocks stack vertically, rows split their width between columns by span,
//! and text wraps to the width it is given. Export pages grow past their
//! minimum height when their content does; nothing is moved to another page.

use super::paint::DrawCommand;
use super::text::TextEngine;
use crate::layout::{BlockNode, Color, Node, PageNode, RenderTree, RowNode, TextAlign, TextStyle};
use tracing::warn;

/// Laid-out document ready for painting.
#[derive(Debug)]
pub struct DisplayList {
    pub width: u32,
    pub height: u32,
    /// Device-pixel offsets where each page after the first begins.
    pub page_breaks: Vec<u32>,
    pub commands: Vec<DrawCommand>,
}

struct Flow<'a> {
    text: &'a mut TextEngine,
    scale: f32,
}

/// Lay out `tree` at `scale` device pixels per CSS pixel.
pub fn layout(tree: &RenderTree, text: &mut TextEngine, scale: f32) -> DisplayList {
    let mut flow = Flow { text, scale };
    let width = (tree.width * scale).round() as u32;
    let mut commands = Vec::new();
    let mut page_breaks = Vec::new();
    let mut y = 0u32;

    for node in &tree.root {
        match node {
            Node::Page(page) => {
                let height = flow.page(page, y as f32, &mut commands);
                y += height;
            }
            Node::PageBreak => page_breaks.push(y),
            other => warn!("Ignoring non-page node at document root: {:?}", other),
        }
    }

    DisplayList {
        width,
        height: y,
        page_breaks,
        commands,
    }
}

impl Flow<'_> {
    fn px(&self, css: f32) -> f32 {
        css * self.scale
    }

    /// Lay out one page starting at `top`; returns its height in whole pixels.
    fn page(&mut self, page: &PageNode, top: f32, out: &mut Vec<DrawCommand>) -> u32 {
        let width = self.px(page.width);
        let pad = page.padding;
        let inner_x = self.px(pad.left);
        let inner_width = width - self.px(pad.horizontal());

        let mut body = Vec::new();
        let mut cursor = top + self.px(pad.top);
        for child in &page.children {
            cursor += self.node(child, inner_x, cursor, inner_width, &mut body);
        }

        let content_height = cursor - top + self.px(pad.bottom);
        let min_height = page.min_height.map(|h| self.px(h)).unwrap_or(0.0);
        let height = content_height.max(min_height).ceil() as u32;
        if page.min_height.is_some() && content_height > min_height + 0.5 {
            warn!(
                "Page {} content is {:.0}px taller than the page",
                page.index + 1,
                content_height - min_height
            );
        }

        out.push(DrawCommand::FillRect {
            x: 0.0,
            y: top,
            width,
            height: height as f32,
            color: page.background,
        });
        if let Some(background) = page.background_image.as_ref().and_then(|r| r.asset().bitmap()) {
            out.push(DrawCommand::Stretch {
                x: 0.0,
                y: top,
                width,
                height: height as f32,
                bitmap: background,
            });
        }
        if let Some(accent) = page.accent {
            out.push(DrawCommand::FillRect {
                x: 0.0,
                y: top,
                width,
                height: self.px(accent.width),
                color: accent.color,
            });
        }
        out.append(&mut body);
        height
    }

    /// Lay out `node` in a box at (x, y) of `width`; returns the height used.
    fn node(&mut self, node: &Node, x: f32, y: f32, width: f32, out: &mut Vec<DrawCommand>) -> f32 {
        match node {
            Node::Block(block) => self.block(block, x, y, width, out),
            Node::Row(row) => self.row(row, x, y, width, out),
            Node::Text(text) => {
                let content = text.display_text();
                if content.is_empty() {
                    return 0.0;
                }
                let shaped = self.text.shape(&content, &text.style, self.scale, width);
                let height = shaped.height;
                out.push(DrawCommand::Text { x, y, text: shaped });
                height
            }
            Node::Image(image) => {
                let w = self.px(image.width).min(width);
                let h = self.px(image.height);
                let bx = x + (width - w).max(0.0);
                if let Some(bitmap) = image.image.asset().bitmap() {
                    out.push(DrawCommand::Image {
                        x: bx,
                        y,
                        width: w,
                        height: h,
                        bitmap,
                    });
                }
                h
            }
            Node::Placeholder(placeholder) => {
                let w = self.px(placeholder.width).min(width);
                let h = self.px(placeholder.height);
                let bx = x + (width - w).max(0.0);
                out.push(DrawCommand::FillRect {
                    x: bx,
                    y,
                    width: w,
                    height: h,
                    color: placeholder.background,
                });

                let style = TextStyle::new(36.0)
                    .bold()
                    .color(placeholder.color)
                    .line_height(1.2)
                    .align(TextAlign::Center);
                let shaped = self.text.shape(&placeholder.label, &style, self.scale, w);
                let ty = y + (h - shaped.height).max(0.0) / 2.0;
                out.push(DrawCommand::Text {
                    x: bx,
                    y: ty,
                    text: shaped,
                });
                h
            }
            Node::Rule(rule) => {
                let h = self.px(rule.thickness);
                out.push(DrawCommand::FillRect {
                    x,
                    y,
                    width,
                    height: h,
                    color: rule.color,
                });
                h
            }
            Node::Page(page) => {
                warn!("Nested page {} flattened into its parent", page.index);
                page.children
                    .iter()
                    .fold(0.0, |used, child| used + self.node(child, x, y + used, width, out))
            }
            Node::PageBreak => 0.0,
        }
    }

    fn block(&mut self, block: &BlockNode, x: f32, y: f32, width: f32, out: &mut Vec<DrawCommand>) -> f32 {
        let style = &block.style;
        let border_top = style.border_top.map(|b| self.px(b.width)).unwrap_or(0.0);
        let border_bottom = style.border_bottom.map(|b| self.px(b.width)).unwrap_or(0.0);
        let border_left = style.border_left.map(|b| self.px(b.width)).unwrap_or(0.0);

        let box_top = y + self.px(style.margin_top);
        let inner_x = x + border_left + self.px(style.padding.left);
        let inner_width = (width - border_left - self.px(style.padding.horizontal())).max(1.0);

        let mut children = Vec::new();
        let mut cursor = box_top + border_top + self.px(style.padding.top);
        for child in &block.children {
            cursor += self.node(child, inner_x, cursor, inner_width, &mut children);
        }
        let box_height = cursor - box_top + self.px(style.padding.bottom) + border_bottom;

        if let Some(background) = style.background {
            push_rect(out, x, box_top, width, box_height, background);
        }
        if let Some(border) = style.border_top {
            push_rect(out, x, box_top, width, border_top, border.color);
        }
        if let Some(border) = style.border_left {
            push_rect(out, x, box_top, border_left, box_height, border.color);
        }
        if let Some(border) = style.border_bottom {
            push_rect(out, x, box_top + box_height - border_bottom, width, border_bottom, border.color);
        }
        out.append(&mut children);

        self.px(style.margin_top) + box_height + self.px(style.margin_bottom)
    }

    fn row(&mut self, row: &RowNode, x: f32, y: f32, width: f32, out: &mut Vec<DrawCommand>) -> f32 {
        let gaps = self.px(row.gap) * row.columns.len().saturating_sub(1) as f32;
        let available = (width - gaps).max(0.0);
        let total = row.total_span() as f32;

        let mut cx = x;
        let mut height = 0.0f32;
        for column in &row.columns {
            let cw = available * column.span as f32 / total;
            let mut cursor = y;
            for child in &column.children {
                cursor += self.node(child, cx, cursor, cw, out);
            }
            height = height.max(cursor - y);
            cx += cw + self.px(row.gap);
        }
        height
    }
}

fn push_rect(out: &mut Vec<DrawCommand>, x: f32, y: f32, width: f32, height: f32, color: Color) {
    out.push(DrawCommand::FillRect {
        x,
        y,
        width,
        height,
        color,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExportConfig;
    use crate::content::CvContent;
    use crate::layout::{render, RenderMode};
    use crate::raster::text::tests::system_engine;

    #[test]
    fn test_export_layout_has_page_sized_pages() {
        let Some(mut engine) = system_engine() else {
            return;
        };
        let tree = render(
            &CvContent::sample(),
            None,
            RenderMode::Export,
            &ExportConfig::default(),
        );
        let list = layout(&tree, &mut engine, 1.0);

        assert_eq!(list.width, 794);
        assert_eq!(list.page_breaks.len(), 1);
        assert!(list.page_breaks[0] >= 1123);
        assert!(list.height >= 2 * 1123);
        assert!(!list.commands.is_empty());
    }

    #[test]
    fn test_layout_scales_with_factor() {
        let Some(mut engine) = system_engine() else {
            return;
        };
        let tree = render(
            &CvContent::sample(),
            None,
            RenderMode::Export,
            &ExportConfig::default(),
        );
        let list = layout(&tree, &mut engine, 2.0);
        assert_eq!(list.width, 1588);
        assert!(list.page_breaks[0] >= 2246);
    }

    #[test]
    fn test_preview_layout_has_no_breaks() {
        let Some(mut engine) = system_engine() else {
            return;
        };
        let tree = render(
            &CvContent::sample(),
            None,
            RenderMode::Preview,
            &ExportConfig::default(),
        );
        let list = layout(&tree, &mut engine, 1.0);
        assert!(list.page_breaks.is_empty());
        assert!(list.height > 0);
    }

    #[test]
    fn test_unloaded_photo_draws_nothing() {
        let Some(mut engine) = system_engine() else {
            return;
        };
        let photo = std::sync::Arc::new(crate::asset::ImageAsset::from_bytes(vec![1, 2, 3]));
        let tree = render(
            &CvContent::sample(),
            Some(&photo),
            RenderMode::Export,
            &ExportConfig::default(),
        );
        let list = layout(&tree, &mut engine, 1.0);
        assert!(!list
            .commands
            .iter()
            .any(|c| matches!(c, DrawCommand::Image { .. })));
    }
}
