//! Standalone HTML serialization of a render tree.
//!
//! Used for the on-screen preview and for the print hand-off, where the
//! host's print pipeline does the pagination. Entries carry
//! `break-inside: avoid` and explicit page-break markers become
//! `break-after: page`.

use crate::layout::{BlockNode, Border, Edges, Node, PageNode, RenderTree, RowNode, TextNode};
use std::fmt::Write;

const PRINT_CSS: &str = r#"
@page { size: A4 portrait; margin: 0; }
* { box-sizing: border-box; -webkit-print-color-adjust: exact; print-color-adjust: exact; }
html, body { margin: 0; padding: 0; background: #e2e8f0; }
body { font-family: system-ui, -apple-system, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif; }
.page { margin: 24px auto; box-shadow: 0 4px 24px rgba(15, 23, 42, 0.15); position: relative; overflow: hidden; }
.row { display: flex; align-items: flex-start; }
.col { min-width: 0; }
.avoid-break { break-inside: avoid; page-break-inside: avoid; }
.page-break { break-after: page; page-break-after: always; height: 0; }
p { margin: 0; white-space: pre-wrap; }
img { display: block; object-fit: cover; }
@media print {
  html, body { background: none; }
  .page { margin: 0; box-shadow: none; }
}
"#;

/// Render `tree` as a complete HTML document titled `title`.
pub fn to_html(tree: &RenderTree, title: &str) -> String {
    let mut out = String::with_capacity(16 * 1024);
    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(out, "<title>{}</title>", escape(title));
    let _ = writeln!(out, "<style>{}</style>", PRINT_CSS);
    out.push_str("</head>\n<body>\n");

    for node in &tree.root {
        write_node(&mut out, node);
    }

    out.push_str("</body>\n</html>\n");
    out
}

fn write_node(out: &mut String, node: &Node) {
    match node {
        Node::Page(page) => write_page(out, page),
        Node::Block(block) => write_block(out, block),
        Node::Row(row) => write_row(out, row),
        Node::Text(text) => write_text(out, text),
        Node::Image(image) => {
            let _ = write!(
                out,
                "<img src=\"{}\" alt=\"\" style=\"width:{}px;height:{}px;margin-left:auto\">",
                escape(&image.image.asset().src()),
                image.width,
                image.height
            );
        }
        Node::Placeholder(p) => {
            let _ = write!(
                out,
                "<div style=\"width:{}px;height:{}px;margin-left:auto;display:flex;\
                 align-items:center;justify-content:center;background:{};color:{};\
                 font-size:36px;font-weight:700\">{}</div>",
                p.width,
                p.height,
                p.background.to_css(),
                p.color.to_css(),
                escape(&p.label)
            );
        }
        Node::Rule(rule) => {
            let _ = write!(
                out,
                "<hr style=\"border:0;height:{}px;background:{};margin:0\">",
                rule.thickness,
                rule.color.to_css()
            );
        }
        Node::PageBreak => out.push_str("<div class=\"page-break\"></div>\n"),
    }
}

fn write_page(out: &mut String, page: &PageNode) {
    let mut style = format!(
        "width:{}px;padding:{};background:{};",
        page.width,
        edges_css(&page.padding),
        page.background.to_css()
    );
    if let Some(height) = page.min_height {
        let _ = write!(style, "min-height:{}px;", height);
    }
    if let Some(bg) = &page.background_image {
        let _ = write!(
            style,
            "background-image:url('{}');background-size:100% 100%;",
            bg.asset().src()
        );
    }
    if let Some(accent) = page.accent {
        let _ = write!(style, "border-top:{};", border_css(accent));
        // The accent is drawn inside the page box, so trim the padding by it.
        let _ = write!(style, "padding-top:{}px;", page.padding.top - accent.width);
    }

    let _ = writeln!(
        out,
        "<section class=\"page\" data-page=\"{}\" style=\"{}\">",
        page.index + 1,
        escape(&style)
    );
    for child in &page.children {
        write_node(out, child);
    }
    out.push_str("</section>\n");
}

fn write_block(out: &mut String, block: &BlockNode) {
    let s = &block.style;
    let mut style = String::new();
    if s.padding != Edges::ZERO {
        let _ = write!(style, "padding:{};", edges_css(&s.padding));
    }
    if s.margin_top > 0.0 {
        let _ = write!(style, "margin-top:{}px;", s.margin_top);
    }
    if s.margin_bottom > 0.0 {
        let _ = write!(style, "margin-bottom:{}px;", s.margin_bottom);
    }
    if let Some(bg) = s.background {
        let _ = write!(style, "background:{};", bg.to_css());
    }
    for (side, border) in [
        ("top", s.border_top),
        ("bottom", s.border_bottom),
        ("left", s.border_left),
    ] {
        if let Some(border) = border {
            let _ = write!(style, "border-{}:{};", side, border_css(border));
        }
    }

    let class = if s.avoid_break { " class=\"avoid-break\"" } else { "" };
    let tag = block
        .tag
        .map(|t| format!(" data-content=\"{}\"", escape(&format!("{:?}", t))))
        .unwrap_or_default();
    let _ = write!(out, "<div{}{} style=\"{}\">", class, tag, escape(&style));
    for child in &block.children {
        write_node(out, child);
    }
    out.push_str("</div>\n");
}

fn write_row(out: &mut String, row: &RowNode) {
    let _ = write!(out, "<div class=\"row\" style=\"gap:{}px\">", row.gap);
    let total = row.total_span() as f32;
    let gaps = row.gap * row.columns.len().saturating_sub(1) as f32;
    for column in &row.columns {
        let share = column.span as f32 / total;
        let _ = write!(
            out,
            "<div class=\"col\" style=\"flex:0 0 calc((100% - {}px) * {:.6})\">",
            gaps, share
        );
        for child in &column.children {
            write_node(out, child);
        }
        out.push_str("</div>");
    }
    out.push_str("</div>\n");
}

fn write_text(out: &mut String, text: &TextNode) {
    let st = &text.style;
    let mut style = format!(
        "font-size:{}px;line-height:{};color:{};text-align:{};",
        st.size,
        st.line_height,
        st.color.to_css(),
        st.align.to_css()
    );
    if st.bold {
        style.push_str("font-weight:700;");
    }
    if st.italic {
        style.push_str("font-style:italic;");
    }
    if st.uppercase {
        style.push_str("text-transform:uppercase;letter-spacing:0.04em;");
    }
    let _ = write!(out, "<p style=\"{}\">{}</p>", style, escape(&text.text));
}

fn edges_css(edges: &Edges) -> String {
    format!(
        "{}px {}px {}px {}px",
        edges.top, edges.right, edges.bottom, edges.left
    )
}

fn border_css(border: Border) -> String {
    format!("{}px solid {}", border.width, border.color.to_css())
}

/// Escape text for HTML content and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
