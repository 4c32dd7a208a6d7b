//! Document renderer.
//!
//! [`render`] is a pure function of content, photo, mode and configuration.
//! Export mode produces fixed-size pages separated by explicit page breaks;
//! preview mode produces one flowing page.

mod document;
pub mod pagination;
pub mod tree;

pub use pagination::{
    check_complete, plan_pages, ContentRef, PageBlock, PaginationError, PaginationPolicy, Region,
};
pub use tree::{
    BlockNode, Border, BoxStyle, Color, Column, Edges, ImageNode, ImageRef, Node, PageNode,
    PlaceholderNode, RenderTree, RowNode, RuleNode, TextAlign, TextNode, TextStyle,
};

use crate::asset::{ImageAsset, ProfileAsset};
use crate::config::ExportConfig;
use crate::content::CvContent;
use document::PageBuilder;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Which layout to produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// On-screen layout: one flowing page.
    Preview,
    /// Paginated layout with fixed page boxes.
    Export,
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderMode::Preview => write!(f, "preview"),
            RenderMode::Export => write!(f, "export"),
        }
    }
}

/// Render the CV into a tree.
///
/// Calling this twice with the same arguments yields equal trees. The photo
/// is referenced, never copied, so preview and export trees built from the
/// same snapshot share one asset.
pub fn render(
    content: &CvContent,
    photo: Option<&ProfileAsset>,
    mode: RenderMode,
    config: &ExportConfig,
) -> RenderTree {
    let blocks = plan_pages(content, mode, &config.pagination);
    debug_assert!(check_complete(content, &blocks).is_ok());

    let builder = PageBuilder {
        content,
        photo,
        config,
    };
    let page_height = config.page.height_px();
    let min_height = match mode {
        RenderMode::Export => Some(page_height),
        RenderMode::Preview => None,
    };
    let background = config
        .page
        .background_image
        .as_ref()
        .map(|path| ImageRef(Arc::new(ImageAsset::file_backed(path.clone()))));

    let mut root = Vec::with_capacity(blocks.len() * 2);
    for (i, block) in blocks.iter().enumerate() {
        if i > 0 {
            root.push(Node::PageBreak);
        }
        let mut page = builder.page(block, min_height);
        page.background_image = background.clone();
        root.push(Node::Page(page));
    }

    debug!(
        "Rendered {} tree: {} page(s), photo {}",
        mode,
        blocks.len(),
        if photo.is_some() { "set" } else { "placeholder" }
    );

    RenderTree {
        mode,
        width: config.page.width_px(),
        page_height,
        blocks,
        root,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::tests::png_bytes;

    fn page_texts(node: &Node) -> Vec<String> {
        let mut texts = Vec::new();
        node.walk(&mut |n| {
            if let Node::Text(t) = n {
                texts.push(t.text.clone());
            }
        });
        texts
    }

    // ========== Export mode tests ==========

    #[test]
    fn test_export_has_two_pages_and_one_break() {
        let tree = render(
            &CvContent::sample(),
            None,
            RenderMode::Export,
            &ExportConfig::default(),
        );
        assert_eq!(tree.page_count(), 2);
        assert_eq!(tree.page_break_count(), 1);
        assert!(matches!(tree.root[1], Node::PageBreak));
    }

    #[test]
    fn test_export_pages_have_fixed_size() {
        let config = ExportConfig::default();
        let tree = render(&CvContent::sample(), None, RenderMode::Export, &config);
        for node in &tree.root {
            if let Node::Page(page) = node {
                assert_eq!(page.width, 794.0);
                assert_eq!(page.min_height, Some(1123.0));
            }
        }
    }

    #[test]
    fn test_export_tags_follow_plan() {
        let tree = render(
            &CvContent::sample(),
            None,
            RenderMode::Export,
            &ExportConfig::default(),
        );
        use ContentRef::*;
        let tags = tree.tags();
        let expected = vec![
            Header,
            Summary,
            Job(0),
            Job(1),
            CoreSkills,
            TechnicalSkills,
            Languages,
            Job(2),
            Job(3),
            Degree(0),
            Degree(1),
            Degree(2),
            Certificates,
            Ethics,
            Footer,
        ];
        assert_eq!(tags, expected);
    }

    #[test]
    fn test_second_page_uses_continued_heading() {
        let config = ExportConfig::default();
        let tree = render(&CvContent::sample(), None, RenderMode::Export, &config);

        let first = page_texts(&tree.root[0]);
        let second = page_texts(&tree.root[2]);
        assert!(first.contains(&config.labels.experience));
        assert!(second.contains(&config.labels.experience_continued));
        assert!(!second.contains(&config.labels.experience));
    }

    #[test]
    fn test_no_continued_heading_when_all_jobs_fit() {
        let config = ExportConfig::default().first_page_jobs(10);
        let tree = render(&CvContent::sample(), None, RenderMode::Export, &config);
        let second = page_texts(&tree.root[2]);
        assert!(!second.contains(&config.labels.experience_continued));
    }

    // ========== Preview mode tests ==========

    #[test]
    fn test_preview_is_single_flowing_page() {
        let tree = render(
            &CvContent::sample(),
            None,
            RenderMode::Preview,
            &ExportConfig::default(),
        );
        assert_eq!(tree.page_count(), 1);
        assert_eq!(tree.page_break_count(), 0);
        match &tree.root[0] {
            Node::Page(page) => assert!(page.min_height.is_none()),
            other => panic!("Expected page, got {:?}", other),
        }
    }

    #[test]
    fn test_preview_contains_every_job() {
        let cv = CvContent::sample();
        let tree = render(&cv, None, RenderMode::Preview, &ExportConfig::default());
        let jobs: Vec<ContentRef> = tree
            .tags()
            .into_iter()
            .filter(|t| matches!(t, ContentRef::Job(_)))
            .collect();
        assert_eq!(jobs.len(), cv.experience.len());
    }

    // ========== Photo tests ==========

    #[test]
    fn test_missing_photo_renders_initials_placeholder() {
        for mode in [RenderMode::Preview, RenderMode::Export] {
            let tree = render(&CvContent::sample(), None, mode, &ExportConfig::default());
            assert!(tree.has_placeholder());
            assert!(tree.images().is_empty());

            let mut label = None;
            tree.walk(|n| {
                if let Node::Placeholder(p) = n {
                    label = Some(p.label.clone());
                }
            });
            assert_eq!(label.as_deref(), Some("JA"));
        }
    }

    #[test]
    fn test_photo_is_shared_between_modes() {
        let photo: ProfileAsset = Arc::new(ImageAsset::from_bytes(png_bytes(4, 5, [1, 2, 3, 255])));
        let cv = CvContent::sample();
        let config = ExportConfig::default();

        let preview = render(&cv, Some(&photo), RenderMode::Preview, &config);
        let export = render(&cv, Some(&photo), RenderMode::Export, &config);

        assert!(!preview.has_placeholder());
        assert_eq!(preview.images().len(), 1);
        assert_eq!(export.images().len(), 1);
        assert!(Arc::ptr_eq(preview.images()[0].asset(), &photo));
        assert!(Arc::ptr_eq(export.images()[0].asset(), &photo));
    }

    #[test]
    fn test_background_image_on_every_page() {
        let mut config = ExportConfig::default();
        config.page.background_image = Some("/tmp/paper.png".into());
        let tree = render(&CvContent::sample(), None, RenderMode::Export, &config);

        let images = tree.images();
        assert_eq!(images.len(), 2);
        assert!(Arc::ptr_eq(images[0].asset(), images[1].asset()));
    }

    #[test]
    fn test_section_headings_are_underlined_with_rules() {
        let tree = render(
            &CvContent::sample(),
            None,
            RenderMode::Export,
            &ExportConfig::default(),
        );
        let mut rules = Vec::new();
        tree.walk(|n| {
            if let Node::Rule(rule) = n {
                rules.push(rule.clone());
            }
        });

        assert!(!rules.is_empty());
        assert!(rules
            .iter()
            .all(|r| r.thickness == 1.0 && r.color == Color::SLATE_300));
    }

    // ========== Determinism tests ==========

    #[test]
    fn test_render_is_deterministic() {
        let cv = CvContent::sample();
        let config = ExportConfig::default();
        let photo: ProfileAsset = Arc::new(ImageAsset::from_bytes(png_bytes(2, 2, [0, 0, 0, 255])));
        for mode in [RenderMode::Preview, RenderMode::Export] {
            assert_eq!(
                render(&cv, Some(&photo), mode, &config),
                render(&cv, Some(&photo), mode, &config)
            );
        }
    }

    #[test]
    fn test_render_mode_display() {
        assert_eq!(RenderMode::Export.to_string(), "export");
        assert_eq!(RenderMode::Preview.to_string(), "preview");
    }
}
