//! Waits until every image a render tree references has settled.
//!
//! Settled means decoded or failed. A failed image never fails the wait;
//! the rasterizer simply draws nothing in its box.

use crate::asset::{ImageAsset, LoadState};
use crate::layout::{ImageRef, RenderTree};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Summary of one preload pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreloadReport {
    /// Distinct images referenced by the tree.
    pub total: usize,
    /// Images that had already settled before the call.
    pub already_settled: usize,
    /// Images that settled successfully during the call or before it.
    pub loaded: usize,
    /// Images that settled as failed.
    pub failed: usize,
}

impl PreloadReport {
    /// Whether every image loaded successfully.
    pub fn all_loaded(&self) -> bool {
        self.failed == 0
    }
}

/// Collect the tree's images, dropping duplicates of the same asset.
fn distinct_images(tree: &RenderTree) -> Vec<Arc<ImageAsset>> {
    let mut unique: Vec<ImageRef> = Vec::new();
    for image in tree.images() {
        if !unique.contains(&image) {
            unique.push(image);
        }
    }
    unique.into_iter().map(|r| r.0).collect()
}

/// Resolve once every image in `tree` has settled.
///
/// The set of images is snapshotted at call time. Loads run concurrently;
/// the call never returns an error.
pub async fn wait_for_images(tree: &RenderTree) -> PreloadReport {
    let images = distinct_images(tree);
    let already_settled = images.iter().filter(|a| a.is_settled()).count();

    debug!(
        "Preloading {} image(s), {} already settled",
        images.len(),
        already_settled
    );

    let states = join_all(images.iter().map(|asset| asset.load())).await;

    let mut report = PreloadReport {
        total: images.len(),
        already_settled,
        ..Default::default()
    };
    for state in states {
        match state {
            LoadState::Ready(_) => report.loaded += 1,
            LoadState::Failed(reason) => {
                warn!("Image will render blank: {}", reason);
                report.failed += 1;
            }
        }
    }

    if report.total > 0 {
        info!(
            "Preload settled: {} loaded, {} failed",
            report.loaded, report.failed
        );
    }
    report
}
