//! Image assets embedded in the document: the profile photo and any
//! background images.
//!
//! An asset carries its encoded source and a decode-once cell. The cell is
//! settled by the preloader before rasterization; a failed decode settles
//! the cell as [`LoadState::Failed`] and is never surfaced as an error.

use crate::error::{ExportError, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

/// Where an asset's encoded bytes come from.
#[derive(Debug, Clone)]
pub enum AssetOrigin {
    /// Bytes held fully in memory (user supplied photo).
    Memory { bytes: Arc<[u8]>, mime: String },
    /// A file read lazily when the asset is first loaded.
    File(PathBuf),
}

/// Outcome of decoding an asset.
#[derive(Debug, Clone)]
pub enum LoadState {
    Ready(Arc<RgbaImage>),
    Failed(String),
}

/// An image referenced from a render tree.
#[derive(Debug)]
pub struct ImageAsset {
    origin: AssetOrigin,
    state: OnceCell<LoadState>,
}

/// The user's profile photo. Shared by reference between the preview and
/// the export render.
pub type ProfileAsset = Arc<ImageAsset>;

impl ImageAsset {
    /// Wrap encoded image bytes. The format is sniffed for the MIME type only;
    /// undecodable bytes are accepted and fail later at load time.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes: Vec<u8> = bytes.into();
        let mime = image::guess_format(&bytes)
            .map(|format| format.to_mime_type().to_string())
            .unwrap_or_else(|_| "application/octet-stream".to_string());

        Self {
            origin: AssetOrigin::Memory {
                bytes: Arc::from(bytes),
                mime,
            },
            state: OnceCell::new(),
        }
    }

    /// Read an image file fully into memory.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ExportError::AssetLoad(format!("{}: {}", path.display(), e)))?;
        debug!("Read {} bytes of image data from {:?}", bytes.len(), path);
        Ok(Self::from_bytes(bytes))
    }

    /// Reference an image on disk without reading it yet.
    pub fn file_backed(path: impl Into<PathBuf>) -> Self {
        Self {
            origin: AssetOrigin::File(path.into()),
            state: OnceCell::new(),
        }
    }

    /// Get the asset origin.
    pub fn origin(&self) -> &AssetOrigin {
        &self.origin
    }

    /// Whether the asset has finished loading, successfully or not.
    pub fn is_settled(&self) -> bool {
        self.state.initialized()
    }

    /// Current load state, if settled.
    pub fn state(&self) -> Option<&LoadState> {
        self.state.get()
    }

    /// Decoded bitmap, if the asset loaded successfully.
    pub fn bitmap(&self) -> Option<Arc<RgbaImage>> {
        match self.state.get() {
            Some(LoadState::Ready(image)) => Some(Arc::clone(image)),
            _ => None,
        }
    }

    /// Load and decode the asset once. Concurrent callers share one decode.
    pub async fn load(&self) -> &LoadState {
        self.state.get_or_init(|| decode(self.origin.clone())).await
    }

    /// URL usable as an HTML `src`: a data URI for in-memory bytes, a
    /// `file://` URL otherwise.
    pub fn src(&self) -> String {
        match &self.origin {
            AssetOrigin::Memory { bytes, mime } => {
                format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
            }
            AssetOrigin::File(path) => format!("file://{}", path.display()),
        }
    }
}

async fn decode(origin: AssetOrigin) -> LoadState {
    let bytes: Arc<[u8]> = match origin {
        AssetOrigin::Memory { bytes, .. } => bytes,
        AssetOrigin::File(path) => match tokio::fs::read(&path).await {
            Ok(bytes) => Arc::from(bytes),
            Err(e) => {
                warn!("Failed to read image {:?}: {}", path, e);
                return LoadState::Failed(e.to_string());
            }
        },
    };

    let decoded = tokio::task::spawn_blocking(move || {
        image::load_from_memory(&bytes).map(|image| image.to_rgba8())
    })
    .await;

    match decoded {
        Ok(Ok(image)) => {
            debug!("Decoded image {}x{}", image.width(), image.height());
            LoadState::Ready(Arc::new(image))
        }
        Ok(Err(e)) => {
            warn!("Failed to decode image: {}", e);
            LoadState::Failed(e.to_string())
        }
        Err(e) => {
            warn!("Image decode task failed: {}", e);
            LoadState::Failed(e.to_string())
        }
    }
}

/// Session-owned holder of the current profile photo.
///
/// Cloning shares the slot. Replacing the photo swaps the whole `Arc`, so a
/// render that already took a snapshot keeps the photo it started with.
#[derive(Debug, Clone, Default)]
pub struct PhotoSlot {
    current: Arc<RwLock<Option<ProfileAsset>>>,
}

impl PhotoSlot {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the photo.
    pub fn set(&self, asset: ProfileAsset) {
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        *current = Some(asset);
    }

    /// Remove the photo.
    pub fn clear(&self) {
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        *current = None;
    }

    /// Snapshot of the current photo.
    pub fn current(&self) -> Option<ProfileAsset> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;

    /// Encode a solid-colour PNG for tests.
    pub(crate) fn png_bytes(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, Rgba(color));
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_from_bytes_sniffs_png() {
        let asset = ImageAsset::from_bytes(png_bytes(2, 2, [255, 0, 0, 255]));
        match asset.origin() {
            AssetOrigin::Memory { mime, .. } => assert_eq!(mime, "image/png"),
            _ => panic!("Expected in-memory origin"),
        }
        assert!(!asset.is_settled());
    }

    #[test]
    fn test_from_bytes_unknown_format_still_accepted() {
        let asset = ImageAsset::from_bytes(vec![1, 2, 3, 4]);
        assert!(asset.src().starts_with("data:application/octet-stream;base64,"));
    }

    #[test]
    fn test_src_is_data_uri() {
        let asset = ImageAsset::from_bytes(png_bytes(1, 1, [0, 0, 0, 255]));
        assert!(asset.src().starts_with("data:image/png;base64,iVBOR"));
    }

    #[test]
    fn test_file_backed_src() {
        let asset = ImageAsset::file_backed("/tmp/paper.png");
        assert_eq!(asset.src(), "file:///tmp/paper.png");
    }

    #[tokio::test]
    async fn test_load_valid_png() {
        let asset = ImageAsset::from_bytes(png_bytes(3, 2, [0, 255, 0, 255]));
        match asset.load().await {
            LoadState::Ready(image) => {
                assert_eq!(image.dimensions(), (3, 2));
            }
            LoadState::Failed(e) => panic!("Unexpected failure: {}", e),
        }
        assert!(asset.is_settled());
        assert!(asset.bitmap().is_some());
    }

    #[tokio::test]
    async fn test_load_garbage_settles_as_failed() {
        let asset = ImageAsset::from_bytes(vec![0u8; 16]);
        assert!(matches!(asset.load().await, LoadState::Failed(_)));
        assert!(asset.is_settled());
        assert!(asset.bitmap().is_none());
    }

    #[tokio::test]
    async fn test_load_missing_file_settles_as_failed() {
        let asset = ImageAsset::file_backed("/nonexistent/background.png");
        assert!(matches!(asset.load().await, LoadState::Failed(_)));
    }

    #[tokio::test]
    async fn test_from_file_missing_is_error() {
        let result = ImageAsset::from_file("/nonexistent/photo.jpg").await;
        assert!(matches!(result, Err(ExportError::AssetLoad(_))));
    }

    #[tokio::test]
    async fn test_from_file_reads_bytes() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("photo.png");
        std::fs::write(&path, png_bytes(4, 4, [9, 9, 9, 255])).unwrap();

        let asset = ImageAsset::from_file(&path).await.unwrap();
        assert!(matches!(asset.load().await, LoadState::Ready(_)));
    }

    // ========== PhotoSlot tests ==========

    #[test]
    fn test_photo_slot_starts_empty() {
        assert!(PhotoSlot::new().current().is_none());
    }

    #[test]
    fn test_photo_slot_replace_is_atomic_swap() {
        let slot = PhotoSlot::new();
        let first: ProfileAsset = Arc::new(ImageAsset::from_bytes(png_bytes(1, 1, [1, 1, 1, 255])));
        let second: ProfileAsset = Arc::new(ImageAsset::from_bytes(png_bytes(1, 1, [2, 2, 2, 255])));

        slot.set(Arc::clone(&first));
        let snapshot = slot.current().unwrap();
        slot.set(Arc::clone(&second));

        assert!(Arc::ptr_eq(&snapshot, &first));
        assert!(Arc::ptr_eq(&slot.current().unwrap(), &second));
    }

    #[test]
    fn test_photo_slot_clone_shares_state() {
        let slot = PhotoSlot::new();
        let shared = slot.clone();
        slot.set(Arc::new(ImageAsset::from_bytes(png_bytes(1, 1, [0, 0, 0, 255]))));
        assert!(shared.current().is_some());

        shared.clear();
        assert!(slot.current().is_none());
    }
}
