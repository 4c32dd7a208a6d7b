//! Configuration types for rendering and export.

use crate::error::{ExportError, Result};
use crate::layout::PaginationPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// CSS reference resolution used for the document's pixel units.
pub const CSS_DPI: f32 = 96.0;

const MM_PER_INCH: f32 = 25.4;

/// Fixed page geometry. Only A4 portrait is targeted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageGeometry {
    /// Page width in millimetres.
    /// Default: 210 (A4).
    pub width_mm: f32,

    /// Page height in millimetres.
    /// Default: 297 (A4).
    pub height_mm: f32,

    /// PDF page margin around the placed page image.
    /// Default: 0.
    pub margin_mm: f32,

    /// Inner padding of each rendered page.
    /// Default: 12.7 (half an inch).
    pub padding_mm: f32,

    /// Optional image drawn behind every page, stretched to the page box.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_image: Option<PathBuf>,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4()
    }
}

impl PageGeometry {
    /// A4 portrait with no PDF margin.
    pub fn a4() -> Self {
        Self {
            width_mm: 210.0,
            height_mm: 297.0,
            margin_mm: 0.0,
            padding_mm: 12.7,
            background_image: None,
        }
    }

    /// Convert millimetres to CSS pixels.
    pub fn mm_to_px(mm: f32) -> f32 {
        mm * CSS_DPI / MM_PER_INCH
    }

    /// Convert millimetres to PDF points.
    pub fn mm_to_pt(mm: f32) -> f32 {
        mm * 72.0 / MM_PER_INCH
    }

    /// Page width in CSS pixels (794 for A4).
    pub fn width_px(&self) -> f32 {
        Self::mm_to_px(self.width_mm).round()
    }

    /// Page height in CSS pixels (1123 for A4).
    pub fn height_px(&self) -> f32 {
        Self::mm_to_px(self.height_mm).round()
    }

    /// Inner page padding in CSS pixels.
    pub fn padding_px(&self) -> f32 {
        Self::mm_to_px(self.padding_mm)
    }

    /// Validate the geometry.
    pub fn validate(&self) -> Result<()> {
        if self.width_mm <= 0.0 || self.height_mm <= 0.0 {
            return Err(ExportError::InvalidConfig(
                "page dimensions must be positive".to_string(),
            ));
        }
        if self.height_mm < self.width_mm {
            return Err(ExportError::InvalidConfig(
                "only portrait pages are supported".to_string(),
            ));
        }
        if self.margin_mm < 0.0 || self.margin_mm * 2.0 >= self.width_mm {
            return Err(ExportError::InvalidConfig(
                "margin_mm must be non-negative and smaller than half the page width".to_string(),
            ));
        }
        if self.padding_mm < 0.0 || self.padding_mm * 2.0 >= self.width_mm {
            return Err(ExportError::InvalidConfig(
                "padding_mm must be non-negative and smaller than half the page width".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration for rasterization and image encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterConfig {
    /// Device pixels per CSS pixel.
    /// Default: 2.0.
    pub scale: f32,

    /// JPEG quality for PDF page images (1-100).
    /// Default: 98.
    pub jpeg_quality: u8,

    /// PNG compression level (0-9, higher = smaller file, slower).
    /// Default: 6.
    pub png_compression: u8,

    /// Canvas background colour.
    /// Default: white (255, 255, 255).
    pub background_color: (u8, u8, u8),

    /// Number of threads for parallel page encoding.
    /// Default: number of CPU cores.
    pub encode_threads: usize,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            scale: 2.0,
            jpeg_quality: 98,
            png_compression: 6,
            background_color: (255, 255, 255),
            encode_threads: num_cpus::get(),
        }
    }
}

impl RasterConfig {
    /// Create a raster config with the given scale.
    pub fn with_scale(scale: f32) -> Self {
        Self {
            scale,
            ..Default::default()
        }
    }

    /// Set JPEG quality.
    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// Set PNG compression level.
    pub fn png_compression(mut self, level: u8) -> Self {
        self.png_compression = level.min(9);
        self
    }

    /// Set the number of encode threads.
    pub fn encode_threads(mut self, threads: usize) -> Self {
        self.encode_threads = threads;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !(1.0..=8.0).contains(&self.scale) {
            return Err(ExportError::InvalidConfig(
                "scale must be between 1 and 8".to_string(),
            ));
        }
        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(ExportError::InvalidConfig(
                "jpeg_quality must be between 1 and 100".to_string(),
            ));
        }
        if self.encode_threads == 0 {
            return Err(ExportError::InvalidConfig(
                "encode_threads must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Output file locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving exported files.
    /// Default: current directory.
    pub output_dir: PathBuf,

    /// Default: "cv.pdf".
    pub pdf_filename: String,

    /// Default: "cv.png".
    pub image_filename: String,

    /// Default: "cv-print.html".
    pub print_filename: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            pdf_filename: "cv.pdf".to_string(),
            image_filename: "cv.png".to_string(),
            print_filename: "cv-print.html".to_string(),
        }
    }
}

impl OutputConfig {
    /// Full path of the PDF output.
    pub fn pdf_path(&self) -> PathBuf {
        self.output_dir.join(&self.pdf_filename)
    }

    /// Full path of the PNG output.
    pub fn image_path(&self) -> PathBuf {
        self.output_dir.join(&self.image_filename)
    }

    /// Full path of the print document.
    pub fn print_path(&self) -> PathBuf {
        self.output_dir.join(&self.print_filename)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        for (field, name) in [
            ("pdf_filename", &self.pdf_filename),
            ("image_filename", &self.image_filename),
            ("print_filename", &self.print_filename),
        ] {
            if name.is_empty() || name.contains('/') || name.contains('\\') {
                return Err(ExportError::InvalidConfig(format!(
                    "{} must be a plain, non-empty file name",
                    field
                )));
            }
        }
        Ok(())
    }
}

/// Configuration for the host print hand-off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrintConfig {
    /// Command receiving the print document. If None, searches PATH for
    /// xdg-open, open, then lp.
    pub command: Option<PathBuf>,

    /// Extra arguments placed before the document path.
    pub args: Vec<String>,

    /// Time to wait for the command to return.
    /// Default: 30 seconds.
    pub timeout: Duration,
}

impl Default for PrintConfig {
    fn default() -> Self {
        Self {
            command: None,
            args: Vec::new(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Font sources for the raster engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Whether to scan the system font directories.
    /// Default: true.
    pub load_system_fonts: bool,

    /// Additional directories to load fonts from.
    pub font_dirs: Vec<PathBuf>,

    /// Preferred family. If None, the generic sans-serif family is used.
    pub family: Option<String>,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            load_system_fonts: true,
            font_dirs: Vec::new(),
            family: None,
        }
    }
}

/// Section headings and fixed document strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Labels {
    pub summary: String,
    pub experience: String,
    pub experience_continued: String,
    pub education: String,
    pub core_skills: String,
    pub technical_skills: String,
    pub languages: String,
    pub certificates: String,
    pub ethics: String,
    pub footer_note: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            summary: "Professional Summary".to_string(),
            experience: "Professional Experience".to_string(),
            experience_continued: "Professional Experience (continued)".to_string(),
            education: "Education".to_string(),
            core_skills: "Areas of Expertise".to_string(),
            technical_skills: "Technical Skills".to_string(),
            languages: "Languages".to_string(),
            certificates: "Certificates".to_string(),
            ethics: "Ethics & Child Safeguarding".to_string(),
            footer_note: "ATS-Compliant Format".to_string(),
        }
    }
}

/// Combined configuration consumed by the renderer and the export pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Page geometry.
    pub page: PageGeometry,

    /// Rasterization settings.
    pub raster: RasterConfig,

    /// Output locations.
    pub output: OutputConfig,

    /// Print hand-off.
    pub print: PrintConfig,

    /// Font sources.
    pub fonts: FontConfig,

    /// Static section-to-page assignment.
    pub pagination: PaginationPolicy,

    /// Section headings.
    pub labels: Labels,

    /// Pause after asset preload before rasterizing.
    /// Default: 500 ms.
    pub settle_delay: Duration,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            page: PageGeometry::default(),
            raster: RasterConfig::default(),
            output: OutputConfig::default(),
            print: PrintConfig::default(),
            fonts: FontConfig::default(),
            pagination: PaginationPolicy::default(),
            labels: Labels::default(),
            settle_delay: Duration::from_millis(500),
        }
    }
}

impl ExportConfig {
    /// Load a configuration file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ExportError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|e| {
            ExportError::InvalidConfig(format!("cannot parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Set the output directory.
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output.output_dir = dir.into();
        self
    }

    /// Set the raster scale.
    pub fn scale(mut self, scale: f32) -> Self {
        self.raster.scale = scale;
        self
    }

    /// Set the settle delay.
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Set how many experience entries go on the first exported page.
    pub fn first_page_jobs(mut self, jobs: usize) -> Self {
        self.pagination.first_page_jobs = jobs;
        self
    }

    /// Set the print command.
    pub fn print_command(mut self, command: impl Into<PathBuf>) -> Self {
        self.print.command = Some(command.into());
        self
    }

    /// Validate the entire configuration.
    pub fn validate(&self) -> Result<()> {
        self.page.validate()?;
        self.raster.validate()?;
        self.output.validate()?;
        if self.print.timeout.is_zero() {
            return Err(ExportError::InvalidConfig(
                "print.timeout must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // PageGeometry tests
    #[test]
    fn test_a4_pixel_dimensions() {
        let page = PageGeometry::a4();
        assert_eq!(page.width_px(), 794.0);
        assert_eq!(page.height_px(), 1123.0);
    }

    #[test]
    fn test_a4_point_dimensions() {
        assert!((PageGeometry::mm_to_pt(210.0) - 595.28).abs() < 0.01);
        assert!((PageGeometry::mm_to_pt(297.0) - 841.89).abs() < 0.01);
    }

    #[test]
    fn test_page_validation_rejects_landscape() {
        let page = PageGeometry {
            width_mm: 297.0,
            height_mm: 210.0,
            ..PageGeometry::a4()
        };
        assert!(page.validate().is_err());
    }

    #[test]
    fn test_page_validation_rejects_huge_margin() {
        let page = PageGeometry {
            margin_mm: 120.0,
            ..PageGeometry::a4()
        };
        assert!(page.validate().is_err());
    }

    // RasterConfig tests
    #[test]
    fn test_raster_config_defaults() {
        let config = RasterConfig::default();
        assert_eq!(config.scale, 2.0);
        assert_eq!(config.jpeg_quality, 98);
        assert_eq!(config.png_compression, 6);
        assert_eq!(config.background_color, (255, 255, 255));
        assert!(config.encode_threads > 0);
    }

    #[test]
    fn test_raster_config_builder_pattern() {
        let config = RasterConfig::with_scale(3.0)
            .jpeg_quality(80)
            .png_compression(9)
            .encode_threads(2);

        assert_eq!(config.scale, 3.0);
        assert_eq!(config.jpeg_quality, 80);
        assert_eq!(config.png_compression, 9);
        assert_eq!(config.encode_threads, 2);
    }

    #[test]
    fn test_raster_config_clamps() {
        let config = RasterConfig::default().jpeg_quality(0).png_compression(15);
        assert_eq!(config.jpeg_quality, 1);
        assert_eq!(config.png_compression, 9);
    }

    #[test]
    fn test_raster_config_validation_scale() {
        assert!(RasterConfig::with_scale(2.0).validate().is_ok());
        assert!(RasterConfig::with_scale(0.5).validate().is_err());
        assert!(RasterConfig::with_scale(9.0).validate().is_err());
    }

    #[test]
    fn test_raster_config_validation_zero_threads() {
        let mut config = RasterConfig::default();
        config.encode_threads = 0;
        assert!(config.validate().is_err());
    }

    // OutputConfig tests
    #[test]
    fn test_output_paths() {
        let config = OutputConfig {
            output_dir: PathBuf::from("/out"),
            ..Default::default()
        };
        assert_eq!(config.pdf_path(), PathBuf::from("/out/cv.pdf"));
        assert_eq!(config.image_path(), PathBuf::from("/out/cv.png"));
        assert_eq!(config.print_path(), PathBuf::from("/out/cv-print.html"));
    }

    #[test]
    fn test_output_validation_rejects_nested_name() {
        let config = OutputConfig {
            pdf_filename: "sub/cv.pdf".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    // ExportConfig tests
    #[test]
    fn test_export_config_defaults() {
        let config = ExportConfig::default();
        assert_eq!(config.settle_delay, Duration::from_millis(500));
        assert_eq!(config.pagination.first_page_jobs, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_export_config_builder_chaining() {
        let config = ExportConfig::default()
            .output_dir("/tmp/cv")
            .scale(3.0)
            .settle_delay(Duration::ZERO)
            .first_page_jobs(3)
            .print_command("/usr/bin/lp");

        assert_eq!(config.output.output_dir, PathBuf::from("/tmp/cv"));
        assert_eq!(config.raster.scale, 3.0);
        assert!(config.settle_delay.is_zero());
        assert_eq!(config.pagination.first_page_jobs, 3);
        assert_eq!(config.print.command, Some(PathBuf::from("/usr/bin/lp")));
    }

    #[test]
    fn test_export_config_validate_propagates() {
        let config = ExportConfig::default().scale(0.0);
        assert!(config.validate().is_err());

        let mut config2 = ExportConfig::default();
        config2.print.timeout = Duration::ZERO;
        assert!(config2.validate().is_err());
    }

    #[test]
    fn test_export_config_partial_json() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "raster": { "scale": 3.0 }, "pagination": { "first_page_jobs": 1 } }"#,
        )
        .unwrap();

        let config = ExportConfig::from_json_file(&path).unwrap();
        assert_eq!(config.raster.scale, 3.0);
        assert_eq!(config.raster.jpeg_quality, 98);
        assert_eq!(config.pagination.first_page_jobs, 1);
        assert_eq!(config.output.pdf_filename, "cv.pdf");
    }

    #[test]
    fn test_export_config_invalid_json_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "raster": { "scale": 50.0 } }"#).unwrap();
        assert!(matches!(
            ExportConfig::from_json_file(&path),
            Err(ExportError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_labels_default_english() {
        let labels = Labels::default();
        assert_eq!(labels.education, "Education");
        assert!(labels.experience_continued.contains("continued"));
    }
}
