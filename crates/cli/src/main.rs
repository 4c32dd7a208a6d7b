//! Command line front end for cv-export.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use cv_export_core::review::{diagnose, score, PdfScanner};
use cv_export_core::{
    html, init_logging, render, CvContent, EngineHandle, ExportConfig, ExportOrchestrator,
    ExportOutcome, ExportStrategy, ImageAsset, PhotoSlot, ProfileAsset, RenderMode,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "cv-export", version, about = "Render and export a two-page A4 CV")]
struct Cli {
    /// CV content as JSON. The built-in sample is used when omitted.
    #[arg(short, long, global = true)]
    content: Option<PathBuf>,

    /// Profile photo.
    #[arg(short, long, global = true)]
    photo: Option<PathBuf>,

    /// Export configuration as JSON.
    #[arg(short = 'C', long, global = true)]
    config: Option<PathBuf>,

    /// Directory for output files, overriding the configuration.
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export the CV.
    Export {
        #[arg(value_enum)]
        format: Format,
    },
    /// Write the on-screen preview as HTML.
    Preview,
    /// Score the content and, optionally, an exported PDF.
    Review {
        /// PDF to measure for ink density and margins.
        #[arg(long)]
        pdf: Option<PathBuf>,
    },
    /// Check the content against the two-page layout's limits.
    Diagnose,
    /// Print the sample content as JSON.
    Sample,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Pdf,
    Png,
    Print,
}

impl From<Format> for ExportStrategy {
    fn from(format: Format) -> Self {
        match format {
            Format::Pdf => ExportStrategy::Pdf,
            Format::Png => ExportStrategy::Image,
            Format::Print => ExportStrategy::Print,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let content = match &cli.content {
        Some(path) => CvContent::from_path(path)?,
        None => CvContent::sample(),
    };

    match &cli.command {
        Command::Sample => {
            println!("{}", content.to_json_pretty()?);
        }
        Command::Diagnose => {
            println!("{}", serde_json::to_string_pretty(&diagnose(&content))?);
        }
        Command::Review { pdf } => {
            let ink = match pdf {
                Some(path) => scan_pdf(path),
                None => None,
            };
            let file_name = pdf
                .as_deref()
                .and_then(Path::file_name)
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "cv.pdf".to_string());
            let scores = score(&content, ink.as_ref(), &file_name);
            println!("{}", serde_json::to_string_pretty(&scores)?);
        }
        Command::Preview => {
            let config = load_config(&cli)?;
            let photo = load_photo(cli.photo.as_deref()).await?;
            let tree = render(&content, photo.as_ref(), RenderMode::Preview, &config);
            let path = config.output.output_dir.join("cv-preview.html");
            std::fs::create_dir_all(&config.output.output_dir).with_context(|| {
                format!("creating {}", config.output.output_dir.display())
            })?;
            std::fs::write(&path, html::to_html(&tree, &content.name))
                .with_context(|| format!("writing {}", path.display()))?;
            println!("{}", path.display());
        }
        Command::Export { format } => {
            let config = load_config(&cli)?;
            let strategy = ExportStrategy::from(*format);

            let engine = EngineHandle::spawn(config.fonts.clone());
            if strategy != ExportStrategy::Print {
                engine.wait_ready().await?;
            }

            let slot = PhotoSlot::new();
            if let Some(photo) = load_photo(cli.photo.as_deref()).await? {
                slot.set(photo);
            }

            let orchestrator =
                ExportOrchestrator::new(content, config, engine).with_photo_slot(slot);
            match orchestrator.export(strategy).await {
                ExportOutcome::Completed(artifact) => {
                    info!(
                        "{} export: {} page(s), {} bytes",
                        artifact.strategy, artifact.pages, artifact.bytes
                    );
                    println!("{}", artifact.path.display());
                }
                ExportOutcome::Rejected => bail!("another export is already running"),
                ExportOutcome::Failed(message) => bail!(message),
            }
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<ExportConfig> {
    let mut config = match &cli.config {
        Some(path) => ExportConfig::from_json_file(path)?,
        None => ExportConfig::default(),
    };
    if let Some(dir) = &cli.output_dir {
        config = config.output_dir(dir);
    }
    config.validate()?;
    Ok(config)
}

async fn load_photo(path: Option<&Path>) -> Result<Option<ProfileAsset>> {
    match path {
        Some(path) => {
            let asset = ImageAsset::from_file(path)
                .await
                .with_context(|| format!("reading photo {}", path.display()))?;
            Ok(Some(Arc::new(asset)))
        }
        None => Ok(None),
    }
}

/// Measure the PDF, or report why the design score will be partial.
fn scan_pdf(path: &Path) -> Option<cv_export_core::review::InkStats> {
    let result = PdfScanner::new().and_then(|scanner| scanner.scan(path));
    match result {
        Ok(stats) => Some(stats),
        Err(e) => {
            warn!("Visual analysis of {} failed: {}", path.display(), e);
            None
        }
    }
}
