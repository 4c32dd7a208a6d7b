//! Print backend: hand the preview document to the host's print pipeline.
//!
//! The tree is written as a standalone HTML document with print CSS, then
//! opened with the configured command or the first of `xdg-open`, `open`
//! and `lp` found on PATH. Pagination is left to whatever prints it.

use super::{write_output, Artifact, ExportBackend, ExportStrategy, ExportTarget};
use crate::config::{ExportConfig, PrintConfig};
use crate::error::{ExportError, Result};
use crate::html::to_html;
use async_process::Command;
use futures::future::BoxFuture;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::time::timeout;
use tracing::{debug, error, info};

/// Commands tried, in order, when none is configured.
const DEFAULT_COMMANDS: [&str; 3] = ["xdg-open", "open", "lp"];

/// Writes `cv-print.html` and sends it to the host print command.
#[derive(Debug, Default, Clone)]
pub struct PrintBackend;

impl PrintBackend {
    pub fn new() -> Self {
        Self
    }

    async fn export(&self, target: &ExportTarget, config: &ExportConfig) -> Result<Artifact> {
        let start = Instant::now();
        let command = find_print_command(&config.print)?;

        let html = to_html(&target.tree, &target.title);
        let path = config.output.print_path();
        write_output(&path, html.as_bytes()).await?;

        run_print_command(&command, &config.print, &path).await?;

        info!(
            "Handed {:?} to {:?} in {:?}",
            path,
            command,
            start.elapsed()
        );
        Ok(Artifact {
            strategy: ExportStrategy::Print,
            path,
            bytes: html.len(),
            pages: target.tree.page_count(),
            dimensions: None,
        })
    }
}

impl ExportBackend for PrintBackend {
    fn strategy(&self) -> ExportStrategy {
        ExportStrategy::Print
    }

    fn render<'a>(
        &'a self,
        target: &'a ExportTarget,
        config: &'a ExportConfig,
    ) -> BoxFuture<'a, Result<Artifact>> {
        Box::pin(self.export(target, config))
    }
}

/// Resolve the command that will receive the print document.
pub fn find_print_command(config: &PrintConfig) -> Result<PathBuf> {
    if let Some(ref command) = config.command {
        if command.exists() {
            return Ok(command.clone());
        }
        // Bare names are looked up on PATH.
        return which::which(command).map_err(|_| ExportError::PrintCommandNotFound);
    }

    DEFAULT_COMMANDS
        .iter()
        .find_map(|name| which::which(name).ok())
        .ok_or(ExportError::PrintCommandNotFound)
}

async fn run_print_command(command: &Path, config: &PrintConfig, document: &Path) -> Result<()> {
    let mut cmd = Command::new(command);
    cmd.kill_on_drop(true);
    cmd.args(&config.args);
    cmd.arg(document);
    debug!("Running {:?} {:?} {:?}", command, config.args, document);

    let output = timeout(config.timeout, cmd.output())
        .await
        .map_err(|_| ExportError::PrintTimeout {
            timeout_secs: config.timeout.as_secs(),
        })?
        .map_err(|e| ExportError::PrintFailed {
            command: command.to_path_buf(),
            message: e.to_string(),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let message = if stderr.is_empty() {
            format!("exited with {}", output.status)
        } else {
            stderr
        };
        error!("Print command {:?} failed: {}", command, message);
        return Err(ExportError::PrintFailed {
            command: command.to_path_buf(),
            message,
        });
    }
    Ok(())
}
