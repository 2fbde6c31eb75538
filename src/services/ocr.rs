use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::model::configuration::OcrConfiguration;

#[derive(thiserror::Error, Debug)]
pub enum OcrError {
    #[error("Could not run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("{program} did not finish within {timeout:?}")]
    Timeout { program: String, timeout: Duration },
    #[error("The PDF has no page to read")]
    NoPages,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Something able to read the text of a scanned PDF
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_text(&self, pdf_path: &Path) -> Result<String, OcrError>;
}

/// Renders every page with poppler's `pdftoppm` then reads it with `tesseract`
#[derive(Clone, Debug)]
pub struct TesseractExtractor {
    configuration: OcrConfiguration,
}

impl TesseractExtractor {
    pub fn new(configuration: OcrConfiguration) -> Self {
        Self { configuration }
    }

    async fn run(&self, program: &str, args: &[&str]) -> Result<Output, OcrError> {
        debug!(program, ?args, "Running OCR command");

        let mut command = Command::new(program);
        command.args(args).kill_on_drop(true);
        let output = tokio::time::timeout(self.configuration.timeout, command.output())
            .await
            .map_err(|_| OcrError::Timeout {
                program: program.to_owned(),
                timeout: self.configuration.timeout,
            })?
            .map_err(|source| OcrError::Spawn {
                program: program.to_owned(),
                source,
            })?;

        if !output.status.success() {
            return Err(OcrError::CommandFailed {
                program: program.to_owned(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }

        Ok(output)
    }

    /// Rasterise the PDF into `directory`, returns the pages in reading order
    async fn render_pages(&self, pdf_path: &Path, directory: &Path) -> Result<Vec<PathBuf>, OcrError> {
        let prefix = directory.join("page");
        let dpi = self.configuration.dpi.to_string();
        let pdf = pdf_path.to_string_lossy();
        let prefix_arg = prefix.to_string_lossy();

        self.run(
            &self.configuration.pdftoppm_bin,
            &["-png", "-r", &dpi, &pdf, &prefix_arg],
        )
        .await?;

        let mut pages = Vec::new();
        let mut entries = tokio::fs::read_dir(directory).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if let Some(number) = page_number(&path) {
                pages.push((number, path));
            }
        }
        pages.sort_by_key(|(number, _)| *number);

        Ok(pages.into_iter().map(|(_, path)| path).collect())
    }

    async fn read_page(&self, page: &Path) -> Result<String, OcrError> {
        let page = page.to_string_lossy();
        let output = self
            .run(
                &self.configuration.tesseract_bin,
                &[&page, "stdout", "-l", &self.configuration.language],
            )
            .await?;

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl TextExtractor for TesseractExtractor {
    #[tracing::instrument(skip(self))]
    async fn extract_text(&self, pdf_path: &Path) -> Result<String, OcrError> {
        let scratch = tempfile::tempdir()?;
        let pages = self.render_pages(pdf_path, scratch.path()).await?;
        if pages.is_empty() {
            return Err(OcrError::NoPages);
        }

        let mut text = String::new();
        for page in &pages {
            text.push_str(&self.read_page(page).await?);
            text.push('\n');
        }

        info!(pages = pages.len(), characters = text.len(), "OCR done");
        Ok(text)
    }
}

/// `page-07.png` is page 7, anything else is not a rendered page
fn page_number(path: &Path) -> Option<u32> {
    if path.extension()? != "png" {
        return None;
    }

    let stem = path.file_stem()?.to_str()?;
    stem.rsplit_once('-')?.1.parse().ok()
}
