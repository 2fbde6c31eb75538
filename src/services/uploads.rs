use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};
use uuid::Uuid;

const ALLOWED_EXTENSIONS: [&str; 1] = ["pdf"];
const EXPORT_EXTENSION: &str = ".xlsx";
const MAX_FILENAME_LENGTH: usize = 255;
/// Room left for the stem once `grades_`, `_{uuid}` and `.xlsx` are added
const MAX_EXPORT_STEM_LENGTH: usize = MAX_FILENAME_LENGTH - 7 - 33 - 5;

static UNSAFE_FILENAME_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.\-]").unwrap());
static UNSAFE_STEM_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_\-]").unwrap());

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum DownloadError {
    #[error("Invalid file type")]
    InvalidType,
    #[error("Error: The file {0} does not exist.")]
    NotFound(String),
}

/// Only PDFs are accepted
pub fn allowed_file(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, extension)| {
            ALLOWED_EXTENSIONS.contains(&extension.to_lowercase().as_str())
        })
        .unwrap_or(false)
}

/// Turn a client supplied filename into something safe to store on disk.
///
/// The result may be empty when nothing usable is left.
pub fn secure_filename(filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();
    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");

    UNSAFE_FILENAME_CHARS
        .replace_all(&joined, "")
        .trim_matches(|c: char| c == '.' || c == '_')
        .to_owned()
}

/// Keep letters, digits, `_` and `-`, and never exceed the filesystem name limit
pub fn sanitize_filename(name: &str) -> String {
    UNSAFE_STEM_CHARS
        .replace_all(name, "")
        .chars()
        .take(MAX_FILENAME_LENGTH)
        .collect()
}

/// Name of the workbook generated for an upload, unique per upload so that it can't be guessed
pub fn export_filename(secure_name: &str, upload_id: &Uuid) -> String {
    let cut = secure_name
        .char_indices()
        .rev()
        .nth(3)
        .map(|(index, _)| index)
        .unwrap_or(0);

    let stem: String = sanitize_filename(&secure_name[..cut])
        .chars()
        .take(MAX_EXPORT_STEM_LENGTH)
        .collect();

    format!("grades_{}_{}{}", stem, upload_id.simple(), EXPORT_EXTENSION)
}

/// # Directory holding uploaded PDFs while they are processed, and generated workbooks
#[derive(Clone, Debug)]
pub struct ExportStore {
    root: PathBuf,
}

impl ExportStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ensure_exists(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)
    }

    /// Unique location for an upload, so that two users sending `grades.pdf` do not collide
    pub fn pdf_path(&self, upload_id: &Uuid, secure_name: &str) -> PathBuf {
        self.root
            .join(format!("{}_{}", upload_id.simple(), secure_name))
    }

    pub fn export_path(&self, export_name: &str) -> PathBuf {
        self.root.join(export_name)
    }

    /// Locate a generated workbook, refusing anything that could escape the directory
    pub fn resolve_export(&self, filename: &str) -> Result<PathBuf, DownloadError> {
        if !filename.ends_with(EXPORT_EXTENSION)
            || filename.contains(['/', '\\'])
            || filename.contains("..")
        {
            return Err(DownloadError::InvalidType);
        }

        let path = self.root.join(filename);
        if path.is_file() {
            Ok(path)
        } else {
            Err(DownloadError::NotFound(filename.to_owned()))
        }
    }

    /// Delete workbooks not modified for `max_age`, returns how many were removed
    #[tracing::instrument(skip(self))]
    pub async fn purge_exports_older_than(&self, max_age: Duration) -> std::io::Result<usize> {
        let now = SystemTime::now();
        let mut removed = 0;
        let mut directory = tokio::fs::read_dir(&self.root).await?;

        while let Some(dir_entry) = directory.next_entry().await? {
            let path = dir_entry.path();
            if !path.to_string_lossy().ends_with(EXPORT_EXTENSION) {
                continue;
            }

            let modified = match dir_entry.metadata().await.and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(error) => {
                    warn!("Could not read metadata of {}: {}", path.display(), error);
                    continue;
                }
            };

            let age = now.duration_since(modified).unwrap_or_default();
            if age >= max_age {
                match tokio::fs::remove_file(&path).await {
                    Ok(()) => {
                        debug!("Purged {}", path.display());
                        removed += 1;
                    }
                    Err(error) => warn!("Could not purge {}: {}", path.display(), error),
                }
            }
        }

        if removed > 0 {
            info!("{} stale workbook(s) purged", removed);
        }

        Ok(removed)
    }
}
