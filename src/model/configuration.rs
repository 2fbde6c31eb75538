use std::env::var;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// # Application configuration
///
/// Every value can be overridden with an environment variable (or a `.env` file).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ApplicationConfiguration {
    /// Address the HTTP server binds to
    pub listen_on: String,
    /// Where uploaded PDFs and generated workbooks live
    pub upload_dir: PathBuf,
    /// Upper bound for an uploaded PDF, in bytes
    pub max_upload_bytes: usize,
    pub ocr: OcrConfiguration,
    /// Generated workbooks older than this are purged
    pub export_retention: Duration,
    /// Cron expression of the purge job
    pub purge_cron: String,
    pub rate_limiting: RateLimitingConfiguration,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OcrConfiguration {
    pub tesseract_bin: String,
    pub pdftoppm_bin: String,
    /// Tesseract language code(s), `eng` or `eng+fra`
    pub language: String,
    /// Rendering resolution of every PDF page
    pub dpi: u32,
    /// Bound on every external command
    pub timeout: Duration,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RateLimitingConfiguration {
    /// Seconds needed to get one more request allowed
    pub fill_rate: u64,
    pub bucket_size: u32,
    /// Key the buckets on `Forwarded`/`X-Forwarded-For`, only sound behind a proxy that sets them
    pub trust_forwarded_headers: bool,
}

impl Default for ApplicationConfiguration {
    fn default() -> Self {
        Self {
            listen_on: String::from("0.0.0.0:8080"),
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: 16 * 1024 * 1024,
            ocr: OcrConfiguration::default(),
            export_retention: Duration::from_secs(60 * 60),
            purge_cron: String::from("0 */10 * * * *"),
            rate_limiting: RateLimitingConfiguration::default(),
        }
    }
}

impl Default for OcrConfiguration {
    fn default() -> Self {
        Self {
            tesseract_bin: String::from("tesseract"),
            pdftoppm_bin: String::from("pdftoppm"),
            language: String::from("eng"),
            dpi: 72,
            timeout: Duration::from_secs(120),
        }
    }
}

impl Default for RateLimitingConfiguration {
    fn default() -> Self {
        Self {
            fill_rate: 6,
            bucket_size: 20,
            trust_forwarded_headers: false,
        }
    }
}

impl ApplicationConfiguration {
    /// Build the configuration from the process environment
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| var(key).ok())
    }

    /// Build the configuration from any key/value source, defaults filling the gaps
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let ocr = OcrConfiguration {
            tesseract_bin: lookup("ATT2GRADE_TESSERACT_BIN").unwrap_or(defaults.ocr.tesseract_bin),
            pdftoppm_bin: lookup("ATT2GRADE_PDFTOPPM_BIN").unwrap_or(defaults.ocr.pdftoppm_bin),
            language: lookup("ATT2GRADE_OCR_LANG").unwrap_or(defaults.ocr.language),
            dpi: parse_or(&lookup, "ATT2GRADE_OCR_DPI", defaults.ocr.dpi)?,
            timeout: Duration::from_secs(parse_or(
                &lookup,
                "ATT2GRADE_OCR_TIMEOUT_SECS",
                defaults.ocr.timeout.as_secs(),
            )?),
        };

        let rate_limiting = RateLimitingConfiguration {
            fill_rate: parse_or(
                &lookup,
                "RATE_LIMITING_FILL_RATE",
                defaults.rate_limiting.fill_rate,
            )?,
            bucket_size: parse_or(
                &lookup,
                "RATE_LIMITING_BUCKET_SIZE",
                defaults.rate_limiting.bucket_size,
            )?,
            trust_forwarded_headers: parse_or(
                &lookup,
                "RATE_LIMITING_TRUST_PROXY",
                defaults.rate_limiting.trust_forwarded_headers,
            )?,
        };

        let retention_minutes = parse_or(
            &lookup,
            "ATT2GRADE_EXPORT_RETENTION_MINUTES",
            defaults.export_retention.as_secs() / 60,
        )?;

        Ok(Self {
            listen_on: lookup("ATT2GRADE_LISTEN_ON").unwrap_or(defaults.listen_on),
            upload_dir: lookup("ATT2GRADE_UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            max_upload_bytes: parse_or(
                &lookup,
                "ATT2GRADE_MAX_UPLOAD_BYTES",
                defaults.max_upload_bytes,
            )?,
            ocr,
            export_retention: Duration::from_secs(retention_minutes * 60),
            purge_cron: lookup("ATT2GRADE_PURGE_CRON").unwrap_or(defaults.purge_cron),
            rate_limiting,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {:?}", key, raw)),
        None => Ok(default),
    }
}
