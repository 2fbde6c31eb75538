use std::path::{Path, PathBuf};

use actix_multipart::{Field, Multipart, MultipartError};
use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::{get, post, web, HttpResponse};
use futures_util::TryStreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use uuid::Uuid;

use crate::model::configuration::ApplicationConfiguration;
use crate::model::GradeReport;
use crate::routes::ApiError;
use crate::services::uploads::{allowed_file, export_filename, secure_filename};
use crate::services::ServiceError;
use crate::startup::ApplicationServices;

const FILE_FIELD: &str = "file";

/// What can go wrong with an upload, shown to the user on the upload form
#[derive(thiserror::Error, Debug)]
pub enum UploadError {
    #[error("No file uploaded")]
    NoFile,
    #[error("No file selected")]
    NoSelection,
    #[error("Invalid file type")]
    InvalidType,
    #[error("File too large")]
    TooLarge,
    #[error("Invalid upload: {0}")]
    Multipart(#[from] MultipartError),
    #[error("No grades found in the PDF")]
    NoGrades,
    #[error("Error processing file: {0}")]
    Processing(String),
}

impl UploadError {
    fn status_code(&self) -> StatusCode {
        match self {
            UploadError::NoFile
            | UploadError::NoSelection
            | UploadError::InvalidType
            | UploadError::Multipart(_) => StatusCode::BAD_REQUEST,
            UploadError::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            UploadError::NoGrades => StatusCode::UNPROCESSABLE_ENTITY,
            UploadError::Processing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for UploadError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::NoGrades => UploadError::NoGrades,
            other => UploadError::Processing(other.to_string()),
        }
    }
}

impl From<std::io::Error> for UploadError {
    fn from(error: std::io::Error) -> Self {
        UploadError::Processing(error.to_string())
    }
}

/// A PDF written to the upload directory
struct StoredUpload {
    id: Uuid,
    secure_name: String,
    path: PathBuf,
}

#[get("/")]
#[tracing::instrument(skip(services))]
pub async fn upload_form(
    services: web::Data<ApplicationServices>,
) -> Result<HttpResponse, ApiError> {
    let page = services.templates.upload_page(None)?;
    Ok(HttpResponse::Ok().content_type(ContentType::html()).body(page))
}

#[post("/")]
#[tracing::instrument(skip(payload, services, configuration))]
pub async fn upload_file(
    payload: Multipart,
    services: web::Data<ApplicationServices>,
    configuration: web::Data<ApplicationConfiguration>,
) -> Result<HttpResponse, ApiError> {
    match receive_and_process(payload, &services, configuration.max_upload_bytes).await {
        Ok(report) => {
            let page = services.templates.results_page(&report)?;
            Ok(HttpResponse::Ok().content_type(ContentType::html()).body(page))
        }
        Err(error) => {
            warn!("Upload rejected: {}", error);
            let page = services.templates.upload_page(Some(&error.to_string()))?;
            Ok(HttpResponse::build(error.status_code())
                .content_type(ContentType::html())
                .body(page))
        }
    }
}

async fn receive_and_process(
    mut payload: Multipart,
    services: &ApplicationServices,
    max_upload_bytes: usize,
) -> Result<GradeReport, UploadError> {
    let mut upload: Option<StoredUpload> = None;
    let received = receive_upload(&mut payload, services, max_upload_bytes, &mut upload).await;

    let result = match (received, &upload) {
        (Err(error), _) => Err(error),
        (Ok(()), None) => Err(UploadError::NoFile),
        (Ok(()), Some(upload)) => services
            .grade_service
            .process(&upload.path, &export_filename(&upload.secure_name, &upload.id))
            .await
            .map_err(UploadError::from),
    };

    if let Some(upload) = &upload {
        remove_upload(&upload.path).await;
    }

    result
}

/// Store the first `file` part of the form into `upload`, reading the rest of the form.
///
/// `upload` is set as soon as a file exists on disk, even when a later part fails.
async fn receive_upload(
    payload: &mut Multipart,
    services: &ApplicationServices,
    max_upload_bytes: usize,
    upload: &mut Option<StoredUpload>,
) -> Result<(), UploadError> {
    while let Some(field) = payload.try_next().await? {
        // a `file` part without filename is a plain form field
        let filename = field
            .content_disposition()
            .get_filename()
            .map(str::to_owned);
        let filename = match filename {
            Some(filename) if field.name() == FILE_FIELD && upload.is_none() => filename,
            _ => {
                drain(field).await?;
                continue;
            }
        };

        if filename.is_empty() {
            return Err(UploadError::NoSelection);
        }
        if !allowed_file(&filename) {
            return Err(UploadError::InvalidType);
        }

        let id = Uuid::new_v4();
        let secure_name = secure_filename(&filename);
        let path = services.grade_service.store().pdf_path(&id, &secure_name);
        info!("Saving {} to {}", filename, path.display());

        *upload = Some(StoredUpload {
            id,
            secure_name,
            path: path.clone(),
        });
        save_field(field, &path, max_upload_bytes).await?;
    }

    Ok(())
}

async fn save_field(
    mut field: Field,
    path: &Path,
    max_upload_bytes: usize,
) -> Result<(), UploadError> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut written = 0usize;

    while let Some(chunk) = field.try_next().await? {
        written += chunk.len();
        if written > max_upload_bytes {
            return Err(UploadError::TooLarge);
        }
        file.write_all(&chunk).await?;
    }

    file.flush().await?;
    Ok(())
}

async fn drain(mut field: Field) -> Result<(), MultipartError> {
    while field.try_next().await?.is_some() {}
    Ok(())
}

async fn remove_upload(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => info!("Cleaned up PDF file: {}", path.display()),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
        Err(error) => warn!("Could not remove {}: {}", path.display(), error),
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(upload_form).service(upload_file);
}
