use actix_files::NamedFile;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{get, web};

use crate::routes::ApiError;
use crate::startup::ApplicationServices;

#[get("/download/{filename}")]
#[tracing::instrument(skip(services))]
pub async fn download_file(
    filename: web::Path<String>,
    services: web::Data<ApplicationServices>,
) -> Result<NamedFile, ApiError> {
    let filename = filename.into_inner();
    let path = services.grade_service.store().resolve_export(&filename)?;

    Ok(NamedFile::open_async(&path)
        .await?
        .set_content_disposition(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(filename)],
        }))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(download_file);
}
