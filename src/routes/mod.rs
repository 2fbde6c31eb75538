use actix_web::http::StatusCode;
use actix_web::{get, web, HttpResponse, ResponseError};
use serde_json::json;

use crate::services::uploads::DownloadError;

pub mod download;
pub mod upload;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    DownloadError(#[from] DownloadError),
    #[error("Template error: {0}")]
    TemplateError(#[from] handlebars::RenderError),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::DownloadError(DownloadError::InvalidType) => StatusCode::BAD_REQUEST,
            ApiError::DownloadError(DownloadError::NotFound(_)) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::DownloadError(error) => HttpResponse::build(self.status_code())
                .content_type("text/plain; charset=utf-8")
                .body(error.to_string()),
            _ => HttpResponse::build(self.status_code()).json(json!({
                "type": "/problem/internal",
                "title": "Unexpected error",
                "status": 500,
                "detail": self.to_string()})),
        }
    }
}

#[get("/api/v1/ping")]
#[tracing::instrument]
pub async fn ping() -> HttpResponse {
    HttpResponse::Ok().content_type("text/plain").body("pong")
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(ping)
        .configure(upload::configure)
        .configure(download::configure);
}
