use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use att2grade::model::configuration::ApplicationConfiguration;
use att2grade::services::ocr::{OcrError, TextExtractor};
use att2grade::services::uploads::ExportStore;
use att2grade::services::GradeService;
use att2grade::startup::ApplicationServices;
use att2grade::templates::Templates;

pub const BOUNDARY: &str = "----att2gradeboundary";

pub const REPORT: &str = "Grades - Jane Doe\n\
    MIS-353-01 Management Information Systems\n\
    Grade tem Points Weight Grade\n\
    Quiz 1 8/10 80%\n\
    Midterm 45/50 90%\n";

/// Stands in for tesseract
pub struct CannedText(Result<String, String>);

#[async_trait]
impl TextExtractor for CannedText {
    async fn extract_text(&self, _pdf_path: &Path) -> Result<String, OcrError> {
        self.0.clone().map_err(|stderr| OcrError::CommandFailed {
            program: String::from("tesseract"),
            status: String::from("exit status: 1"),
            stderr,
        })
    }
}

pub fn services(text: Result<&str, &str>, upload_dir: &Path) -> ApplicationServices {
    let extractor = CannedText(text.map(str::to_owned).map_err(str::to_owned));

    ApplicationServices {
        grade_service: GradeService::new(Arc::new(extractor), ExportStore::new(upload_dir)),
        templates: Templates::new().unwrap(),
    }
}

pub fn configuration(upload_dir: &Path) -> ApplicationConfiguration {
    ApplicationConfiguration {
        upload_dir: upload_dir.to_path_buf(),
        max_upload_bytes: 1024,
        ..ApplicationConfiguration::default()
    }
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

/// One part of a form, to be joined by `multipart_form`
pub fn multipart_part(field: &str, filename: Option<&str>, content: &[u8]) -> Vec<u8> {
    let disposition = match filename {
        Some(filename) => format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/pdf\r\n",
            field, filename
        ),
        None => format!("Content-Disposition: form-data; name=\"{}\"\r\n", field),
    };

    let mut part = format!("--{}\r\n{}\r\n", BOUNDARY, disposition).into_bytes();
    part.extend_from_slice(content);
    part.extend_from_slice(b"\r\n");
    part
}

/// A part whose header block can't be parsed
pub fn malformed_part() -> Vec<u8> {
    format!("--{}\r\nthis is not a header\r\n\r\ngarbage\r\n", BOUNDARY).into_bytes()
}

pub fn multipart_form(parts: &[Vec<u8>]) -> Vec<u8> {
    let mut body = parts.concat();
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// Body of a form with a single field
pub fn multipart_body(field: &str, filename: Option<&str>, content: &[u8]) -> Vec<u8> {
    multipart_form(&[multipart_part(field, filename, content)])
}

/// Files left in the upload directory
pub fn stored_files(upload_dir: &Path) -> Vec<String> {
    let mut files: Vec<String> = std::fs::read_dir(upload_dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    files.sort();
    files
}

macro_rules! spawn_app {
    ($text:expr, $upload_dir:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new(helpers::services(
                    $text,
                    $upload_dir,
                )))
                .app_data(actix_web::web::Data::new(helpers::configuration(
                    $upload_dir,
                )))
                .configure(att2grade::routes::configure),
        )
        .await
    };
}
