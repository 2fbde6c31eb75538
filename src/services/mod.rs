use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::model::GradeReport;
use crate::services::export::ExportError;
use crate::services::ocr::{OcrError, TextExtractor};
use crate::services::uploads::ExportStore;

pub mod export;
pub mod grading;
pub mod ocr;
pub mod parsing;
pub mod uploads;

#[derive(thiserror::Error, Debug)]
pub enum ServiceError {
    #[error("OCR error: {0}")]
    OcrError(#[from] OcrError),
    #[error("No grades found in the PDF")]
    NoGrades,
    #[error("Export error: {0}")]
    ExportError(#[from] ExportError),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

/// # Turns an uploaded grade report into a [GradeReport]
#[derive(Clone)]
pub struct GradeService {
    extractor: Arc<dyn TextExtractor>,
    store: ExportStore,
}

impl GradeService {
    pub fn new(extractor: Arc<dyn TextExtractor>, store: ExportStore) -> Self {
        Self { extractor, store }
    }

    pub fn store(&self) -> &ExportStore {
        &self.store
    }

    /// OCR the PDF, read its grades and write them as `export_name` in the store
    #[tracing::instrument(skip(self))]
    pub async fn process(
        &self,
        pdf_path: &Path,
        export_name: &str,
    ) -> Result<GradeReport, ServiceError> {
        let text = self.extractor.extract_text(pdf_path).await?;
        info!("Extracted text length: {}", text.len());

        let course_title = parsing::extract_course_title(&text);
        info!("Found course title: {}", course_title);

        let entries = parsing::extract_assignments_and_grades(&text);
        if entries.is_empty() {
            return Err(ServiceError::NoGrades);
        }

        let export_path = self.store.export_path(export_name);
        let to_export = entries.clone();
        tokio::task::spawn_blocking(move || export::save_to_excel(&to_export, &export_path))
            .await
            .map_err(anyhow::Error::from)??;

        let overall_grade = grading::calculate_overall_grade(&entries);
        info!("Overall grade: {}", overall_grade);

        Ok(GradeReport {
            course_title,
            entries,
            overall_grade,
            excel_filename: export_name.to_owned(),
            generated_at: Utc::now(),
        })
    }
}


#[cfg(test)]
mod tests {
    use speculoos::prelude::*;

    use super::testing::grade_service;
    use super::*;

    const REPORT: &str = "MIS-353-01 Intro to MIS\nQuiz 1 8/10 80%\nMidterm 45/50\n";

    #[tokio::test]
    async fn a_report_is_parsed_graded_and_exported() {
        let directory = tempfile::tempdir().unwrap();
        let service = grade_service(Ok(REPORT), directory.path());

        let report = service
            .process(Path::new("ignored.pdf"), "grades_report.xlsx")
            .await
            .unwrap();

        assert_eq!(report.course_title, "MIS-353-01 Intro to MIS");
        assert_that(&report.entries).has_length(2);
        assert_eq!(report.overall_grade, 88.33);
        assert_eq!(report.excel_filename, "grades_report.xlsx");
        assert!(directory.path().join("grades_report.xlsx").is_file());
    }

    #[tokio::test]
    async fn no_grades_is_a_dedicated_error() {
        let directory = tempfile::tempdir().unwrap();
        let service = grade_service(Ok("MIS-353-01\nnothing\n"), directory.path());

        let error = service
            .process(Path::new("ignored.pdf"), "grades_report.xlsx")
            .await
            .unwrap_err();

        assert!(matches!(error, ServiceError::NoGrades));
        assert!(!directory.path().join("grades_report.xlsx").exists());
    }

    #[tokio::test]
    async fn ocr_failures_are_propagated() {
        let directory = tempfile::tempdir().unwrap();
        let service = grade_service(Err("Error opening data file"), directory.path());

        let error = service
            .process(Path::new("ignored.pdf"), "grades_report.xlsx")
            .await
            .unwrap_err();

        assert!(matches!(error, ServiceError::OcrError(_)));
        assert!(error.to_string().contains("Error opening data file"));
    }
}
