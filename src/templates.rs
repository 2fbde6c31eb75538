use std::sync::Arc;

use handlebars::{Handlebars, RenderError, TemplateError};
use serde_json::json;

use crate::model::GradeReport;
use crate::services::export::HEADERS;
use crate::services::grading::format_percentage;

const UPLOAD: &str = "upload";
const RESULTS: &str = "results";

/// # HTML pages, compiled into the binary
#[derive(Clone)]
pub struct Templates {
    registry: Arc<Handlebars<'static>>,
}

impl Templates {
    pub fn new() -> Result<Self, TemplateError> {
        let mut registry = Handlebars::new();
        registry.register_template_string(UPLOAD, include_str!("../templates/upload.html"))?;
        registry.register_template_string(RESULTS, include_str!("../templates/results.html"))?;

        Ok(Self {
            registry: Arc::new(registry),
        })
    }

    /// Upload form, optionally telling what went wrong with the previous upload
    pub fn upload_page(&self, error: Option<&str>) -> Result<String, RenderError> {
        self.registry.render(UPLOAD, &json!({ "error": error }))
    }

    pub fn results_page(&self, report: &GradeReport) -> Result<String, RenderError> {
        self.registry.render(
            RESULTS,
            &json!({
                "course_title": report.course_title,
                "overall_grade": format_percentage(report.overall_grade),
                "headers": HEADERS,
                "entries": report.entries,
                "excel_filename": report.excel_filename,
                "generated_at": report.generated_at.format("%Y-%m-%d %H:%M UTC").to_string(),
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::model::GradeEntry;

    use super::*;

    #[test]
    fn upload_page_shows_the_error_escaped() {
        let templates = Templates::new().unwrap();

        let page = templates.upload_page(Some("Invalid <file> type")).unwrap();

        assert!(page.contains("Invalid &lt;file&gt; type"));
        assert!(page.contains(r#"enctype="multipart/form-data""#));
    }

    #[test]
    fn upload_page_without_error_has_no_error_block() {
        let templates = Templates::new().unwrap();

        let page = templates.upload_page(None).unwrap();

        assert!(!page.contains(r#"class="error""#));
    }

    #[test]
    fn results_page_lists_every_entry() {
        let templates = Templates::new().unwrap();
        let report = GradeReport {
            course_title: String::from("MIS-353-01 Intro"),
            entries: vec![
                GradeEntry::new("Quiz 1", 8.0, 10.0),
                GradeEntry::new("Midterm", 45.0, 50.0),
            ],
            overall_grade: 88.33,
            excel_filename: String::from("grades_report.xlsx"),
            generated_at: Utc::now(),
        };

        let page = templates.results_page(&report).unwrap();

        assert!(page.contains("MIS-353-01 Intro"));
        assert!(page.contains("88.33%"));
        assert!(page.contains("<td>Quiz 1</td>"));
        assert!(page.contains("<td>Midterm</td>"));
        assert!(page.contains(r#"href="/download/grades_report.xlsx""#));
        assert!(page.contains("<th>Weight</th>"));
    }
}
