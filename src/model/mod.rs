use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod configuration;

/// Section every OCR-extracted line is filed under
pub const DEFAULT_SECTION: &str = "All Grades";

/// Weight given to a section when the report does not state one
pub const DEFAULT_WEIGHT: f64 = 100.0;

/// # One graded item read from a report
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GradeEntry {
    pub section: String,
    pub item: String,
    pub achieved: f64,
    pub total: f64,
    /// Weight of the section, in percent
    pub weight: Option<f64>,
}

impl GradeEntry {
    pub fn new<S: Into<String>>(item: S, achieved: f64, total: f64) -> Self {
        Self {
            section: String::from(DEFAULT_SECTION),
            item: item.into(),
            achieved,
            total,
            weight: Some(DEFAULT_WEIGHT),
        }
    }
}

/// # Outcome of a processed grade report
#[derive(Debug, Serialize, Clone)]
pub struct GradeReport {
    pub course_title: String,
    pub entries: Vec<GradeEntry>,
    /// Overall grade, in percent, rounded to 2 decimals
    pub overall_grade: f64,
    /// Name of the generated workbook inside the upload directory
    pub excel_filename: String,
    pub generated_at: DateTime<Utc>,
}
