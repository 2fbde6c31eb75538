use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::model::GradeEntry;

pub const UNKNOWN_COURSE: &str = "Unknown Course";

/// Course codes look like `MIS-353-01`
static COURSE_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{2,}-[0-9]{3}-[0-9]{2}").unwrap());

static TITLE_ARTIFACTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9\- ]").unwrap());

/// ASCII digits only: other scripts' digits match `\d` but don't parse as numbers
static GRADE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]+)/([0-9]+)\s*(?:[0-9]+%)?").unwrap());

/// Markers of table headers, including the way OCR usually mangles "Grade Item"
const HEADER_MARKERS: [&str; 4] = ["Grade tem", "Points", "Comments", "Grades -"];

/// Find the course title in OCR output, `Unknown Course` when there is none
#[tracing::instrument(skip(text))]
pub fn extract_course_title(text: &str) -> String {
    text.lines()
        .find(|line| COURSE_CODE.is_match(line))
        .map(|line| TITLE_ARTIFACTS.replace_all(line.trim(), "").into_owned())
        .unwrap_or_else(|| String::from(UNKNOWN_COURSE))
}

/// Read every `achieved/total` line of the OCR output as a grade entry
#[tracing::instrument(skip(text), fields(text_length = text.len()))]
pub fn extract_assignments_and_grades(text: &str) -> Vec<GradeEntry> {
    let entries: Vec<GradeEntry> = text
        .lines()
        .enumerate()
        .filter_map(|(index, line)| parse_grade_line(index, line.trim()))
        .collect();

    if entries.is_empty() {
        warn!("No grades were extracted");
    } else {
        debug!("{} grade entries extracted", entries.len());
    }

    entries
}

fn parse_grade_line(index: usize, line: &str) -> Option<GradeEntry> {
    if line.is_empty() || HEADER_MARKERS.iter().any(|marker| line.contains(marker)) {
        debug!(index, line, "Skipping line");
        return None;
    }

    let captures = GRADE.captures(line)?;
    let achieved: f64 = captures[1].parse().ok()?;
    let total: f64 = captures[2].parse().ok()?;
    let item = line.replace(&captures[0], "").trim().to_owned();

    debug!(index, item = %item, achieved, total, "Found grade");
    Some(GradeEntry::new(item, achieved, total))
}
