use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, XlsxError};

use crate::model::GradeEntry;

pub const HEADERS: [&str; 5] = ["Section", "Item", "Achieved", "Total", "Weight"];

#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    #[error("Could not write the workbook: {0}")]
    Xlsx(#[from] XlsxError),
}

/// Write the grades as a single-sheet workbook, one row per entry under a header row
#[tracing::instrument(skip(entries), fields(entries = entries.len()))]
pub fn save_to_excel(entries: &[GradeEntry], path: &Path) -> Result<(), ExportError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();

    for (column, header) in (0u16..).zip(HEADERS) {
        worksheet.write_string_with_format(0, column, header, &header_format)?;
    }

    for (row, entry) in (1u32..).zip(entries) {
        worksheet.write_string(row, 0, &entry.section)?;
        worksheet.write_string(row, 1, &entry.item)?;
        worksheet.write_number(row, 2, entry.achieved)?;
        worksheet.write_number(row, 3, entry.total)?;
        if let Some(weight) = entry.weight {
            worksheet.write_number(row, 4, weight)?;
        }
    }

    workbook.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Read;

    use super::*;

    #[test]
    fn writes_a_zip_container() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("grades_report.xlsx");
        let entries = vec![
            GradeEntry::new("Quiz 1", 8.0, 10.0),
            GradeEntry {
                weight: None,
                ..GradeEntry::new("Bonus", 1.0, 1.0)
            },
        ];

        save_to_excel(&entries, &path).unwrap();

        let mut magic = [0u8; 2];
        fs::File::open(&path)
            .unwrap()
            .read_exact(&mut magic)
            .unwrap();
        assert_eq!(&magic, b"PK", "xlsx files are zip archives");
    }

    #[test]
    fn missing_directory_is_an_error() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("missing").join("grades.xlsx");

        assert!(save_to_excel(&[], &path).is_err());
    }
}
