//! Admin data export: per-log CSV downloads and a combined Excel workbook.

use rust_xlsxwriter::{Format, Workbook};

use crate::logs::{LogError, LogKind, LogStore};

/// Errors raised while building exports.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Log(#[from] LogError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("workbook error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

/// Build an Excel workbook with one sheet per non-empty log.
///
/// The header row is bold; numeric-looking cells are written as numbers so
/// spreadsheet formulas work on durations and ratings.
pub fn workbook(store: &LogStore) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let mut populated = false;

    for kind in LogKind::ALL {
        let Some(raw) = store.raw(kind)? else {
            continue;
        };
        populated = true;

        let worksheet = workbook.add_worksheet();
        worksheet.set_name(kind.sheet_name())?;

        let mut reader = csv::Reader::from_reader(raw.as_slice());

        let headers = reader.headers()?.clone();
        for (col, header) in headers.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, header, &bold)?;
        }

        for (row_idx, row) in reader.records().enumerate() {
            let row = row?;
            for (col, cell) in row.iter().enumerate() {
                let r = (row_idx + 1) as u32;
                let c = col as u16;
                if let Ok(n) = cell.parse::<f64>() {
                    worksheet.write_number(r, c, n)?;
                } else {
                    worksheet.write_string(r, c, cell)?;
                }
            }
        }
    }

    // A workbook needs at least one sheet to be a valid file.
    if !populated {
        workbook.add_worksheet();
    }

    Ok(workbook.save_to_buffer()?)
}

/// Download filename for a log's CSV export.
#[must_use]
pub fn csv_filename(kind: LogKind) -> String {
    format!("nuanswers_{}.csv", kind.slug().replace('-', "_"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logs::{FeedbackRecord, RegistrationRecord};
    use tempfile::TempDir;

    fn store_with_data() -> (TempDir, LogStore) {
        let dir = TempDir::new().unwrap();
        let store = LogStore::open(dir.path()).unwrap();
        store
            .append(
                LogKind::Registration,
                &RegistrationRecord {
                    timestamp: "2025-03-10 11:00:00".to_string(),
                    full_name: "Ada".to_string(),
                    grade: "Junior".to_string(),
                    campus: "Florham".to_string(),
                    major: "Accounting".to_string(),
                    course_name: "Intermediate".to_string(),
                    course_id: "ACCT_2021_01".to_string(),
                    professor: "Dr. Byron".to_string(),
                    usage_time_minutes: 42.5,
                },
            )
            .unwrap();
        store
            .append(
                LogKind::Feedback,
                &FeedbackRecord {
                    timestamp: "2025-03-10 11:30:00".to_string(),
                    course_id: "ACCT_2021_01".to_string(),
                    rating: 5,
                    topic: "ratios".to_string(),
                    difficulty: 3,
                },
            )
            .unwrap();
        (dir, store)
    }

    #[test]
    fn test_workbook_contains_populated_sheets() {
        let (_dir, store) = store_with_data();
        let bytes = workbook(&store).unwrap();
        // xlsx files are zip archives.
        assert_eq!(&bytes[0..2], b"PK");
        assert!(bytes.len() > 500);
    }

    #[test]
    fn test_workbook_on_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = LogStore::open(dir.path()).unwrap();
        let bytes = workbook(&store).unwrap();
        assert_eq!(&bytes[0..2], b"PK");
    }

    #[test]
    fn test_csv_filename() {
        assert_eq!(
            csv_filename(LogKind::ResponseTimes),
            "nuanswers_response_times.csv"
        );
    }
}
