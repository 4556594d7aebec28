//! Excel extraction: every sheet is rendered as labeled rows of text.

use std::path::Path;

use async_trait::async_trait;
use calamine::{Reader, open_workbook_auto};

use super::{Extracted, ExtractError, Extractor, guess_mime};

/// Reads `.xls`/`.xlsx` workbooks sheet by sheet.
#[derive(Debug, Default)]
pub struct SpreadsheetExtractor;

#[async_trait]
impl Extractor for SpreadsheetExtractor {
    async fn extract(&self, path: &Path) -> Result<Extracted, ExtractError> {
        let mime_type = guess_mime(path);
        let path = path.to_path_buf();

        let content = tokio::task::spawn_blocking(move || -> Result<String, ExtractError> {
            let mut workbook =
                open_workbook_auto(&path).map_err(|e| ExtractError::Parse(e.to_string()))?;

            let mut out = String::new();
            for sheet in workbook.sheet_names().to_owned() {
                let range = workbook
                    .worksheet_range(&sheet)
                    .map_err(|e| ExtractError::Parse(e.to_string()))?;

                out.push_str(&format!("\nSheet: {sheet}\n"));
                for row in range.rows() {
                    let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
                    out.push_str(&cells.join(", "));
                    out.push('\n');
                }
            }
            Ok(out)
        })
        .await
        .map_err(|e| ExtractError::Parse(e.to_string()))??;

        Ok(Extracted { content, mime_type })
    }

    fn supports(&self, extension: &str) -> bool {
        matches!(extension, "xls" | "xlsx")
    }

    fn name(&self) -> &'static str {
        "Spreadsheet"
    }
}
