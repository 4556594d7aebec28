//! CSV extraction: each row becomes one comma-joined text line.

use std::path::Path;

use async_trait::async_trait;

use super::{Extracted, ExtractError, Extractor, guess_mime};

/// Flattens CSV rows into readable lines.
#[derive(Debug, Default)]
pub struct CsvExtractor;

#[async_trait]
impl Extractor for CsvExtractor {
    async fn extract(&self, path: &Path) -> Result<Extracted, ExtractError> {
        let mime_type = guess_mime(path);
        let path = path.to_path_buf();

        let content = tokio::task::spawn_blocking(move || -> Result<String, ExtractError> {
            let mut reader = csv::ReaderBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_path(&path)
                .map_err(|e| ExtractError::Parse(e.to_string()))?;

            let mut out = String::new();
            for row in reader.records() {
                let row = row.map_err(|e| ExtractError::Parse(e.to_string()))?;
                let fields: Vec<&str> = row.iter().collect();
                out.push_str(&fields.join(", "));
                out.push('\n');
            }
            Ok(out)
        })
        .await
        .map_err(|e| ExtractError::Parse(e.to_string()))??;

        Ok(Extracted { content, mime_type })
    }

    fn supports(&self, extension: &str) -> bool {
        extension == "csv"
    }

    fn name(&self) -> &'static str {
        "Csv"
    }
}
