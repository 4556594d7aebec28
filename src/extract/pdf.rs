//! PDF extraction via embedded text.

use std::path::Path;

use async_trait::async_trait;

use super::{Extracted, ExtractError, Extractor};

/// Extracts the embedded text layer of a PDF. Scanned PDFs without a text
/// layer produce empty content rather than an error.
#[derive(Debug, Default)]
pub struct PdfExtractor;

#[async_trait]
impl Extractor for PdfExtractor {
    async fn extract(&self, path: &Path) -> Result<Extracted, ExtractError> {
        let path = path.to_path_buf();

        let content = tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text(&path).map_err(|e| ExtractError::Parse(e.to_string()))
        })
        .await
        .map_err(|e| ExtractError::Parse(e.to_string()))??;

        Ok(Extracted {
            content,
            mime_type: "application/pdf".to_string(),
        })
    }

    fn supports(&self, extension: &str) -> bool {
        extension == "pdf"
    }

    fn name(&self) -> &'static str {
        "Pdf"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_pdf_is_parse_error() {
        let file = tempfile::NamedTempFile::with_suffix(".pdf").unwrap();
        std::fs::write(file.path(), b"not a pdf").unwrap();

        let err = PdfExtractor.extract(file.path()).await.unwrap_err();
        assert!(matches!(err, ExtractError::Parse(_)));
    }
}
