//! Plain-text extraction for `.txt` and `.md` uploads.

use std::path::Path;

use async_trait::async_trait;

use super::{Extracted, ExtractError, Extractor, guess_mime};

/// Reads text files as-is.
#[derive(Debug, Default)]
pub struct PlainTextExtractor;

#[async_trait]
impl Extractor for PlainTextExtractor {
    async fn extract(&self, path: &Path) -> Result<Extracted, ExtractError> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::InvalidData {
                ExtractError::Parse(format!("file is not valid UTF-8 text: {}", path.display()))
            } else {
                ExtractError::Io(e)
            }
        })?;

        Ok(Extracted {
            content,
            mime_type: guess_mime(path),
        })
    }

    fn supports(&self, extension: &str) -> bool {
        matches!(extension, "txt" | "md")
    }

    fn name(&self) -> &'static str {
        "PlainText"
    }
}
