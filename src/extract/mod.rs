//! Document text extraction for uploaded course materials.
//!
//! Uploads are dispatched by file extension to a format-specific extractor.
//! Each extractor turns one document into plain text that can be injected
//! into the chat context.
//!
//! # Extractors
//!
//! - [`PlainTextExtractor`] - `.txt`, `.md`
//! - [`CsvExtractor`] - `.csv`
//! - [`PdfExtractor`] - `.pdf`
//! - [`SpreadsheetExtractor`] - `.xls`, `.xlsx`
//! - [`OfficeExtractor`] - `.docx`, `.pptx`
//!
//! Images (`.png`, `.jpg`, `.jpeg`) are not text-extracted; the upload
//! layer sends them to vision analysis instead.

mod delimited;
mod office;
mod pdf;
mod plain;
mod spreadsheet;

pub use delimited::CsvExtractor;
pub use office::OfficeExtractor;
pub use pdf::PdfExtractor;
pub use plain::PlainTextExtractor;
pub use spreadsheet::SpreadsheetExtractor;

use std::path::Path;

use async_trait::async_trait;

/// File extensions handled by vision analysis rather than text extraction.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Whether an extension names an image upload.
#[must_use]
pub fn is_image_extension(ext: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
}

/// Result of text extraction.
#[derive(Debug, Clone)]
pub struct Extracted {
    /// Extracted plain text.
    pub content: String,
    /// MIME type guessed from the source path.
    pub mime_type: String,
}

/// Errors that can occur during extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// No extractor handles this extension.
    #[error("unsupported file type: {0}")]
    Unsupported(String),

    /// The file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file was readable but not parseable as its format.
    #[error("failed to parse document: {0}")]
    Parse(String),
}

/// Trait for format-specific text extractors.
#[async_trait]
pub trait Extractor: Send + Sync + std::fmt::Debug {
    /// Extract text from the file at `path`.
    async fn extract(&self, path: &Path) -> Result<Extracted, ExtractError>;

    /// Whether this extractor handles the (lower-cased, dot-less) extension.
    fn supports(&self, extension: &str) -> bool;

    /// Extractor name for logging.
    fn name(&self) -> &'static str;
}

/// The set of registered extractors, dispatching by extension.
#[derive(Debug)]
pub struct ExtractorSet {
    extractors: Vec<Box<dyn Extractor>>,
}

impl Default for ExtractorSet {
    fn default() -> Self {
        Self::standard()
    }
}

impl ExtractorSet {
    /// The standard registry covering every supported upload format.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            extractors: vec![
                Box::new(PlainTextExtractor),
                Box::new(CsvExtractor),
                Box::new(PdfExtractor),
                Box::new(SpreadsheetExtractor),
                Box::new(OfficeExtractor),
            ],
        }
    }

    /// Find the extractor responsible for an extension.
    #[must_use]
    pub fn for_extension(&self, extension: &str) -> Option<&dyn Extractor> {
        let ext = extension.to_ascii_lowercase();
        self.extractors
            .iter()
            .find(|e| e.supports(&ext))
            .map(AsRef::as_ref)
    }

    /// Extract text from a file, dispatching on its extension.
    pub async fn extract_path(&self, path: &Path) -> Result<Extracted, ExtractError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let Some(extractor) = self.for_extension(&ext) else {
            return Err(ExtractError::Unsupported(if ext.is_empty() {
                path.display().to_string()
            } else {
                format!(".{ext}")
            }));
        };

        tracing::debug!(
            extractor = extractor.name(),
            path = %path.display(),
            "Extracting document text"
        );
        extractor.extract(path).await
    }
}

/// Guess the MIME type for a path, defaulting to `application/octet-stream`.
#[must_use]
pub(crate) fn guess_mime(path: &Path) -> String {
    mime_guess::from_path(path).first_or_octet_stream().to_string()
}
