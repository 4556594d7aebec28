//! Word and PowerPoint extraction.
//!
//! OOXML documents are zip archives of XML parts. Text lives in `<w:t>`
//! runs (Word) and `<a:t>` runs (PowerPoint slides); paragraphs become
//! line breaks.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use async_trait::async_trait;
use quick_xml::Reader;
use quick_xml::events::Event;
use zip::ZipArchive;

use super::{Extracted, ExtractError, Extractor, guess_mime};

/// Extracts text runs from `.docx` and `.pptx` archives.
#[derive(Debug, Default)]
pub struct OfficeExtractor;

#[async_trait]
impl Extractor for OfficeExtractor {
    async fn extract(&self, path: &Path) -> Result<Extracted, ExtractError> {
        let mime_type = guess_mime(path);
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let path = path.to_path_buf();

        let content = tokio::task::spawn_blocking(move || -> Result<String, ExtractError> {
            let file = File::open(&path)?;
            let mut archive =
                ZipArchive::new(file).map_err(|e| ExtractError::Parse(e.to_string()))?;

            match ext.as_str() {
                "docx" => {
                    let xml = read_entry(&mut archive, "word/document.xml")?;
                    collect_runs(&xml, "w:t", "w:p")
                }
                "pptx" => {
                    let mut slides: Vec<String> = archive
                        .file_names()
                        .filter(|n| n.starts_with("ppt/slides/slide") && n.ends_with(".xml"))
                        .map(ToString::to_string)
                        .collect();
                    slides.sort();

                    let mut out = String::new();
                    for slide in slides {
                        let xml = read_entry(&mut archive, &slide)?;
                        out.push_str(&collect_runs(&xml, "a:t", "a:p")?);
                    }
                    Ok(out)
                }
                other => Err(ExtractError::Unsupported(format!(".{other}"))),
            }
        })
        .await
        .map_err(|e| ExtractError::Parse(e.to_string()))??;

        Ok(Extracted { content, mime_type })
    }

    fn supports(&self, extension: &str) -> bool {
        matches!(extension, "docx" | "pptx")
    }

    fn name(&self) -> &'static str {
        "Office"
    }
}

fn read_entry(archive: &mut ZipArchive<File>, name: &str) -> Result<String, ExtractError> {
    let mut entry = archive
        .by_name(name)
        .map_err(|e| ExtractError::Parse(format!("{name}: {e}")))?;
    let mut xml = String::new();
    entry.read_to_string(&mut xml)?;
    Ok(xml)
}

/// Concatenate the contents of every `<text_tag>` run, breaking lines at
/// the end of each `<para_tag>` element.
fn collect_runs(xml: &str, text_tag: &str, para_tag: &str) -> Result<String, ExtractError> {
    let mut reader = Reader::from_str(xml);
    let mut out = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == text_tag.as_bytes() => {
                in_text = true;
            }
            Ok(Event::Text(t)) if in_text => {
                let text = t.unescape().map_err(|e| ExtractError::Parse(e.to_string()))?;
                out.push_str(&text);
            }
            Ok(Event::End(e)) => {
                if e.name().as_ref() == text_tag.as_bytes() {
                    in_text = false;
                } else if e.name().as_ref() == para_tag.as_bytes() {
                    out.push('\n');
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Parse(e.to_string())),
            _ => {}
        }
    }

    Ok(out)
}
