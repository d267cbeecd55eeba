//! Markdown conversion backed by pdf-extract.
//!
//! Text comes from pdf-extract page by page. Page images, when requested,
//! are decoded through lopdf and written next to each other in the image
//! directory as `page_{n}_img_{k}.{ext}`.

use doctools_core::EngineError;
use std::fmt::Write as _;
use std::ops::Range;
use std::path::Path;
use tracing::debug;

use crate::engine::{MarkdownEngine, MarkdownOptions};
use crate::image::{convert_image, format_extension};
use crate::pdf::{decode_image_stream, load_document, page_image_streams};

/// Tier-two engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractMarkdown;

impl PdfExtractMarkdown {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl MarkdownEngine for PdfExtractMarkdown {
    fn name(&self) -> &str {
        "pdf-extract"
    }

    fn page_count(&self, path: &Path) -> Result<usize, EngineError> {
        Ok(load_document(path)?.get_pages().len())
    }

    fn to_markdown(
        &self,
        path: &Path,
        pages: Range<usize>,
        options: &MarkdownOptions,
    ) -> Result<String, EngineError> {
        let bytes = std::fs::read(path)?;
        let texts = pdf_extract::extract_text_from_mem_by_pages(&bytes)
            .map_err(|e| EngineError::Parse(format!("pdf-extract: {e}")))?;

        let end = pages.end.min(texts.len());
        let mut markdown = String::new();
        for index in pages.start..end {
            if !markdown.is_empty() {
                markdown.push_str("\n\n");
            }
            let _ = write!(markdown, "### Page {}\n\n", index + 1);
            markdown.push_str(&page_markdown(&texts[index]));
        }

        if options.write_images {
            if let Some(dir) = &options.image_dir {
                let written = write_page_images(path, pages.start..end, dir, options.image_format)?;
                debug!("Wrote {} images to {:?}", written, dir);
            }
        }

        Ok(markdown)
    }
}

/// Render one page of plain text as markdown paragraphs.
fn page_markdown(text: &str) -> String {
    let paragraphs: Vec<String> = split_paragraphs(text)
        .into_iter()
        .map(|p| {
            if looks_like_heading(&p) {
                format!("#### {p}")
            } else {
                p
            }
        })
        .collect();

    if paragraphs.is_empty() {
        "(no extractable text)".to_string()
    } else {
        paragraphs.join("\n\n")
    }
}

/// Split text on blank lines, joining wrapped lines within a paragraph.
fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join(" "));
    }

    paragraphs
}

/// Check if text looks like a heading.
fn looks_like_heading(text: &str) -> bool {
    // Short text (likely a title/heading)
    if text.len() > 100 || text.ends_with('.') {
        return false;
    }

    // Title case with few words
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() || words.len() > 8 {
        return false;
    }
    let caps_count = words
        .iter()
        .filter(|w| w.chars().next().is_some_and(char::is_uppercase))
        .count();
    caps_count * 2 >= words.len()
}

/// Write page images for `pages` into `dir`, returning how many were written.
///
/// Images that cannot be decoded are skipped; images that
/// decode but cannot be converted keep their original encoding.
fn write_page_images(
    path: &Path,
    pages: Range<usize>,
    dir: &Path,
    format: image::ImageFormat,
) -> Result<usize, EngineError> {
    let document = load_document(path)?;
    let page_ids: Vec<_> = document.get_pages().into_values().collect();

    let mut written = 0;
    for index in pages {
        let Some(&page_id) = page_ids.get(index) else {
            break;
        };
        let number = index + 1;
        for (k, stream) in page_image_streams(&document, page_id).into_iter().enumerate() {
            let raw = match decode_image_stream(stream) {
                Ok(raw) => raw,
                Err(e) => {
                    debug!("Skipping page {} image {}: {}", number, k + 1, e);
                    continue;
                }
            };
            let (data, extension) = match convert_image(&raw.data, format) {
                Ok(converted) => (converted, format_extension(format)),
                Err(_) => (raw.data.clone(), raw.extension()),
            };
            let file = dir.join(format!("page_{number}_img_{}.{extension}", k + 1));
            std::fs::write(&file, data)?;
            written += 1;
        }
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::write_pdf;
    use tempfile::tempdir;

    fn options() -> MarkdownOptions {
        MarkdownOptions {
            write_images: false,
            image_dir: None,
            image_format: image::ImageFormat::Png,
        }
    }

    #[test]
    fn test_looks_like_heading() {
        assert!(looks_like_heading("Introduction"));
        assert!(looks_like_heading("Chapter One Overview"));
        assert!(!looks_like_heading("This is a full sentence."));
        assert!(!looks_like_heading(&"Word ".repeat(30)));
        assert!(!looks_like_heading(""));
    }

    #[test]
    fn test_split_paragraphs() {
        let text = "Overview\n\nfirst line\nwrapped line\n\n\n  last  \n";
        assert_eq!(
            split_paragraphs(text),
            vec!["Overview", "first line wrapped line", "last"]
        );
    }

    #[test]
    fn test_page_markdown_promotes_headings() {
        let md = page_markdown("Results\n\nthe numbers went up this year.");
        assert_eq!(md, "#### Results\n\nthe numbers went up this year.");
        assert_eq!(page_markdown("  \n "), "(no extractable text)");
    }

    #[test]
    fn test_to_markdown_page_range() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        write_pdf(&path, &["first body", "second body", "third body"]);

        let engine = PdfExtractMarkdown::new();
        assert_eq!(engine.page_count(&path).unwrap(), 3);

        let md = engine.to_markdown(&path, 1..3, &options()).unwrap();
        assert!(!md.contains("### Page 1\n"));
        let second = md.find("### Page 2").unwrap();
        let third = md.find("### Page 3").unwrap();
        assert!(second < third);
        assert!(md.contains("second body"));
    }

    #[test]
    fn test_to_markdown_rejects_garbage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("junk.pdf");
        std::fs::write(&path, b"not a pdf at all").unwrap();
        assert!(PdfExtractMarkdown::new()
            .to_markdown(&path, 0..1, &options())
            .is_err());
    }
}
