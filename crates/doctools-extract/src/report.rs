//! Content layout shared by the extraction tiers.
//!
//! Quick mode produces one text item. Full mode produces a header item
//! followed by page, image and analysis items in document order.

use doctools_core::ContentItem;
use std::fmt::Write as _;

use crate::ocr::ImageAnalyzer;
use crate::pipeline::{ExtractionJob, PageBudget};

/// Placeholder for pages without text.
pub(crate) const NO_TEXT: &str = "(no extractable text)";

/// Quick-mode report: document information followed by `content`.
pub(crate) fn quick_report(
    job: &ExtractionJob,
    budget: &PageBudget,
    metadata: &[(String, String)],
    content: &str,
) -> ContentItem {
    let mut text = String::new();
    if let Some(notice) = budget.notice() {
        text.push_str(&notice);
        text.push_str("\n\n");
    }

    let _ = write!(
        text,
        "# {}\n\n## Document information\n\n- Pages: {}\n",
        job.file_name(),
        budget.total
    );
    for (key, value) in metadata {
        let _ = writeln!(text, "- {key}: {value}");
    }

    text.push_str("\n## Content\n\n");
    let content = content.trim();
    text.push_str(if content.is_empty() { NO_TEXT } else { content });
    ContentItem::text(text)
}

/// `### Page N` sections for every page with text.
pub(crate) fn page_sections(pages: &[(usize, String)]) -> String {
    pages
        .iter()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(number, text)| format!("### Page {number}\n\n{}", text.trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Full-mode header item.
pub(crate) fn full_header(
    job: &ExtractionJob,
    budget: &PageBudget,
    metadata: &[(String, String)],
) -> ContentItem {
    let mut text = String::new();
    if let Some(notice) = budget.notice() {
        text.push_str(&notice);
        text.push_str("\n\n");
    }

    let _ = write!(
        text,
        "# {}\n\n- File: {}\n- Pages: {}\n",
        job.file_name(),
        job.path().display(),
        budget.total
    );
    for (key, value) in metadata {
        let _ = writeln!(text, "- {key}: {value}");
    }
    text.push_str("\n---");
    ContentItem::text(text)
}

/// Full-mode text item for one page.
pub(crate) fn page_item(number: usize, text: &str) -> ContentItem {
    let text = text.trim();
    ContentItem::text(format!(
        "### Page {number}\n\n{}",
        if text.is_empty() { NO_TEXT } else { text }
    ))
}

/// An image item followed by its OCR analysis.
pub(crate) async fn analyzed_image(
    title: String,
    data: Vec<u8>,
    mime_type: String,
    analyzer: &ImageAnalyzer,
) -> [ContentItem; 2] {
    let analysis = analyzer.analyze(&data).await;
    let caption = format!("{title} analysis:\n{analysis}");
    [ContentItem::image(title, data, mime_type), ContentItem::text(caption)]
}
