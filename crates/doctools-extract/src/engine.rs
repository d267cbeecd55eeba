//! Extraction engine capabilities.
//!
//! Tools and the PDF pipeline talk to third-party parsers only through these
//! traits, so every engine can be swapped or faked in tests:
//!
//! | Trait | Surface | Default implementation |
//! |-------|---------|------------------------|
//! | [`PdfTextEngine`] | page count, per-page text and images | [`LopdfEngine`](crate::pdf::LopdfEngine) |
//! | [`MarkdownEngine`] | page range as markdown, images to disk | [`PdfExtractMarkdown`](crate::markdown::PdfExtractMarkdown) |
//! | [`MinimalPdfReader`] | page count, metadata, per-page text | [`PopplerReader`](crate::poppler::PopplerReader) |
//! | [`PageRasterizer`] | pages rendered to images | [`PdftoppmRasterizer`](crate::poppler::PdftoppmRasterizer) |
//! | [`OcrEngine`] | text recognition over image bytes | [`TesseractOcr`](crate::ocr::TesseractOcr) |
//! | [`OfficeReader`] | properties, paragraphs, tables, image count | [`DocxReader`](crate::docx::DocxReader), [`WorkbookReader`](crate::workbook::WorkbookReader) |
//!
//! Synchronous engines are CPU-bound library calls and are run inside
//! `tokio::task::spawn_blocking`. Asynchronous engines drive subprocesses.

use async_trait::async_trait;
use doctools_core::EngineError;
use std::ops::Range;
use std::path::{Path, PathBuf};

// ============================================================================
// PDF text engine
// ============================================================================

/// An image embedded in a PDF page.
#[derive(Debug, Clone)]
pub struct RawImage {
    pub data: Vec<u8>,
    pub mime_type: String,
}

impl RawImage {
    /// File extension matching the MIME type.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" => "jpg",
            "image/jp2" => "jp2",
            _ => "png",
        }
    }
}

/// An opened PDF document. Page indices are zero-based.
pub trait PdfPages: Send {
    fn page_count(&self) -> usize;

    /// Document information key/value pairs.
    fn metadata(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    fn page_text(&self, index: usize) -> Result<String, EngineError>;

    /// Images on a page. The outer error means the page could not be
    /// inspected; inner errors are per-image decode failures.
    fn page_images(&self, index: usize) -> Result<Vec<Result<RawImage, EngineError>>, EngineError>;
}

/// Fast native reader with page-structured access.
pub trait PdfTextEngine: Send + Sync {
    fn name(&self) -> &str;

    fn open(&self, path: &Path) -> Result<Box<dyn PdfPages>, EngineError>;
}

// ============================================================================
// Markdown engine
// ============================================================================

/// Options for [`MarkdownEngine::to_markdown`].
#[derive(Debug, Clone)]
pub struct MarkdownOptions {
    /// Write page images into `image_dir`
    pub write_images: bool,
    pub image_dir: Option<PathBuf>,
    /// Format images are written in when they can be decoded
    pub image_format: image::ImageFormat,
}

/// Higher-level conversion of a page range to structured markdown.
pub trait MarkdownEngine: Send + Sync {
    fn name(&self) -> &str;

    fn page_count(&self, path: &Path) -> Result<usize, EngineError>;

    /// Render `pages` (zero-based, half-open) as markdown. When
    /// `options.write_images` is set, page images are written to
    /// `options.image_dir` as a side effect.
    fn to_markdown(
        &self,
        path: &Path,
        pages: Range<usize>,
        options: &MarkdownOptions,
    ) -> Result<String, EngineError>;
}

// ============================================================================
// Minimal reader and rasterizer
// ============================================================================

/// Page count and document information.
#[derive(Debug, Clone, Default)]
pub struct PdfInfo {
    pub page_count: usize,
    pub metadata: Vec<(String, String)>,
}

/// Basic reader with minimal dependencies.
#[async_trait]
pub trait MinimalPdfReader: Send + Sync {
    fn name(&self) -> &str;

    async fn info(&self, path: &Path) -> Result<PdfInfo, EngineError>;

    /// Text of one page (zero-based index).
    async fn page_text(&self, path: &Path, index: usize) -> Result<String, EngineError>;
}

/// A rendered page image.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// One-based page number
    pub page: usize,
    pub data: Vec<u8>,
    pub mime_type: String,
}

/// Page-to-image renderer.
#[async_trait]
pub trait PageRasterizer: Send + Sync {
    fn name(&self) -> &str;

    /// Render `pages` (zero-based, half-open) into `out_dir`.
    async fn render(
        &self,
        path: &Path,
        dpi: u32,
        pages: Range<usize>,
        out_dir: &Path,
    ) -> Result<Vec<RenderedPage>, EngineError>;
}

// ============================================================================
// OCR
// ============================================================================

/// Text recognition over image bytes.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    fn name(&self) -> &str;

    async fn recognize(&self, image: &[u8], language: &str) -> Result<String, EngineError>;
}

// ============================================================================
// Office documents
// ============================================================================

/// Core document properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentProperties {
    pub title: Option<String>,
    pub author: Option<String>,
    pub created: Option<String>,
    pub modified: Option<String>,
    pub comments: Option<String>,
}

impl DocumentProperties {
    /// Present properties as labelled pairs, in display order.
    #[must_use]
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        [
            ("Title", &self.title),
            ("Author", &self.author),
            ("Created", &self.created),
            ("Modified", &self.modified),
            ("Comments", &self.comments),
        ]
        .into_iter()
        .filter_map(|(label, value)| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| (label, v))
        })
        .collect()
    }
}

/// A table as rows of cell text. The first row is the header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    /// Sheet name for workbooks
    pub name: Option<String>,
    pub rows: Vec<Vec<String>>,
}

/// Content of an office document.
#[derive(Debug, Clone, Default)]
pub struct OfficeDocument {
    pub properties: DocumentProperties,
    /// Body paragraphs in document order
    pub paragraphs: Vec<String>,
    pub tables: Vec<Table>,
    /// Embedded image relationships (bytes are not extracted)
    pub image_count: usize,
}

/// Office-document reader.
pub trait OfficeReader: Send + Sync {
    fn name(&self) -> &str;

    fn open(&self, path: &Path) -> Result<OfficeDocument, EngineError>;
}
