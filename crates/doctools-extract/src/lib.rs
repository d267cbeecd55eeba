//! # doctools-extract
//!
//! Document extraction tools for doctools.
//!
//! This crate provides the tool registry, the built-in tools and the
//! engines behind them. Every tool turns a file path into an ordered
//! sequence of [`ContentItem`](doctools_core::ContentItem)s.
//!
//! ## Built-in Tools
//!
//! | Tool | Formats | Features |
//! |------|---------|----------|
//! | [`FileTool`] | `.pdf`, `.doc`, `.docx`, `.xls`, `.xlsx`, `.xlsm` | Routes by extension |
//! | [`PdfTool`] | `.pdf` | Three-tier fallback, quick/full modes, embedded images + OCR |
//! | [`QuickPdfTool`] | `.pdf` | Text-only preview |
//! | [`WordTool`] | `.docx` (`.doc` is reported as unreadable) | Properties, paragraphs, tables, image count |
//! | [`ExcelTool`] | `.xls`, `.xlsx`, `.xlsm` | One markdown table per sheet |
//!
//! ## Usage
//!
//! ```rust,ignore
//! use doctools_extract::{ExtractConfig, builtin_registry};
//! use serde_json::json;
//!
//! let registry = builtin_registry(&ExtractConfig::default());
//! let args = json!({"file_path": "report.pdf", "mode": "quick"});
//! let items = registry.dispatch("file", args.as_object().unwrap()).await;
//! ```
//!
//! ## PDF Pipeline
//!
//! [`PdfPipeline`] tries its tiers in order and stops at the first success:
//!
//! 1. **structured**: lopdf, per-page text and embedded images
//! 2. **markdown**: pdf-extract text as markdown, images written to scratch
//! 3. **minimal**: poppler `pdfinfo`/`pdftotext`, pages rasterized by `pdftoppm`
//!
//! - **Page caps**: 50 pages in quick mode, 30 in full mode
//! - **Scratch**: full mode owns a `doctools-*` temp directory, removed on every exit path
//! - **OCR**: `tesseract`, language `chi_sim+eng` by default
//!
//! ## Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ToolRegistry`] | Tool definitions and live instances, dispatch by name |
//! | [`PdfPipeline`] | Ordered fallback over [`ExtractionTier`]s |
//! | [`ImageAnalyzer`] | OCR result rendering for extracted images |
//! | [`engine`] | Capability traits every engine implements |

pub mod config;
pub mod docx;
pub mod engine;
pub mod image;
pub mod markdown;
pub mod ocr;
pub mod pdf;
pub mod pipeline;
pub mod poppler;
pub mod registry;
pub mod tiers;
pub mod tools;
pub mod workbook;

mod office;
mod process;
mod report;
#[cfg(test)]
mod testing;

pub use config::{ExtractConfig, OcrConfig, OfficeConfig, PdfConfig};
pub use docx::DocxReader;
pub use markdown::PdfExtractMarkdown;
pub use ocr::{DisabledOcr, ImageAnalyzer, TesseractOcr};
pub use pdf::LopdfEngine;
pub use pipeline::{ExtractionJob, ExtractionTier, PageBudget, PdfMode, PdfPipeline};
pub use poppler::{PdftoppmRasterizer, PopplerReader};
pub use registry::{ToolRegistry, builtin_registry};
pub use tiers::{MarkdownTier, MinimalTier, StructuredTier};
pub use tools::{ExcelTool, FileTool, PdfTool, QuickPdfTool, WordTool};
pub use workbook::WorkbookReader;
