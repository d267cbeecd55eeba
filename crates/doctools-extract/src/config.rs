//! Extraction limits and engine settings.
//!
//! Every field has a serde default so partial TOML sections load cleanly.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings for all built-in tools.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractConfig {
    #[serde(default)]
    pub pdf: PdfConfig,

    #[serde(default)]
    pub ocr: OcrConfig,

    #[serde(default)]
    pub office: OfficeConfig,
}

/// PDF pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfConfig {
    /// Page cap in quick mode
    #[serde(default = "default_quick_page_cap")]
    pub quick_page_cap: usize,

    /// Page cap in full mode
    #[serde(default = "default_full_page_cap")]
    pub full_page_cap: usize,

    /// Largest accepted PDF (bytes)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Resolution for page rasterization
    #[serde(default = "default_render_dpi")]
    pub render_dpi: u32,

    /// Extension of the format embedded images are re-encoded in by the
    /// markdown tier (`png` or `jpg`)
    #[serde(default = "default_image_format")]
    pub image_format: String,

    /// Parent directory for scratch directories (default: system temp dir)
    #[serde(default)]
    pub scratch_root: Option<PathBuf>,
}

fn default_quick_page_cap() -> usize {
    50
}

fn default_full_page_cap() -> usize {
    30
}

fn default_max_file_size() -> u64 {
    104_857_600 // 100MB
}

fn default_render_dpi() -> u32 {
    150
}

fn default_image_format() -> String {
    "png".to_string()
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            quick_page_cap: default_quick_page_cap(),
            full_page_cap: default_full_page_cap(),
            max_file_size: default_max_file_size(),
            render_dpi: default_render_dpi(),
            image_format: default_image_format(),
            scratch_root: None,
        }
    }
}

/// OCR configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Run OCR over extracted images
    #[serde(default = "default_ocr_enabled")]
    pub enabled: bool,

    /// Tesseract language hint
    #[serde(default = "default_ocr_language")]
    pub language: String,

    /// Tesseract executable
    #[serde(default = "default_ocr_binary")]
    pub binary: PathBuf,
}

fn default_ocr_enabled() -> bool {
    true
}

fn default_ocr_language() -> String {
    "chi_sim+eng".to_string()
}

fn default_ocr_binary() -> PathBuf {
    PathBuf::from("tesseract")
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: default_ocr_enabled(),
            language: default_ocr_language(),
            binary: default_ocr_binary(),
        }
    }
}

/// Word and Excel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfficeConfig {
    /// Rows rendered per worksheet
    #[serde(default = "default_max_sheet_rows")]
    pub max_sheet_rows: usize,
}

fn default_max_sheet_rows() -> usize {
    500
}

impl Default for OfficeConfig {
    fn default() -> Self {
        Self {
            max_sheet_rows: default_max_sheet_rows(),
        }
    }
}
