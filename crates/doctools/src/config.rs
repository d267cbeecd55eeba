//! Configuration handling for the doctools CLI.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use doctools_extract::{ExtractConfig, OcrConfig, OfficeConfig, PdfConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file name inside the config directory.
const CONFIG_FILE: &str = "config.toml";

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// PDF pipeline configuration
    #[serde(default)]
    pub pdf: PdfConfig,

    /// OCR configuration
    #[serde(default)]
    pub ocr: OcrConfig,

    /// Word and Excel configuration
    #[serde(default)]
    pub office: OfficeConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load from the default config path. A missing file yields defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load from `path`, or from the default config path when `None`.
    pub fn load_from(path: Option<PathBuf>) -> Result<Self> {
        let explicit = path.is_some();
        let Some(path) = path.or_else(Self::config_path) else {
            return Ok(Self::default());
        };
        if !explicit && !path.exists() {
            return Ok(Self::default());
        }
        Self::read(&path)
    }

    fn read(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("Invalid config in {}", path.display()))
    }

    /// Path of the default config file.
    pub fn config_path() -> Option<PathBuf> {
        config_dir().map(|dir| dir.join(CONFIG_FILE))
    }

    /// Settings handed to the tool registry.
    pub fn extract(&self) -> ExtractConfig {
        ExtractConfig {
            pdf: self.pdf.clone(),
            ocr: self.ocr.clone(),
            office: self.office.clone(),
        }
    }

    /// Commented sample config with every default spelled out.
    pub fn sample_toml() -> &'static str {
        r#"# doctools configuration

[pdf]
# Pages processed in quick mode
quick_page_cap = 50
# Pages processed in full mode
full_page_cap = 30
# Largest accepted PDF in bytes (100MB)
max_file_size = 104857600
# Resolution used when rasterizing pages
render_dpi = 150
# Format of images written in full mode: png or jpg
image_format = "png"
# Parent of the per-call scratch directories (default: system temp dir)
# scratch_root = "/tmp"

[ocr]
enabled = true
language = "chi_sim+eng"
binary = "tesseract"

[office]
# Rows rendered per worksheet
max_sheet_rows = 500

[logging]
# trace, debug, info, warn or error
level = "info"
"#
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Get the XDG config directory for doctools.
pub fn config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("DOCTOOLS_CONFIG_DIR") {
        return Some(PathBuf::from(dir));
    }

    ProjectDirs::from("", "", "doctools").map(|dirs| dirs.config_dir().to_path_buf())
}
