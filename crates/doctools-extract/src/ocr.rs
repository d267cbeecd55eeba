//! Text recognition over extracted images.
//!
//! [`TesseractOcr`] drives the `tesseract` command line. [`DisabledOcr`] is
//! used when OCR is turned off in configuration. [`ImageAnalyzer`] turns an
//! OCR outcome into the text reported next to each image.

use async_trait::async_trait;
use doctools_core::EngineError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::process::Command;
use tracing::debug;

use crate::config::OcrConfig;
use crate::engine::OcrEngine;
use crate::process;

/// OCR through the `tesseract` executable, image bytes passed on stdin.
pub struct TesseractOcr {
    binary: PathBuf,
}

impl TesseractOcr {
    #[must_use]
    pub fn new(binary: impl AsRef<Path>) -> Self {
        Self {
            binary: binary.as_ref().to_path_buf(),
        }
    }
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self::new("tesseract")
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn recognize(&self, image: &[u8], language: &str) -> Result<String, EngineError> {
        let mut command = Command::new(&self.binary);
        command.args(["stdin", "stdout", "-l", language]);

        let stdout = process::run(command, Some(image)).await?;
        Ok(String::from_utf8_lossy(&stdout).trim().to_string())
    }
}

/// OCR engine that is always unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledOcr;

#[async_trait]
impl OcrEngine for DisabledOcr {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn recognize(&self, _image: &[u8], _language: &str) -> Result<String, EngineError> {
        Err(EngineError::Unavailable("OCR is disabled".to_string()))
    }
}

/// Runs OCR on one image and renders the result as report text.
///
/// Failures never propagate; they become part of the text.
#[derive(Clone)]
pub struct ImageAnalyzer {
    engine: Arc<dyn OcrEngine>,
    language: String,
}

impl ImageAnalyzer {
    pub fn new(engine: Arc<dyn OcrEngine>, language: impl Into<String>) -> Self {
        Self {
            engine,
            language: language.into(),
        }
    }

    /// Build the analyzer described by `config`.
    #[must_use]
    pub fn from_config(config: &OcrConfig) -> Self {
        let engine: Arc<dyn OcrEngine> = if config.enabled {
            Arc::new(TesseractOcr::new(&config.binary))
        } else {
            Arc::new(DisabledOcr)
        };
        Self::new(engine, config.language.clone())
    }

    /// Recognize text in `image`.
    pub async fn analyze(&self, image: &[u8]) -> String {
        match self.engine.recognize(image, &self.language).await {
            Ok(text) if text.trim().is_empty() => "No text recognized in image.".to_string(),
            Ok(text) => format!("Text recognized in image:\n{}", text.trim()),
            Err(e) => {
                debug!("OCR with {} failed: {}", self.engine.name(), e);
                format!("Image analysis failed: {e}")
            }
        }
    }
}
