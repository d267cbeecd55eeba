//! The `pdf` tool.

use async_trait::async_trait;
use doctools_core::{
    Arguments, ContentItem, Tool, ToolError, optional_str, require_existing_file,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

use super::{check_extension, check_size, into_content};
use crate::pipeline::{PdfMode, PdfPipeline};

/// Argument key selecting the extraction mode.
pub const MODE: &str = "mode";

/// PDF extraction through the fallback pipeline, in quick or full mode.
#[derive(Clone)]
pub struct PdfTool {
    pipeline: Arc<PdfPipeline>,
}

impl PdfTool {
    #[must_use]
    pub fn new(pipeline: Arc<PdfPipeline>) -> Self {
        Self { pipeline }
    }

    async fn run(&self, arguments: &Arguments) -> Result<Vec<ContentItem>, ToolError> {
        let path = require_existing_file(arguments)?;
        let mode = parse_mode(arguments)?;
        check_extension(&path, &["pdf"])?;
        check_size(&path, self.pipeline.config().max_file_size)?;

        info!("pdf: {:?} ({})", path, mode.as_str());
        Ok(self.pipeline.run(&path, mode).await)
    }
}

fn parse_mode(arguments: &Arguments) -> Result<PdfMode, ToolError> {
    let value = optional_str(arguments, MODE, PdfMode::default().as_str())?;
    PdfMode::parse(value).ok_or_else(|| ToolError::InvalidArgument {
        name: MODE.to_string(),
        reason: format!("must be 'quick' or 'full', got '{value}'"),
    })
}

#[async_trait]
impl Tool for PdfTool {
    fn name(&self) -> &str {
        "pdf"
    }

    fn description(&self) -> &str {
        "Extract PDF content. 'quick' mode returns text only; 'full' mode also \
         extracts embedded images and runs OCR on them."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["file_path"],
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Local path of the PDF file, e.g. '/path/to/document.pdf'",
                },
                "mode": {
                    "type": "string",
                    "description": "Extraction mode: 'quick' (text only) or 'full' (text and images). Defaults to 'full'.",
                    "enum": ["quick", "full"],
                    "default": "full",
                }
            }
        })
    }

    async fn execute(&self, arguments: &Arguments) -> Vec<ContentItem> {
        into_content(self.run(arguments).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PdfConfig;
    use crate::ocr::{DisabledOcr, ImageAnalyzer};
    use crate::pdf::LopdfEngine;
    use crate::testing::write_pdf;
    use crate::tiers::StructuredTier;
    use tempfile::tempdir;

    fn args(value: Value) -> Arguments {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn tool(config: PdfConfig) -> PdfTool {
        let pipeline = PdfPipeline::new(config, ImageAnalyzer::new(Arc::new(DisabledOcr), "eng"))
            .with_tier(StructuredTier::new(Arc::new(LopdfEngine::new())));
        PdfTool::new(Arc::new(pipeline))
    }

    #[test]
    fn test_schema_declares_mode() {
        let schema = tool(PdfConfig::default()).input_schema();
        assert_eq!(schema["properties"]["mode"]["enum"], json!(["quick", "full"]));
        assert_eq!(schema["required"], json!(["file_path"]));
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!(parse_mode(&args(json!({}))).unwrap(), PdfMode::Full);
        assert_eq!(
            parse_mode(&args(json!({"mode": "quick"}))).unwrap(),
            PdfMode::Quick
        );
        let err = parse_mode(&args(json!({"mode": "fast"}))).unwrap_err();
        assert!(err.to_string().contains("'fast'"));
    }

    #[tokio::test]
    async fn test_missing_file_path() {
        let items = tool(PdfConfig::default()).execute(&args(json!({}))).await;
        assert_eq!(items.len(), 1);
        assert_eq!(
            items[0].as_text(),
            Some("Error: missing required argument 'file_path'")
        );
    }

    #[tokio::test]
    async fn test_missing_file_wins_over_bad_mode() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.pdf");
        let items = tool(PdfConfig::default())
            .execute(&args(json!({"file_path": path, "mode": "fast"})))
            .await;
        assert_eq!(items.len(), 1);
        assert!(items[0].as_text().unwrap().starts_with("Error: file not found"));
    }

    #[tokio::test]
    async fn test_not_a_pdf() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();
        let items = tool(PdfConfig::default())
            .execute(&args(json!({"file_path": path})))
            .await;
        assert_eq!(items[0].as_text(), Some("Error: unsupported file type: .txt"));
    }

    #[tokio::test]
    async fn test_file_too_large() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big.pdf");
        write_pdf(&path, &["page"]);
        let config = PdfConfig {
            max_file_size: 16,
            ..Default::default()
        };
        let items = tool(config)
            .execute(&args(json!({"file_path": path})))
            .await;
        assert!(items[0].as_text().unwrap().starts_with("Error: file is too large"));
    }

    #[tokio::test]
    async fn test_quick_mode_extracts_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("two.pdf");
        write_pdf(&path, &["Hello", "World"]);
        let items = tool(PdfConfig::default())
            .execute(&args(json!({"file_path": path, "mode": "quick"})))
            .await;
        assert_eq!(items.len(), 1);
        let text = items[0].as_text().unwrap();
        assert!(text.contains("### Page 1"));
        assert!(text.contains("### Page 2"));
    }

    #[tokio::test]
    async fn test_full_mode_on_text_only_pdf() {
        let root = tempdir().unwrap();
        let dir = tempdir().unwrap();
        let path = dir.path().join("two.pdf");
        write_pdf(&path, &["Hello", "World"]);
        let config = PdfConfig {
            scratch_root: Some(root.path().to_path_buf()),
            ..Default::default()
        };
        let items = tool(config)
            .execute(&args(json!({"file_path": path})))
            .await;
        // header + one item per page, no images and no warnings
        assert_eq!(items.len(), 3);
        assert!(items.iter().all(|item| !item.as_text().unwrap().contains("Warning:")));
        assert!(items[1].as_text().unwrap().starts_with("### Page 1"));
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }
}
