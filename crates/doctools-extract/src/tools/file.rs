//! The `file` tool: routes a path to the matching extractor.

use async_trait::async_trait;
use doctools_core::{Arguments, ContentItem, Tool, ToolError, require_existing_file};
use futures::FutureExt;
use serde_json::Value;
use std::panic::AssertUnwindSafe;
use tracing::{debug, warn};

use super::{ExcelTool, PdfTool, WordTool, extension, file_path_schema};
use crate::registry::panic_message;

/// Dispatches by lowercase extension to the PDF, Word or Excel tool.
pub struct FileTool {
    pdf: PdfTool,
    word: WordTool,
    excel: ExcelTool,
}

impl FileTool {
    #[must_use]
    pub fn new(pdf: PdfTool, word: WordTool, excel: ExcelTool) -> Self {
        Self { pdf, word, excel }
    }

    fn route(&self, ext: Option<&str>) -> Result<&dyn Tool, ToolError> {
        match ext {
            Some("pdf") => Ok(&self.pdf),
            Some("doc" | "docx") => Ok(&self.word),
            Some("xls" | "xlsx" | "xlsm") => Ok(&self.excel),
            Some(other) => Err(ToolError::UnsupportedType(format!(".{other}"))),
            None => Err(ToolError::UnsupportedType("(none)".to_string())),
        }
    }
}

#[async_trait]
impl Tool for FileTool {
    fn name(&self) -> &str {
        "file"
    }

    fn description(&self) -> &str {
        "Parse file content. Supports PDF, Word and Excel formats"
    }

    fn input_schema(&self) -> Value {
        let mut schema = file_path_schema("Local path of the file, e.g. '/path/to/document.pdf'");
        schema["properties"]["mode"] = serde_json::json!({
            "type": "string",
            "description": "PDF extraction mode, forwarded to the pdf tool",
            "enum": ["quick", "full"],
        });
        schema
    }

    async fn execute(&self, arguments: &Arguments) -> Vec<ContentItem> {
        let path = match require_existing_file(arguments) {
            Ok(path) => path,
            Err(e) => return vec![e.into_content()],
        };
        let ext = extension(&path);
        let tool = match self.route(ext.as_deref()) {
            Ok(tool) => tool,
            Err(e) => return vec![e.into_content()],
        };

        debug!("file: routing {:?} to {}", path, tool.name());
        match AssertUnwindSafe(tool.execute(arguments)).catch_unwind().await {
            Ok(items) => items,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                warn!("{} tool panicked on {:?}: {}", tool.name(), path, message);
                vec![ContentItem::text(format!(
                    "Error: failed to process {}: {message}",
                    path.display()
                ))]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PdfConfig;
    use crate::engine::{OfficeDocument, OfficeReader};
    use crate::ocr::{DisabledOcr, ImageAnalyzer};
    use crate::pipeline::PdfPipeline;
    use doctools_core::EngineError;
    use serde_json::json;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::tempdir;

    struct PanickingReader;

    impl OfficeReader for PanickingReader {
        fn name(&self) -> &str {
            "panicking"
        }

        fn open(&self, _path: &Path) -> Result<OfficeDocument, EngineError> {
            panic!("reader bug")
        }
    }

    fn args(value: Value) -> Arguments {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn file_tool(word: WordTool) -> FileTool {
        let pipeline = Arc::new(PdfPipeline::new(
            PdfConfig::default(),
            ImageAnalyzer::new(Arc::new(DisabledOcr), "eng"),
        ));
        FileTool::new(PdfTool::new(pipeline), word, ExcelTool::default())
    }

    #[test]
    fn test_route() {
        let tool = file_tool(WordTool::default());
        assert_eq!(tool.route(Some("pdf")).unwrap().name(), "pdf");
        assert_eq!(tool.route(Some("doc")).unwrap().name(), "word");
        assert_eq!(tool.route(Some("docx")).unwrap().name(), "word");
        assert_eq!(tool.route(Some("xlsm")).unwrap().name(), "excel");
        assert!(tool.route(Some("txt")).is_err());
        assert!(tool.route(None).is_err());
    }

    #[tokio::test]
    async fn test_missing_argument() {
        let items = file_tool(WordTool::default()).execute(&Arguments::new()).await;
        assert_eq!(
            items,
            vec![ContentItem::text("Error: missing required argument 'file_path'")]
        );
    }

    #[tokio::test]
    async fn test_nonexistent_file() {
        let items = file_tool(WordTool::default())
            .execute(&args(json!({"file_path": "/nowhere/report.docx"})))
            .await;
        assert_eq!(items.len(), 1);
        assert_eq!(
            items[0].as_text(),
            Some("Error: file not found: /nowhere/report.docx")
        );
    }

    #[tokio::test]
    async fn test_unsupported_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.TXT");
        std::fs::write(&path, "x").unwrap();
        let items = file_tool(WordTool::default())
            .execute(&args(json!({"file_path": path})))
            .await;
        assert_eq!(items[0].as_text(), Some("Error: unsupported file type: .txt"));
    }

    #[tokio::test]
    async fn test_sub_tool_panic_is_diagnostic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("crash.docx");
        std::fs::write(&path, "x").unwrap();

        let items = file_tool(WordTool::new(Arc::new(PanickingReader)))
            .execute(&args(json!({"file_path": path})))
            .await;
        assert_eq!(items.len(), 1);
        let text = items[0].as_text().unwrap();
        assert!(text.starts_with("Error: failed to parse Word document"), "{text}");
        assert!(text.contains("engine task aborted"), "{text}");
    }

    #[tokio::test]
    async fn test_uppercase_extension_routes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("REPORT.PDF");
        std::fs::write(&path, b"").unwrap();
        let items = file_tool(WordTool::default())
            .execute(&args(json!({"file_path": path})))
            .await;
        // Routed to the pdf tool, whose empty pipeline reports exhaustion
        assert!(items[0]
            .as_text()
            .unwrap()
            .starts_with("Error: unable to extract content from"));
    }
}
