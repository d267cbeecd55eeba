//! The `quick_pdf` tool: a text-only preview for large documents.

use async_trait::async_trait;
use doctools_core::{Arguments, ContentItem, Tool, ToolError, require_existing_file};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use super::{check_extension, check_size, file_path_schema, into_content, size_mb};
use crate::pipeline::{PdfMode, PdfPipeline};

const CLOSING_NOTE: &str = "## Note\n\nQuick preview complete. To see image content, use the \
                            `pdf` tool with mode \"full\".";

/// Quick-mode preview sharing the `pdf` tool's pipeline.
#[derive(Clone)]
pub struct QuickPdfTool {
    pipeline: Arc<PdfPipeline>,
}

impl QuickPdfTool {
    #[must_use]
    pub fn new(pipeline: Arc<PdfPipeline>) -> Self {
        Self { pipeline }
    }

    async fn run(&self, arguments: &Arguments) -> Result<Vec<ContentItem>, ToolError> {
        let path = require_existing_file(arguments)?;
        check_extension(&path, &["pdf"])?;
        let size = check_size(&path, self.pipeline.config().max_file_size)?;

        info!("quick_pdf: {:?}", path);
        let extracted = self.pipeline.run(&path, PdfMode::Quick).await;
        if extracted.len() == 1 && extracted[0].is_error() {
            return Ok(extracted);
        }

        let mut items = Vec::with_capacity(extracted.len() + 2);
        items.push(ContentItem::text(format!(
            "# Quick preview - text only\n\nFile size: {} MB",
            size_mb(size)
        )));
        items.extend(extracted);
        items.push(ContentItem::text(CLOSING_NOTE));
        Ok(items)
    }
}

#[async_trait]
impl Tool for QuickPdfTool {
    fn name(&self) -> &str {
        "quick_pdf"
    }

    fn description(&self) -> &str {
        "Quickly preview PDF content (text only, no images)"
    }

    fn input_schema(&self) -> Value {
        file_path_schema("Local path of the PDF file, e.g. '/path/to/document.pdf'")
    }

    async fn execute(&self, arguments: &Arguments) -> Vec<ContentItem> {
        into_content(self.run(arguments).await)
    }
}
