//! Built-in tools.
//!
//! | Tool | Accepts | Backed by |
//! |------|---------|-----------|
//! | [`FileTool`] | any supported extension | routes to the tools below |
//! | [`PdfTool`] | `.pdf`, `quick` or `full` mode | [`PdfPipeline`](crate::pipeline::PdfPipeline) |
//! | [`QuickPdfTool`] | `.pdf` | the same pipeline in quick mode |
//! | [`WordTool`] | `.doc`, `.docx` | [`OfficeReader`](crate::engine::OfficeReader) |
//! | [`ExcelTool`] | `.xls`, `.xlsx`, `.xlsm` | [`OfficeReader`](crate::engine::OfficeReader) |

pub mod excel;
pub mod file;
pub mod pdf;
pub mod quick_pdf;
pub mod word;

pub use excel::ExcelTool;
pub use file::FileTool;
pub use pdf::PdfTool;
pub use quick_pdf::QuickPdfTool;
pub use word::WordTool;

use doctools_core::{ContentItem, EngineError, ToolError};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::engine::{DocumentProperties, OfficeDocument, OfficeReader};

/// Input schema with a single required `file_path`.
pub(crate) fn file_path_schema(description: &str) -> Value {
    json!({
        "type": "object",
        "required": ["file_path"],
        "properties": {
            "file_path": {
                "type": "string",
                "description": description,
            }
        }
    })
}

/// Lowercase extension without the dot.
pub(crate) fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
}

/// Reject files whose extension is not in `allowed`.
pub(crate) fn check_extension(path: &Path, allowed: &[&str]) -> Result<(), ToolError> {
    match extension(path) {
        Some(ext) if allowed.contains(&ext.as_str()) => Ok(()),
        Some(ext) => Err(ToolError::UnsupportedType(format!(".{ext}"))),
        None => Err(ToolError::UnsupportedType("(none)".to_string())),
    }
}

/// File size in bytes, rejected when above `limit`.
pub(crate) fn check_size(path: &Path, limit: u64) -> Result<u64, ToolError> {
    let size = std::fs::metadata(path)?.len();
    if size > limit {
        return Err(ToolError::FileTooLarge { size, limit });
    }
    Ok(size)
}

/// Size in megabytes with two decimals.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn size_mb(bytes: u64) -> String {
    format!("{:.2}", bytes as f64 / (1024.0 * 1024.0))
}

/// Turn a tool body's outcome into the content sequence.
pub(crate) fn into_content(result: Result<Vec<ContentItem>, ToolError>) -> Vec<ContentItem> {
    match result {
        Ok(items) if items.is_empty() => vec![ContentItem::text("(no content)")],
        Ok(items) => items,
        Err(e) => vec![e.into_content()],
    }
}

/// Open an office document off the async runtime.
pub(crate) async fn open_office(
    reader: Arc<dyn OfficeReader>,
    path: PathBuf,
    kind: &'static str,
) -> Result<OfficeDocument, ToolError> {
    tokio::task::spawn_blocking(move || reader.open(&path))
        .await
        .map_err(|e| EngineError::Join(e.to_string()))
        .and_then(|result| result)
        .map_err(|source| ToolError::Parse { kind, source })
}

/// `## Document properties` section, when any property is set.
pub(crate) fn properties_section(properties: &DocumentProperties) -> Option<String> {
    let entries = properties.entries();
    if entries.is_empty() {
        return None;
    }
    let lines: Vec<String> = entries
        .iter()
        .map(|(label, value)| format!("- {label}: {value}"))
        .collect();
    Some(format!("## Document properties\n\n{}", lines.join("\n")))
}
