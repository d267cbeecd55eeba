//! The `excel` tool.

use async_trait::async_trait;
use doctools_core::{Arguments, ContentItem, Tool, ToolError, require_existing_file};
use serde_json::Value;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::info;

use super::{check_extension, file_path_schema, into_content, open_office, properties_section, size_mb};
use crate::config::OfficeConfig;
use crate::engine::{OfficeDocument, OfficeReader, Table};
use crate::office::render_markdown_table;
use crate::workbook::WorkbookReader;

/// Workbook extraction: one markdown table per sheet.
#[derive(Clone)]
pub struct ExcelTool {
    reader: Arc<dyn OfficeReader>,
    max_rows: usize,
}

impl ExcelTool {
    #[must_use]
    pub fn new(reader: Arc<dyn OfficeReader>, max_rows: usize) -> Self {
        Self { reader, max_rows }
    }

    async fn run(&self, arguments: &Arguments) -> Result<Vec<ContentItem>, ToolError> {
        let path = require_existing_file(arguments)?;
        check_extension(&path, &["xls", "xlsx", "xlsm"])?;
        let size = std::fs::metadata(&path)?.len();

        info!("excel: {:?}", path);
        let workbook = open_office(Arc::clone(&self.reader), path, "Excel").await?;
        Ok(workbook_report(size, &workbook, self.max_rows))
    }
}

impl Default for ExcelTool {
    fn default() -> Self {
        Self::new(
            Arc::new(WorkbookReader::new()),
            OfficeConfig::default().max_sheet_rows,
        )
    }
}

fn workbook_report(size: u64, workbook: &OfficeDocument, max_rows: usize) -> Vec<ContentItem> {
    let mut items = vec![ContentItem::text(format!(
        "# Excel workbook\n\nFile size: {} MB\nSheets: {}",
        size_mb(size),
        workbook.tables.len()
    ))];

    if let Some(properties) = properties_section(&workbook.properties) {
        items.push(ContentItem::text(properties));
    }

    for (i, sheet) in workbook.tables.iter().enumerate() {
        items.push(ContentItem::text(sheet_section(i + 1, sheet, max_rows)));
    }

    if workbook.image_count > 0 {
        items.push(ContentItem::text(format!(
            "## Images\n\nThe workbook contains {} embedded media files (not extracted).",
            workbook.image_count
        )));
    }

    items.push(ContentItem::text("Excel workbook processed."));
    items
}

fn sheet_section(index: usize, sheet: &Table, max_rows: usize) -> String {
    let name = sheet
        .name
        .clone()
        .unwrap_or_else(|| format!("Sheet {index}"));
    let mut section = format!("## Sheet: {name}\n\n");

    if sheet.rows.iter().all(|row| row.iter().all(|c| c.trim().is_empty())) {
        section.push_str("(empty sheet)");
        return section;
    }

    let shown = sheet.rows.len().min(max_rows);
    section.push_str(&render_markdown_table(&sheet.rows[..shown]));
    if shown < sheet.rows.len() {
        let _ = write!(
            section,
            "\n\nNote: showing the first {shown} of {} rows.",
            sheet.rows.len()
        );
    }
    section
}

#[async_trait]
impl Tool for ExcelTool {
    fn name(&self) -> &str {
        "excel"
    }

    fn description(&self) -> &str {
        "Parse an Excel workbook, extracting every sheet as a table"
    }

    fn input_schema(&self) -> Value {
        file_path_schema("Local path of the Excel workbook, e.g. '/path/to/book.xlsx'")
    }

    async fn execute(&self, arguments: &Arguments) -> Vec<ContentItem> {
        into_content(self.run(arguments).await)
    }
}
