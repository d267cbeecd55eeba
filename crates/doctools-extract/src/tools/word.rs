//! The `word` tool.

use async_trait::async_trait;
use doctools_core::{Arguments, ContentItem, Tool, ToolError, require_existing_file};
use serde_json::Value;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::info;

use super::{check_extension, file_path_schema, into_content, open_office, properties_section, size_mb};
use crate::docx::DocxReader;
use crate::engine::{OfficeDocument, OfficeReader};
use crate::office::render_markdown_table;

/// Word document extraction: properties, paragraphs, tables, image count.
#[derive(Clone)]
pub struct WordTool {
    reader: Arc<dyn OfficeReader>,
}

impl WordTool {
    #[must_use]
    pub fn new(reader: Arc<dyn OfficeReader>) -> Self {
        Self { reader }
    }

    async fn run(&self, arguments: &Arguments) -> Result<Vec<ContentItem>, ToolError> {
        let path = require_existing_file(arguments)?;
        check_extension(&path, &["doc", "docx"])?;
        let size = std::fs::metadata(&path)?.len();

        info!("word: {:?}", path);
        let document = open_office(Arc::clone(&self.reader), path, "Word").await?;
        Ok(word_report(size, &document))
    }
}

impl Default for WordTool {
    fn default() -> Self {
        Self::new(Arc::new(DocxReader::new()))
    }
}

fn word_report(size: u64, document: &OfficeDocument) -> Vec<ContentItem> {
    let mut items = vec![ContentItem::text(format!(
        "# Word document\n\nFile size: {} MB",
        size_mb(size)
    ))];

    if let Some(properties) = properties_section(&document.properties) {
        items.push(ContentItem::text(properties));
    }

    let mut content = format!(
        "## Document content\n\n### Paragraphs ({} total)\n\n",
        document.paragraphs.len()
    );
    for paragraph in document.paragraphs.iter().filter(|p| !p.trim().is_empty()) {
        content.push_str(paragraph);
        content.push_str("\n\n");
    }

    if !document.tables.is_empty() {
        let _ = write!(content, "### Tables ({} total)\n\n", document.tables.len());
        for (i, table) in document.tables.iter().enumerate() {
            let _ = write!(content, "#### Table {}\n\n", i + 1);
            if !table.rows.is_empty() {
                content.push_str(&render_markdown_table(&table.rows));
                content.push_str("\n\n");
            }
        }
    }
    items.push(ContentItem::text(content.trim_end()));

    if document.image_count > 0 {
        items.push(ContentItem::text(format!(
            "## Images\n\nThe document contains {} images.\n\n\
             Note: only the image count is reported; image content is not extracted. \
             Open the original document to view them.",
            document.image_count
        )));
    }

    items.push(ContentItem::text("Word document processed."));
    items
}

#[async_trait]
impl Tool for WordTool {
    fn name(&self) -> &str {
        "word"
    }

    fn description(&self) -> &str {
        "Parse a Word document, extracting text, tables and image information"
    }

    fn input_schema(&self) -> Value {
        file_path_schema("Local path of the Word document, e.g. '/path/to/document.docx'")
    }

    async fn execute(&self, arguments: &Arguments) -> Vec<ContentItem> {
        into_content(self.run(arguments).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{DocumentProperties, Table};
    use doctools_core::EngineError;
    use serde_json::json;
    use std::path::Path;
    use tempfile::tempdir;

    struct FakeReader(Result<OfficeDocument, &'static str>);

    impl OfficeReader for FakeReader {
        fn name(&self) -> &str {
            "fake"
        }

        fn open(&self, _path: &Path) -> Result<OfficeDocument, EngineError> {
            self.0
                .clone()
                .map_err(|m| EngineError::Parse(m.to_string()))
        }
    }

    fn args(value: Value) -> Arguments {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn table(rows: &[&[&str]]) -> Table {
        Table {
            name: None,
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| (*c).to_string()).collect())
                .collect(),
        }
    }

    fn document(tables: Vec<Table>) -> OfficeDocument {
        OfficeDocument {
            properties: DocumentProperties {
                title: Some("Plan".to_string()),
                ..Default::default()
            },
            paragraphs: vec!["Intro".to_string(), String::new(), "Body".to_string()],
            tables,
            image_count: 0,
        }
    }

    #[test]
    fn test_report_without_tables() {
        let items = word_report(2048, &document(vec![]));
        let text: Vec<&str> = items.iter().filter_map(ContentItem::as_text).collect();
        assert_eq!(text[0], "# Word document\n\nFile size: 0.00 MB");
        assert_eq!(text[1], "## Document properties\n\n- Title: Plan");
        assert_eq!(
            text[2],
            "## Document content\n\n### Paragraphs (3 total)\n\nIntro\n\nBody"
        );
        assert!(!text.iter().any(|t| t.contains("Table")));
        assert_eq!(*text.last().unwrap(), "Word document processed.");
    }

    #[test]
    fn test_report_with_two_tables() {
        let tables = vec![
            table(&[&["A", "B"], &["1", "2"], &["3", "4"]]),
            table(&[&["Only", "Header", "Row"]]),
        ];
        let items = word_report(0, &document(tables));
        let content = items[2].as_text().unwrap();

        assert!(content.contains("### Tables (2 total)"));
        assert!(content.contains("#### Table 1\n\n| A | B |\n| --- | --- |\n| 1 | 2 |\n| 3 | 4 |"));
        assert!(content.contains("#### Table 2\n\n| Only | Header | Row |\n| --- | --- | --- |"));
    }

    #[test]
    fn test_report_image_count() {
        let mut doc = document(vec![]);
        doc.image_count = 3;
        let items = word_report(0, &doc);
        assert!(items[3]
            .as_text()
            .unwrap()
            .starts_with("## Images\n\nThe document contains 3 images."));
    }

    #[tokio::test]
    async fn test_parse_failure_diagnostic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("locked.docx");
        std::fs::write(&path, b"x").unwrap();

        let tool = WordTool::new(Arc::new(FakeReader(Err("encrypted package"))));
        let items = tool.execute(&args(json!({"file_path": path}))).await;
        assert_eq!(items.len(), 1);
        let text = items[0].as_text().unwrap();
        assert!(text.starts_with("Error: failed to parse Word document: parse error: encrypted package"));
        assert!(text.contains("password protected"));
    }

    #[tokio::test]
    async fn test_rejects_other_extensions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sheet.xlsx");
        std::fs::write(&path, b"x").unwrap();
        let items = WordTool::default()
            .execute(&args(json!({"file_path": path})))
            .await;
        assert_eq!(items[0].as_text(), Some("Error: unsupported file type: .xlsx"));
    }

    #[tokio::test]
    async fn test_legacy_doc_is_diagnostic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("old.doc");
        std::fs::write(&path, b"\xD0\xCF\x11\xE0 binary word").unwrap();
        let items = WordTool::default()
            .execute(&args(json!({"file_path": path})))
            .await;
        assert_eq!(items.len(), 1);
        assert!(items[0].is_error());
    }
}
