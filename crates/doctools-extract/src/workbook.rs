//! Spreadsheet reader backed by calamine.
//!
//! Every worksheet becomes a [`Table`] named after the sheet. Zip-based
//! workbooks (`.xlsx`, `.xlsm`) also report core properties and the number
//! of embedded media files.

use calamine::{Reader, open_workbook_auto};
use doctools_core::EngineError;
use std::path::Path;
use tracing::debug;

use crate::engine::{DocumentProperties, OfficeDocument, OfficeReader, Table};
use crate::office::{open_package, parse_core_properties, read_part};

#[derive(Debug, Clone, Copy, Default)]
pub struct WorkbookReader;

impl WorkbookReader {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl OfficeReader for WorkbookReader {
    fn name(&self) -> &str {
        "calamine"
    }

    fn open(&self, path: &Path) -> Result<OfficeDocument, EngineError> {
        let mut workbook =
            open_workbook_auto(path).map_err(|e| EngineError::Parse(format!("calamine: {e}")))?;

        let mut tables = Vec::new();
        for name in workbook.sheet_names() {
            let range = workbook
                .worksheet_range(&name)
                .map_err(|e| EngineError::Parse(format!("sheet '{name}': {e}")))?;
            let rows = range
                .rows()
                .map(|row| row.iter().map(ToString::to_string).collect())
                .collect();
            tables.push(Table {
                name: Some(name),
                rows,
            });
        }
        debug!("{:?}: {} sheets", path, tables.len());

        let (properties, image_count) = if is_zip_workbook(path) {
            package_extras(path)?
        } else {
            (DocumentProperties::default(), 0)
        };

        Ok(OfficeDocument {
            properties,
            paragraphs: Vec::new(),
            tables,
            image_count,
        })
    }
}

fn is_zip_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| matches!(ext.to_lowercase().as_str(), "xlsx" | "xlsm"))
}

/// Core properties and `xl/media/` entry count of an OOXML workbook.
fn package_extras(path: &Path) -> Result<(DocumentProperties, usize), EngineError> {
    let mut package = open_package(path)?;
    let image_count = package
        .file_names()
        .filter(|name| name.starts_with("xl/media/") && !name.ends_with('/'))
        .count();
    let properties = match read_part(&mut package, "docProps/core.xml")? {
        Some(xml) => parse_core_properties(&xml)?,
        None => DocumentProperties::default(),
    };
    Ok((properties, image_count))
}
