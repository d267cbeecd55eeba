//! Word (`.docx`) reader over the raw package with zip and quick-xml.

use doctools_core::EngineError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::{NsReader, Reader};
use std::path::Path;
use tracing::debug;

use crate::engine::{OfficeDocument, OfficeReader, Table};
use crate::office::{open_package, parse_core_properties, read_part, xml_error};

const DOCUMENT_PART: &str = "word/document.xml";
const RELS_PART: &str = "word/_rels/document.xml.rels";
const CORE_PART: &str = "docProps/core.xml";

/// WordprocessingML namespaces, transitional and strict.
const WORD_NAMESPACES: [&[u8]; 2] = [
    b"http://schemas.openxmlformats.org/wordprocessingml/2006/main",
    b"http://purl.oclc.org/ooxml/wordprocessingml/main",
];

/// Reads paragraphs, tables, core properties and image relationships.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxReader;

impl DocxReader {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl OfficeReader for DocxReader {
    fn name(&self) -> &str {
        "docx"
    }

    fn open(&self, path: &Path) -> Result<OfficeDocument, EngineError> {
        let mut package = open_package(path)?;

        let body = read_part(&mut package, DOCUMENT_PART)?
            .ok_or_else(|| EngineError::Parse(format!("missing {DOCUMENT_PART}")))?;
        let (paragraphs, tables) = parse_body(&body)?;

        let properties = match read_part(&mut package, CORE_PART)? {
            Some(xml) => parse_core_properties(&xml)?,
            None => Default::default(),
        };
        let image_count = match read_part(&mut package, RELS_PART)? {
            Some(xml) => count_image_relationships(&xml)?,
            None => 0,
        };

        debug!(
            "{:?}: {} paragraphs, {} tables, {} images",
            path,
            paragraphs.len(),
            tables.len(),
            image_count
        );
        Ok(OfficeDocument {
            properties,
            paragraphs,
            tables,
            image_count,
        })
    }
}

/// Row and cell state of the outermost open table.
#[derive(Default)]
struct TableBuilder {
    rows: Vec<Vec<String>>,
    row: Vec<String>,
    cell: String,
}

/// Top-level paragraphs and tables of `word/document.xml`.
///
/// Nested tables are folded into the text of the enclosing cell.
fn parse_body(xml: &str) -> Result<(Vec<String>, Vec<Table>), EngineError> {
    let mut reader = NsReader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut tables = Vec::new();

    let mut table_depth = 0usize;
    let mut table = TableBuilder::default();
    let mut paragraph: Option<String> = None;
    let mut in_text = false;

    loop {
        let (namespace, event) = reader.read_resolved_event().map_err(xml_error)?;
        let word = is_word_namespace(&namespace);
        match event {
            Event::Start(e) if word => match e.local_name().as_ref() {
                b"tbl" => {
                    table_depth += 1;
                    if table_depth == 1 {
                        table = TableBuilder::default();
                    }
                }
                b"tr" if table_depth == 1 => table.row.clear(),
                b"tc" if table_depth == 1 => table.cell.clear(),
                b"p" => paragraph = Some(String::new()),
                b"t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) if word => match e.local_name().as_ref() {
                b"p" => finish_paragraph(String::new(), table_depth, &mut table, &mut paragraphs),
                _ => push_break(&e, paragraph.as_mut()),
            },
            Event::Text(t) if in_text => {
                if let Some(text) = paragraph.as_mut() {
                    text.push_str(&t.unescape().map_err(xml_error)?);
                }
            }
            Event::End(e) if word => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    let text = paragraph.take().unwrap_or_default();
                    finish_paragraph(text, table_depth, &mut table, &mut paragraphs);
                }
                b"tc" if table_depth == 1 => {
                    let cell = std::mem::take(&mut table.cell);
                    table.row.push(cell);
                }
                b"tr" if table_depth == 1 => {
                    let row = std::mem::take(&mut table.row);
                    table.rows.push(row);
                }
                b"tbl" => {
                    table_depth = table_depth.saturating_sub(1);
                    if table_depth == 0 {
                        tables.push(Table {
                            name: None,
                            rows: std::mem::take(&mut table.rows),
                        });
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok((paragraphs, tables))
}

/// Route a finished paragraph to the body or the open table cell.
fn finish_paragraph(
    text: String,
    table_depth: usize,
    table: &mut TableBuilder,
    paragraphs: &mut Vec<String>,
) {
    if table_depth == 0 {
        paragraphs.push(text);
    } else {
        if !table.cell.is_empty() {
            table.cell.push('\n');
        }
        table.cell.push_str(&text);
    }
}

fn is_word_namespace(namespace: &ResolveResult<'_>) -> bool {
    matches!(namespace, ResolveResult::Bound(Namespace(uri)) if WORD_NAMESPACES.iter().any(|ns| ns == uri))
}

fn push_break(element: &BytesStart<'_>, paragraph: Option<&mut String>) {
    let Some(text) = paragraph else {
        return;
    };
    match element.local_name().as_ref() {
        b"tab" => text.push('\t'),
        b"br" | b"cr" => text.push('\n'),
        _ => {}
    }
}

/// Number of relationships whose type is an image.
fn count_image_relationships(xml: &str) -> Result<usize, EngineError> {
    let mut reader = Reader::from_str(xml);
    let mut count = 0;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                let is_image = e
                    .try_get_attribute("Type")
                    .map_err(xml_error)?
                    .map(|attr| attr.unescape_value().map_err(xml_error))
                    .transpose()?
                    .is_some_and(|kind| kind.ends_with("/image"));
                if is_image {
                    count += 1;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(count)
}
