//! Helpers shared by the Word and Excel readers.

use doctools_core::EngineError;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::engine::DocumentProperties;

/// An opened OOXML package.
pub(crate) type Package = zip::ZipArchive<File>;

/// Open an OOXML zip package.
pub(crate) fn open_package(path: &Path) -> Result<Package, EngineError> {
    let file = File::open(path)?;
    zip::ZipArchive::new(file)
        .map_err(|e| EngineError::Parse(format!("not an Office Open XML package: {e}")))
}

/// Read a package part as UTF-8. `Ok(None)` when the part is absent.
pub(crate) fn read_part(package: &mut Package, name: &str) -> Result<Option<String>, EngineError> {
    let mut part = match package.by_name(name) {
        Ok(part) => part,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(EngineError::Parse(format!("{name}: {e}"))),
    };
    let mut xml = String::new();
    part.read_to_string(&mut xml)?;
    Ok(Some(xml))
}

/// Core properties from `docProps/core.xml`.
pub(crate) fn parse_core_properties(xml: &str) -> Result<DocumentProperties, EngineError> {
    let mut reader = Reader::from_str(xml);
    let mut properties = DocumentProperties::default();
    let mut field: Option<Vec<u8>> = None;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => field = Some(e.local_name().as_ref().to_vec()),
            Event::End(_) => field = None,
            Event::Text(t) => {
                let Some(name) = field.as_deref() else {
                    continue;
                };
                let value = t.unescape().map_err(xml_error)?.trim().to_string();
                if value.is_empty() {
                    continue;
                }
                let slot = match name {
                    b"title" => &mut properties.title,
                    b"creator" => &mut properties.author,
                    b"created" => &mut properties.created,
                    b"modified" => &mut properties.modified,
                    b"description" => &mut properties.comments,
                    _ => continue,
                };
                *slot = Some(value);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(properties)
}

pub(crate) fn xml_error(err: impl std::fmt::Display) -> EngineError {
    EngineError::Parse(format!("malformed XML: {err}"))
}

/// Render rows as a markdown table. The first row is the header.
pub(crate) fn render_markdown_table(rows: &[Vec<String>]) -> String {
    let Some((header, body)) = rows.split_first() else {
        return String::new();
    };

    let line = |cells: &[String]| {
        let cells: Vec<String> = cells.iter().map(|c| markdown_cell(c)).collect();
        format!("| {} |", cells.join(" | "))
    };

    let mut lines = vec![line(header)];
    lines.push(format!("| {} |", vec!["---"; header.len()].join(" | ")));
    lines.extend(body.iter().map(|row| line(row)));
    lines.join("\n")
}

fn markdown_cell(text: &str) -> String {
    text.replace(['\r', '\n'], " ").trim().replace('|', "\\|")
}
