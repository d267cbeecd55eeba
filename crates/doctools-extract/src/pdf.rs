//! Page-structured PDF access backed by lopdf.
//!
//! Also hosts the embedded-image decoding shared by the markdown engine:
//!
//! - **JPEG** (`DCTDecode`): raw stream content
//! - **Flate** (`FlateDecode`): inflated and re-encoded as PNG
//! - **JPEG2000** (`JPXDecode`): raw stream content
//! - **Color spaces**: RGB, Grayscale, CMYK (converted to RGB)

use doctools_core::EngineError;
use flate2::read::ZlibDecoder;
use lopdf::{Document, Object, ObjectId, Stream};
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::engine::{PdfPages, PdfTextEngine, RawImage};

/// Tier-one engine: opens documents with lopdf.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfEngine;

impl LopdfEngine {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl PdfTextEngine for LopdfEngine {
    fn name(&self) -> &str {
        "lopdf"
    }

    fn open(&self, path: &Path) -> Result<Box<dyn PdfPages>, EngineError> {
        let document = load_document(path)?;
        let pages = document.get_pages().into_iter().collect();
        Ok(Box::new(LopdfDocument { document, pages }))
    }
}

/// Read and parse a PDF, rejecting documents that stay encrypted.
pub(crate) fn load_document(path: &Path) -> Result<Document, EngineError> {
    debug!("Loading PDF: {:?}", path);
    let bytes = std::fs::read(path)?;
    let document =
        Document::load_mem(&bytes).map_err(|e| EngineError::Parse(format!("lopdf: {e}")))?;
    if document.is_encrypted() {
        return Err(EngineError::Failed("document is encrypted".to_string()));
    }
    Ok(document)
}

struct LopdfDocument {
    document: Document,
    /// (page number, page object) in page order
    pages: Vec<(u32, ObjectId)>,
}

impl LopdfDocument {
    fn page(&self, index: usize) -> Result<(u32, ObjectId), EngineError> {
        self.pages
            .get(index)
            .copied()
            .ok_or_else(|| EngineError::Failed(format!("page index {index} out of range")))
    }
}

impl PdfPages for LopdfDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn metadata(&self) -> Vec<(String, String)> {
        document_info(&self.document)
    }

    fn page_text(&self, index: usize) -> Result<String, EngineError> {
        let (number, _) = self.page(index)?;
        self.document
            .extract_text(&[number])
            .map_err(|e| EngineError::Parse(format!("page {number}: {e}")))
    }

    fn page_images(&self, index: usize) -> Result<Vec<Result<RawImage, EngineError>>, EngineError> {
        let (number, page_id) = self.page(index)?;
        let images = page_image_streams(&self.document, page_id);

        debug!("Page {} has {} images", number, images.len());
        Ok(images.into_iter().map(decode_image_stream).collect())
    }
}

/// Deepest `/Parent` chain followed when resolving inherited resources.
const MAX_TREE_DEPTH: usize = 64;

/// Image XObjects of a page.
///
/// `/Resources` is inherited as a whole from the nearest `/Pages` ancestor
/// that defines it. A page without an `/XObject` dictionary has no images.
pub(crate) fn page_image_streams(document: &Document, page_id: ObjectId) -> Vec<&Stream> {
    let Some(resources) = page_resources(document, page_id) else {
        return Vec::new();
    };
    let Some(xobjects) = resources
        .get(b"XObject")
        .ok()
        .and_then(|obj| resolve_dictionary(document, obj))
    else {
        return Vec::new();
    };

    xobjects
        .iter()
        .filter_map(|(name, value)| {
            let stream = match value {
                Object::Reference(id) => document.get_object(*id).and_then(Object::as_stream),
                other => other.as_stream(),
            };
            match stream {
                Ok(stream) => Some(stream),
                Err(e) => {
                    debug!("Skipping XObject {}: {}", String::from_utf8_lossy(name), e);
                    None
                }
            }
        })
        .filter(|stream| {
            stream
                .dict
                .get(b"Subtype")
                .and_then(Object::as_name)
                .is_ok_and(|subtype| subtype == b"Image")
        })
        .collect()
}

fn page_resources(document: &Document, page_id: ObjectId) -> Option<&lopdf::Dictionary> {
    let mut node = document.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(resources) = node.get(b"Resources") {
            return resolve_dictionary(document, resources);
        }
        let parent = node.get(b"Parent").ok()?;
        node = resolve_dictionary(document, parent)?;
    }
    None
}

fn resolve_dictionary<'a>(document: &'a Document, object: &'a Object) -> Option<&'a lopdf::Dictionary> {
    match object {
        Object::Dictionary(dictionary) => Some(dictionary),
        Object::Reference(id) => document.get_dictionary(*id).ok(),
        _ => None,
    }
}

/// Key/value pairs of the document information dictionary.
pub(crate) fn document_info(document: &Document) -> Vec<(String, String)> {
    let Ok(info) = document.trailer.get(b"Info") else {
        return Vec::new();
    };
    let dictionary = match info {
        Object::Reference(id) => document.get_dictionary(*id).ok(),
        Object::Dictionary(dictionary) => Some(dictionary),
        _ => None,
    };
    let Some(dictionary) = dictionary else {
        return Vec::new();
    };

    dictionary
        .iter()
        .filter_map(|(key, value)| {
            let value = match value {
                Object::Reference(id) => document.get_object(*id).ok()?,
                other => other,
            };
            let Object::String(bytes, _) = value else {
                return None;
            };
            let text = decode_text_string(bytes);
            let text = text.trim();
            (!text.is_empty()).then(|| (String::from_utf8_lossy(key).into_owned(), text.to_string()))
        })
        .collect()
}

/// Decode a PDF text string (UTF-16BE with BOM, otherwise PDFDocEncoding).
fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        bytes.iter().map(|&b| char::from(b)).collect()
    }
}

/// Decode an image XObject into a [`RawImage`].
pub(crate) fn decode_image_stream(stream: &Stream) -> Result<RawImage, EngineError> {
    let filters = stream_filters(&stream.dict);
    if filters.is_empty() {
        return Err(EngineError::Failed("image has no filter".to_string()));
    }

    let (data, mime_type) = if filters.iter().any(|f| f == "DCTDecode") {
        (stream.content.clone(), "image/jpeg")
    } else if filters.iter().any(|f| f == "FlateDecode") {
        (decode_flate_image(stream)?, "image/png")
    } else if filters.iter().any(|f| f == "JPXDecode") {
        (stream.content.clone(), "image/jp2")
    } else {
        return Err(EngineError::Failed(format!(
            "unsupported image filter: {filters:?}"
        )));
    };

    Ok(RawImage {
        data,
        mime_type: mime_type.to_string(),
    })
}

/// `/Filter` as a list of names; a single name or an array.
fn stream_filters(dict: &lopdf::Dictionary) -> Vec<String> {
    match dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![String::from_utf8_lossy(name).into_owned()],
        Ok(Object::Array(names)) => names
            .iter()
            .filter_map(|n| n.as_name().ok())
            .map(|n| String::from_utf8_lossy(n).into_owned())
            .collect(),
        _ => Vec::new(),
    }
}

/// Color space name; for arrays such as `[/ICCBased 5 0 R]` the family name.
fn stream_color_space(dict: &lopdf::Dictionary) -> Option<String> {
    let name = match dict.get(b"ColorSpace").ok()? {
        Object::Name(name) => name,
        Object::Array(items) => items.first()?.as_name().ok()?,
        _ => return None,
    };
    Some(String::from_utf8_lossy(name).into_owned())
}

fn dimension(dict: &lopdf::Dictionary, key: &[u8]) -> Result<u32, EngineError> {
    let label = String::from_utf8_lossy(key);
    let value = dict
        .get(key)
        .and_then(Object::as_i64)
        .map_err(|_| EngineError::Parse(format!("image has no {label}")))?;
    u32::try_from(value).map_err(|_| EngineError::Parse(format!("invalid {label} {value}")))
}

fn decode_flate_image(stream: &Stream) -> Result<Vec<u8>, EngineError> {
    let mut decoder = ZlibDecoder::new(stream.content.as_slice());
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| EngineError::Parse(format!("decompression failed: {e}")))?;

    let color_space = stream_color_space(&stream.dict).unwrap_or_else(|| "DeviceRGB".to_string());
    let color_space = color_space.as_str();
    let width = dimension(&stream.dict, b"Width")?;
    let height = dimension(&stream.dict, b"Height")?;

    let img = match color_space {
        "DeviceGray" | "Gray" => image::GrayImage::from_raw(width, height, decompressed)
            .map(image::DynamicImage::ImageLuma8),
        "DeviceCMYK" | "CMYK" => image::RgbImage::from_raw(width, height, cmyk_to_rgb(&decompressed))
            .map(image::DynamicImage::ImageRgb8),
        "DeviceRGB" | "RGB" => image::RgbImage::from_raw(width, height, decompressed)
            .map(image::DynamicImage::ImageRgb8),
        other => {
            debug!("Unknown color space '{}', attempting RGB", other);
            image::RgbImage::from_raw(width, height, decompressed)
                .map(image::DynamicImage::ImageRgb8)
        }
    };
    let img = img.ok_or_else(|| {
        EngineError::Parse(format!(
            "{width}x{height} {color_space} image does not match its data length"
        ))
    })?;

    let mut png = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(|e| EngineError::Failed(format!("PNG encoding failed: {e}")))?;
    Ok(png)
}

/// Convert CMYK bytes to RGB.
#[allow(clippy::many_single_char_names)]
fn cmyk_to_rgb(cmyk: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity((cmyk.len() / 4) * 3);
    for chunk in cmyk.chunks_exact(4) {
        let c = f32::from(chunk[0]) / 255.0;
        let m = f32::from(chunk[1]) / 255.0;
        let y = f32::from(chunk[2]) / 255.0;
        let k = f32::from(chunk[3]) / 255.0;

        let r = 255.0 * (1.0 - c) * (1.0 - k);
        let g = 255.0 * (1.0 - m) * (1.0 - k);
        let b = 255.0 * (1.0 - y) * (1.0 - k);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        {
            rgb.push(r as u8);
            rgb.push(g as u8);
            rgb.push(b as u8);
        }
    }
    rgb
}
