//! Content model shared by all tools.
//!
//! A tool result is an ordered `Vec<ContentItem>`. Order mirrors the page or
//! section order of the source document and must be preserved by every
//! consumer.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One block of a tool result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentItem {
    /// Human-readable text, including diagnostics.
    Text { text: String },
    /// Raw image bytes with a title and MIME type.
    Image {
        title: String,
        #[serde(with = "base64_bytes")]
        data: Vec<u8>,
        mime_type: String,
    },
    /// Opaque resource payload. Reserved; no tool produces it yet.
    #[serde(rename = "resource")]
    EmbeddedResource { resource: Value },
}

impl ContentItem {
    /// Create a text item.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create an image item.
    pub fn image(title: impl Into<String>, data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self::Image {
            title: title.into(),
            data,
            mime_type: mime_type.into(),
        }
    }

    /// Create a `Warning:` text item for a recovered, non-fatal problem.
    pub fn warning(message: impl std::fmt::Display) -> Self {
        Self::text(format!("Warning: {message}"))
    }

    /// Text of a text item.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::Image { .. } | Self::EmbeddedResource { .. } => None,
        }
    }

    /// Whether this item is an `Error:` diagnostic.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.as_text().is_some_and(|text| text.starts_with("Error:"))
    }
}

/// Concatenate the text of all text items, separated by blank lines.
#[must_use]
pub fn concat_text(items: &[ContentItem]) -> String {
    items
        .iter()
        .filter_map(ContentItem::as_text)
        .collect::<Vec<_>>()
        .join("\n\n")
}

mod base64_bytes {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_serializes_with_type_tag() {
        let item = ContentItem::text("hello");
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value, json!({"type": "text", "text": "hello"}));
    }

    #[test]
    fn test_image_serializes_data_as_base64() {
        let item = ContentItem::image("Page 1 image 1", vec![0xFF, 0xD8, 0xFF], "image/jpeg");
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["type"], "image");
        assert_eq!(value["data"], "/9j/");
        assert_eq!(value["mime_type"], "image/jpeg");

        let back: ContentItem = serde_json::from_value(value).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn test_embedded_resource_tag() {
        let item = ContentItem::EmbeddedResource {
            resource: json!({"uri": "file:///tmp/a"}),
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["type"], "resource");
    }

    #[test]
    fn test_warning_prefix() {
        let item = ContentItem::warning("tier failed");
        assert_eq!(item.as_text(), Some("Warning: tier failed"));
        assert!(!item.is_error());
    }

    #[test]
    fn test_is_error() {
        assert!(ContentItem::text("Error: boom").is_error());
        assert!(!ContentItem::text("all good").is_error());
        assert!(!ContentItem::image("x", vec![], "image/png").is_error());
    }

    #[test]
    fn test_concat_text_skips_images() {
        let items = vec![
            ContentItem::text("first"),
            ContentItem::image("img", vec![1, 2, 3], "image/png"),
            ContentItem::text("second"),
        ];
        assert_eq!(concat_text(&items), "first\n\nsecond");
    }
}
