//! Image probing and conversion.
//!
//! Used to describe scratch images written by engines and to convert
//! embedded images into the requested output format.

use doctools_core::EngineError;
use image::{ImageFormat, ImageReader};
use std::io::Cursor;

/// Dimensions and format of an encoded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageProbe {
    pub width: u32,
    pub height: u32,
    /// Lowercase format name, e.g. `png`
    pub format: String,
    pub mime_type: String,
}

impl std::fmt::Display for ImageProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{} {}", self.width, self.height, self.format)
    }
}

/// Read dimensions and format without decoding pixel data.
pub fn probe_image(bytes: &[u8]) -> Result<ImageProbe, EngineError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(EngineError::Io)?;
    let format = reader
        .format()
        .ok_or_else(|| EngineError::Parse("unrecognized image format".to_string()))?;
    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| EngineError::Parse(format!("failed to read image header: {e}")))?;

    Ok(ImageProbe {
        width,
        height,
        format: format!("{format:?}").to_lowercase(),
        mime_type: format.to_mime_type().to_string(),
    })
}

/// Re-encode image bytes into `format`.
pub fn convert_image(bytes: &[u8], format: ImageFormat) -> Result<Vec<u8>, EngineError> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| EngineError::Parse(format!("failed to decode image: {e}")))?;

    let img = if format == ImageFormat::Jpeg {
        // JPEG has no alpha channel
        image::DynamicImage::ImageRgb8(img.to_rgb8())
    } else {
        img
    };

    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), format)
        .map_err(|e| EngineError::Failed(format!("image encoding failed: {e}")))?;
    Ok(out)
}

/// File extension for an output format.
#[must_use]
pub fn format_extension(format: ImageFormat) -> &'static str {
    format.extensions_str().first().copied().unwrap_or("bin")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_png;

    #[test]
    fn test_probe_png() {
        let probe = probe_image(&sample_png(3, 2)).unwrap();
        assert_eq!(probe.width, 3);
        assert_eq!(probe.height, 2);
        assert_eq!(probe.format, "png");
        assert_eq!(probe.mime_type, "image/png");
        assert_eq!(probe.to_string(), "3x2 png");
    }

    #[test]
    fn test_probe_rejects_garbage() {
        assert!(probe_image(b"definitely not an image").is_err());
        assert!(probe_image(&[]).is_err());
    }

    #[test]
    fn test_convert_png_to_jpeg() {
        let jpeg = convert_image(&sample_png(4, 4), ImageFormat::Jpeg).unwrap();
        let probe = probe_image(&jpeg).unwrap();
        assert_eq!(probe.format, "jpeg");
        assert_eq!((probe.width, probe.height), (4, 4));
    }

    #[test]
    fn test_format_extension() {
        assert_eq!(format_extension(ImageFormat::Png), "png");
        assert_eq!(format_extension(ImageFormat::Jpeg), "jpg");
    }
}
