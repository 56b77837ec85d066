//! Image blobs — the unit handed from capture to upload.
//!
//! Pure encoding logic, no OS access.

use super::CaptureError;
use image::{DynamicImage, ImageFormat, RgbaImage};
use std::io::Cursor;

pub const PNG_MIME: &str = "image/png";

/// An encoded screenshot with a file name and mime type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBlob {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ImageBlob {
    /// Wrap PNG bytes under a timestamp name: `screenshot-<unix millis>.png`.
    pub fn png(bytes: Vec<u8>) -> Self {
        Self::png_at(bytes, chrono::Utc::now().timestamp_millis())
    }

    pub fn png_at(bytes: Vec<u8>, millis: i64) -> Self {
        Self {
            name: format!("screenshot-{}.png", millis),
            mime: PNG_MIME.to_string(),
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Extension of `name` (text after the last `.`), if any.
    pub fn extension(&self) -> Option<&str> {
        let (_, ext) = self.name.rsplit_once('.')?;
        if ext.is_empty() {
            None
        } else {
            Some(ext)
        }
    }
}

/// Encode an RGBA buffer as PNG bytes.
pub fn encode_png(image: RgbaImage) -> Result<Vec<u8>, CaptureError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(CaptureError::Failed(
            "Captured image has zero width or height".into(),
        ));
    }

    let mut png_bytes: Vec<u8> = Vec::new();
    DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut png_bytes), ImageFormat::Png)
        .map_err(|e| CaptureError::Failed(format!("PNG encoding failed: {}", e)))?;

    Ok(png_bytes)
}
