//! Image representation and encoding utilities.
//!
//! Every photo that enters the booth, whether it came from a file, a drop or
//! the camera, is normalized into a [`CapturedImage`]: base64 text plus a
//! media type, the shape the Gemini API accepts as inline data. Results come
//! back as a [`GeneratedImage`] of the same shape.

use crate::error::{AppError, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::Path;

/// Media type of camera snapshots.
pub const CAMERA_MIME_TYPE: &str = "image/jpeg";

/// A user-supplied photo awaiting generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    /// Standard base64 of the encoded image bytes.
    pub data: String,
    pub mime_type: String,
}

/// Output of a successful generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    /// Standard base64 of the encoded image bytes.
    pub data: String,
    pub mime_type: String,
}

impl CapturedImage {
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Self {
            data: BASE64.encode(bytes),
            mime_type: mime_type.into(),
        }
    }

    pub fn bytes(&self) -> Result<Vec<u8>> {
        decode_base64(&self.data)
    }

    pub fn decode(&self) -> Result<DynamicImage> {
        ImageProcessor::decode(&self.bytes()?)
    }
}

impl GeneratedImage {
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Self {
            data: BASE64.encode(bytes),
            mime_type: mime_type.into(),
        }
    }

    pub fn bytes(&self) -> Result<Vec<u8>> {
        decode_base64(&self.data)
    }

    pub fn decode(&self) -> Result<DynamicImage> {
        ImageProcessor::decode(&self.bytes()?)
    }
}

fn decode_base64(data: &str) -> Result<Vec<u8>> {
    BASE64
        .decode(data)
        .map_err(|e| AppError::image(format!("Invalid base64 image data: {}", e)))
}

/// Image processing utilities for the capture workflow.
pub struct ImageProcessor;

impl ImageProcessor {
    /// Validates raw file content and wraps it as a [`CapturedImage`].
    ///
    /// The bytes are kept as supplied; they are only decoded to prove they
    /// are an image. When `declared_mime` is absent or not an image type, the
    /// media type is sniffed from the content.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::UnreadableFile`] if the content is empty or does
    /// not decode as an image.
    pub fn captured_from_file_bytes(
        bytes: &[u8],
        declared_mime: Option<&str>,
    ) -> Result<CapturedImage> {
        if bytes.is_empty() {
            return Err(AppError::unreadable("the file is empty"));
        }

        let format = image::guess_format(bytes)
            .map_err(|e| AppError::unreadable(format!("unrecognized image data ({})", e)))?;

        image::load_from_memory_with_format(bytes, format)
            .map_err(|e| AppError::unreadable(e.to_string()))?;

        let mime_type = match declared_mime {
            Some(mime) if is_image_mime(mime) => mime.to_string(),
            _ => format.to_mime_type().to_string(),
        };

        Ok(CapturedImage::from_bytes(bytes, mime_type))
    }

    /// Encodes a camera frame as a JPEG [`CapturedImage`].
    pub fn captured_from_frame(frame: &DynamicImage) -> Result<CapturedImage> {
        let jpeg = Self::encode_jpeg(frame)?;
        Ok(CapturedImage::from_bytes(&jpeg, CAMERA_MIME_TYPE))
    }

    /// Encodes a DynamicImage as JPEG bytes.
    ///
    /// JPEG has no alpha channel, so the frame is flattened to RGB first.
    pub fn encode_jpeg(image: &DynamicImage) -> Result<Vec<u8>> {
        let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
        Self::encode(&rgb, ImageFormat::Jpeg)
    }

    /// Encodes a DynamicImage as PNG bytes.
    pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
        Self::encode(image, ImageFormat::Png)
    }

    fn encode(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
        let mut buffer: Vec<u8> = Vec::new();
        let mut cursor = Cursor::new(&mut buffer);

        image
            .write_to(&mut cursor, format)
            .map_err(|e| AppError::image(format!("Failed to encode image: {}", e)))?;

        Ok(buffer)
    }

    pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
        image::load_from_memory(bytes)
            .map_err(|e| AppError::image(format!("Failed to decode image: {}", e)))
    }

    /// Media type implied by a file name's extension, if it is an image.
    pub fn mime_from_path(path: &Path) -> Option<&'static str> {
        ImageFormat::from_path(path).ok().map(|f| f.to_mime_type())
    }
}

/// Whether a declared media type names an image.
pub fn is_image_mime(mime: &str) -> bool {
    mime.trim().to_ascii_lowercase().starts_with("image/")
}
