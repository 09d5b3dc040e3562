use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;

use crate::constants::PHOTO_JPEG_QUALITY;
use crate::error::PhotoError;

/// Turns a user-selected image into the compressed blob stored on a recipe.
///
/// Returns `None` when the image cannot be read; capture cancellation is
/// handled by the caller never invoking the encoder.
pub trait PhotoEncoder: Send + Sync {
    fn encode(&self, image_bytes: &[u8]) -> Option<Bytes>;
}

// Re-encodes any decodable image as a baseline JPEG. Alpha is dropped.
#[derive(Debug, Clone, Copy)]
pub struct JpegPhotoEncoder {
    quality: u8,
}

impl JpegPhotoEncoder {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn compress(&self, image_bytes: &[u8]) -> Result<Bytes, PhotoError> {
        if image_bytes.is_empty() {
            return Err(PhotoError::Empty);
        }

        let img = image::load_from_memory(image_bytes)?;
        let rgb = img.to_rgb8();

        let mut out = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut out, self.quality);
        encoder.encode_image(&rgb)?;

        Ok(Bytes::from(out))
    }
}

impl Default for JpegPhotoEncoder {
    fn default() -> Self {
        Self::new(PHOTO_JPEG_QUALITY)
    }
}

impl PhotoEncoder for JpegPhotoEncoder {
    fn encode(&self, image_bytes: &[u8]) -> Option<Bytes> {
        self.compress(image_bytes).ok()
    }
}
