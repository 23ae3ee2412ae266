//! Pure Rust codec backend built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP, BMP) | `image::ImageReader` with content sniffing |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` at the configured quality |
//! | Encode → other | `RgbImage::write_to` with the format picked by extension |
//!
//! Every decoded image is converted to 8-bit RGB. Alpha is dropped and
//! grayscale is expanded, so transforms always see three channels.
//!
//! Encoding happens in memory; the file is only created once the encoder has
//! succeeded, so a failed encode never leaves a partial file behind.

use super::backend::{BackendError, ImageBackend};
use super::params::Quality;
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageFormat, ImageReader, RgbImage};
use std::io::Cursor;
use std::path::Path;

/// Extensions whose codecs are compiled in.
const FORMAT_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
    ("bmp", ImageFormat::Bmp),
];

/// Codec backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustBackend {
    jpeg_quality: Quality,
}

impl RustBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quality(jpeg_quality: Quality) -> Self {
        Self { jpeg_quality }
    }
}

fn format_for(path: &Path) -> Result<ImageFormat, BackendError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    FORMAT_CANDIDATES
        .iter()
        .find(|(candidate, _)| *candidate == ext)
        .map(|(_, fmt)| *fmt)
        .ok_or(BackendError::UnsupportedFormat(ext))
}

impl ImageBackend for RustBackend {
    fn decode(&self, path: &Path) -> Result<RgbImage, BackendError> {
        let decoded = ImageReader::open(path)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| {
                BackendError::ProcessingFailed(format!(
                    "Failed to decode {}: {}",
                    path.display(),
                    e
                ))
            })?;
        Ok(decoded.to_rgb8())
    }

    fn encode(&self, image: &RgbImage, path: &Path) -> Result<(), BackendError> {
        let encode_err = |e: image::ImageError| {
            BackendError::ProcessingFailed(format!("Failed to encode {}: {}", path.display(), e))
        };
        let mut bytes = Vec::new();
        match format_for(path)? {
            ImageFormat::Jpeg => {
                JpegEncoder::new_with_quality(&mut bytes, self.jpeg_quality.value() as u8)
                    .write_image(
                        image.as_raw(),
                        image.width(),
                        image.height(),
                        ExtendedColorType::Rgb8,
                    )
                    .map_err(encode_err)?;
            }
            format => image
                .write_to(&mut Cursor::new(&mut bytes), format)
                .map_err(encode_err)?,
        }
        std::fs::write(path, bytes)?;
        Ok(())
    }
}
