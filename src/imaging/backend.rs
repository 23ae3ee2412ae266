//! Image codec backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the boundary to file formats: decode a file
//! into an 8-bit, three-channel buffer, and encode a buffer back to a file
//! whose format is chosen by its extension.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend). Tests use an in-memory
//! mock so the batch driver can run without real codecs.

use image::RgbImage;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),
}

/// Trait for image codec backends.
///
/// Must be `Sync`: the driver shares one backend across rayon workers.
pub trait ImageBackend: Sync {
    /// Decode a file into an interleaved 8-bit RGB buffer.
    fn decode(&self, path: &Path) -> Result<RgbImage, BackendError>;

    /// Encode `image` to `path`, picking the format from the extension.
    fn encode(&self, image: &RgbImage, path: &Path) -> Result<(), BackendError>;
}
