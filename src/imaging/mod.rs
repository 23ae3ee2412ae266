//! Image processing in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode / encode** | `image` crate codecs |
//! | **Rotate** | rotation matrix + canvas planning, `imageproc` affine warp |
//! | **Rescale** | `image::imageops::resize` (bilinear) |
//! | **Blur** | `imageproc` Gaussian blur, sigma derived from the odd kernel size |
//! | **Tint / noise / brighten / flip** | per-subpixel loops over the RGB buffer |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for rotation geometry and kernel math (unit testable)
//! - **Parameters**: Data structures describing transform arguments
//! - **Primitives**: Thin wrappers over the pixel kernels of `image` / `imageproc`
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: The transforms, combining calculations + primitives

pub mod backend;
pub mod calculations;
pub mod operations;
pub mod params;
mod primitives;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use operations::TransformError;
pub use params::{Channel, ChannelValue, CropPolicy, FlipAxis, Quality, TintMode};
pub use rust_backend::RustBackend;
