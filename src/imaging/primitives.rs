//! Pixel kernels delegated to `image` and `imageproc`.
//!
//! The transform layer only computes parameters; these thin wrappers are the
//! single place where numeric execution is handed off.
//!
//! | Primitive | Crate / function |
//! |---|---|
//! | Affine warp | `imageproc::geometric_transformations::warp_into` (bilinear) |
//! | Gaussian blur | `imageproc::filter::gaussian_blur_f32` |
//! | Resize | `image::imageops::resize` with `Triangle` (bilinear) filter |
//! | Flip | `image::imageops::flip_{horizontal,vertical}_in_place` |

use super::calculations::AffineMatrix;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};

/// Warp `image` through `matrix` onto a `width`×`height` canvas.
///
/// Uncovered canvas pixels are black. Returns `None` if the matrix is not
/// invertible.
pub fn warp_affine(
    image: &RgbImage,
    matrix: &AffineMatrix,
    width: u32,
    height: u32,
) -> Option<RgbImage> {
    let [[a, b, tx], [c, d, ty]] = *matrix;
    let projection = Projection::from_matrix([
        a as f32, b as f32, tx as f32, //
        c as f32, d as f32, ty as f32, //
        0.0, 0.0, 1.0,
    ])?;
    let mut out = RgbImage::new(width, height);
    warp_into(
        image,
        &projection,
        Interpolation::Bilinear,
        Rgb([0, 0, 0]),
        &mut out,
    );
    Some(out)
}

/// Gaussian blur with standard deviation `sigma` (must be positive).
pub fn gaussian_blur(image: &RgbImage, sigma: f32) -> RgbImage {
    imageproc::filter::gaussian_blur_f32(image, sigma)
}

/// Resize to exactly `width`×`height`, ignoring aspect ratio.
pub fn resize(image: &RgbImage, width: u32, height: u32) -> RgbImage {
    imageops::resize(image, width, height, FilterType::Triangle)
}

pub fn flip_vertical(image: &mut RgbImage) {
    imageops::flip_vertical_in_place(image);
}

pub fn flip_horizontal(image: &mut RgbImage) {
    imageops::flip_horizontal_in_place(image);
}
