//! Image transforms.
//!
//! One pure function per operation kind. Each takes ownership of the buffer
//! it transforms and returns the result; nothing outside that buffer is
//! touched. Parameter values arrive already resolved (see
//! [`registry`](crate::registry)), so these functions never see raw tokens.

use super::calculations::{gaussian_sigma, is_full_turn, odd_kernel_size, plan_rotation};
use super::params::{ChannelValue, CropPolicy, FlipAxis, TintMode};
use super::primitives;
use image::RgbImage;
use rand::Rng;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
    #[error("rotating {width}x{height} by {degrees} degrees leaves an empty canvas")]
    DegenerateCanvas { width: u32, height: u32, degrees: f64 },
    #[error("rotation by {0} degrees has no invertible affine matrix")]
    SingularMatrix(f64),
    #[error("rescale target {width}x{height} has a zero dimension")]
    EmptyTarget { width: u32, height: u32 },
    #[error("blur kernel size must be at least 1")]
    EmptyKernel,
}

/// Result type for image transforms.
pub type Result<T> = std::result::Result<T, TransformError>;

/// Reject buffers a transform cannot work on.
pub fn ensure_non_empty(image: &RgbImage) -> Result<()> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(TransformError::EmptyImage { width, height });
    }
    Ok(())
}

/// Apply tint tokens in order, each touching one channel of every pixel.
pub fn tint(mut image: RgbImage, channels: &[ChannelValue], mode: TintMode) -> RgbImage {
    for cv in channels {
        let idx = cv.channel.rgb_index();
        match mode {
            TintMode::Absolute => {
                let value = cv.value.clamp(0, 255) as u8;
                for pixel in image.pixels_mut() {
                    pixel.0[idx] = value;
                }
            }
            TintMode::Additive => {
                for pixel in image.pixels_mut() {
                    let widened = i32::from(pixel.0[idx]) + cv.value;
                    pixel.0[idx] = widened.clamp(0, 255) as u8;
                }
            }
        }
    }
    image
}

/// Rotate about the image center, sizing the canvas per `policy`.
pub fn rotate(image: RgbImage, degrees: f64, policy: CropPolicy) -> Result<RgbImage> {
    ensure_non_empty(&image)?;
    let (width, height) = image.dimensions();

    if is_full_turn(degrees) {
        // Every policy keeps the source size here; skip resampling the edges.
        return Ok(image);
    }

    let plan = plan_rotation(width, height, degrees, policy).ok_or(
        TransformError::DegenerateCanvas {
            width,
            height,
            degrees,
        },
    )?;
    primitives::warp_affine(&image, &plan.matrix, plan.canvas_width, plan.canvas_height)
        .ok_or(TransformError::SingularMatrix(degrees))
}

/// Resize to an absolute pixel size.
pub fn rescale(image: RgbImage, width: u32, height: u32) -> Result<RgbImage> {
    ensure_non_empty(&image)?;
    if width == 0 || height == 0 {
        return Err(TransformError::EmptyTarget { width, height });
    }
    if image.dimensions() == (width, height) {
        return Ok(image);
    }
    Ok(primitives::resize(&image, width, height))
}

/// Symmetric Gaussian blur. Even kernel sizes step down to the next odd one.
pub fn blur(image: RgbImage, kernel_size: u32) -> Result<RgbImage> {
    ensure_non_empty(&image)?;
    let kernel = odd_kernel_size(kernel_size).ok_or(TransformError::EmptyKernel)?;
    Ok(primitives::gaussian_blur(&image, gaussian_sigma(kernel)))
}

/// Multiply every subpixel by its own uniform factor from `[lower, upper]`.
///
/// Bounds are expected ordered and finite.
pub fn noise<R: Rng + ?Sized>(mut image: RgbImage, lower: f32, upper: f32, rng: &mut R) -> RgbImage {
    for subpixel in image.iter_mut() {
        let factor: f32 = rng.random_range(lower..=upper);
        *subpixel = scale_subpixel(*subpixel, factor);
    }
    image
}

/// Multiply every subpixel by `intensity`.
pub fn brighten(mut image: RgbImage, intensity: f32) -> RgbImage {
    for subpixel in image.iter_mut() {
        *subpixel = scale_subpixel(*subpixel, intensity);
    }
    image
}

/// Mirror along each axis in the order given.
pub fn flip(mut image: RgbImage, axes: &[FlipAxis]) -> RgbImage {
    for axis in axes {
        match axis {
            FlipAxis::Vertical => primitives::flip_vertical(&mut image),
            FlipAxis::Horizontal => primitives::flip_horizontal(&mut image),
        }
    }
    image
}

#[inline]
fn scale_subpixel(value: u8, factor: f32) -> u8 {
    (f32::from(value) * factor).clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::params::Channel;
    use crate::test_helpers::gradient_image;
    use image::Rgb;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn uniform(width: u32, height: u32, rgb: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb(rgb))
    }

    fn cv(channel: Channel, value: i32) -> ChannelValue {
        ChannelValue { channel, value }
    }

    // =========================================================================
    // Tint
    // =========================================================================

    #[test]
    fn additive_tint_saturates_high() {
        let img = tint(uniform(4, 4, [250, 0, 0]), &[cv(Channel::Red, 10)], TintMode::Additive);
        assert!(img.pixels().all(|p| p.0 == [255, 0, 0]));
    }

    #[test]
    fn additive_tint_saturates_low() {
        let img = tint(uniform(4, 4, [0, 0, 5]), &[cv(Channel::Blue, -10)], TintMode::Additive);
        assert!(img.pixels().all(|p| p.0 == [0, 0, 0]));
    }

    #[test]
    fn additive_tint_only_touches_named_channel() {
        let img = tint(uniform(2, 2, [10, 20, 30]), &[cv(Channel::Green, 5)], TintMode::Additive);
        assert_eq!(img.get_pixel(1, 1).0, [10, 25, 30]);
    }

    #[test]
    fn absolute_tint_sets_and_clamps() {
        let img = tint(
            uniform(2, 2, [10, 20, 30]),
            &[cv(Channel::Red, 300), cv(Channel::Green, 7), cv(Channel::Blue, -4)],
            TintMode::Absolute,
        );
        assert_eq!(img.get_pixel(0, 0).0, [255, 7, 0]);
    }

    #[test]
    fn tint_without_tokens_is_noop() {
        let src = gradient_image(8, 6);
        assert_eq!(tint(src.clone(), &[], TintMode::Additive), src);
    }

    // =========================================================================
    // Rotate
    // =========================================================================

    #[test]
    fn rotate_zero_keep_size_is_unchanged() {
        let src = gradient_image(100, 50);
        let out = rotate(src.clone(), 0.0, CropPolicy::KeepOriginalSize).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn rotate_keep_size_preserves_dimensions() {
        let out = rotate(gradient_image(100, 50), 90.0, CropPolicy::KeepOriginalSize).unwrap();
        assert_eq!(out.dimensions(), (100, 50));
    }

    #[test]
    fn rotate_keep_corners_swaps_on_quarter_turn() {
        let out = rotate(gradient_image(100, 50), 90.0, CropPolicy::KeepCorners).unwrap();
        assert_eq!(out.dimensions(), (50, 100));
    }

    #[test]
    fn rotate_keep_corners_grows_canvas() {
        let out = rotate(gradient_image(100, 50), 45.0, CropPolicy::KeepCorners).unwrap();
        assert_eq!(out.dimensions(), (106, 106));
    }

    #[test]
    fn rotate_crop_inward_shrinks_canvas() {
        let out = rotate(gradient_image(100, 50), 15.0, CropPolicy::CropInward).unwrap();
        assert_eq!(out.dimensions(), (57, 48));
    }

    #[test]
    fn rotate_crop_inward_rejects_degenerate_canvas() {
        let result = rotate(gradient_image(100, 50), 90.0, CropPolicy::CropInward);
        assert!(matches!(result, Err(TransformError::DegenerateCanvas { .. })));
    }

    #[test]
    fn rotate_empty_image_is_error() {
        let result = rotate(RgbImage::new(0, 10), 15.0, CropPolicy::KeepOriginalSize);
        assert_eq!(
            result,
            Err(TransformError::EmptyImage {
                width: 0,
                height: 10
            })
        );
    }

    #[test]
    fn rotate_half_turn_keeps_center_pixel() {
        let src = uniform(21, 21, [200, 100, 50]);
        let out = rotate(src, 180.0, CropPolicy::KeepOriginalSize).unwrap();
        let center = out.get_pixel(10, 10).0;
        for (got, want) in center.iter().zip([200u8, 100, 50]) {
            assert!((*got as i32 - want as i32).abs() <= 1, "{center:?}");
        }
    }

    // =========================================================================
    // Rescale / blur
    // =========================================================================

    #[test]
    fn rescale_to_absolute_size() {
        let out = rescale(gradient_image(100, 50), 256, 256).unwrap();
        assert_eq!(out.dimensions(), (256, 256));
    }

    #[test]
    fn rescale_rejects_zero_target() {
        let result = rescale(gradient_image(10, 10), 0, 5);
        assert!(matches!(result, Err(TransformError::EmptyTarget { .. })));
    }

    #[test]
    fn blur_keeps_dimensions_and_uniform_colour() {
        let out = blur(uniform(12, 9, [80, 80, 80]), 3).unwrap();
        assert_eq!(out.dimensions(), (12, 9));
        let p = out.get_pixel(6, 4).0;
        assert!(p.iter().all(|&v| (v as i32 - 80).abs() <= 1), "{p:?}");
    }

    #[test]
    fn blur_smooths_a_hard_edge() {
        let mut src = uniform(10, 10, [0, 0, 0]);
        for y in 0..10 {
            for x in 5..10 {
                src.put_pixel(x, y, Rgb([255, 255, 255]));
            }
        }
        let out = blur(src, 5).unwrap();
        let edge = out.get_pixel(5, 5).0[0];
        assert!(edge > 0 && edge < 255);
    }

    #[test]
    fn blur_zero_kernel_is_error() {
        assert_eq!(blur(gradient_image(4, 4), 0), Err(TransformError::EmptyKernel));
    }

    // =========================================================================
    // Noise / brighten
    // =========================================================================

    #[test]
    fn noise_is_reproducible_with_seed() {
        let src = gradient_image(16, 16);
        let a = noise(src.clone(), 0.7, 1.0, &mut StdRng::seed_from_u64(7));
        let b = noise(src, 0.7, 1.0, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn noise_stays_within_factor_bounds() {
        let src = uniform(16, 16, [200, 100, 10]);
        let out = noise(src, 0.7, 1.0, &mut StdRng::seed_from_u64(1));
        for p in out.pixels() {
            // 0.7 is not exact in f32, so the lower bound can truncate one below.
            assert!((139..=200).contains(&p.0[0]));
            assert!((69..=100).contains(&p.0[1]));
            assert!((6..=10).contains(&p.0[2]));
        }
    }

    #[test]
    fn noise_with_unit_factor_is_identity() {
        let src = gradient_image(8, 8);
        let out = noise(src.clone(), 1.0, 1.0, &mut StdRng::seed_from_u64(3));
        assert_eq!(out, src);
    }

    #[test]
    fn brighten_scales_and_clamps() {
        let out = brighten(uniform(2, 2, [100, 200, 0]), 1.5);
        assert_eq!(out.get_pixel(0, 0).0, [150, 255, 0]);
    }

    #[test]
    fn brighten_below_one_darkens() {
        let out = brighten(uniform(2, 2, [100, 50, 3]), 0.5);
        assert_eq!(out.get_pixel(1, 1).0, [50, 25, 1]);
    }

    // =========================================================================
    // Flip
    // =========================================================================

    #[test]
    fn flip_horizontal_mirrors_columns() {
        let src = gradient_image(5, 3);
        let out = flip(src.clone(), &[FlipAxis::Horizontal]);
        assert_eq!(out.get_pixel(0, 1), src.get_pixel(4, 1));
    }

    #[test]
    fn flip_vertical_mirrors_rows() {
        let src = gradient_image(5, 3);
        let out = flip(src.clone(), &[FlipAxis::Vertical]);
        assert_eq!(out.get_pixel(2, 0), src.get_pixel(2, 2));
    }

    #[test]
    fn flip_both_axes_is_half_turn() {
        let src = gradient_image(5, 3);
        let out = flip(src.clone(), &[FlipAxis::Vertical, FlipAxis::Horizontal]);
        assert_eq!(out.get_pixel(0, 0), src.get_pixel(4, 2));
    }

    proptest! {
        #[test]
        fn horizontal_flip_twice_is_identity(width in 1u32..40, height in 1u32..40) {
            let src = gradient_image(width, height);
            let twice = flip(flip(src.clone(), &[FlipAxis::Horizontal]), &[FlipAxis::Horizontal]);
            prop_assert_eq!(twice, src);
        }

        #[test]
        fn additive_tint_is_clamped_sum(v in 0u8..=255, d in -300i32..300) {
            let out = tint(uniform(1, 1, [v, v, v]), &[cv(Channel::Red, d)], TintMode::Additive);
            prop_assert_eq!(out.get_pixel(0, 0).0[0] as i32, (v as i32 + d).clamp(0, 255));
        }
    }
}
