//! Pure calculation functions for transform parameters.
//!
//! All functions here are pure and testable without any I/O or images.
//!
//! ## Rotation
//!
//! The rotation matrix follows the usual 2×3 affine convention, mapping
//! source coordinates to destination coordinates, with positive degrees
//! rotating counter-clockwise in image coordinates (y axis pointing down):
//!
//! ```text
//! [ α  β  (1-α)·cx - β·cy ]      α = cos θ
//! [-β  α  β·cx + (1-α)·cy ]      β = sin θ
//! ```
//!
//! Canvas size depends on the [`CropPolicy`]. The translation column is then
//! shifted by `bound/2 - center` on each axis so the rotated content stays
//! centred on the new canvas.

use super::params::CropPolicy;

/// 2×3 affine matrix, row-major.
pub type AffineMatrix = [[f64; 3]; 2];

/// Rotation matrix about `center` by `degrees`, uniformly scaled.
pub fn rotation_matrix(center: (f64, f64), degrees: f64, scale: f64) -> AffineMatrix {
    let theta = degrees.to_radians();
    let alpha = scale * theta.cos();
    let beta = scale * theta.sin();
    let (cx, cy) = center;
    [
        [alpha, beta, (1.0 - alpha) * cx - beta * cy],
        [-beta, alpha, beta * cx + (1.0 - alpha) * cy],
    ]
}

/// Canvas size for a rotated `width`×`height` image, before validation.
///
/// Values are truncated toward zero. `CropInward` can go to zero or below
/// for steep angles; callers reject such canvases.
///
/// The `CropInward` shrink (`2·W·|sin θ|`, `2·H·|sin θ|`) only approximates
/// the inscribed rectangle.
pub fn canvas_size(width: u32, height: u32, degrees: f64, policy: CropPolicy) -> (i64, i64) {
    let w = width as f64;
    let h = height as f64;
    let theta = degrees.to_radians();
    let abs_cos = theta.cos().abs();
    let abs_sin = theta.sin().abs();

    match policy {
        CropPolicy::KeepOriginalSize => (width as i64, height as i64),
        CropPolicy::KeepCorners => (
            (h * abs_sin + w * abs_cos) as i64,
            (h * abs_cos + w * abs_sin) as i64,
        ),
        CropPolicy::CropInward => (
            (h * abs_sin + w * abs_cos - 2.0 * w * abs_sin) as i64,
            (h * abs_cos + w * abs_sin - 2.0 * h * abs_sin) as i64,
        ),
    }
}

/// Everything the affine warp needs for one rotation.
#[derive(Debug, Clone, PartialEq)]
pub struct RotationPlan {
    pub matrix: AffineMatrix,
    pub canvas_width: u32,
    pub canvas_height: u32,
}

/// Plan a rotation: canvas size plus a matrix re-centred on that canvas.
///
/// Returns `None` when the canvas would be empty.
pub fn plan_rotation(
    width: u32,
    height: u32,
    degrees: f64,
    policy: CropPolicy,
) -> Option<RotationPlan> {
    let center = (width as f64 / 2.0, height as f64 / 2.0);
    let mut matrix = rotation_matrix(center, degrees, 1.0);

    let (bound_w, bound_h) = canvas_size(width, height, degrees, policy);
    if bound_w <= 0 || bound_h <= 0 {
        return None;
    }
    let canvas_width = u32::try_from(bound_w).ok()?;
    let canvas_height = u32::try_from(bound_h).ok()?;

    matrix[0][2] += bound_w as f64 / 2.0 - center.0;
    matrix[1][2] += bound_h as f64 / 2.0 - center.1;

    Some(RotationPlan {
        matrix,
        canvas_width,
        canvas_height,
    })
}

/// True when `degrees` is a whole number of turns.
pub fn is_full_turn(degrees: f64) -> bool {
    let r = degrees.rem_euclid(360.0);
    r < 1e-9 || (360.0 - r) < 1e-9
}

/// Force a Gaussian kernel size odd by stepping even sizes down by one.
///
/// Zero has no odd predecessor and maps to `None`.
pub fn odd_kernel_size(kernel_size: u32) -> Option<u32> {
    match kernel_size {
        0 => None,
        k if k % 2 == 0 => Some(k - 1),
        k => Some(k),
    }
}

/// Standard deviation for an odd Gaussian kernel when none is given.
///
/// `σ = 0.3·((k − 1)·0.5 − 1) + 0.8`, the customary derivation for a
/// kernel whose support is `k` pixels. Always positive for `k ≥ 1`.
pub fn gaussian_sigma(kernel_size: u32) -> f32 {
    0.3 * ((kernel_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}
