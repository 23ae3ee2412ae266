//! Shared test utilities.
//!
//! Image fixtures with distinct pixel content (so geometric transforms can be
//! checked exactly) and small filesystem helpers for driver tests.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let input = input_dir(tmp.path(), &["a.png", "b.png"]);
//! let config = write_chain_config(tmp.path(), "rotate 90 ; flip vertical\n");
//! ```

use image::{Rgb, RgbImage};
use std::fs;
use std::path::{Path, PathBuf};

// =========================================================================
// Image fixtures
// =========================================================================

/// `width × height` image where every pixel differs from its neighbours.
///
/// Red follows x, green follows y, blue mixes both, so flips and rotations
/// by multiples of 90° are detectable pixel for pixel.
pub fn gradient_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x % 256) as u8,
            (y % 256) as u8,
            ((x * 7 + y * 13) % 256) as u8,
        ])
    })
}

/// Write a gradient PNG of the given size to `path`.
pub fn write_png(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    gradient_image(width, height).save(path).unwrap();
}

// =========================================================================
// Filesystem fixtures
// =========================================================================

/// Create `<root>/input` holding one empty file per name.
///
/// Content is irrelevant when the driver runs against a mock backend.
pub fn input_dir(root: &Path, names: &[&str]) -> PathBuf {
    let dir = root.join("input");
    fs::create_dir_all(&dir).unwrap();
    for name in names {
        fs::write(dir.join(name), b"").unwrap();
    }
    dir
}

/// Write a chain configuration file and return its path.
pub fn write_chain_config(root: &Path, text: &str) -> PathBuf {
    let path = root.join("augment.conf");
    fs::write(&path, text).unwrap();
    path
}

/// Sorted file names directly inside `dir`.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
