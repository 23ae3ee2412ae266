//! Parameter types for image operations.
//!
//! These types describe *what* to do, not *how* to do it. The
//! [`registry`](crate::registry) turns raw configuration tokens into these
//! records, and the [`operations`](super::operations) consume them.
//!
//! ## Types
//!
//! - [`CropPolicy`]: Output canvas strategy for rotation.
//! - [`FlipAxis`]: Mirror direction.
//! - [`Channel`] / [`ChannelValue`]: A colour channel and the integer applied to it by tint.
//! - [`TintMode`]: Additive (clamped) or absolute channel assignment.
//! - [`Quality`]: Lossy encoding quality (1–100, default 95). Clamped on construction.

use thiserror::Error;

/// How the rotation canvas is sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropPolicy {
    /// Canvas stays the source size; rotated corners may be clipped.
    KeepOriginalSize,
    /// Canvas grows to the bounding box of the rotated corners.
    KeepCorners,
    /// Canvas shrinks from the corner bounding box toward the inscribed region.
    CropInward,
}

/// Mirror direction, named after the token that selects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipAxis {
    /// Upside down (about the horizontal axis).
    Vertical,
    /// Left to right (about the vertical axis).
    Horizontal,
}

impl FlipAxis {
    pub fn from_token(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("vertical") {
            Some(Self::Vertical)
        } else if token.eq_ignore_ascii_case("horizontal") {
            Some(Self::Horizontal)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vertical => "vertical",
            Self::Horizontal => "horizontal",
        }
    }
}

/// A colour channel addressable by tint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Blue,
    Green,
    Red,
}

impl Channel {
    const ALL: [Channel; 3] = [Channel::Blue, Channel::Green, Channel::Red];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Red => "red",
        }
    }

    /// Subpixel offset inside an interleaved `Rgb<u8>` pixel.
    pub fn rgb_index(self) -> usize {
        match self {
            Self::Red => 0,
            Self::Green => 1,
            Self::Blue => 2,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelTokenError {
    #[error("`{0}` does not name a channel (expected redNN, greenNN or blueNN)")]
    UnknownChannel(String),
    #[error("`{token}` has a non-integer value, expected {channel}NN")]
    BadValue { token: String, channel: &'static str },
}

/// A tint token such as `red20` or `blue-15`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelValue {
    pub channel: Channel,
    pub value: i32,
}

impl ChannelValue {
    pub fn parse(token: &str) -> Result<Self, ChannelTokenError> {
        let lowered = token.to_lowercase();
        for channel in Channel::ALL {
            if let Some(rest) = lowered.strip_prefix(channel.as_str()) {
                return rest
                    .parse::<i32>()
                    .map(|value| Self { channel, value })
                    .map_err(|_| ChannelTokenError::BadValue {
                        token: token.to_string(),
                        channel: channel.as_str(),
                    });
            }
        }
        Err(ChannelTokenError::UnknownChannel(token.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TintMode {
    /// Add the value to the channel, saturating at 0 and 255.
    Additive,
    /// Set the channel to the value, clamped to 0..=255.
    Absolute,
}

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(95)
    }
}
