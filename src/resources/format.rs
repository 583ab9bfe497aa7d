//! Pixel formats and sampler parameters.
//!
//! A [`PixelFormat`] describes the channel layout and storage semantics of
//! an image plane. Byte formats quantize on store to 8-bit steps; float
//! formats keep the stored value exact. The wrap and filter parameter enums
//! are carried by attachment specifications so attachments can be recreated
//! identically on resize.

/// Internal format of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 8-bit RGB color.
    Rgb8,
    /// 8-bit RGBA color.
    Rgba8,
    /// Single-channel 32-bit float (entity-ID planes, masks).
    R32F,
    /// Two-channel 16-bit float (BRDF lookup tables).
    Rg16F,
    /// Four-channel 16-bit float (HDR color).
    Rgba16F,
    /// Four-channel 32-bit float (decoded equirectangular sources).
    Rgba32F,
    /// 24-bit depth.
    Depth24,
    /// 32-bit float depth.
    Depth32F,
    /// Combined 24-bit depth with 8-bit stencil.
    Depth24Stencil8,
}

impl PixelFormat {
    /// Number of stored channels per texel.
    #[must_use]
    pub fn channel_count(self) -> usize {
        match self {
            PixelFormat::R32F | PixelFormat::Depth24 | PixelFormat::Depth32F => 1,
            PixelFormat::Rg16F | PixelFormat::Depth24Stencil8 => 2,
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 | PixelFormat::Rgba16F | PixelFormat::Rgba32F => 4,
        }
    }

    /// Whether this format stores depth (and possibly stencil) data.
    #[must_use]
    pub fn is_depth(self) -> bool {
        matches!(
            self,
            PixelFormat::Depth24 | PixelFormat::Depth32F | PixelFormat::Depth24Stencil8
        )
    }

    /// Whether stored values keep full float precision.
    ///
    /// Byte formats quantize each channel to 1/255 steps on store.
    #[must_use]
    pub fn is_float(self) -> bool {
        !matches!(self, PixelFormat::Rgb8 | PixelFormat::Rgba8)
    }
}

/// Texture coordinate wrapping behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapMode {
    /// Tile the image.
    #[default]
    Repeat,
    /// Clamp coordinates to the edge texel.
    ClampToEdge,
    /// Tile with every other repetition mirrored.
    MirroredRepeat,
}

impl WrapMode {
    /// Apply the wrap to a normalized coordinate.
    #[must_use]
    pub fn apply(self, coord: f32) -> f32 {
        match self {
            WrapMode::Repeat => coord.rem_euclid(1.0),
            WrapMode::ClampToEdge => coord.clamp(0.0, 1.0),
            WrapMode::MirroredRepeat => {
                let t = coord.rem_euclid(2.0);
                if t > 1.0 {
                    2.0 - t
                } else {
                    t
                }
            }
        }
    }
}

/// Texture filtering behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    /// Nearest-texel lookup.
    Nearest,
    /// Bilinear interpolation.
    #[default]
    Linear,
}
